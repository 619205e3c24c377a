//! Mesh topology derived from drone positions and jamming exposure.
//!
//! Links are rebuilt from scratch every tick; nothing here holds state.

use crate::config::SimConfig;
use swarm_domain::{Drone, MeshLink};

/// All links between linkable drones within mesh range.
///
/// Pairs whose endpoints are both jammed have their strength cut by the
/// penalty factor and stay active only if the degraded strength still clears
/// the threshold.
pub fn compute_links(drones: &[Drone], config: &SimConfig) -> Vec<MeshLink> {
    let nodes: Vec<&Drone> = drones.iter().filter(|d| d.status.can_link()).collect();
    let mut links = Vec::new();

    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            if let Some(link) = link_between(a, b, config) {
                links.push(link);
            }
        }
    }

    links
}

fn link_between(a: &Drone, b: &Drone, config: &SimConfig) -> Option<MeshLink> {
    let dist = a.position.distance_to(&b.position);
    if dist >= config.mesh_range {
        return None;
    }

    let strength = (1.0 - dist / config.mesh_range).max(0.0);
    let both_jammed = a.in_jamming_zone && b.in_jamming_zone;

    let (strength, active) = if both_jammed {
        let degraded = strength * config.jammed_link_penalty;
        (degraded, degraded > config.jammed_link_threshold)
    } else {
        (strength, true)
    };

    Some(MeshLink {
        from: a.id.clone(),
        to: b.id.clone(),
        strength,
        active,
    })
}

/// Ids reachable from `id` over active links.
pub fn active_peers(links: &[MeshLink], id: &str) -> Vec<String> {
    links
        .iter()
        .filter(|link| link.active)
        .filter_map(|link| link.peer_of(id))
        .map(str::to_string)
        .collect()
}

/// Rewrite every drone's `connected_peers` from the active-link set.
pub fn assign_peers(drones: &mut [Drone], links: &[MeshLink]) {
    for drone in drones.iter_mut() {
        drone.connected_peers = active_peers(links, &drone.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_domain::{DroneRole, DroneStatus, Position};

    fn drone_at(id: &str, x: f64, y: f64) -> Drone {
        Drone::new(id, DroneRole::Relay, Position::new(x, y))
    }

    #[test]
    fn test_strength_falls_with_distance() {
        let config = SimConfig::default();
        let near = compute_links(&[drone_at("a", 100.0, 100.0), drone_at("b", 130.0, 100.0)], &config);
        let far = compute_links(&[drone_at("a", 100.0, 100.0), drone_at("b", 220.0, 100.0)], &config);

        assert_eq!(near.len(), 1);
        assert_eq!(far.len(), 1);
        assert!((near[0].strength - (1.0 - 30.0 / 150.0)).abs() < 1e-9);
        assert!((far[0].strength - (1.0 - 120.0 / 150.0)).abs() < 1e-9);
        assert!(near[0].strength > far[0].strength);
        assert!(near[0].active && far[0].active);
    }

    #[test]
    fn test_no_link_at_or_beyond_range() {
        let config = SimConfig::default();
        let at_range = compute_links(&[drone_at("a", 100.0, 100.0), drone_at("b", 250.0, 100.0)], &config);
        let beyond = compute_links(&[drone_at("a", 100.0, 100.0), drone_at("b", 400.0, 100.0)], &config);
        assert!(at_range.is_empty());
        assert!(beyond.is_empty());
    }

    #[test]
    fn test_both_jammed_penalty() {
        let config = SimConfig::default();
        let mut a = drone_at("a", 100.0, 100.0);
        let mut b = drone_at("b", 150.0, 100.0);
        a.in_jamming_zone = true;
        b.in_jamming_zone = true;
        a.status = DroneStatus::Jammed;
        b.status = DroneStatus::Jammed;

        let links = compute_links(&[a, b], &config);
        assert_eq!(links.len(), 1);
        assert!((links[0].strength - (1.0 - 50.0 / 150.0) * 0.3).abs() < 1e-9);
        assert!((links[0].strength - 0.2).abs() < 1e-9);
        assert!(!links[0].active);
    }

    #[test]
    fn test_single_jammed_endpoint_keeps_full_strength() {
        let config = SimConfig::default();
        let mut a = drone_at("a", 100.0, 100.0);
        a.in_jamming_zone = true;
        let links = compute_links(&[a, drone_at("b", 150.0, 100.0)], &config);
        assert!((links[0].strength - (1.0 - 50.0 / 150.0)).abs() < 1e-9);
        assert!(links[0].active);
    }

    #[test]
    fn test_offline_and_destroyed_never_link() {
        let config = SimConfig::default();
        let mut offline = drone_at("off", 101.0, 100.0);
        offline.status = DroneStatus::Offline;
        let mut destroyed = drone_at("dead", 100.0, 101.0);
        destroyed.status = DroneStatus::Destroyed;

        let links = compute_links(&[drone_at("a", 100.0, 100.0), offline, destroyed], &config);
        assert!(links.is_empty());
    }

    #[test]
    fn test_peers_follow_active_links_only() {
        let links = vec![
            MeshLink { from: "a".into(), to: "b".into(), strength: 0.9, active: true },
            MeshLink { from: "c".into(), to: "a".into(), strength: 0.7, active: true },
            MeshLink { from: "a".into(), to: "d".into(), strength: 0.1, active: false },
        ];
        let mut peers = active_peers(&links, "a");
        peers.sort();
        assert_eq!(peers, vec!["b".to_string(), "c".to_string()]);
        assert!(active_peers(&links, "d").is_empty());
    }
}
