//! Per-drone decision and motion update.
//!
//! Each call maps one drone's current state to its next-tick state. The live
//! drone is never steered by the role logic: it is either frozen (external
//! feed connected) or driven by keyboard fallback input.

use crate::config::SimConfig;
use crate::live::KeyboardInput;
use swarm_domain::{
    Drone, DroneRole, DroneStatus, JammingZone, Position, Target, ThreatLevel, Velocity,
    heading_between,
};

/// Everything a drone can observe during one tick.
#[derive(Debug, Clone, Copy)]
pub struct Surroundings<'a> {
    /// Full roster as of the start of the tick
    pub drones: &'a [Drone],
    pub jamming_zones: &'a [JammingZone],
    pub targets: &'a [Target],
    pub gps_enabled: bool,
    /// Simulation clock, epoch milliseconds
    pub now_ms: f64,
    /// External device feed is currently driving the live drone
    pub live_connected: bool,
    pub keyboard: KeyboardInput,
}

/// Next-tick state for `drone`.
pub fn update_drone(drone: &Drone, env: &Surroundings<'_>, config: &SimConfig) -> Drone {
    if drone.is_live_device {
        if env.live_connected {
            return drone.clone();
        }
        return keyboard_step(drone, env.keyboard, config);
    }

    autonomous_step(drone, env, config)
}

/// Manual flight for the live drone while its device is away.
fn keyboard_step(drone: &Drone, keys: KeyboardInput, config: &SimConfig) -> Drone {
    let velocity = keys.velocity(config.keyboard_speed);
    let heading = if velocity.is_moving() {
        velocity.heading_deg()
    } else {
        drone.heading
    };

    let position = config.bounds.clamp(Position::new(
        drone.position.x + velocity.vx,
        drone.position.y + velocity.vy,
    ));

    Drone {
        position,
        velocity,
        heading,
        last_known_position: position,
        ..drone.clone()
    }
}

fn autonomous_step(drone: &Drone, env: &Surroundings<'_>, config: &SimConfig) -> Drone {
    let position = drone.position;

    let in_jamming = env.jamming_zones.iter().any(|zone| zone.covers(&position));
    let gps_available = env.gps_enabled && !in_jamming;

    let threats: Vec<&Target> = env
        .targets
        .iter()
        .filter(|t| t.is_hostile() && position.distance_to(&t.position) < config.threat_range)
        .collect();
    let threat_level = assess_threat(threats.len(), in_jamming);

    let waypoint = match drone.role {
        DroneRole::Scout => scout_waypoint(drone, in_jamming, env, config),
        DroneRole::Tracker => tracker_waypoint(env.targets),
        DroneRole::Relay => relay_waypoint(env.drones),
        DroneRole::Interceptor => threats.first().map(|t| t.position),
    };

    let (velocity, heading) = match waypoint {
        Some(goal) => steer(drone, goal, config),
        None => (drone.velocity, drone.heading),
    };

    let next_position = config.bounds.clamp(Position::new(
        position.x + velocity.vx,
        position.y + velocity.vy,
    ));

    let last_known_position = if gps_available {
        next_position
    } else {
        drone.last_known_position
    };

    let battery = drone.battery.map(|b| (b - config.battery_drain).max(0.0));

    let signal_strength = if in_jamming {
        (drone.signal_strength - config.signal_decay).max(config.signal_floor)
    } else {
        (drone.signal_strength + config.signal_recovery).min(1.0)
    };

    let status = match battery {
        Some(level) if level <= 0.0 => DroneStatus::Offline,
        _ if in_jamming => DroneStatus::Jammed,
        _ => DroneStatus::Active,
    };

    Drone {
        position: next_position,
        velocity,
        heading,
        gps_available,
        in_jamming_zone: in_jamming,
        threat_level,
        last_known_position,
        battery,
        signal_strength,
        status,
        ..drone.clone()
    }
}

/// Threat classification from the number of hostiles in range.
pub fn assess_threat(nearby_hostiles: usize, in_jamming: bool) -> ThreatLevel {
    match nearby_hostiles {
        0 if in_jamming => ThreatLevel::Low,
        0 => ThreatLevel::None,
        1 => ThreatLevel::Medium,
        _ => ThreatLevel::High,
    }
}

/// Unit-vector pursuit of `goal`; stops inside the arrival radius.
fn steer(drone: &Drone, goal: Position, config: &SimConfig) -> (Velocity, f64) {
    let dx = goal.x - drone.position.x;
    let dy = goal.y - drone.position.y;
    let dist = dx.hypot(dy);

    if dist <= config.arrival_radius {
        return (Velocity::ZERO, drone.heading);
    }

    let speed = match drone.role {
        DroneRole::Interceptor => config.intercept_speed,
        _ => config.cruise_speed,
    };

    (
        Velocity::new(dx / dist * speed, dy / dist * speed),
        heading_between(dx, dy),
    )
}

/// Jammed scouts flee radially from the nearest active zone; free scouts
/// fly a patrol ellipse around the map center.
fn scout_waypoint(
    drone: &Drone,
    in_jamming: bool,
    env: &Surroundings<'_>,
    config: &SimConfig,
) -> Option<Position> {
    let position = drone.position;

    if in_jamming {
        let nearest = env
            .jamming_zones
            .iter()
            .filter(|z| z.active)
            .min_by(|a, b| {
                position
                    .distance_to(&a.center)
                    .total_cmp(&position.distance_to(&b.center))
            })?;

        let angle = (position.y - nearest.center.y).atan2(position.x - nearest.center.x);
        return Some(Position::new(
            position.x + angle.cos() * config.escape_distance,
            position.y + angle.sin() * config.escape_distance,
        ));
    }

    let phase = env.now_ms / config.patrol_period_ms + patrol_offset(&drone.id);
    let center = config.bounds.center();
    Some(Position::new(
        center.x + phase.cos() * config.patrol_radius_x,
        center.y + phase.sin() * config.patrol_radius_y,
    ))
}

/// First hostile in roster order.
fn tracker_waypoint(targets: &[Target]) -> Option<Position> {
    targets.iter().find(|t| t.is_hostile()).map(|t| t.position)
}

/// Centroid of the whole roster, self included.
fn relay_waypoint(drones: &[Drone]) -> Option<Position> {
    Position::centroid(drones.iter().map(|d| &d.position))
}

/// Phase offset from the leading base-36 digits of an id; zero if none.
pub fn patrol_offset(id: &str) -> f64 {
    id.chars()
        .map_while(|c| c.to_digit(36))
        .fold(0.0, |acc, digit| acc * 36.0 + f64::from(digit))
}
