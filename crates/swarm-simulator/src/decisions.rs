//! Rolling log of autonomous decisions.
//!
//! Entries are inferred by diffing consecutive tick states: a drone crossing
//! into a jamming zone, losing GPS, gaining a peer, and so on. Newest first,
//! capped, in memory only.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use swarm_domain::{
    Decision, DecisionKind, DecisionPriority, Drone, DroneRole, DroneStatus, Target, ThreatLevel,
};

/// Capped, newest-first decision history.
#[derive(Debug, Clone)]
pub struct DecisionLog {
    entries: VecDeque<Decision>,
    capacity: usize,
    sequence: u64,
}

/// Inputs for one tick's worth of decision inference.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a> {
    pub drones_before: &'a [Drone],
    pub drones_after: &'a [Drone],
    pub targets_before: &'a [Target],
    pub targets_after: &'a [Target],
    pub at: DateTime<Utc>,
}

impl DecisionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            sequence: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Newest first.
    pub fn entries(&self) -> impl Iterator<Item = &Decision> {
        self.entries.iter()
    }

    pub fn recent(&self, count: usize) -> Vec<Decision> {
        self.entries.iter().take(count).cloned().collect()
    }

    /// Infer and record decisions for one tick. Returns how many were added.
    pub fn observe<R: Rng + ?Sized>(
        &mut self,
        transition: &Transition<'_>,
        chatter_chance: f64,
        rng: &mut R,
    ) -> usize {
        let mut batch = Vec::new();

        for after in transition.drones_after {
            let Some(before) = transition.drones_before.iter().find(|d| d.id == after.id) else {
                continue;
            };
            self.state_changes(before, after, transition.at, &mut batch);

            if after.status == DroneStatus::Active && rng.gen_bool(chatter_chance.clamp(0.0, 1.0)) {
                if let Some(message) = role_phrases(after.role).choose(rng) {
                    batch.push(self.entry(
                        after,
                        "role",
                        DecisionKind::Role,
                        (*message).to_string(),
                        DecisionPriority::Low,
                        transition.at,
                    ));
                }
            }
        }

        self.tracking_changes(transition, &mut batch);

        let added = batch.len();
        for decision in batch.into_iter().rev() {
            self.entries.push_front(decision);
        }
        self.entries.truncate(self.capacity);
        added
    }

    fn state_changes(&mut self, before: &Drone, after: &Drone, at: DateTime<Utc>, out: &mut Vec<Decision>) {
        if after.in_jamming_zone && !before.in_jamming_zone {
            out.push(self.entry(
                after,
                "jam",
                DecisionKind::Evasion,
                "Jamming detected → Initiating evasive maneuvers".into(),
                DecisionPriority::High,
                at,
            ));
        }
        if !after.in_jamming_zone && before.in_jamming_zone {
            out.push(self.entry(
                after,
                "clear",
                DecisionKind::Navigation,
                "Jamming zone cleared → Resuming normal operations".into(),
                DecisionPriority::Medium,
                at,
            ));
        }

        if after.gps_available != before.gps_available {
            let (message, priority) = if after.gps_available {
                ("GPS acquired → Updating position lock", DecisionPriority::Low)
            } else {
                ("GPS denied → Switching to inertial navigation", DecisionPriority::High)
            };
            out.push(self.entry(after, "gps", DecisionKind::Navigation, message.into(), priority, at));
        }

        if after.threat_level != before.threat_level && after.threat_level != ThreatLevel::None {
            let priority = if after.threat_level.is_severe() {
                DecisionPriority::Critical
            } else {
                DecisionPriority::Medium
            };
            out.push(self.entry(
                after,
                "threat",
                DecisionKind::Threat,
                format!(
                    "Threat level: {} → Adjusting posture",
                    after.threat_level.as_str().to_ascii_uppercase()
                ),
                priority,
                at,
            ));
        }

        let (peers_before, peers_after) = (before.connected_peers.len(), after.connected_peers.len());
        if peers_after > peers_before {
            out.push(self.entry(
                after,
                "mesh-up",
                DecisionKind::Communication,
                format!("New peer connected → Mesh expanded to {peers_after} nodes"),
                DecisionPriority::Low,
                at,
            ));
        } else if peers_after < peers_before {
            out.push(self.entry(
                after,
                "mesh-down",
                DecisionKind::Communication,
                format!("Peer lost → Rerouting through {peers_after} remaining nodes"),
                DecisionPriority::Medium,
                at,
            ));
        }
    }

    fn tracking_changes(&mut self, transition: &Transition<'_>, out: &mut Vec<Decision>) {
        for target in transition.targets_after {
            let previous: &[String] = transition
                .targets_before
                .iter()
                .find(|t| t.id == target.id)
                .map(|t| t.tracked_by.as_slice())
                .unwrap_or_default();

            for tracker_id in target.tracked_by.iter().filter(|id| !previous.contains(*id)) {
                if let Some(tracker) = transition.drones_after.iter().find(|d| &d.id == tracker_id) {
                    out.push(self.entry(
                        tracker,
                        "track",
                        DecisionKind::Tracking,
                        format!("Contact {} acquired → Tracking", short_id(&target.id)),
                        DecisionPriority::Medium,
                        transition.at,
                    ));
                }
            }

            for tracker_id in previous.iter().filter(|id| !target.tracked_by.contains(*id)) {
                if let Some(tracker) = transition.drones_after.iter().find(|d| &d.id == tracker_id) {
                    out.push(self.entry(
                        tracker,
                        "untrack",
                        DecisionKind::Tracking,
                        format!("Contact {} lost → Reacquiring", short_id(&target.id)),
                        DecisionPriority::Medium,
                        transition.at,
                    ));
                }
            }
        }
    }

    fn entry(
        &mut self,
        drone: &Drone,
        tag: &str,
        kind: DecisionKind,
        message: String,
        priority: DecisionPriority,
        at: DateTime<Utc>,
    ) -> Decision {
        self.sequence += 1;
        Decision {
            id: format!("{}-{}-{}", drone.id, tag, self.sequence),
            drone_id: drone.id.clone(),
            drone_name: drone.display_name(),
            kind,
            message,
            timestamp: at,
            priority,
        }
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(4).collect::<String>().to_ascii_uppercase()
}

fn role_phrases(role: DroneRole) -> &'static [&'static str] {
    match role {
        DroneRole::Scout => &[
            "Scanning sector → No new contacts",
            "Adjusting patrol pattern → Optimizing coverage",
            "Terrain analysis → Updating navigation mesh",
        ],
        DroneRole::Relay => &[
            "Signal strength optimal → Maintaining position",
            "Rebalancing mesh → Centering between nodes",
            "Bandwidth allocation → Prioritizing tactical data",
        ],
        DroneRole::Tracker => &[
            "Target bearing updated → Adjusting intercept vector",
            "Predictive tracking → Calculating target trajectory",
            "Lock maintained → Target designated",
        ],
        DroneRole::Interceptor => &[
            "Combat ready → Awaiting engagement orders",
            "Threat assessment → Calculating approach vector",
            "Weapons check → Systems nominal",
        ],
    }
}
