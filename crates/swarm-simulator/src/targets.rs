//! Target motion and tracker assignment.

use crate::config::SimConfig;
use swarm_domain::{Drone, DroneRole, MapBounds, Position, Target, Velocity};

/// Advance one target by its velocity, reflecting off the map edges.
#[must_use]
pub fn advance_target(target: &Target, bounds: &MapBounds) -> Target {
    let position = bounds.clamp(Position::new(
        target.position.x + target.velocity.vx,
        target.position.y + target.velocity.vy,
    ));

    let mut velocity: Velocity = target.velocity;
    if bounds.on_x_edge(position.x) {
        velocity.vx = -velocity.vx;
    }
    if bounds.on_y_edge(position.y) {
        velocity.vy = -velocity.vy;
    }

    Target {
        position,
        velocity,
        ..target.clone()
    }
}

pub fn advance_targets(targets: &[Target], bounds: &MapBounds) -> Vec<Target> {
    targets.iter().map(|t| advance_target(t, bounds)).collect()
}

/// Mark each target as tracked by the linkable trackers within threat range.
pub fn assign_trackers(targets: &mut [Target], drones: &[Drone], config: &SimConfig) {
    for target in targets.iter_mut() {
        target.tracked_by = drones
            .iter()
            .filter(|d| d.role == DroneRole::Tracker && d.status.can_link())
            .filter(|d| d.position.distance_to(&target.position) < config.threat_range)
            .map(|d| d.id.clone())
            .collect();
        target.tracked = !target.tracked_by.is_empty();
    }
}
