//! Initial world generation for a fresh run.

use crate::config::SimConfig;
use rand::Rng;
use swarm_domain::{
    Drone, DroneRole, JammingZone, MissionStatus, Position, SimulationState, Target, TargetKind,
    Velocity,
};
use uuid::Builder;

/// Nine-character lowercase base-36 id drawn from `rng`.
pub fn generate_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let uuid = Builder::from_random_bytes(rng.r#gen()).into_uuid();
    uuid.simple().to_string()[..9].to_string()
}

/// Fresh `planning` state: the live drone, simulated drones, two zones, two targets.
pub fn initial_state<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> SimulationState {
    SimulationState {
        drones: initial_drones(config, rng),
        jamming_zones: initial_jamming_zones(rng),
        targets: initial_targets(rng),
        mesh_links: Vec::new(),
        gps_enabled: true,
        jamming_active: true,
        simulation_running: false,
        time_elapsed: 0.0,
        mission_status: MissionStatus::Planning,
    }
}

/// Live drone at map center, then simulated drones clustered west of center.
pub fn initial_drones<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Vec<Drone> {
    let mut drones = Vec::with_capacity(config.drone_count);
    drones.push(Drone::live(config.bounds.center()));

    for i in 1..config.drone_count {
        let role = DroneRole::ALL[i % DroneRole::ALL.len()];
        let position = Position::new(rng.gen_range(100.0..300.0), rng.gen_range(200.0..400.0));

        let mut drone = Drone::new(generate_id(rng), role, position);
        drone.battery = Some(rng.gen_range(85.0..100.0));
        drone.signal_strength = rng.gen_range(0.9..1.0);
        drone.heading = rng.gen_range(0.0..360.0);
        drone.altitude = rng.gen_range(100.0..150.0);
        drones.push(drone);
    }

    drones
}

pub fn initial_jamming_zones<R: Rng + ?Sized>(rng: &mut R) -> Vec<JammingZone> {
    vec![
        JammingZone {
            id: generate_id(rng),
            center: Position::new(550.0, 300.0),
            radius: 120.0,
            intensity: 0.8,
            active: true,
        },
        JammingZone {
            id: generate_id(rng),
            center: Position::new(400.0, 450.0),
            radius: 80.0,
            intensity: 0.6,
            active: true,
        },
    ]
}

pub fn initial_targets<R: Rng + ?Sized>(rng: &mut R) -> Vec<Target> {
    vec![
        Target {
            id: generate_id(rng),
            position: Position::new(650.0, 200.0),
            velocity: Velocity::new(-0.5, 0.3),
            kind: TargetKind::Hostile,
            tracked: false,
            tracked_by: Vec::new(),
        },
        Target {
            id: generate_id(rng),
            position: Position::new(700.0, 400.0),
            velocity: Velocity::new(-0.3, -0.2),
            kind: TargetKind::Unknown,
            tracked: false,
            tracked_by: Vec::new(),
        },
    ]
}
