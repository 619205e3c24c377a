//! Simulation driver.
//!
//! [`SwarmSimulation`] owns the world state and is the only thing that
//! mutates it: through [`SwarmSimulation::tick`] or the explicit control
//! calls. Each tick rebuilds the next state from the previous one rather than
//! patching it in place.

use crate::behavior::{self, Surroundings};
use crate::clock::{SimClock, SystemClock};
use crate::config::SimConfig;
use crate::decisions::{DecisionLog, Transition};
use crate::live::{KeyboardInput, LiveLink, RelayMessage};
use crate::mesh;
use crate::scenario;
use crate::targets;
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use swarm_domain::{
    Decision, DomainError, Drone, DroneStatus, MissionStatus, SimulationMetrics, SimulationState,
};
use tracing::{debug, info};

/// Device-feed status as seen by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatus {
    pub device_connected: bool,
    pub last_update: Option<DateTime<Utc>>,
}

/// Everything a host needs to render one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSnapshot {
    pub tick: u64,
    pub state: SimulationState,
    pub metrics: SimulationMetrics,
    pub decisions: Vec<Decision>,
    pub live: LiveStatus,
}

/// Swarm simulation driver.
pub struct SwarmSimulation {
    config: SimConfig,
    state: SimulationState,
    live: LiveLink,
    decisions: DecisionLog,
    clock: Arc<dyn SimClock>,
    rng: StdRng,
    last_frame: Option<Instant>,
    ticks: u64,
}

impl SwarmSimulation {
    /// New run on the system clock, seeded from OS entropy.
    pub fn new(config: SimConfig) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), StdRng::from_entropy())
    }

    /// Reproducible run: same seed and clock readings give the same states.
    pub fn seeded(config: SimConfig, seed: u64, clock: Arc<dyn SimClock>) -> Self {
        Self::with_parts(config, clock, StdRng::seed_from_u64(seed))
    }

    fn with_parts(config: SimConfig, clock: Arc<dyn SimClock>, mut rng: StdRng) -> Self {
        let state = scenario::initial_state(&config, &mut rng);
        let decisions = DecisionLog::new(config.decision_log_capacity);
        Self {
            config,
            state,
            live: LiveLink::default(),
            decisions,
            clock,
            rng,
            last_frame: None,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Host-side edits between ticks (scenario setup, tests).
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.simulation_running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn decisions(&self) -> &DecisionLog {
        &self.decisions
    }

    // -------------------------------------------------------------------------
    // Control surface
    // -------------------------------------------------------------------------

    /// Start or pause. Resuming never replays the paused interval.
    pub fn toggle_simulation(&mut self) {
        self.state.simulation_running = !self.state.simulation_running;
        self.last_frame = None;
        info!(running = self.state.simulation_running, "simulation toggled");
    }

    pub fn toggle_gps(&mut self) {
        self.state.gps_enabled = !self.state.gps_enabled;
        info!(gps_enabled = self.state.gps_enabled, "GPS toggled");
    }

    /// Flip the global jamming flag and force every zone to match it.
    pub fn toggle_jamming(&mut self) {
        let active = !self.state.jamming_active;
        self.state.jamming_active = active;
        for zone in &mut self.state.jamming_zones {
            zone.active = active;
        }
        info!(jamming_active = active, "jamming toggled");
    }

    /// Fresh `planning` world with new positions and ids.
    pub fn reset(&mut self) {
        self.state = scenario::initial_state(&self.config, &mut self.rng);
        self.decisions.clear();
        self.last_frame = None;
        self.ticks = 0;
        info!("simulation reset");
    }

    pub fn set_keyboard(&mut self, keys: KeyboardInput) {
        self.live.set_keyboard(keys);
    }

    pub fn set_device_connected(&mut self, connected: bool) {
        let now = self.clock.now();
        self.live.set_device_connected(connected, now);
        info!(connected, "live device link changed");
    }

    /// Merge one relay frame into the world.
    pub fn apply_relay_message(&mut self, message: &RelayMessage) -> Result<(), DomainError> {
        match message {
            RelayMessage::ConnectionStatus { device_connected } => {
                self.set_device_connected(*device_connected);
                Ok(())
            }
            RelayMessage::DroneUpdate(update) => {
                let now = self.clock.now();
                self.live
                    .apply_update(&mut self.state, update, &self.config.bounds, now)
            }
        }
    }

    pub fn live_status(&self) -> LiveStatus {
        LiveStatus {
            device_connected: self.live_connected(),
            last_update: self.live.last_update(),
        }
    }

    fn live_connected(&self) -> bool {
        self.live
            .is_connected(self.clock.now(), self.config.live_timeout)
    }

    // -------------------------------------------------------------------------
    // Stepping
    // -------------------------------------------------------------------------

    /// Frame throttle: run a tick only once the frame interval has passed
    /// since the last executed one. The first call after start, resume or
    /// reset only primes the frame clock. Returns true if a tick ran.
    pub fn advance(&mut self, now: Instant) -> bool {
        if !self.state.simulation_running {
            return false;
        }

        let Some(last) = self.last_frame else {
            self.last_frame = Some(now);
            return false;
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.config.frame_interval {
            return false;
        }

        self.last_frame = Some(now);
        self.tick(elapsed.as_secs_f64())
    }

    /// One state transition. Motion is a fixed unit step per tick;
    /// `delta_secs` only feeds elapsed time. No-op while paused.
    pub fn tick(&mut self, delta_secs: f64) -> bool {
        if !self.state.simulation_running {
            return false;
        }

        let now = self.clock.now();
        let prev = &self.state;

        let surroundings = Surroundings {
            drones: &prev.drones,
            jamming_zones: &prev.jamming_zones,
            targets: &prev.targets,
            gps_enabled: prev.gps_enabled,
            now_ms: self.clock.now_ms(),
            live_connected: self.live_connected(),
            keyboard: self.live.keyboard(),
        };

        let mut drones: Vec<Drone> = prev
            .drones
            .iter()
            .map(|d| behavior::update_drone(d, &surroundings, &self.config))
            .collect();

        let mut next_targets = targets::advance_targets(&prev.targets, &self.config.bounds);
        targets::assign_trackers(&mut next_targets, &drones, &self.config);

        let mesh_links = mesh::compute_links(&drones, &self.config);
        mesh::assign_peers(&mut drones, &mesh_links);

        let logged = self.decisions.observe(
            &Transition {
                drones_before: &prev.drones,
                drones_after: &drones,
                targets_before: &prev.targets,
                targets_after: &next_targets,
                at: now,
            },
            self.config.role_chatter_chance,
            &mut self.rng,
        );

        let next = SimulationState {
            drones,
            targets: next_targets,
            mesh_links,
            time_elapsed: prev.time_elapsed + delta_secs.max(0.0),
            mission_status: MissionStatus::Active,
            ..prev.clone()
        };
        self.state = next;
        self.ticks += 1;

        debug!(
            tick = self.ticks,
            links = self.state.mesh_links.len(),
            decisions = logged,
            "tick complete"
        );
        true
    }

    // -------------------------------------------------------------------------
    // Read side
    // -------------------------------------------------------------------------

    /// Derived health figures for the current state.
    pub fn metrics(&self) -> SimulationMetrics {
        compute_metrics(&self.state, &self.config)
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            tick: self.ticks,
            state: self.state.clone(),
            metrics: self.metrics(),
            decisions: self.decisions.recent(self.config.decision_log_capacity),
            live: self.live_status(),
        }
    }
}

/// Metrics for any state.
///
/// Unknown battery counts as zero in the average, which understates it while
/// the live drone's battery is unreported.
pub fn compute_metrics(state: &SimulationState, config: &SimConfig) -> SimulationMetrics {
    let total = state.drones.len();
    let active_drones = state.count_status(DroneStatus::Active);
    let jammed_drones = state.count_status(DroneStatus::Jammed);

    let possible_links = total * total.saturating_sub(1) / 2;
    let mesh_connectivity = if possible_links > 0 {
        state.active_link_count() as f64 / possible_links as f64 * 100.0
    } else {
        0.0
    };

    let network_resilience = if active_drones > 0 {
        (active_drones as f64 + jammed_drones as f64 * 0.5) / total as f64 * 100.0
    } else {
        0.0
    };

    SimulationMetrics {
        active_drones,
        jammed_drones,
        mesh_connectivity,
        mission_progress: (state.time_elapsed * config.mission_progress_rate).min(100.0),
        threat_count: state.targets.iter().filter(|t| t.is_hostile()).count(),
        avg_battery: state.average_battery(),
        network_resilience,
    }
}
