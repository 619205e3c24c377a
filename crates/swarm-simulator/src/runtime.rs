//! # Simulation Runtime
//!
//! Drives a [`SwarmSimulation`] from a tokio task. Hosts talk to it through a
//! cloneable [`SimulationHandle`]: commands go in over an mpsc channel and
//! every state change is published as a [`SimulationSnapshot`] on a watch
//! channel. No frame timer is polled while the simulation is paused.

use crate::engine::{SimulationSnapshot, SwarmSimulation};
use crate::live::{KeyboardInput, RelayMessage};
use swarm_domain::SimulationMetrics;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

/// Command channel capacity
const COMMAND_CAPACITY: usize = 256;

/// Control messages accepted by the runtime task.
#[derive(Debug)]
pub enum SimCommand {
    ToggleSimulation,
    ToggleGps,
    ToggleJamming,
    Reset,
    Relay(RelayMessage),
    /// Relay transport dropped
    DeviceDisconnected,
    Keyboard(KeyboardInput),
    Metrics(oneshot::Sender<SimulationMetrics>),
    Shutdown,
}

/// The runtime task has exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("simulation runtime is no longer running")]
pub struct RuntimeClosed;

/// Cloneable control handle for a running simulation.
#[derive(Debug, Clone)]
pub struct SimulationHandle {
    commands: mpsc::Sender<SimCommand>,
    snapshots: watch::Receiver<SimulationSnapshot>,
}

impl SimulationHandle {
    pub async fn send(&self, command: SimCommand) -> Result<(), RuntimeClosed> {
        self.commands.send(command).await.map_err(|_| RuntimeClosed)
    }

    pub async fn toggle_simulation(&self) -> Result<(), RuntimeClosed> {
        self.send(SimCommand::ToggleSimulation).await
    }

    pub async fn toggle_gps(&self) -> Result<(), RuntimeClosed> {
        self.send(SimCommand::ToggleGps).await
    }

    pub async fn toggle_jamming(&self) -> Result<(), RuntimeClosed> {
        self.send(SimCommand::ToggleJamming).await
    }

    pub async fn reset(&self) -> Result<(), RuntimeClosed> {
        self.send(SimCommand::Reset).await
    }

    pub async fn relay(&self, message: RelayMessage) -> Result<(), RuntimeClosed> {
        self.send(SimCommand::Relay(message)).await
    }

    pub async fn keyboard(&self, keys: KeyboardInput) -> Result<(), RuntimeClosed> {
        self.send(SimCommand::Keyboard(keys)).await
    }

    pub async fn metrics(&self) -> Result<SimulationMetrics, RuntimeClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(SimCommand::Metrics(tx)).await?;
        rx.await.map_err(|_| RuntimeClosed)
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeClosed> {
        self.send(SimCommand::Shutdown).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SimulationSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SimulationSnapshot> {
        self.snapshots.clone()
    }
}

/// Spawner for the runtime task.
pub struct SimulationRuntime;

impl SimulationRuntime {
    /// Move `sim` onto a tokio task. The join handle yields the simulation
    /// back after shutdown or once every handle is dropped.
    pub fn spawn(sim: SwarmSimulation) -> (SimulationHandle, JoinHandle<SwarmSimulation>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(sim.snapshot());

        let task = tokio::spawn(run(sim, command_rx, snapshot_tx));
        let handle = SimulationHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (handle, task)
    }
}

async fn run(
    mut sim: SwarmSimulation,
    mut commands: mpsc::Receiver<SimCommand>,
    snapshots: watch::Sender<SimulationSnapshot>,
) -> SwarmSimulation {
    let mut frames = time::interval(sim.config().frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        frame_ms = sim.config().frame_interval.as_millis() as u64,
        drones = sim.state().drones.len(),
        "simulation runtime started"
    );

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("all simulation handles dropped");
                    break;
                };
                let was_running = sim.is_running();
                if !apply(&mut sim, command) {
                    break;
                }
                if sim.is_running() && !was_running {
                    frames.reset();
                }
                snapshots.send_replace(sim.snapshot());
            }
            _ = frames.tick(), if sim.is_running() => {
                // a skipped deadline lags the real frame time
                if sim.advance(time::Instant::now().into_std()) {
                    snapshots.send_replace(sim.snapshot());
                }
            }
        }
    }

    info!(ticks = sim.ticks(), "simulation runtime stopped");
    sim
}

/// Returns false when the runtime should stop.
fn apply(sim: &mut SwarmSimulation, command: SimCommand) -> bool {
    match command {
        SimCommand::ToggleSimulation => sim.toggle_simulation(),
        SimCommand::ToggleGps => sim.toggle_gps(),
        SimCommand::ToggleJamming => sim.toggle_jamming(),
        SimCommand::Reset => sim.reset(),
        SimCommand::Relay(message) => {
            if let Err(e) = sim.apply_relay_message(&message) {
                debug!(error = %e, "dropping live update");
            }
        }
        SimCommand::DeviceDisconnected => sim.set_device_connected(false),
        SimCommand::Keyboard(keys) => sim.set_keyboard(keys),
        SimCommand::Metrics(reply) => {
            let _ = reply.send(sim.metrics());
        }
        SimCommand::Shutdown => return false,
    }
    true
}
