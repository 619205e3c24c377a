//! # Swarm Simulator
//!
//! Fixed-timestep simulation of an autonomous drone swarm operating under GPS
//! denial and radio jamming.
//!
//! ## Features
//!
//! - Role-driven drone behavior (scout, relay, tracker, interceptor)
//! - Distance-based mesh topology with jamming degradation
//! - Bouncing target motion and tracker assignment
//! - Live-device override for one drone, with keyboard fallback
//! - Decision log inferred from state transitions
//! - Async runtime with command and snapshot channels

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod behavior;
pub mod clock;
pub mod config;
pub mod decisions;
pub mod engine;
pub mod feed;
pub mod live;
pub mod mesh;
pub mod runtime;
pub mod scenario;
pub mod targets;

pub use clock::{ManualClock, SimClock, SystemClock};
pub use config::{RuntimeConfig, SimConfig};
pub use decisions::DecisionLog;
pub use engine::{LiveStatus, SimulationSnapshot, SwarmSimulation, compute_metrics};
pub use feed::{LiveFeed, LiveFeedError};
pub use live::{KeyboardInput, LiveDroneUpdate, LiveLink, RelayMessage};
pub use runtime::{RuntimeClosed, SimCommand, SimulationHandle, SimulationRuntime};
