//! Request briefs sent to the advisor gateway.
//!
//! Each brief is an aggregate view of one simulation snapshot; no per-drone
//! positions leave the simulator.

use serde::{Deserialize, Serialize};
use swarm_domain::{DroneRole, DroneStatus, SimulationState, TargetKind};

/// Envelope POSTed to the gateway: `{"type": .., "data": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum AdvisorRequest {
    /// Threat assessment
    ThreatAnalysis(ThreatBrief),
    /// Free-text operator command
    NaturalCommand(CommandBrief),
    /// Swarm composition review
    SwarmOptimization(SwarmBrief),
}

impl AdvisorRequest {
    /// Wire name of the request type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ThreatAnalysis(_) => "threat-analysis",
            Self::NaturalCommand(_) => "natural-command",
            Self::SwarmOptimization(_) => "swarm-optimization",
        }
    }
}

/// One target as reported to the threat analyst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    /// Target classification
    #[serde(rename = "type")]
    pub kind: TargetKind,
    /// Whether any tracker holds it
    pub tracked: bool,
}

/// Threat-analysis input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatBrief {
    /// Drones in `active` status
    pub active_drones: usize,
    /// Drones in `jammed` status
    pub jammed_drones: usize,
    /// Every target, in state order
    pub targets: Vec<TargetSummary>,
    /// Drones assessing `high` or `critical` threat
    pub high_threat_drones: usize,
}

impl ThreatBrief {
    /// Summarize `state`.
    pub fn from_state(state: &SimulationState) -> Self {
        Self {
            active_drones: state.count_status(DroneStatus::Active),
            jammed_drones: state.count_status(DroneStatus::Jammed),
            targets: state
                .targets
                .iter()
                .map(|t| TargetSummary {
                    kind: t.kind,
                    tracked: t.tracked,
                })
                .collect(),
            high_threat_drones: state
                .drones
                .iter()
                .filter(|d| d.threat_level.is_severe())
                .count(),
        }
    }
}

/// Natural-command input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandBrief {
    /// Operator text, verbatim
    pub command: String,
}

impl CommandBrief {
    /// Wrap an operator command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// Drone counts per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    /// Scout drones
    pub scouts: usize,
    /// Relay drones
    pub relays: usize,
    /// Tracker drones
    pub trackers: usize,
    /// Interceptor drones
    pub interceptors: usize,
}

/// Drone counts per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// `active` drones
    pub active: usize,
    /// `jammed` drones
    pub jammed: usize,
    /// `offline` drones
    pub offline: usize,
}

/// Swarm-optimization input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwarmBrief {
    /// Roster size, the live drone included
    pub total_drones: usize,
    /// Composition
    pub by_role: RoleCounts,
    /// Health
    pub by_status: StatusCounts,
    /// Mean battery, unknown counted as zero
    pub avg_battery: f64,
    /// Drones with at least one mesh peer
    pub connected_drones: usize,
}

impl SwarmBrief {
    /// Summarize `state`.
    pub fn from_state(state: &SimulationState) -> Self {
        Self {
            total_drones: state.drones.len(),
            by_role: RoleCounts {
                scouts: state.count_role(DroneRole::Scout),
                relays: state.count_role(DroneRole::Relay),
                trackers: state.count_role(DroneRole::Tracker),
                interceptors: state.count_role(DroneRole::Interceptor),
            },
            by_status: StatusCounts {
                active: state.count_status(DroneStatus::Active),
                jammed: state.count_status(DroneStatus::Jammed),
                offline: state.count_status(DroneStatus::Offline),
            },
            avg_battery: state.average_battery(),
            connected_drones: state
                .drones
                .iter()
                .filter(|d| !d.connected_peers.is_empty())
                .count(),
        }
    }
}
