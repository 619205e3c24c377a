//! # Swarm Advisor
//!
//! Client for the tactical assistant gateway. Builds request briefs from a
//! simulation snapshot and parses the free-text replies into typed advice.
//! Nothing here mutates simulation state.
//!
//! ## Features
//!
//! - Threat assessment from aggregate swarm and target counts
//! - Natural-language command interpretation against a fixed vocabulary
//! - Swarm optimization suggestions

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod briefs;
pub mod client;
pub mod error;
pub mod reports;

pub use briefs::{AdvisorRequest, CommandBrief, SwarmBrief, ThreatBrief};
pub use client::AdvisorClient;
pub use error::{AdvisorError, Result};
pub use reports::{CommandResult, CommandTarget, OptimizationSuggestion, SwarmAction, ThreatAnalysis};
