//! Engine tuning and process configuration.

use std::env;
use std::time::Duration;
use swarm_domain::MapBounds;

/// Tuning constants for one simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Map rectangle and edge margin
    pub bounds: MapBounds,
    /// Drones per run, the live drone included
    pub drone_count: usize,

    /// Maximum link distance
    pub mesh_range: f64,
    /// Strength multiplier when both endpoints are jammed
    pub jammed_link_penalty: f64,
    /// Degraded strength a both-jammed link must exceed to stay up
    pub jammed_link_threshold: f64,

    /// Radius within which hostiles count as threats
    pub threat_range: f64,
    /// Distance at which a drone considers its waypoint reached
    pub arrival_radius: f64,
    pub cruise_speed: f64,
    pub intercept_speed: f64,
    pub keyboard_speed: f64,
    /// How far ahead a jammed scout aims when escaping
    pub escape_distance: f64,
    pub patrol_radius_x: f64,
    pub patrol_radius_y: f64,
    /// Milliseconds per radian of patrol phase
    pub patrol_period_ms: f64,

    pub battery_drain: f64,
    pub signal_decay: f64,
    pub signal_floor: f64,
    pub signal_recovery: f64,

    /// Minimum wall time between executed ticks
    pub frame_interval: Duration,
    /// Live updates older than this mean the device is gone
    pub live_timeout: Duration,
    /// Mission progress percent per elapsed second
    pub mission_progress_rate: f64,

    pub decision_log_capacity: usize,
    /// Per-tick chance an active drone logs a role status line
    pub role_chatter_chance: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bounds: MapBounds::default(),
            drone_count: 8,
            mesh_range: 150.0,
            jammed_link_penalty: 0.3,
            jammed_link_threshold: 0.5,
            threat_range: 200.0,
            arrival_radius: 5.0,
            cruise_speed: 1.0,
            intercept_speed: 2.0,
            keyboard_speed: 3.0,
            escape_distance: 50.0,
            patrol_radius_x: 200.0,
            patrol_radius_y: 150.0,
            patrol_period_ms: 5000.0,
            battery_drain: 0.001,
            signal_decay: 0.01,
            signal_floor: 0.1,
            signal_recovery: 0.005,
            frame_interval: Duration::from_millis(16),
            live_timeout: Duration::from_secs(5),
            mission_progress_rate: 2.0,
            decision_log_capacity: 50,
            role_chatter_chance: 0.01,
        }
    }
}

/// Process-level settings read from the environment.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Logging level used when `RUST_LOG` is unset
    pub log_level: String,

    /// Live-device relay WebSocket URL (`ws://host:port`), feed disabled when unset
    pub live_feed_url: Option<String>,

    /// Delay between relay reconnect attempts
    pub live_reconnect: Duration,

    /// Advisor gateway endpoint, advisor disabled when unset
    pub advisor_url: Option<String>,

    /// Bearer token for the advisor gateway
    pub advisor_api_key: Option<String>,
}

impl RuntimeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            live_feed_url: env::var("LIVE_FEED_URL").ok().filter(|v| !v.is_empty()),

            live_reconnect: env::var("LIVE_RECONNECT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_secs(2)),

            advisor_url: env::var("ADVISOR_URL").ok().filter(|v| !v.is_empty()),

            advisor_api_key: env::var("ADVISOR_API_KEY").ok(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
