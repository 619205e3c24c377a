//! # Drone Swarm Simulation - Domain Model
//!
//! Entities, value objects, and enums for a drone swarm operating under GPS
//! denial and radio jamming. These types are shared by the simulation engine,
//! the advisor channel, and any renderer consuming snapshots.
//!
//! Serialized field names are camelCase so snapshots can be handed to a map
//! renderer unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of the single drone driven by an external device feed.
pub const LIVE_DRONE_ID: &str = "PROXY-DRONE-01";

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Point on the tactical map plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(&self, other: &Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Arithmetic mean of a set of points, `None` when empty.
    #[must_use]
    pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Position>) -> Option<Position> {
        let (sum_x, sum_y, count) = points
            .into_iter()
            .fold((0.0, 0.0, 0usize), |(sx, sy, n), p| (sx + p.x, sy + p.y, n + 1));

        (count > 0).then(|| Position::new(sum_x / count as f64, sum_y / count as f64))
    }
}

/// Per-tick displacement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { vx: 0.0, vy: 0.0 };

    pub const fn new(vx: f64, vy: f64) -> Self {
        Self { vx, vy }
    }

    pub fn is_moving(&self) -> bool {
        self.vx != 0.0 || self.vy != 0.0
    }

    /// Direction of travel in degrees, normalized to `[0, 360)`.
    #[must_use]
    pub fn heading_deg(&self) -> f64 {
        heading_between(self.vx, self.vy)
    }
}

/// Heading in degrees for a displacement, normalized to `[0, 360)`.
#[must_use]
pub fn heading_between(dx: f64, dy: f64) -> f64 {
    dy.atan2(dx).to_degrees().rem_euclid(360.0)
}

/// Playable map rectangle with an edge margin no entity may cross.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl MapBounds {
    pub fn min_x(&self) -> f64 {
        self.margin
    }

    pub fn max_x(&self) -> f64 {
        self.width - self.margin
    }

    pub fn min_y(&self) -> f64 {
        self.margin
    }

    pub fn max_y(&self) -> f64 {
        self.height - self.margin
    }

    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a point into `[margin, W - margin] x [margin, H - margin]`.
    #[must_use]
    pub fn clamp(&self, p: Position) -> Position {
        Position::new(
            p.x.clamp(self.min_x(), self.max_x()),
            p.y.clamp(self.min_y(), self.max_y()),
        )
    }

    /// True when `x` sits on (or beyond) the left or right boundary.
    pub fn on_x_edge(&self, x: f64) -> bool {
        x <= self.min_x() || x >= self.max_x()
    }

    /// True when `y` sits on (or beyond) the top or bottom boundary.
    pub fn on_y_edge(&self, y: f64) -> bool {
        y <= self.min_y() || y >= self.max_y()
    }
}

impl Default for MapBounds {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            margin: 20.0,
        }
    }
}

// =============================================================================
// ENUMS
// =============================================================================

/// Swarm role, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DroneRole {
    Scout,
    Relay,
    Tracker,
    Interceptor,
}

impl DroneRole {
    pub const ALL: [DroneRole; 4] = [Self::Scout, Self::Relay, Self::Tracker, Self::Interceptor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scout => "scout",
            Self::Relay => "relay",
            Self::Tracker => "tracker",
            Self::Interceptor => "interceptor",
        }
    }

    /// Plural group name used by the command vocabulary.
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Scout => "scouts",
            Self::Relay => "relays",
            Self::Tracker => "trackers",
            Self::Interceptor => "interceptors",
        }
    }
}

impl fmt::Display for DroneRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DroneRole {
    type Err = DomainError;

    /// Accepts singular or plural names, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|role| lowered == role.as_str() || lowered == role.plural())
            .ok_or_else(|| DomainError::UnknownRole(s.to_string()))
    }
}

/// Drone operational status, derived every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DroneStatus {
    #[default]
    Active,
    Jammed,
    Offline,
    Destroyed,
}

impl DroneStatus {
    /// Only active and jammed drones take part in the mesh.
    pub fn can_link(&self) -> bool {
        matches!(self, Self::Active | Self::Jammed)
    }
}

/// Proximity/count-based classification of nearby hostiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn is_severe(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

/// Target classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Hostile,
    Unknown,
    Friendly,
}

/// Mission status. `Complete` and `Failed` are reserved for mission-objective
/// logic and are never entered by the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    #[default]
    Planning,
    Active,
    Complete,
    Failed,
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// Swarm member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drone {
    pub id: String,
    pub position: Position,
    pub velocity: Velocity,
    /// Degrees, `[0, 360)`.
    pub heading: f64,
    pub role: DroneRole,
    pub status: DroneStatus,
    /// `None` means unknown (no battery telemetry), not empty.
    pub battery: Option<f64>,
    pub signal_strength: f64,
    pub gps_available: bool,
    pub in_jamming_zone: bool,
    pub threat_level: ThreatLevel,
    pub connected_peers: Vec<String>,
    /// Frozen the instant GPS is lost.
    pub last_known_position: Position,
    pub altitude: f64,
    pub is_live_device: bool,
    pub last_live_update: Option<DateTime<Utc>>,
}

impl Drone {
    /// A fresh simulated drone with nominal sensors.
    pub fn new(id: impl Into<String>, role: DroneRole, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            velocity: Velocity::ZERO,
            heading: 0.0,
            role,
            status: DroneStatus::Active,
            battery: Some(100.0),
            signal_strength: 1.0,
            gps_available: true,
            in_jamming_zone: false,
            threat_level: ThreatLevel::None,
            connected_peers: Vec::new(),
            last_known_position: position,
            altitude: 100.0,
            is_live_device: false,
            last_live_update: None,
        }
    }

    /// The externally driven drone, battery unknown until the device reports.
    pub fn live(position: Position) -> Self {
        Self {
            battery: None,
            is_live_device: true,
            ..Self::new(LIVE_DRONE_ID, DroneRole::Scout, position)
        }
    }

    /// Battery for aggregation; unknown counts as empty.
    pub fn battery_or_zero(&self) -> f64 {
        self.battery.unwrap_or(0.0)
    }

    /// Short log label, e.g. `SCOUT-K3F9`.
    pub fn display_name(&self) -> String {
        let prefix: String = self.id.chars().take(4).collect();
        format!(
            "{}-{}",
            self.role.as_str().to_ascii_uppercase(),
            prefix.to_ascii_uppercase()
        )
    }
}

/// Circular region denying GPS and degrading comms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JammingZone {
    pub id: String,
    pub center: Position,
    pub radius: f64,
    /// 0-1, informational.
    pub intensity: f64,
    pub active: bool,
}

impl JammingZone {
    /// Strictly inside the radius of an active zone.
    pub fn covers(&self, p: &Position) -> bool {
        self.active && p.distance_to(&self.center) < self.radius
    }
}

/// Tracked or hostile entity moving across the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub id: String,
    pub position: Position,
    pub velocity: Velocity,
    #[serde(rename = "type")]
    pub kind: TargetKind,
    pub tracked: bool,
    pub tracked_by: Vec<String>,
}

impl Target {
    pub fn is_hostile(&self) -> bool {
        self.kind == TargetKind::Hostile
    }
}

/// Derived, unordered connectivity between two drones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshLink {
    pub from: String,
    pub to: String,
    /// 0-1, distance derived.
    pub strength: f64,
    pub active: bool,
}

impl MeshLink {
    /// The other endpoint when `id` is one end of this link.
    pub fn peer_of(&self, id: &str) -> Option<&str> {
        if self.from == id {
            Some(&self.to)
        } else if self.to == id {
            Some(&self.from)
        } else {
            None
        }
    }

    /// Endpoint match in either order.
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

/// Aggregate world state, owned by the simulation driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub drones: Vec<Drone>,
    pub jamming_zones: Vec<JammingZone>,
    pub targets: Vec<Target>,
    pub mesh_links: Vec<MeshLink>,
    pub gps_enabled: bool,
    pub jamming_active: bool,
    pub simulation_running: bool,
    /// Seconds of wall time accumulated across executed ticks.
    pub time_elapsed: f64,
    pub mission_status: MissionStatus,
}

impl SimulationState {
    pub fn drone(&self, id: &str) -> Option<&Drone> {
        self.drones.iter().find(|d| d.id == id)
    }

    pub fn drone_mut(&mut self, id: &str) -> Option<&mut Drone> {
        self.drones.iter_mut().find(|d| d.id == id)
    }

    pub fn live_drone(&self) -> Option<&Drone> {
        self.drones.iter().find(|d| d.is_live_device)
    }

    pub fn count_status(&self, status: DroneStatus) -> usize {
        self.drones.iter().filter(|d| d.status == status).count()
    }

    pub fn count_role(&self, role: DroneRole) -> usize {
        self.drones.iter().filter(|d| d.role == role).count()
    }

    pub fn active_link_count(&self) -> usize {
        self.mesh_links.iter().filter(|l| l.active).count()
    }

    /// Mean battery with unknown readings counted as zero.
    pub fn average_battery(&self) -> f64 {
        if self.drones.is_empty() {
            return 0.0;
        }
        self.drones.iter().map(Drone::battery_or_zero).sum::<f64>() / self.drones.len() as f64
    }
}

/// Derived read-only snapshot of swarm health.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationMetrics {
    pub active_drones: usize,
    pub jammed_drones: usize,
    /// Active links over all possible pairs, percent.
    pub mesh_connectivity: f64,
    /// Percent, capped at 100.
    pub mission_progress: f64,
    pub threat_count: usize,
    pub avg_battery: f64,
    /// Active plus half-weighted jammed over total, percent.
    pub network_resilience: f64,
}

// =============================================================================
// DECISION LOG
// =============================================================================

/// Category of an autonomous decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Navigation,
    Threat,
    Communication,
    Role,
    Evasion,
    Tracking,
}

/// Urgency of a decision entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// One entry of the rolling decision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub id: String,
    pub drone_id: String,
    pub drone_name: String,
    pub kind: DecisionKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub priority: DecisionPriority,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Unknown drone role: {0}")]
    UnknownRole(String),

    #[error("Drone not found: {0}")]
    DroneNotFound(String),
}
