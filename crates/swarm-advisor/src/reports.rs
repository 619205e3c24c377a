//! Typed advice parsed from gateway replies.
//!
//! Replies are model-generated text. The parsers accept surrounding prose and
//! decorations but reject anything outside the command vocabulary.

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use swarm_domain::{Drone, DroneRole, SimulationState};

/// Number of suggestions an optimization reply must carry.
pub const SUGGESTION_COUNT: usize = 3;

// =============================================================================
// THREAT ANALYSIS
// =============================================================================

/// Parsed threat assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatAnalysis {
    /// Uppercase level as reported, `UNKNOWN` when absent
    pub threat_level: String,
    /// Short situation summary
    pub assessment: String,
    /// Suggested next step
    pub recommended_action: String,
}

/// Read `THREAT LEVEL:`, `ASSESSMENT:` and `RECOMMENDED ACTION:` lines.
pub fn parse_threat_analysis(reply: &str) -> ThreatAnalysis {
    let mut analysis = ThreatAnalysis {
        threat_level: "UNKNOWN".to_string(),
        assessment: String::new(),
        recommended_action: String::new(),
    };

    for line in reply.lines().filter(|l| !l.trim().is_empty()) {
        if line.contains("THREAT LEVEL:") {
            let level = line.split(':').nth(1).map(str::trim).unwrap_or_default();
            if !level.is_empty() {
                analysis.threat_level = level.to_ascii_uppercase();
            }
        } else if line.contains("ASSESSMENT:") {
            analysis.assessment = after_label(line);
        } else if line.contains("RECOMMENDED ACTION:") {
            analysis.recommended_action = after_label(line);
        }
    }
    analysis
}

fn after_label(line: &str) -> String {
    line.split_once(':')
        .map(|(_, rest)| rest.trim().to_string())
        .unwrap_or_default()
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Swarm-level action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwarmAction {
    /// Launch toward the operating area
    Deploy,
    /// Return to base
    Recall,
    /// Hold a patrol pattern
    Patrol,
    /// Engage hostiles
    Intercept,
    /// Break contact and avoid threats
    Evade,
    /// Spread out around an area
    FormPerimeter,
    /// Converge on a point
    Concentrate,
}

impl SwarmAction {
    /// Every accepted action.
    pub const ALL: [SwarmAction; 7] = [
        Self::Deploy,
        Self::Recall,
        Self::Patrol,
        Self::Intercept,
        Self::Evade,
        Self::FormPerimeter,
        Self::Concentrate,
    ];

    /// Vocabulary spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deploy => "DEPLOY",
            Self::Recall => "RECALL",
            Self::Patrol => "PATROL",
            Self::Intercept => "INTERCEPT",
            Self::Evade => "EVADE",
            Self::FormPerimeter => "FORM_PERIMETER",
            Self::Concentrate => "CONCENTRATE",
        }
    }
}

impl fmt::Display for SwarmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwarmAction {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| AdvisorError::InvalidCommand(format!("unknown action {s:?}")))
    }
}

/// Who a command addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandTarget {
    /// The whole swarm
    All,
    /// Every drone of one role
    Role(DroneRole),
    /// One drone by id
    Drone(String),
}

impl CommandTarget {
    /// Resolve a target word: `all`, a role group, or an id present in
    /// `roster`.
    pub fn parse(raw: &str, roster: &[Drone]) -> Result<Self> {
        let word = raw.trim();
        if word.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if let Ok(role) = word.parse::<DroneRole>() {
            return Ok(Self::Role(role));
        }
        roster
            .iter()
            .find(|d| d.id == word || d.id.eq_ignore_ascii_case(word))
            .map(|d| Self::Drone(d.id.clone()))
            .ok_or_else(|| AdvisorError::InvalidCommand(format!("unknown target {raw:?}")))
    }

    /// Drones in `state` this target addresses.
    pub fn select<'a>(&self, state: &'a SimulationState) -> Vec<&'a Drone> {
        state
            .drones
            .iter()
            .filter(|d| match self {
                Self::All => true,
                Self::Role(role) => d.role == *role,
                Self::Drone(id) => &d.id == id,
            })
            .collect()
    }
}

impl fmt::Display for CommandTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Role(role) => f.write_str(role.plural()),
            Self::Drone(id) => f.write_str(id),
        }
    }
}

/// Structured interpretation of an operator command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// What to do
    pub action: SwarmAction,
    /// Who does it
    pub target: CommandTarget,
    /// Free-form extras from the interpreter
    pub parameters: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawCommand {
    action: String,
    target: String,
    #[serde(default)]
    parameters: Map<String, Value>,
}

/// Extract the JSON object from a command reply and validate it against the
/// vocabulary and `roster`.
pub fn parse_command(reply: &str, roster: &[Drone]) -> Result<CommandResult> {
    let object = extract_span(reply, '{', '}')
        .ok_or_else(|| AdvisorError::MalformedReply("no JSON object in command reply".into()))?;
    let raw: RawCommand = serde_json::from_str(object)?;

    Ok(CommandResult {
        action: raw.action.parse()?,
        target: CommandTarget::parse(&raw.target, roster)?,
        parameters: raw.parameters,
    })
}

// =============================================================================
// OPTIMIZATION
// =============================================================================

/// One prioritized improvement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    /// `HIGH`, `MEDIUM` or `LOW` as reported
    pub priority: String,
    /// What to change
    pub suggestion: String,
    /// Expected effect
    pub impact: String,
}

/// Extract the JSON array from an optimization reply. Extra suggestions are
/// dropped; fewer than three is an error.
pub fn parse_optimizations(reply: &str) -> Result<Vec<OptimizationSuggestion>> {
    let array = extract_span(reply, '[', ']')
        .ok_or_else(|| AdvisorError::MalformedReply("no JSON array in optimization reply".into()))?;
    let mut suggestions: Vec<OptimizationSuggestion> = serde_json::from_str(array)?;

    if suggestions.len() < SUGGESTION_COUNT {
        return Err(AdvisorError::MalformedReply(format!(
            "expected {SUGGESTION_COUNT} suggestions, got {}",
            suggestions.len()
        )));
    }
    suggestions.truncate(SUGGESTION_COUNT);
    for s in &mut suggestions {
        s.priority = s.priority.trim().to_ascii_uppercase();
    }
    Ok(suggestions)
}

/// Outermost `open`..`close` span: first opener to last closer.
fn extract_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_domain::Position;

    fn roster() -> Vec<Drone> {
        vec![
            Drone::live(Position::new(400.0, 300.0)),
            Drone::new("k3f9a0b1c", DroneRole::Tracker, Position::new(100.0, 100.0)),
        ]
    }

    #[test]
    fn test_threat_analysis_lines() {
        let reply = "- THREAT LEVEL: high\n\n- ASSESSMENT: Hostile closing from the east: 2 drones jammed.\n- RECOMMENDED ACTION: Reposition relays.";
        let analysis = parse_threat_analysis(reply);
        assert_eq!(analysis.threat_level, "HIGH");
        assert_eq!(
            analysis.assessment,
            "Hostile closing from the east: 2 drones jammed."
        );
        assert_eq!(analysis.recommended_action, "Reposition relays.");
    }

    #[test]
    fn test_threat_analysis_defaults() {
        let analysis = parse_threat_analysis("All quiet.");
        assert_eq!(analysis.threat_level, "UNKNOWN");
        assert!(analysis.assessment.is_empty());
        assert!(analysis.recommended_action.is_empty());

        assert_eq!(parse_threat_analysis("THREAT LEVEL:").threat_level, "UNKNOWN");
    }

    #[test]
    fn test_command_with_prose() {
        let reply = "Sure. ```json\n{\"action\": \"FORM_PERIMETER\", \"target\": \"Trackers\", \"parameters\": {\"radius\": 120}}\n```";
        let command = parse_command(reply, &roster()).unwrap();
        assert_eq!(command.action, SwarmAction::FormPerimeter);
        assert_eq!(command.target, CommandTarget::Role(DroneRole::Tracker));
        assert_eq!(command.parameters["radius"], 120);
    }

    #[test]
    fn test_command_targets() {
        let roster = roster();
        assert_eq!(CommandTarget::parse("ALL", &roster).unwrap(), CommandTarget::All);
        assert_eq!(
            CommandTarget::parse("proxy-drone-01", &roster).unwrap(),
            CommandTarget::Drone("PROXY-DRONE-01".into())
        );
        assert!(CommandTarget::parse("bombers", &roster).is_err());
    }

    #[test]
    fn test_command_rejects_unknown_action() {
        let reply = r#"{"action": "SELF_DESTRUCT", "target": "all"}"#;
        assert!(matches!(
            parse_command(reply, &roster()),
            Err(AdvisorError::InvalidCommand(_))
        ));
        assert!(matches!(
            parse_command("no idea", &roster()),
            Err(AdvisorError::MalformedReply(_))
        ));
    }

    #[test]
    fn test_target_selection() {
        let state = SimulationState {
            drones: roster(),
            jamming_zones: Vec::new(),
            targets: Vec::new(),
            mesh_links: Vec::new(),
            gps_enabled: true,
            jamming_active: true,
            simulation_running: false,
            time_elapsed: 0.0,
            mission_status: swarm_domain::MissionStatus::Planning,
        };
        assert_eq!(CommandTarget::All.select(&state).len(), 2);
        assert_eq!(CommandTarget::Role(DroneRole::Scout).select(&state).len(), 1);
        assert_eq!(
            CommandTarget::Drone("k3f9a0b1c".into()).select(&state)[0].role,
            DroneRole::Tracker
        );
        assert_eq!(CommandTarget::Role(DroneRole::Relay).to_string(), "relays");
    }

    #[test]
    fn test_optimizations_exactly_three() {
        let reply = r#"Here you go:
[{"priority":"high","suggestion":"Move relay north","impact":"Restores mesh"},
 {"priority":"MEDIUM","suggestion":"Rotate scouts","impact":"Battery"},
 {"priority":"LOW","suggestion":"Widen patrol","impact":"Coverage"},
 {"priority":"LOW","suggestion":"Extra","impact":"None"}]"#;
        let suggestions = parse_optimizations(reply).unwrap();
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0].priority, "HIGH");
        assert_eq!(suggestions[2].suggestion, "Widen patrol");

        let short = r#"[{"priority":"HIGH","suggestion":"a","impact":"b"}]"#;
        assert!(matches!(
            parse_optimizations(short),
            Err(AdvisorError::MalformedReply(_))
        ));
        assert!(parse_optimizations("nothing").is_err());
    }
}
