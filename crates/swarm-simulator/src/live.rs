//! Live-device adapter.
//!
//! Turns relay frames into pose/battery overrides for the live drone and
//! tracks whether the device is currently driving it. Frames are decoded
//! leniently: unknown message types, missing fields and fields of the wrong
//! shape are skipped, never reported as errors.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use swarm_domain::{DomainError, DroneStatus, MapBounds, Position, SimulationState, Velocity};
use tracing::debug;

/// Greeting sent to the relay so it forwards device frames to us.
pub const DASHBOARD_HELLO: &str = r#"{"type":"client-type","payload":"dashboard"}"#;

/// Directional flags for manual control of the live drone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl KeyboardInput {
    /// Map a WASD or arrow key name to its flag. Returns false for other keys.
    pub fn set_key(&mut self, key: &str, pressed: bool) -> bool {
        let flag = match key.to_ascii_lowercase().as_str() {
            "w" | "arrowup" => &mut self.up,
            "s" | "arrowdown" => &mut self.down,
            "a" | "arrowleft" => &mut self.left,
            "d" | "arrowright" => &mut self.right,
            _ => return false,
        };
        *flag = pressed;
        true
    }

    /// Fixed-speed velocity; down wins over up and right over left.
    pub fn velocity(&self, speed: f64) -> Velocity {
        let mut v = Velocity::ZERO;
        if self.up {
            v.vy = -speed;
        }
        if self.down {
            v.vy = speed;
        }
        if self.left {
            v.vx = -speed;
        }
        if self.right {
            v.vx = speed;
        }
        v
    }
}

/// Pose/battery record pushed by the device. Absent fields keep prior values.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveDroneUpdate {
    pub id: String,
    pub position: Option<Position>,
    pub heading: Option<f64>,
    /// Outer `None`: field absent. `Some(None)`: battery reported as unknown.
    pub battery: Option<Option<f64>>,
    pub online: bool,
}

/// Frame from the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    ConnectionStatus { device_connected: bool },
    DroneUpdate(LiveDroneUpdate),
}

/// Decode one relay frame. `None` for anything unusable.
pub fn parse_frame(raw: &str) -> Option<RelayMessage> {
    let frame: Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "dropping malformed relay frame");
            return None;
        }
    };

    let payload = frame.get("payload")?;
    match frame.get("type")?.as_str()? {
        "connection-status" => Some(RelayMessage::ConnectionStatus {
            device_connected: payload.get("deviceConnected")?.as_bool()?,
        }),
        "drone-update" => parse_update(payload).map(RelayMessage::DroneUpdate),
        other => {
            debug!(kind = other, "ignoring relay frame");
            None
        }
    }
}

fn parse_update(payload: &Value) -> Option<LiveDroneUpdate> {
    let id = payload.get("id")?.as_str()?.to_string();

    let position = payload
        .get("position")
        .and_then(|p| Some(Position::new(p.get("x")?.as_f64()?, p.get("y")?.as_f64()?)));

    let heading = payload.get("heading").and_then(Value::as_f64);

    let battery = match payload.get("battery") {
        Some(Value::Null) => Some(None),
        Some(value) => value.as_f64().map(Some),
        None => None,
    };

    let online = payload
        .get("online")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    Some(LiveDroneUpdate {
        id,
        position,
        heading,
        battery,
        online,
    })
}

/// Connection bookkeeping for the live drone's device feed.
#[derive(Debug, Clone, Default)]
pub struct LiveLink {
    device_connected: bool,
    last_update: Option<DateTime<Utc>>,
    /// Latest relay message of any kind, the clock for the liveness window.
    last_message: Option<DateTime<Utc>>,
    keyboard: KeyboardInput,
}

impl LiveLink {
    pub fn set_device_connected(&mut self, connected: bool, now: DateTime<Utc>) {
        self.device_connected = connected;
        if connected {
            self.last_message = Some(now);
        }
    }

    pub fn keyboard(&self) -> KeyboardInput {
        self.keyboard
    }

    pub fn set_keyboard(&mut self, keys: KeyboardInput) {
        self.keyboard = keys;
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Device announced and the relay spoke within `timeout`.
    pub fn is_connected(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        if !self.device_connected {
            return false;
        }
        self.last_message
            .is_some_and(|at| (now - at).to_std().map_or(true, |age| age <= timeout))
    }

    /// Overwrite the live drone from a device record.
    ///
    /// Fails when no live drone carries the record's id; the caller drops
    /// such records.
    pub fn apply_update(
        &mut self,
        state: &mut SimulationState,
        update: &LiveDroneUpdate,
        bounds: &MapBounds,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let drone = state
            .drone_mut(&update.id)
            .filter(|d| d.is_live_device)
            .ok_or_else(|| DomainError::DroneNotFound(update.id.clone()))?;

        if let Some(position) = update.position {
            let position = bounds.clamp(position);
            drone.position = position;
            drone.last_known_position = position;
        }
        if let Some(heading) = update.heading {
            drone.heading = heading.rem_euclid(360.0);
        }
        if let Some(battery) = update.battery {
            drone.battery = battery.map(|b| b.clamp(0.0, 100.0));
        }
        drone.status = if update.online {
            DroneStatus::Active
        } else {
            DroneStatus::Offline
        };
        drone.last_live_update = Some(now);

        self.device_connected = true;
        self.last_update = Some(now);
        self.last_message = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::scenario;
    use chrono::TimeDelta;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use swarm_domain::LIVE_DRONE_ID;

    fn state() -> SimulationState {
        scenario::initial_state(&SimConfig::default(), &mut StdRng::seed_from_u64(3))
    }

    #[test]
    fn test_parse_drone_update() {
        let raw = r#"{"type":"drone-update","payload":{"id":"PROXY-DRONE-01","position":{"x":410.5,"y":290},"heading":45,"battery":null,"online":true}}"#;
        let msg = parse_frame(raw).unwrap();

        assert_eq!(
            msg,
            RelayMessage::DroneUpdate(LiveDroneUpdate {
                id: LIVE_DRONE_ID.into(),
                position: Some(Position::new(410.5, 290.0)),
                heading: Some(45.0),
                battery: Some(None),
                online: true,
            })
        );
    }

    #[test]
    fn test_parse_skips_garbled_fields() {
        let raw = r#"{"type":"drone-update","payload":{"id":"PROXY-DRONE-01","position":{"x":"left"},"heading":"north"}}"#;
        let Some(RelayMessage::DroneUpdate(update)) = parse_frame(raw) else {
            panic!("expected a drone update");
        };
        assert_eq!(update.position, None);
        assert_eq!(update.heading, None);
        assert_eq!(update.battery, None);
        assert!(update.online);
    }

    #[test]
    fn test_parse_rejects_unusable_frames() {
        assert!(parse_frame("not json").is_none());
        assert!(parse_frame(r#"{"type":"drone-update","payload":{"heading":3}}"#).is_none());
        assert!(parse_frame(r#"{"type":"device-data","payload":{}}"#).is_none());
        assert!(parse_frame(r#"{"payload":{"deviceConnected":true}}"#).is_none());
        assert_eq!(
            parse_frame(r#"{"type":"connection-status","payload":{"deviceConnected":false}}"#),
            Some(RelayMessage::ConnectionStatus {
                device_connected: false
            })
        );
    }

    #[test]
    fn test_apply_update_overwrites_present_fields() {
        let mut state = state();
        let mut link = LiveLink::default();
        let now = Utc::now();
        let update = LiveDroneUpdate {
            id: LIVE_DRONE_ID.into(),
            position: Some(Position::new(100.0, 120.0)),
            heading: Some(-90.0),
            battery: Some(Some(64.0)),
            online: true,
        };

        link.apply_update(&mut state, &update, &MapBounds::default(), now)
            .unwrap();
        let live = state.live_drone().unwrap();
        assert_eq!(live.position, Position::new(100.0, 120.0));
        assert_eq!(live.last_known_position, Position::new(100.0, 120.0));
        assert_eq!(live.heading, 270.0);
        assert_eq!(live.battery, Some(64.0));
        assert_eq!(live.last_live_update, Some(now));
        assert!(link.is_connected(now, Duration::from_secs(5)));

        let partial = LiveDroneUpdate {
            id: LIVE_DRONE_ID.into(),
            position: None,
            heading: None,
            battery: None,
            online: false,
        };
        link.apply_update(&mut state, &partial, &MapBounds::default(), now)
            .unwrap();
        let live = state.live_drone().unwrap();
        assert_eq!(live.position, Position::new(100.0, 120.0));
        assert_eq!(live.battery, Some(64.0));
        assert_eq!(live.status, DroneStatus::Offline);
    }

    #[test]
    fn test_apply_update_unknown_id() {
        let mut state = state();
        let before = state.clone();
        let mut link = LiveLink::default();
        let update = LiveDroneUpdate {
            id: "someone-else".into(),
            position: Some(Position::new(1.0, 1.0)),
            heading: None,
            battery: None,
            online: true,
        };

        let result = link.apply_update(&mut state, &update, &MapBounds::default(), Utc::now());
        assert!(matches!(result, Err(DomainError::DroneNotFound(_))));
        assert_eq!(state, before);
        assert!(!link.is_connected(Utc::now(), Duration::from_secs(5)));
    }

    #[test]
    fn test_liveness_window() {
        let mut link = LiveLink::default();
        let mut state = state();
        let start = Utc::now();
        let update = LiveDroneUpdate {
            id: LIVE_DRONE_ID.into(),
            position: None,
            heading: None,
            battery: None,
            online: true,
        };
        link.apply_update(&mut state, &update, &MapBounds::default(), start)
            .unwrap();

        let timeout = Duration::from_secs(5);
        assert!(link.is_connected(start + TimeDelta::seconds(4), timeout));
        assert!(!link.is_connected(start + TimeDelta::seconds(6), timeout));

        link.set_device_connected(false, start);
        assert!(!link.is_connected(start, timeout));
    }

    #[test]
    fn test_connection_status_alone_expires() {
        let mut link = LiveLink::default();
        let start = Utc::now();
        let timeout = Duration::from_secs(5);

        link.set_device_connected(true, start);
        assert!(link.is_connected(start + TimeDelta::seconds(3), timeout));
        assert!(!link.is_connected(start + TimeDelta::seconds(60), timeout));
        assert_eq!(link.last_update(), None);

        // a fresh announcement restarts the window
        link.set_device_connected(true, start + TimeDelta::seconds(60));
        assert!(link.is_connected(start + TimeDelta::seconds(62), timeout));
    }

    #[test]
    fn test_apply_update_ignores_non_live_drone_with_same_id() {
        let mut state = state();
        let scout_id = state.drones[4].id.clone();
        let mut link = LiveLink::default();
        let update = LiveDroneUpdate {
            id: scout_id,
            position: Some(Position::new(1.0, 1.0)),
            heading: None,
            battery: None,
            online: true,
        };

        let result = link.apply_update(&mut state, &update, &MapBounds::default(), Utc::now());
        assert!(matches!(result, Err(DomainError::DroneNotFound(_))));
        assert_ne!(state.drones[4].position, Position::new(1.0, 1.0));
    }

    #[test]
    fn test_keyboard_mapping() {
        let mut keys = KeyboardInput::default();
        assert!(keys.set_key("W", true));
        assert!(keys.set_key("ArrowLeft", true));
        assert!(!keys.set_key("q", true));
        assert_eq!(keys.velocity(3.0), Velocity::new(-3.0, -3.0));

        keys.set_key("s", true);
        assert_eq!(keys.velocity(3.0), Velocity::new(-3.0, 3.0));
    }
}
