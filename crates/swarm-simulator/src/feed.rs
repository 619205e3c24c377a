//! Relay transport for the live drone.
//!
//! Opens a WebSocket to the device relay, announces itself as a dashboard and
//! forwards every JSON text frame to the simulation. Connection loss is never
//! fatal: the feed marks the device disconnected, waits and reconnects until
//! the simulation runtime goes away.

use crate::live::{DASHBOARD_HELLO, parse_frame};
use crate::runtime::{RuntimeClosed, SimCommand, SimulationHandle};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum LiveFeedError {
    #[error("relay WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    #[error(transparent)]
    RuntimeClosed(#[from] RuntimeClosed),
}

impl From<tungstenite::Error> for LiveFeedError {
    fn from(e: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(e))
    }
}

/// Reconnecting relay client.
pub struct LiveFeed {
    url: String,
    reconnect: Duration,
    handle: SimulationHandle,
}

impl LiveFeed {
    /// `url` is the relay's `ws://` endpoint.
    pub fn new(url: impl Into<String>, reconnect: Duration, handle: SimulationHandle) -> Self {
        Self {
            url: url.into(),
            reconnect,
            handle,
        }
    }

    /// Run until the simulation runtime closes.
    pub async fn run(self) {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self.session().await {
                Ok(forwarded) => info!(url = %self.url, forwarded, "relay closed the connection"),
                Err(LiveFeedError::RuntimeClosed(_)) => break,
                Err(LiveFeedError::WebSocket(e)) => {
                    warn!(url = %self.url, attempt, error = %e, "relay connection failed")
                }
            }

            if self.handle.send(SimCommand::DeviceDisconnected).await.is_err() {
                break;
            }
            tokio::time::sleep(self.reconnect).await;
        }
        debug!("live feed stopped");
    }

    /// One connection lifetime. Returns the number of frames forwarded.
    async fn session(&self) -> Result<u64, LiveFeedError> {
        let (mut socket, _) = connect_async(self.url.as_str()).await?;
        info!(url = %self.url, "connected to relay");

        socket.send(Message::text(DASHBOARD_HELLO)).await?;

        let mut forwarded = 0;
        while let Some(frame) = socket.next().await {
            match frame? {
                Message::Text(text) => {
                    if let Some(message) = parse_frame(&text) {
                        self.handle.relay(message).await?;
                        forwarded += 1;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        Ok(forwarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::SimConfig;
    use crate::engine::SwarmSimulation;
    use crate::runtime::SimulationRuntime;
    use std::sync::Arc;
    use swarm_domain::{LIVE_DRONE_ID, Position};
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    async fn wait_for<F>(handle: &SimulationHandle, mut ready: F) -> bool
    where
        F: FnMut(&crate::engine::SimulationSnapshot) -> bool,
    {
        for _ in 0..200 {
            if ready(&handle.snapshot()) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_feed_forwards_frames_and_reconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let sim = SwarmSimulation::seeded(SimConfig::default(), 8, Arc::new(SystemClock));
        let (handle, task) = SimulationRuntime::spawn(sim);
        let feed = tokio::spawn(LiveFeed::new(url, Duration::from_millis(20), handle.clone()).run());

        let (stream, _) = listener.accept().await.unwrap();
        let mut relay = tokio_test::assert_ok!(accept_async(stream).await);

        let hello = relay.next().await.unwrap().unwrap();
        assert_eq!(hello, Message::text(DASHBOARD_HELLO));

        let frames = [
            r#"{"type":"connection-status","payload":{"deviceConnected":true}}"#,
            "garbage",
            r#"{"type":"drone-update","payload":{"id":"PROXY-DRONE-01","position":{"x":250,"y":260},"battery":55}}"#,
        ];
        for frame in frames {
            tokio_test::assert_ok!(relay.send(Message::text(frame)).await);
        }
        tokio_test::assert_ok!(relay.send(Message::binary(vec![1u8, 2, 3])).await);

        assert!(
            wait_for(&handle, |s| {
                s.state.drone(LIVE_DRONE_ID).map(|d| d.position) == Some(Position::new(250.0, 260.0))
            })
            .await
        );
        let snapshot = handle.snapshot();
        assert!(snapshot.live.device_connected);
        assert_eq!(snapshot.state.drone(LIVE_DRONE_ID).unwrap().battery, Some(55.0));

        drop(relay);
        assert!(wait_for(&handle, |s| !s.live.device_connected).await);

        let (stream, _) = listener.accept().await.unwrap();
        let mut relay = tokio_test::assert_ok!(accept_async(stream).await);
        let hello = relay.next().await.unwrap().unwrap();
        assert_eq!(hello, Message::text(DASHBOARD_HELLO));

        handle.shutdown().await.unwrap();
        task.await.unwrap();
        drop(handle);
        feed.abort();
    }
}
