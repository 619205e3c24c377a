//! HTTP client for the advisor gateway.

use crate::briefs::{AdvisorRequest, CommandBrief, SwarmBrief, ThreatBrief};
use crate::error::{AdvisorError, Result};
use crate::reports::{self, CommandResult, OptimizationSuggestion, ThreatAnalysis};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use swarm_domain::SimulationState;
use tracing::{debug, warn};

/// Request timeout for gateway calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gateway reply body: `{"result": ..}` on success, `{"error": ..}` otherwise.
#[derive(Debug, Deserialize)]
struct GatewayReply {
    result: Option<String>,
    error: Option<String>,
}

/// Advisor gateway client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AdvisorClient {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl AdvisorClient {
    /// Client for `endpoint`, sending `api_key` as a bearer token when set.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    /// Gateway URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Assess the threat picture of `state`.
    pub async fn analyze_threat(&self, state: &SimulationState) -> Result<ThreatAnalysis> {
        let request = AdvisorRequest::ThreatAnalysis(ThreatBrief::from_state(state));
        let reply = self.request(&request).await?;
        Ok(reports::parse_threat_analysis(&reply))
    }

    /// Interpret an operator command against the drones in `state`.
    pub async fn interpret_command(
        &self,
        command: &str,
        state: &SimulationState,
    ) -> Result<CommandResult> {
        let request = AdvisorRequest::NaturalCommand(CommandBrief::new(command));
        let reply = self.request(&request).await?;
        reports::parse_command(&reply, &state.drones)
    }

    /// Three prioritized improvements for the swarm in `state`.
    pub async fn optimize(&self, state: &SimulationState) -> Result<Vec<OptimizationSuggestion>> {
        let request = AdvisorRequest::SwarmOptimization(SwarmBrief::from_state(state));
        let reply = self.request(&request).await?;
        reports::parse_optimizations(&reply)
    }

    /// POST one request and return the reply text.
    async fn request(&self, request: &AdvisorRequest) -> Result<String> {
        debug!(kind = request.kind(), endpoint = %self.endpoint, "advisor request");

        let mut builder = self.http.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        let reply = serde_json::from_str::<GatewayReply>(&body).ok();

        if !status.is_success() {
            let message = reply.and_then(|r| r.error).unwrap_or(body);
            warn!(kind = request.kind(), status = status.as_u16(), %message, "advisor request failed");
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                message,
            });
        }

        match reply {
            Some(GatewayReply {
                error: Some(error), ..
            }) => Err(AdvisorError::Gateway(error)),
            Some(GatewayReply {
                result: Some(result),
                ..
            }) => Ok(result),
            _ => Err(AdvisorError::MalformedReply(
                "gateway body has neither result nor error".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::SwarmAction;
    use swarm_domain::{Drone, DroneRole, MissionStatus, Position};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn state() -> SimulationState {
        SimulationState {
            drones: vec![
                Drone::live(Position::new(400.0, 300.0)),
                Drone::new("a1b2c3d4e", DroneRole::Interceptor, Position::new(200.0, 250.0)),
            ],
            jamming_zones: Vec::new(),
            targets: Vec::new(),
            mesh_links: Vec::new(),
            gps_enabled: true,
            jamming_active: true,
            simulation_running: true,
            time_elapsed: 3.0,
            mission_status: MissionStatus::Active,
        }
    }

    /// Answer one HTTP request with `status` and `body`; yields the raw request.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/ai-swarm", listener.local_addr().unwrap());

        let task = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });
        (url, task)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn reply(result: &str) -> String {
        serde_json::json!({ "result": result }).to_string()
    }

    #[test]
    fn test_endpoint_is_kept() {
        let client = AdvisorClient::new("http://127.0.0.1:9/ai-swarm", None).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9/ai-swarm");
    }

    #[tokio::test]
    async fn test_threat_analysis_round() {
        let (url, server) = serve_once(
            "200 OK",
            reply("- THREAT LEVEL: MEDIUM\n- ASSESSMENT: One hostile.\n- RECOMMENDED ACTION: Hold."),
        )
        .await;
        let client = AdvisorClient::new(url, Some("secret".into())).unwrap();

        let analysis = client.analyze_threat(&state()).await.unwrap();
        assert_eq!(analysis.threat_level, "MEDIUM");
        assert_eq!(analysis.recommended_action, "Hold.");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /ai-swarm"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(request.contains(r#""type":"threat-analysis""#));
        assert!(request.contains(r#""activeDrones":2"#));
    }

    #[tokio::test]
    async fn test_command_round() {
        let (url, server) = serve_once(
            "200 OK",
            reply(r#"{"action":"INTERCEPT","target":"a1b2c3d4e","parameters":{}}"#),
        )
        .await;
        let client = AdvisorClient::new(url, None).unwrap();

        let command = client
            .interpret_command("send the interceptor after it", &state())
            .await
            .unwrap();
        assert_eq!(command.action, SwarmAction::Intercept);
        assert_eq!(command.target.select(&state()).len(), 1);

        let request = server.await.unwrap();
        assert!(request.contains("send the interceptor after it"));
        assert!(!request.to_ascii_lowercase().contains("authorization"));
    }

    #[tokio::test]
    async fn test_gateway_error_status() {
        let body = serde_json::json!({ "error": "Rate limit exceeded. Please try again." }).to_string();
        let (url, server) = serve_once("429 Too Many Requests", body).await;
        let client = AdvisorClient::new(url, None).unwrap();

        let err = client.optimize(&state()).await.unwrap_err();
        match err {
            AdvisorError::Status { status, message } => {
                assert_eq!(status, 429);
                assert!(message.starts_with("Rate limit"));
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_error_body_with_success_status() {
        let body = serde_json::json!({ "error": "Unknown request type" }).to_string();
        let (url, server) = serve_once("200 OK", body).await;
        let client = AdvisorClient::new(url, None).unwrap();

        let err = client.analyze_threat(&state()).await.unwrap_err();
        assert!(matches!(err, AdvisorError::Gateway(ref m) if m == "Unknown request type"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_gateway() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/ai-swarm", listener.local_addr().unwrap());
        drop(listener);

        let client = AdvisorClient::new(url, None).unwrap();
        tokio_test::assert_err!(client.analyze_threat(&state()).await);
    }
}
