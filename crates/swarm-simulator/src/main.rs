//! Drone Swarm Simulator CLI
//!
//! Runs the swarm simulation in real time, optionally driving the live drone
//! from a device relay and asking the advisor gateway for periodic advice.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use swarm_advisor::AdvisorClient;
use swarm_domain::SimulationState;
use swarm_simulator::{
    LiveFeed, RuntimeConfig, SimConfig, SimulationRuntime, SimulationSnapshot, SwarmSimulation,
    SystemClock,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "swarm-simulator")]
#[command(about = "Simulate an autonomous drone swarm under GPS denial and jamming")]
struct Args {
    /// Stop after this many ticks (runs until Ctrl+C when unset)
    #[arg(short, long)]
    frames: Option<u64>,

    /// Seed for a reproducible scenario
    #[arg(short, long)]
    seed: Option<u64>,

    /// Ticks between status reports
    #[arg(long, default_value = "120")]
    report_every: u64,

    /// Device relay WebSocket URL, overrides LIVE_FEED_URL
    #[arg(long)]
    live_url: Option<String>,

    /// Start with every jamming zone switched off
    #[arg(long)]
    no_jamming: bool,

    /// Start with GPS denied swarm-wide
    #[arg(long)]
    no_gps: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Dry run (don't call the advisor gateway)
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let runtime_config = RuntimeConfig::from_env();

    init_tracing(&runtime_config.log_level, args.json_logs)?;

    let config = SimConfig::default();
    let mut sim = match args.seed {
        Some(seed) => SwarmSimulation::seeded(config, seed, Arc::new(SystemClock)),
        None => SwarmSimulation::new(config),
    };
    if args.no_jamming {
        sim.toggle_jamming();
    }
    if args.no_gps {
        sim.toggle_gps();
    }

    info!(
        "Starting swarm simulation: {} drones, {} jamming zones, {} targets",
        sim.state().drones.len(),
        sim.state().jamming_zones.len(),
        sim.state().targets.len()
    );

    let (handle, task) = SimulationRuntime::spawn(sim);

    let feed = args
        .live_url
        .clone()
        .or_else(|| runtime_config.live_feed_url.clone())
        .map(|url| {
            info!("Live feed: {}", url);
            tokio::spawn(LiveFeed::new(url, runtime_config.live_reconnect, handle.clone()).run())
        });

    let advisor = match (&runtime_config.advisor_url, args.dry_run) {
        (Some(url), false) => {
            let client = AdvisorClient::new(url.clone(), runtime_config.advisor_api_key.clone())?;
            info!("Advisor: {}", client.endpoint());
            Some(client)
        }
        _ => None,
    };

    handle.toggle_simulation().await?;

    let report_every = args.report_every.max(1);
    let mut next_report = report_every;
    let mut last_decision: Option<String> = None;
    let mut updates = handle.subscribe();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("Simulation runtime stopped unexpectedly");
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();

                log_decisions(&snapshot, &mut last_decision);

                if snapshot.tick >= next_report {
                    report(&snapshot);
                    next_report = snapshot.tick + report_every;
                    if let Some(advisor) = &advisor {
                        tokio::spawn(request_advice(advisor.clone(), snapshot.state.clone()));
                    }
                }

                if args.frames.is_some_and(|limit| snapshot.tick >= limit) {
                    info!("Frame limit reached");
                    break;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    handle.shutdown().await.ok();
    let sim = task.await?;
    if let Some(feed) = feed {
        feed.abort();
    }

    let metrics = sim.metrics();
    info!("=== FINAL STATUS ===");
    info!(
        "Ticks: {} | Elapsed: {:.1}s | Mission: {:.1}%",
        sim.ticks(),
        sim.state().time_elapsed,
        metrics.mission_progress
    );
    info!(
        "Active: {} | Jammed: {} | Mesh: {:.1}% | Resilience: {:.1}% | Battery: {:.1}%",
        metrics.active_drones,
        metrics.jammed_drones,
        metrics.mesh_connectivity,
        metrics.network_resilience,
        metrics.avg_battery
    );
    for decision in sim.decisions().entries().take(5) {
        info!("  [{:?}] {}: {}", decision.priority, decision.drone_name, decision.message);
    }

    Ok(())
}

fn init_tracing(level: &str, json: bool) -> Result<()> {
    let filter =
        EnvFilter::from_default_env().add_directive(format!("swarm_simulator={level}").parse()?);
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn report(snapshot: &SimulationSnapshot) {
    let m = &snapshot.metrics;
    info!(
        "Tick {} | Mission: {:.1}% | Active: {} | Jammed: {} | Mesh: {:.1}% | Threats: {} | Battery: {:.1}% | Live: {}",
        snapshot.tick,
        m.mission_progress,
        m.active_drones,
        m.jammed_drones,
        m.mesh_connectivity,
        m.threat_count,
        m.avg_battery,
        if snapshot.live.device_connected { "device" } else { "keyboard" }
    );
}

/// Log decisions newer than `last_seen`, oldest first.
fn log_decisions(snapshot: &SimulationSnapshot, last_seen: &mut Option<String>) {
    let fresh: Vec<_> = snapshot
        .decisions
        .iter()
        .take_while(|d| last_seen.as_deref() != Some(d.id.as_str()))
        .collect();

    for decision in fresh.iter().rev() {
        info!(
            "  {} [{:?}/{:?}] {}",
            decision.drone_name, decision.kind, decision.priority, decision.message
        );
    }
    if let Some(newest) = snapshot.decisions.first() {
        *last_seen = Some(newest.id.clone());
    }
}

/// Ask the advisor for a threat read and optimization ideas. Failures are
/// logged and never reach the simulation.
async fn request_advice(advisor: AdvisorClient, state: SimulationState) {
    match advisor.analyze_threat(&state).await {
        Ok(analysis) => info!(
            "Advisor threat: {} | {} | {}",
            analysis.threat_level, analysis.assessment, analysis.recommended_action
        ),
        Err(err) => warn!("Failed to analyze threat: {}", err),
    }

    match advisor.optimize(&state).await {
        Ok(suggestions) => {
            for s in suggestions {
                info!("Advisor [{}] {} ({})", s.priority, s.suggestion, s.impact);
            }
        }
        Err(err) => warn!("Failed to get optimizations: {}", err),
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
