//! AEGIS Fleet - Emergency Vehicle Coordination
//!
//! Runs the orchestrator (fleet state + dispatch + REST/WS API) together with
//! a simulated vehicle fleet on a shared in-process pub/sub bus.
//!
//! # Usage
//!
//! ```bash
//! # Default demo fleet: 3 ambulances, 2 fire trucks, 2 police units
//! cargo run --release
//!
//! # Orchestrator only (agents connect via their own process)
//! cargo run --release -- --ambulances 0 --fire-trucks 0 --police 0
//!
//! # Inject a failure scenario into the first ambulance
//! cargo run --release -- --inject engine_overheat
//! ```
//!
//! # Environment Variables
//!
//! - `AEGIS_SERVER_ADDR`: HTTP bind address (default: 0.0.0.0:8080)
//! - `AEGIS_FLEET_ID`: fleet identifier used in topic names (default: fleet01)
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use aegis_fleet::api::{create_app, ApiState};
use aegis_fleet::config::{AgentConfig, OrchestratorConfig};
use aegis_fleet::orchestrator::Orchestrator;
use aegis_fleet::transport::{InMemoryBus, Transport};
use aegis_fleet::types::VehicleType;
use aegis_fleet::agent::{FailureScenario, VehicleAgent};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "aegis-fleet")]
#[command(about = "AEGIS emergency fleet coordination")]
#[command(version)]
struct CliArgs {
    /// Override the HTTP server bind address (default: 0.0.0.0:8080)
    #[arg(short, long, env = "AEGIS_SERVER_ADDR")]
    addr: Option<String>,

    /// Fleet identifier used in pub/sub topic names
    #[arg(long, env = "AEGIS_FLEET_ID")]
    fleet_id: Option<String>,

    /// Number of simulated ambulances
    #[arg(long, default_value = "3")]
    ambulances: u32,

    /// Number of simulated fire trucks
    #[arg(long, default_value = "2")]
    fire_trucks: u32,

    /// Number of simulated police units
    #[arg(long, default_value = "2")]
    police: u32,

    /// Telemetry frequency for simulated agents in Hz (0.1 - 10.0)
    #[arg(long, default_value = "1.0")]
    frequency: f64,

    /// Random positional spread around each station in km
    #[arg(long, default_value = "2.0")]
    jitter_km: f64,

    /// Activate a failure scenario on the first simulated vehicle
    /// (engine_overheat, alternator_failure, brake_pad_wear,
    /// tire_pressure_low, battery_degradation, fuel_leak)
    #[arg(long)]
    inject: Option<FailureScenario>,
}

// ============================================================================
// Fleet Construction
// ============================================================================

/// Home station coordinates per vehicle type (San Francisco area)
fn station_for(vehicle_type: VehicleType) -> (f64, f64) {
    match vehicle_type {
        VehicleType::Ambulance => (37.7749, -122.4194),
        VehicleType::FireTruck => (37.7850, -122.4070),
        VehicleType::Police => (37.7690, -122.4330),
    }
}

/// Build agent configs for `count` vehicles of one type, each offset from the
/// type's station by a small random jitter so they do not share a GPS fix.
fn build_agent_configs(
    vehicle_type: VehicleType,
    count: u32,
    fleet_id: &str,
    frequency_hz: f64,
    jitter_km: f64,
) -> Vec<AgentConfig> {
    // 1 degree of latitude is roughly 111 km
    let degree_per_km = 1.0 / 111.0;
    let (base_lat, base_lon) = station_for(vehicle_type);
    let mut rng = rand::thread_rng();

    (1..=count)
        .map(|i| {
            let lat_offset = rng.gen_range(-jitter_km..=jitter_km) * degree_per_km;
            let lon_offset = rng.gen_range(-jitter_km..=jitter_km) * degree_per_km;
            AgentConfig::new(
                format!("{}-{:03}", vehicle_type.id_prefix(), i),
                vehicle_type,
            )
            .with_fleet_id(fleet_id)
            .with_frequency(frequency_hz)
            .with_position(base_lat + lat_offset, base_lon + lon_offset)
        })
        .collect()
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut config = OrchestratorConfig::from_env();
    if let Some(addr) = args.addr {
        config.server_addr = addr;
    }
    if let Some(fleet_id) = args.fleet_id {
        config.fleet_id = fleet_id;
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  AEGIS Fleet - Emergency Vehicle Coordination");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("");

    // Create cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    // Shared in-process broker
    let bus = Arc::new(InMemoryBus::new());

    // Orchestrator owner task
    let (orchestrator, handle) = Orchestrator::new(config.clone(), bus.clone());

    let mut task_set: JoinSet<Result<()>> = JoinSet::new();

    let orchestrator_cancel = cancel_token.clone();
    task_set.spawn(async move {
        orchestrator
            .run(orchestrator_cancel)
            .await
            .context("orchestrator task failed")
    });

    // Simulated vehicle fleet
    let mut configs = Vec::new();
    configs.extend(build_agent_configs(
        VehicleType::Ambulance,
        args.ambulances,
        &config.fleet_id,
        args.frequency,
        args.jitter_km,
    ));
    configs.extend(build_agent_configs(
        VehicleType::FireTruck,
        args.fire_trucks,
        &config.fleet_id,
        args.frequency,
        args.jitter_km,
    ));
    configs.extend(build_agent_configs(
        VehicleType::Police,
        args.police,
        &config.fleet_id,
        args.frequency,
        args.jitter_km,
    ));

    info!(
        "🚑 Launching {} simulated vehicles ({} ambulances, {} fire trucks, {} police)",
        configs.len(),
        args.ambulances,
        args.fire_trucks,
        args.police
    );

    for (index, agent_config) in configs.into_iter().enumerate() {
        agent_config.validate().context("invalid agent config")?;
        let mut agent = VehicleAgent::new(agent_config, bus.clone() as Arc<dyn Transport>);
        if index == 0 {
            if let Some(scenario) = args.inject {
                info!(scenario = %scenario, "Injecting failure scenario into first vehicle");
                agent.activate_failure(scenario);
            }
        }
        let agent_cancel = cancel_token.clone();
        task_set.spawn(async move { agent.run(agent_cancel).await });
    }

    // HTTP server
    let app = create_app(ApiState {
        orchestrator: handle,
    });
    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;
    info!("✓ HTTP server listening on {}", config.server_addr);

    let http_cancel = cancel_token.clone();
    task_set.spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                http_cancel.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await
            .context("HTTP server error")
    });

    // Supervisor: first task failure cancels the rest
    while let Some(result) = task_set.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Task failed: {:#}", e);
                cancel_token.cancel();
            }
            Err(e) => {
                error!("Task panicked: {}", e);
                cancel_token.cancel();
            }
        }
    }

    bus.close().await;
    info!("");
    info!("✓ AEGIS Fleet shutdown complete");
    Ok(())
}
