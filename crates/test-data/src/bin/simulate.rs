//! Runs one simulated session and prints its summary as JSON.
//!
//! Run with:
//! ```
//! SCENARIO=loop cargo run -p test-data --bin simulate
//! ```
//!
//! Environment:
//! - `SCENARIO`: `sprint` (default), `loop`, `overspeed` or `abandoned`
//! - `SEED`: random seed
//! - `SIMULATION_CONFIG`: path to a JSON [`SimulationConfig`]
//! - `SESSION_CONFIG`: path to a JSON session configuration
//! - `GPX_FILE`: walk this route instead of a generated one (`GPX_LOOP=1` for loops)

use std::env;

use anyhow::bail;
use pathwalker::SessionConfig;
use test_data::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let scenario = env::var("SCENARIO").unwrap_or_else(|_| "sprint".to_string());
    let mut builder = match scenario.as_str() {
        "sprint" => ScenarioBuilder::sprint_test(),
        "loop" => ScenarioBuilder::loop_test(),
        "overspeed" => ScenarioBuilder::overspeed_test(),
        "abandoned" => ScenarioBuilder::abandoned_walk_test(),
        other => bail!("Unknown scenario {other:?}"),
    };

    if let Ok(path) = env::var("SIMULATION_CONFIG") {
        builder = builder.with_simulation_config(SimulationConfig::from_json_file(&path)?);
    }
    if let Ok(path) = env::var("SESSION_CONFIG") {
        builder = builder.with_session_config(SessionConfig::from_json_file(&path)?);
    } else {
        builder = builder.with_session_config(SessionConfig::from_env());
    }
    if let Ok(seed) = env::var("SEED") {
        builder = builder.with_seed(seed.parse()?);
    }
    if let Ok(path) = env::var("GPX_FILE") {
        let is_loop = env::var("GPX_LOOP").is_ok_and(|v| v == "1" || v == "true");
        builder = builder.with_gpx_file(path, is_loop);
    }

    tracing::info!("Running {scenario} scenario");
    let result = builder.with_metrics(true).run().await?;

    tracing::info!("Simulation completed!");
    tracing::info!("  State: {}", result.state);
    tracing::info!("  Laps: {}", result.lap_count);
    tracing::info!("  Distance: {:.0}cm", result.distance_cm);
    tracing::info!("  Record time: {}", result.record_time);

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
