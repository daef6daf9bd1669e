//! Stream driver
//!
//! Reads one JSON message per stdin line, hands each to the engine in
//! arrival order, and prints a one-line JSON digest of the view whenever it
//! changed. Set `FLOW_ENGINE_DERIVE_ALERTS=1` to derive large-trade,
//! strategy-package and volume-trend alerts locally.

use anyhow::Context;
use chrono::Utc;
use flow_engine::{EngineConfig, FlowEngine, SERVICE_VERSION};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(version = SERVICE_VERSION, "Starting flow engine");

    let config = EngineConfig {
        derive_large_trade_alerts: std::env::var("FLOW_ENGINE_DERIVE_ALERTS")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        ..EngineConfig::default()
    };
    let mut engine = FlowEngine::new(config).context("invalid engine configuration")?;

    let (tx, mut rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if tx.send(line).await.is_err() {
                break;
            }
        }
        Ok::<(), std::io::Error>(())
    });

    // Single consumer: events apply strictly in arrival order
    while let Some(line) = rx.recv().await {
        match engine.apply_message(&line, Utc::now()) {
            Ok(outcome) if outcome.changed => {
                println!("{}", serde_json::to_string(&engine.digest())?);
            }
            Ok(_) => {}
            // Already logged and counted by the ingestion layer
            Err(_) => {}
        }
    }

    reader.await.context("stdin reader panicked")??;

    let metrics = engine.metrics().export();
    tracing::info!(?metrics, "Input closed, shutting down");
    Ok(())
}
