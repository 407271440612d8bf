//! Reply bridge binary.
//!
//! Usage:
//!   bridge --config config/bridge.toml
//!
//! Runs against the in-process broker unless a real broker client is wired
//! in; the transport is an injected collaborator, not part of this service.

use anyhow::{Context, Result};
use bridge::{
    BridgeMetrics, ChannelSink, CorrelationEngine, Listener, MemoryBroker, Notifier, Publisher,
};
use clap::Parser;
use config::BridgeConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "bridge")]
#[command(about = "Request/reply correlation bridge")]
#[command(version)]
struct Args {
    /// Path to configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    info!("Starting Reply Bridge");

    let config = match &args.config {
        Some(path) => BridgeConfig::from_file(path).map_err(|e| {
            error!("Failed to load configuration: {}", e);
            e
        })?,
        None => {
            info!("No config file given, using defaults");
            BridgeConfig::default()
        }
    };

    info!(
        "Consuming '{}' as group '{}', replies default to '{}'",
        config.topics.input, config.broker.group_id, config.topics.output
    );

    // In-process broker stands in for the externally owned client here;
    // a production deployment injects the real one.
    let broker = MemoryBroker::new();
    let subscription = broker.subscribe(&config.topics.input);
    let producer = Arc::new(broker.producer());

    let (sink, mut updates) = ChannelSink::channel();
    tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            info!(incoming = %update.incoming, outgoing = %update.outgoing, "correlated");
        }
    });

    let metrics = Arc::new(RwLock::new(BridgeMetrics::new()));
    let reporting = Arc::clone(&metrics);
    let interval = Duration::from_secs(config.runtime.metrics_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            info!("{}", reporting.read().await.clone());
        }
    });

    let listener = Listener::new(
        Box::new(subscription),
        CorrelationEngine::new(),
        Publisher::new(producer, config.topics.output.clone()),
        Notifier::new(config.topics.notification_channel.clone(), Arc::new(sink)),
        config.reply.clone(),
        config.runtime.shard_buffer,
        metrics,
    );

    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener.run().await {
            error!("Listener failed: {}", e);
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to install CTRL+C signal handler")?;
    info!("Received shutdown signal");

    broker.close(&config.topics.input);
    listener_handle.await.context("Listener task panicked")?;

    Ok(())
}

fn init_logging(args: &Args) {
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();
}
