//! Solubility Server - LogS prediction service
//!
//! Loads the regression model once at startup and serves batch predictions
//! over HTTP alongside health probes and Prometheus metrics.

use anyhow::{Context, Result};
use solubility_lib::{
    chem::SmilesParser,
    health::{components, HealthRegistry},
    observability::{ServiceMetrics, StructuredLogger},
    SolubilityPipeline,
};
use solubility_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting solubility-server");

    let config = ServerConfig::load().context("Failed to load configuration")?;
    info!(
        instance = %config.instance_name,
        max_batch_size = config.max_batch_size,
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::PARSER).await;
    health_registry.register(components::PREDICTOR).await;

    let metrics = ServiceMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);

    let mut pipeline = SolubilityPipeline::with_parser(SmilesParser, config.assembler_config())
        .with_metrics(metrics);

    // A missing or broken model keeps the server up but not ready
    let source = config.model_source();
    let origin = source.describe();
    match pipeline.load_model(source, &config.load_options()) {
        Ok(handle) => {
            let model = handle.info();
            logger.log_model_loaded(&model.name, &model.version, &model.kind, &origin);
            health_registry.model_loaded(handle.version()).await;
        }
        Err(e) => {
            logger.log_model_load_failed(&origin, &e.to_string());
            health_registry.model_unavailable(e.to_string()).await;
        }
    }

    let app_state = Arc::new(api::AppState::new(
        pipeline,
        health_registry,
        logger.clone(),
    ));

    let addr = format!("0.0.0.0:{}", config.api_port);
    logger.log_startup(SERVER_VERSION, &addr);

    api::serve(&addr, app_state, shutdown_signal()).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
