//! FraudShield entrypoint: load config and model, then serve the scoring API
//! until Ctrl+C. A missing or broken model does not stop startup; scoring
//! requests fail with "Model not loaded" until a later load succeeds.

use fraudshield::{
    config::ServiceConfig, logging::StructuredLogger, model::ModelRegistry, server,
    service::RequestHandler,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = ServiceConfig::from_env()?;

    StructuredLogger::init(config.log.json, &config.log.level)?;

    info!(
        bind = %config.bind,
        model_path = %config.model.path.display(),
        "FraudShield starting"
    );

    let registry = Arc::new(ModelRegistry::new(
        config.model.path.clone(),
        config.model.reload_interval(),
    ));
    if let Err(e) = registry.load_now() {
        warn!(error = %e, "starting without a model");
    }

    let handler = Arc::new(RequestHandler::new(registry));
    let app = server::router(handler, &config.server);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("FraudShield stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
