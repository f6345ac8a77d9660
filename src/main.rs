use anyhow::Context;
use std::sync::Arc;

use delay_predictor::config::ServerConfig;
use delay_predictor::model::Predictor;
use delay_predictor::server::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = ServerConfig::from_env();
    let source = cfg.model_source()?;

    // load before serving; a bad artifact aborts startup
    let predictor = Predictor::new();
    predictor
        .load(&source)
        .with_context(|| format!("failed to load model {}", source.path().display()))?;
    predictor.warmup()?;
    tracing::info!("warmup forward ok");

    let state = AppState::new(Arc::new(predictor)).with_prediction_log(cfg.log_predictions);
    let app = router(state);

    let addr = cfg.socket_addr()?;
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
