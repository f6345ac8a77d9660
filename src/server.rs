use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::encoder::FeatureMatrix;
use crate::error::Result;
use crate::model::Predictor;
use crate::types::{decode_batch, Health, PredictOut};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub log_predictions: bool,
}

impl AppState {
    pub fn new(predictor: Arc<Predictor>) -> Self {
        Self {
            predictor,
            log_predictions: false,
        }
    }

    pub fn with_prediction_log(mut self, on: bool) -> Self {
        self.log_predictions = on;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .with_state(state)
}

// ---------- Handlers ----------

async fn health() -> Json<Health> {
    Json(Health { status: "OK" })
}

// Failures are reported as 200 with an `error` body, not as an HTTP error status.
async fn predict(State(state): State<AppState>, body: Bytes) -> Json<PredictOut> {
    match run_batch(&state, &body) {
        Ok(predictions) => Json(PredictOut::Predictions { predictions }),
        Err(e) => {
            tracing::warn!("predict failed: {}", e);
            Json(PredictOut::Error {
                error: e.to_string(),
            })
        }
    }
}

fn run_batch(state: &AppState, body: &[u8]) -> Result<Vec<i64>> {
    let batch = decode_batch(body)?;
    let features = state.predictor.encoder().encode(&batch)?;
    if state.log_predictions {
        log_batch(&features);
    }
    state.predictor.predict(&features)
}

fn log_batch(x: &FeatureMatrix) {
    let nz = x.values().iter().filter(|v| **v != 0.0).count();
    let mut sample = vec![];
    if x.n_rows() > 0 {
        for (name, v) in x.columns().iter().zip(x.row(0)) {
            if *v != 0.0 {
                sample.push(name.as_str());
            }
        }
    }
    tracing::info!(
        "recv rows={} in_dim={} nonzero={} row0=[{}]",
        x.n_rows(),
        x.n_cols(),
        nz,
        sample.join(", ")
    );
}
