use std::{env, net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};

use crate::model::ModelSource;

pub const DEFAULT_MODEL_PATH: &str = "models/delay_model.json";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub model_path: PathBuf,
    pub bind_addr: String,
    pub port: u16,
    pub log_predictions: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            bind_addr: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            log_predictions: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Builds the config from any key lookup; unset or unparsable keys keep defaults.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        Self {
            model_path: get("MODEL_PATH").map(PathBuf::from).unwrap_or(d.model_path),
            bind_addr: get("BIND_ADDR").unwrap_or(d.bind_addr),
            port: get("PORT").and_then(|s| s.parse().ok()).unwrap_or(d.port),
            log_predictions: get("LOG_PRED").as_deref() == Some("1"),
        }
    }

    pub fn model_source(&self) -> Result<ModelSource> {
        ModelSource::from_path(self.model_path.clone())
            .with_context(|| format!("invalid model location {}", self.model_path.display()))
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.bind_addr, self.port))
    }
}
