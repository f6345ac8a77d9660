use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;

/// One flight observation as it arrives over the wire.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RawRecord {
    #[serde(rename = "OPERA")]
    pub carrier: String,
    #[serde(rename = "TIPOVUELO")]
    pub flight_type: String,
    #[serde(rename = "MES")]
    pub month: i64,
    // anything else on the object; only read when a target column is requested
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawRecord {
    pub fn new(carrier: impl Into<String>, flight_type: impl Into<String>, month: i64) -> Self {
        Self {
            carrier: carrier.into(),
            flight_type: flight_type.into(),
            month,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Decodes a `/predict` body: a JSON array of records.
pub fn decode_batch(body: &[u8]) -> Result<Vec<RawRecord>> {
    Ok(serde_json::from_slice(body)?)
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PredictOut {
    Predictions { predictions: Vec<i64> },
    Error { error: String },
}
