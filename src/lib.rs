//! Flight delay prediction served over HTTP.
//!
//! Raw flight records are one-hot encoded by [`encoder::FeatureEncoder`],
//! aligned to the schema of the loaded [`model::Predictor`], and classified.

pub mod config;
pub mod encoder;
pub mod error;
pub mod model;
pub mod server;
pub mod types;

pub use encoder::{Attribute, EncodeMode, FeatureEncoder, FeatureMatrix, FeatureSchema};
pub use error::{DelayError, Result};
pub use model::{Classifier, LogisticRegression, ModelSource, Predictor};
pub use types::RawRecord;
