use parking_lot::RwLock;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::encoder::{FeatureEncoder, FeatureMatrix, FeatureSchema};
use crate::error::{DelayError, Result};

/// Inference contract every model backend implements.
pub trait Classifier: Send + Sync {
    /// Columns the model was fit on, in training order.
    fn feature_names(&self) -> &[String];

    /// One class label per row of `x`. Columns are already aligned.
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>>;

    fn name(&self) -> &str {
        "classifier"
    }
}

// ---------- Logistic regression (JSON artifact) ----------

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

#[derive(Deserialize)]
struct LogisticJson {
    feature_names_in: Vec<String>,
    coef: Vec<f64>,
    intercept: f64,
    #[serde(default = "default_classes")]
    classes: Vec<i64>,
}

/// Binary logistic regression exported as
/// `{"feature_names_in": [...], "coef": [...], "intercept": b, "classes": [c0, c1]}`.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    feature_names: Vec<String>,
    coef: Vec<f64>,
    intercept: f64,
    classes: [i64; 2],
}

impl LogisticRegression {
    pub fn new(
        feature_names: Vec<String>,
        coef: Vec<f64>,
        intercept: f64,
        classes: [i64; 2],
    ) -> Result<Self> {
        if feature_names.is_empty() {
            return Err(DelayError::InvalidModel("model has no features".into()));
        }
        if feature_names.len() != coef.len() {
            return Err(DelayError::InvalidModel(format!(
                "feature_names_in has {} entries but coef has {}",
                feature_names.len(),
                coef.len()
            )));
        }
        if !intercept.is_finite() || coef.iter().any(|c| !c.is_finite()) {
            return Err(DelayError::InvalidModel("coefficients must be finite".into()));
        }
        // rejects duplicate names
        FeatureSchema::new(feature_names.clone())
            .map_err(|e| DelayError::InvalidModel(e.to_string()))?;
        Ok(Self {
            feature_names,
            coef,
            intercept,
            classes,
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let p = path.display().to_string();
        let txt = fs::read_to_string(path).map_err(|e| DelayError::load(&p, e))?;
        Self::from_json_str(&txt).map_err(|e| DelayError::load(&p, e))
    }

    pub fn from_json_str(txt: &str) -> Result<Self> {
        let raw: LogisticJson =
            serde_json::from_str(txt).map_err(|e| DelayError::InvalidModel(e.to_string()))?;
        let classes: [i64; 2] = raw.classes.try_into().map_err(|c: Vec<i64>| {
            DelayError::InvalidModel(format!("expected 2 classes, got {}", c.len()))
        })?;
        Self::new(raw.feature_names_in, raw.coef, raw.intercept, classes)
    }

    pub fn decision_function(&self, row: &[f32]) -> f64 {
        self.intercept
            + row
                .iter()
                .zip(&self.coef)
                .map(|(x, w)| *x as f64 * w)
                .sum::<f64>()
    }
}

impl Classifier for LogisticRegression {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        if x.n_cols() != self.coef.len() {
            return Err(DelayError::Inference(format!(
                "feature length mismatch: got {}, expected {}",
                x.n_cols(),
                self.coef.len()
            )));
        }
        Ok(x
            .rows()
            .map(|row| {
                if self.decision_function(row) > 0.0 {
                    self.classes[1]
                } else {
                    self.classes[0]
                }
            })
            .collect())
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

// ---------- Artifact location ----------

#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    LogisticJson(PathBuf),
}

impl ModelSource {
    /// Picks the backend from the model file extension.
    pub fn from_path(model: impl Into<PathBuf>) -> Result<Self> {
        let model = model.into();
        let ext = model
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(ModelSource::LogisticJson(model)),
            _ => Err(DelayError::load(
                model.display().to_string(),
                "unrecognised model file extension (expected .json)",
            )),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ModelSource::LogisticJson(p) => p,
        }
    }

    fn open(&self) -> Result<Box<dyn Classifier>> {
        match self {
            ModelSource::LogisticJson(p) => Ok(Box::new(LogisticRegression::from_json_file(p)?)),
        }
    }
}

// ---------- Predictor ----------

struct LoadedModel {
    classifier: Box<dyn Classifier>,
    schema: Arc<FeatureSchema>,
}

impl LoadedModel {
    fn new(classifier: Box<dyn Classifier>) -> Result<Self> {
        let schema = Arc::new(FeatureSchema::new(classifier.feature_names().to_vec())?);
        Ok(Self { classifier, schema })
    }
}

/// Shared holder of the trained classifier.
///
/// Starts unloaded. `load` validates the artifact fully before swapping it in,
/// so a failed load leaves whatever was there before.
#[derive(Default)]
pub struct Predictor {
    inner: RwLock<Option<Arc<LoadedModel>>>,
}

impl Predictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_classifier(classifier: Box<dyn Classifier>) -> Result<Self> {
        let p = Self::new();
        p.install(classifier)?;
        Ok(p)
    }

    pub fn load(&self, source: &ModelSource) -> Result<()> {
        let classifier = source.open()?;
        let name = classifier.name().to_string();
        let width = self.install(classifier).map_err(|e| {
            DelayError::load(source.path().display().to_string(), e)
        })?;
        tracing::info!(
            "model loaded from {} (backend={}, features={})",
            source.path().display(),
            name,
            width
        );
        Ok(())
    }

    fn install(&self, classifier: Box<dyn Classifier>) -> Result<usize> {
        let loaded = Arc::new(LoadedModel::new(classifier)?);
        let width = loaded.schema.len();
        *self.inner.write() = Some(loaded);
        Ok(width)
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().is_some()
    }

    pub fn schema(&self) -> Option<Arc<FeatureSchema>> {
        self.inner.read().as_ref().map(|m| m.schema.clone())
    }

    /// Serving-mode encoder bound to the loaded schema, training-mode when unloaded.
    pub fn encoder(&self) -> FeatureEncoder {
        match self.schema() {
            Some(s) => FeatureEncoder::serving(s),
            None => FeatureEncoder::training(),
        }
    }

    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<i64>> {
        // clone out so the lock is not held during inference
        let model = self.inner.read().clone().ok_or(DelayError::NotLoaded)?;

        if x.columns() != model.schema.columns() {
            return Err(DelayError::SchemaMismatch {
                expected: model.schema.len(),
                got: x.n_cols(),
            });
        }

        let labels = model.classifier.predict(x)?;
        if labels.len() != x.n_rows() {
            return Err(DelayError::Inference(format!(
                "classifier returned {} labels for {} rows",
                labels.len(),
                x.n_rows()
            )));
        }
        Ok(labels)
    }

    /// Runs a single all-zero row through the model.
    pub fn warmup(&self) -> Result<()> {
        let schema = self.schema().ok_or(DelayError::NotLoaded)?;
        let probe = FeatureMatrix::zeros(schema.columns().to_vec(), 1);
        self.predict(&probe).map(|_| ())
    }
}
