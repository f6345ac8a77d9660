//! One-hot expansion of raw flight records and alignment to a trained schema.

use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::{DelayError, Result};
use crate::types::RawRecord;

/// Categorical attributes in the order their indicator groups are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Carrier,
    FlightType,
    Month,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [Attribute::Carrier, Attribute::FlightType, Attribute::Month];

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Carrier => "OPERA",
            Attribute::FlightType => "TIPOVUELO",
            Attribute::Month => "MES",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    fn column(self, value: &str) -> String {
        format!("{}_{}", self.name(), value)
    }

    fn raw_value(self, r: &RawRecord) -> Value {
        match self {
            Attribute::Carrier => Value::from(r.carrier.clone()),
            Attribute::FlightType => Value::from(r.flight_type.clone()),
            Attribute::Month => Value::from(r.month),
        }
    }

    fn indicator(self, r: &RawRecord) -> String {
        match self {
            Attribute::Carrier => self.column(&r.carrier),
            Attribute::FlightType => self.column(&r.flight_type),
            Attribute::Month => self.column(&r.month.to_string()),
        }
    }

    /// Distinct observed values as column names, in the group's natural order.
    fn observed_columns(self, batch: &[RawRecord]) -> Vec<String> {
        match self {
            Attribute::Month => batch
                .iter()
                .map(|r| r.month)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|m| self.column(&m.to_string()))
                .collect(),
            Attribute::Carrier | Attribute::FlightType => batch
                .iter()
                .map(|r| match self {
                    Attribute::Carrier => r.carrier.as_str(),
                    _ => r.flight_type.as_str(),
                })
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|v| self.column(v))
                .collect(),
        }
    }
}

/// Ordered column names a classifier was fit on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, c) in columns.iter().enumerate() {
            if index.insert(c.clone(), i).is_some() {
                return Err(DelayError::Validation(format!(
                    "duplicate feature column {:?}",
                    c
                )));
            }
        }
        Ok(Self { columns, index })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }
}

/// Row-major {0,1} matrix, one row per input record.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Vec<f32>,
    n_rows: usize,
}

impl FeatureMatrix {
    pub fn zeros(columns: Vec<String>, n_rows: usize) -> Self {
        let values = vec![0.0; columns.len() * n_rows];
        Self {
            columns,
            values,
            n_rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn row(&self, i: usize) -> &[f32] {
        let w = self.n_cols();
        &self.values[i * w..(i + 1) * w]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Value at (`row`, `column`), `None` if either is out of range.
    pub fn get(&self, row: usize, column: &str) -> Option<f32> {
        if row >= self.n_rows {
            return None;
        }
        let c = self.columns.iter().position(|x| x == column)?;
        self.row(row).get(c).copied()
    }

    fn set(&mut self, row: usize, col: usize) {
        let w = self.n_cols();
        self.values[row * w + col] = 1.0;
    }
}

/// Whether encoding aligns to a trained schema.
#[derive(Debug, Clone)]
pub enum EncodeMode {
    /// No schema yet: columns are whatever indicators the batch produces.
    Training,
    /// Columns are exactly the schema; missing ones zero-filled, unknown ones dropped.
    Serving(Arc<FeatureSchema>),
}

#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    mode: EncodeMode,
}

impl FeatureEncoder {
    pub fn new(mode: EncodeMode) -> Self {
        Self { mode }
    }

    pub fn training() -> Self {
        Self::new(EncodeMode::Training)
    }

    pub fn serving(schema: Arc<FeatureSchema>) -> Self {
        Self::new(EncodeMode::Serving(schema))
    }

    pub fn mode(&self) -> &EncodeMode {
        &self.mode
    }

    pub fn encode(&self, batch: &[RawRecord]) -> Result<FeatureMatrix> {
        self.encode_attributes(batch, &Attribute::ALL)
    }

    /// Like [`encode`](Self::encode), and also pulls the raw `target` value out
    /// of every record. A target naming one of the attributes is not expanded.
    pub fn encode_with_target(
        &self,
        batch: &[RawRecord],
        target: &str,
    ) -> Result<(FeatureMatrix, Vec<Value>)> {
        let excluded = Attribute::from_name(target);
        let attrs: Vec<Attribute> = Attribute::ALL
            .into_iter()
            .filter(|a| Some(*a) != excluded)
            .collect();
        let features = self.encode_attributes(batch, &attrs)?;

        let mut values = Vec::with_capacity(batch.len());
        for (i, r) in batch.iter().enumerate() {
            let v = match excluded {
                Some(a) => a.raw_value(r),
                None => r.extra.get(target).cloned().ok_or_else(|| {
                    DelayError::Validation(format!(
                        "record {}: missing target column {:?}",
                        i, target
                    ))
                })?,
            };
            values.push(v);
        }
        Ok((features, values))
    }

    fn encode_attributes(&self, batch: &[RawRecord], attrs: &[Attribute]) -> Result<FeatureMatrix> {
        match &self.mode {
            EncodeMode::Training => {
                let columns: Vec<String> = attrs
                    .iter()
                    .flat_map(|a| a.observed_columns(batch))
                    .collect();
                // observed columns are unique across groups, so the schema cannot fail
                let layout = FeatureSchema::new(columns)?;
                Ok(fill(layout.columns().to_vec(), |c| layout.position(c), batch, attrs))
            }
            EncodeMode::Serving(schema) => Ok(fill(
                schema.columns().to_vec(),
                |c| schema.position(c),
                batch,
                attrs,
            )),
        }
    }
}

fn fill<F>(columns: Vec<String>, position: F, batch: &[RawRecord], attrs: &[Attribute]) -> FeatureMatrix
where
    F: Fn(&str) -> Option<usize>,
{
    let mut m = FeatureMatrix::zeros(columns, batch.len());
    for (i, r) in batch.iter().enumerate() {
        for a in attrs {
            if let Some(col) = position(&a.indicator(r)) {
                m.set(i, col);
            }
        }
    }
    m
}
