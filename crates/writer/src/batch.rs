//! Data batches: the ephemeral payloads handed to the append engine.
//!
//! A batch covers one (population, field) pair for one write call. Rows are
//! keyed by source id in insertion order; the engine re-sorts them to the
//! mapping's declared order before anything touches the store, so callers
//! may insert in any order as long as the *set* of sources matches the
//! mapping exactly.
//!
//! Unit metadata is optional on the batch and checked by the engine at
//! array-creation time, so a batch without a unit can still be appended to an
//! array that already exists.

use indexmap::IndexMap;

use dendrite_model::SourceId;
use dendrite_store::Dtype;

/// Regular fixed-step samples: one equal-length row per source, implicit
/// time axis `tstart + k * dt`.
#[derive(Debug, Clone)]
pub struct UniformBatch {
    field: String,
    /// Physical unit of the samples; required at creation.
    pub unit: Option<String>,
    /// Unit of the implicit time axis; required at creation.
    pub time_unit: Option<String>,
    /// Sampling interval; must be positive at creation.
    pub dt: f64,
    /// Declared element width.
    pub dtype: Dtype,
    rows: IndexMap<SourceId, Vec<f64>>,
}

impl UniformBatch {
    /// Create an empty batch for `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            unit: None,
            time_unit: None,
            dt: 0.0,
            dtype: Dtype::default(),
            rows: IndexMap::new(),
        }
    }

    /// Set the sample unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the time unit.
    pub fn with_time_unit(mut self, unit: impl Into<String>) -> Self {
        self.time_unit = Some(unit.into());
        self
    }

    /// Set the sampling interval.
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Set the declared element width.
    pub fn with_dtype(mut self, dtype: Dtype) -> Self {
        self.dtype = dtype;
        self
    }

    /// Field this batch records.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Insert (or replace) one source's samples.
    pub fn insert(&mut self, source: impl Into<SourceId>, samples: Vec<f64>) {
        self.rows.insert(source.into(), samples);
    }

    /// Sources covered by this batch, in insertion order.
    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.rows.keys()
    }

    pub(crate) fn row(&self, source: &SourceId) -> Option<&[f64]> {
        self.rows.get(source).map(Vec::as_slice)
    }
}

/// Nonuniform samples on a shared explicit time axis: one equal-length row
/// per source plus one time vector covering every row.
#[derive(Debug, Clone)]
pub struct SharedTimeBatch {
    field: String,
    /// Physical unit of the samples; required at creation.
    pub unit: Option<String>,
    /// Unit of the shared time vector; required at creation.
    pub time_unit: Option<String>,
    /// Declared element width.
    pub dtype: Dtype,
    times: Vec<f64>,
    rows: IndexMap<SourceId, Vec<f64>>,
}

impl SharedTimeBatch {
    /// Create an empty batch for `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            unit: None,
            time_unit: None,
            dtype: Dtype::default(),
            times: Vec::new(),
            rows: IndexMap::new(),
        }
    }

    /// Set the sample unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the time unit.
    pub fn with_time_unit(mut self, unit: impl Into<String>) -> Self {
        self.time_unit = Some(unit.into());
        self
    }

    /// Set the shared sampling times for this batch's columns.
    pub fn with_times(mut self, times: Vec<f64>) -> Self {
        self.times = times;
        self
    }

    /// Field this batch records.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The shared sampling times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Insert (or replace) one source's samples.
    pub fn insert(&mut self, source: impl Into<SourceId>, samples: Vec<f64>) {
        self.rows.insert(source.into(), samples);
    }

    /// Sources covered by this batch, in insertion order.
    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.rows.keys()
    }

    pub(crate) fn row(&self, source: &SourceId) -> Option<&[f64]> {
        self.rows.get(source).map(Vec::as_slice)
    }
}

/// Nonuniform samples with per-source time axes: one (data, time) pair per
/// source, each pair's vectors equal in length.
#[derive(Debug, Clone)]
pub struct TimedBatch {
    field: String,
    /// Physical unit of the samples; required at creation.
    pub unit: Option<String>,
    /// Unit of the per-source time vectors; required at creation.
    pub time_unit: Option<String>,
    /// Declared element width.
    pub dtype: Dtype,
    rows: IndexMap<SourceId, (Vec<f64>, Vec<f64>)>,
}

impl TimedBatch {
    /// Create an empty batch for `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            unit: None,
            time_unit: None,
            dtype: Dtype::default(),
            rows: IndexMap::new(),
        }
    }

    /// Set the sample unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the time unit.
    pub fn with_time_unit(mut self, unit: impl Into<String>) -> Self {
        self.time_unit = Some(unit.into());
        self
    }

    /// Field this batch records.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Insert (or replace) one source's samples and their sampling times.
    pub fn insert(&mut self, source: impl Into<SourceId>, data: Vec<f64>, times: Vec<f64>) {
        self.rows.insert(source.into(), (data, times));
    }

    /// Sources covered by this batch, in insertion order.
    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.rows.keys()
    }

    pub(crate) fn row(&self, source: &SourceId) -> Option<(&[f64], &[f64])> {
        self.rows
            .get(source)
            .map(|(data, times)| (data.as_slice(), times.as_slice()))
    }
}

/// Event recordings: one vector of event times per source. The times are
/// the payload, so no separate time axis exists.
#[derive(Debug, Clone)]
pub struct EventBatch {
    field: String,
    /// Physical unit of the event times; required at creation.
    pub unit: Option<String>,
    /// Declared element width.
    pub dtype: Dtype,
    rows: IndexMap<SourceId, Vec<f64>>,
}

impl EventBatch {
    /// Create an empty batch for `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            unit: None,
            dtype: Dtype::default(),
            rows: IndexMap::new(),
        }
    }

    /// Set the unit of the event times.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Field this batch records.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Insert (or replace) one source's event times.
    pub fn insert(&mut self, source: impl Into<SourceId>, times: Vec<f64>) {
        self.rows.insert(source.into(), times);
    }

    /// Sources covered by this batch, in insertion order.
    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.rows.keys()
    }

    pub(crate) fn row(&self, source: &SourceId) -> Option<&[f64]> {
        self.rows.get(source).map(Vec::as_slice)
    }
}

/// Time-invariant values: one equal-length row per source, no time axis.
#[derive(Debug, Clone)]
pub struct StaticBatch {
    field: String,
    /// Physical unit of the values; required at creation.
    pub unit: Option<String>,
    /// Declared element width.
    pub dtype: Dtype,
    rows: IndexMap<SourceId, Vec<f64>>,
}

impl StaticBatch {
    /// Create an empty batch for `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            unit: None,
            dtype: Dtype::default(),
            rows: IndexMap::new(),
        }
    }

    /// Set the value unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Field this batch records.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Insert (or replace) one source's values.
    pub fn insert(&mut self, source: impl Into<SourceId>, values: Vec<f64>) {
        self.rows.insert(source.into(), values);
    }

    /// Sources covered by this batch, in insertion order.
    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.rows.keys()
    }

    pub(crate) fn row(&self, source: &SourceId) -> Option<&[f64]> {
        self.rows.get(source).map(Vec::as_slice)
    }
}
