//! Regular 2-D layouts: fixed-step, shared-time, and static arrays.
//!
//! All three store one equal-length row per source in a single extensible
//! matrix and grow by appending whole columns. They differ only in their
//! time axis: fixed-step carries `dt`/`tstart` attributes, shared-time
//! carries an explicit time vector that grows in lock-step with the data
//! columns, and static data has no time axis at all.

use tracing::debug;

use dendrite_store::{Matrix, ObjectId, Payload, Vector};

use crate::append::{check_even_rows, check_sources, ordered_rows, time_series_name};
use crate::batch::{SharedTimeBatch, StaticBatch, UniformBatch};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::mapping::{MappingHandle, Namespace};
use crate::recorder::Recorder;

impl Recorder {
    /// Append regular fixed-step samples for every source of a population.
    ///
    /// Creates `/data/uniform/<population>/<field>` on first write, sized
    /// to the batch; later calls append columns after the last column.
    /// `tstart` and the batch's `dt` are fixed at creation. With
    /// `fixed = true` the width is capped at the creating batch's column
    /// count. Valid under every dialect.
    pub fn append_uniform(
        &mut self,
        mapping: &MappingHandle,
        batch: &UniformBatch,
        tstart: f64,
        fixed: bool,
    ) -> Result<ObjectId> {
        check_sources(mapping, batch.sources())?;
        let rows = ordered_rows(mapping, |source| batch.row(source));
        let cols = check_even_rows(batch.field(), &rows)?;

        let group = self.data_group(Namespace::Uniform, mapping.population())?;
        if let Some(dataset) = self.store.child(group, batch.field()) {
            self.store.matrix_mut(dataset)?.append_cols(&rows)?;
            return Ok(dataset);
        }

        if batch.dt <= 0.0 {
            return Err(Error::MissingMetadata {
                field: batch.field().to_string(),
                what: "positive dt",
            });
        }
        let unit = require_unit(batch.field(), &batch.unit)?;
        let time_unit = require_time_unit(batch.field(), &batch.time_unit)?;

        let matrix = Matrix::from_rows(&rows, fixed.then_some(cols), 0.0)?;
        let dataset = self
            .store
            .create_dataset(group, batch.field(), Payload::Matrix(matrix))?;
        self.store.set_attr(dataset, "source", mapping.dataset());
        self.store.set_attr(dataset, "tstart", tstart);
        self.store.set_attr(dataset, "dt", batch.dt);
        self.store.set_attr(dataset, "field", batch.field());
        self.store.set_attr(dataset, "unit", unit);
        self.store.set_attr(dataset, "timeunit", time_unit);
        self.store.set_attr(dataset, "dtype", batch.dtype.as_str());
        debug!(path = %self.store.path_of(dataset), rows = rows.len(), cols, "created uniform array");
        Ok(dataset)
    }

    /// Append nonuniform samples sharing one explicit time vector.
    ///
    /// Creates `/data/nonuniform/<population>/<field>` and its time vector
    /// `/map/time/<population>_<field>` on first write; both grow in
    /// lock-step on later calls. The batch's time vector length must equal
    /// its column count. Valid only under the shared-time dialect.
    pub fn append_nonuniform_regular(
        &mut self,
        mapping: &MappingHandle,
        batch: &SharedTimeBatch,
        fixed: bool,
    ) -> Result<ObjectId> {
        if self.dialect() != Dialect::SharedTime {
            return Err(Error::DialectMismatch {
                required: "shared-time",
                configured: self.dialect(),
            });
        }
        check_sources(mapping, batch.sources())?;
        let rows = ordered_rows(mapping, |source| batch.row(source));
        let cols = check_even_rows(batch.field(), &rows)?;
        if batch.times().len() != cols {
            return Err(Error::ShapeMismatch {
                field: batch.field().to_string(),
                detail: format!(
                    "time vector has {} entries for {} data columns",
                    batch.times().len(),
                    cols
                ),
            });
        }

        let group = self.data_group(Namespace::Nonuniform, mapping.population())?;
        let ts_path = format!(
            "/map/time/{}",
            time_series_name(mapping.population(), batch.field())
        );
        if let Some(dataset) = self.store.child(group, batch.field()) {
            let times = self.store.resolve(&ts_path)?;
            self.store.matrix_mut(dataset)?.append_cols(&rows)?;
            self.store.vector_mut(times)?.append(batch.times())?;
            return Ok(dataset);
        }

        let unit = require_unit(batch.field(), &batch.unit)?;
        let time_unit = require_time_unit(batch.field(), &batch.time_unit)?;

        let matrix = Matrix::from_rows(&rows, fixed.then_some(cols), 0.0)?;
        let dataset = self
            .store
            .create_dataset(group, batch.field(), Payload::Matrix(matrix))?;
        let time_group = self.store.resolve("/map/time")?;
        let times = self.store.create_dataset(
            time_group,
            &time_series_name(mapping.population(), batch.field()),
            Payload::Vector(Vector::new(batch.times().to_vec(), fixed.then_some(cols))),
        )?;
        self.store.set_attr(times, "unit", time_unit);
        self.store.set_attr(dataset, "source", mapping.dataset());
        self.store.set_attr(dataset, "time", times);
        self.store.set_attr(dataset, "field", batch.field());
        self.store.set_attr(dataset, "unit", unit);
        self.store.set_attr(dataset, "dtype", batch.dtype.as_str());
        debug!(path = %self.store.path_of(dataset), rows = rows.len(), cols, "created shared-time array");
        Ok(dataset)
    }

    /// Append time-invariant values for every source of a population.
    ///
    /// Creates `/data/static/<population>/<field>` on first write. Static
    /// data is usually a one-shot write, so callers typically pass
    /// `fixed = true`. Valid under every dialect.
    pub fn append_static(
        &mut self,
        mapping: &MappingHandle,
        batch: &StaticBatch,
        fixed: bool,
    ) -> Result<ObjectId> {
        check_sources(mapping, batch.sources())?;
        let rows = ordered_rows(mapping, |source| batch.row(source));
        let cols = check_even_rows(batch.field(), &rows)?;

        let group = self.data_group(Namespace::Static, mapping.population())?;
        if let Some(dataset) = self.store.child(group, batch.field()) {
            self.store.matrix_mut(dataset)?.append_cols(&rows)?;
            return Ok(dataset);
        }

        let unit = require_unit(batch.field(), &batch.unit)?;
        let matrix = Matrix::from_rows(&rows, fixed.then_some(cols), 0.0)?;
        let dataset = self
            .store
            .create_dataset(group, batch.field(), Payload::Matrix(matrix))?;
        self.store.set_attr(dataset, "source", mapping.dataset());
        self.store.set_attr(dataset, "field", batch.field());
        self.store.set_attr(dataset, "unit", unit);
        self.store.set_attr(dataset, "dtype", batch.dtype.as_str());
        debug!(path = %self.store.path_of(dataset), rows = rows.len(), cols, "created static array");
        Ok(dataset)
    }
}

/// Creation-time unit check.
pub(crate) fn require_unit<'a>(field: &str, unit: &'a Option<String>) -> Result<&'a str> {
    unit.as_deref().ok_or_else(|| Error::MissingMetadata {
        field: field.to_string(),
        what: "unit",
    })
}

/// Creation-time time-unit check.
pub(crate) fn require_time_unit<'a>(field: &str, unit: &'a Option<String>) -> Result<&'a str> {
    unit.as_deref().ok_or_else(|| Error::MissingMetadata {
        field: field.to_string(),
        what: "timeunit",
    })
}
