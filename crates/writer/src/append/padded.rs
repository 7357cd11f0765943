//! NaN-padded layout: fixed-width rows with a sentinel tail.
//!
//! The whole population shares a single 2-D array. Each row holds its
//! source's samples followed by NaN padding; the first sentinel cell in a
//! row is where that source's next append lands. The array's width is the
//! maximum written extent over all rows, so short rows keep a sentinel
//! tail after every append.
//!
//! Append offsets are computed for every row, then both the data and time
//! arrays are grown before any cell is written, so a capacity failure on
//! a fixed array leaves the store untouched.

use tracing::debug;

use dendrite_store::{Matrix, ObjectId, Payload};

use crate::append::{check_sources, time_series_name};
use crate::batch::{EventBatch, TimedBatch};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::mapping::{MappingHandle, Namespace};
use crate::recorder::Recorder;

/// First sentinel cell of a row: where the next append starts. A row with
/// no sentinel is fully original data and appends at its end.
fn pad_start(row: &[f64]) -> usize {
    row.iter()
        .position(|value| value.is_nan())
        .unwrap_or(row.len())
}

impl Recorder {
    /// Append nonuniform samples into the population's NaN-padded array.
    ///
    /// Creates `/data/nonuniform/<population>/<field>` and the padded time
    /// matrix `/map/time/<population>_<field>` on first write, both wide
    /// enough for the longest row. On later calls the width grows to
    /// `max(existing width, max(start + new samples))` per row and each
    /// row's new samples land at its first sentinel cell. With
    /// `fixed = true` the creation width is the permanent bound. Valid
    /// only under the padded dialect.
    pub fn append_nonuniform_padded(
        &mut self,
        mapping: &MappingHandle,
        batch: &TimedBatch,
        fixed: bool,
    ) -> Result<ObjectId> {
        if self.dialect() != Dialect::Padded {
            return Err(Error::DialectMismatch {
                required: "padded",
                configured: self.dialect(),
            });
        }
        check_sources(mapping, batch.sources())?;
        for source in mapping.sources() {
            let (data, times) = batch.row(source).expect("source sets verified equal");
            if data.len() != times.len() {
                return Err(Error::ShapeMismatch {
                    field: batch.field().to_string(),
                    detail: format!(
                        "source \"{source}\" has {} samples and {} times",
                        data.len(),
                        times.len()
                    ),
                });
            }
        }

        let group = self.data_group(Namespace::Nonuniform, mapping.population())?;
        let ts_name = time_series_name(mapping.population(), batch.field());

        if let Some(dataset) = self.store.child(group, batch.field()) {
            let times_ds = self.store.resolve(&format!("/map/time/{ts_name}"))?;
            let starts = self.pad_starts(dataset, mapping)?;

            let mut new_width = self.store.matrix(dataset)?.shape().1;
            for (row, source) in mapping.sources().iter().enumerate() {
                let (data, _) = batch.row(source).expect("source sets verified equal");
                new_width = new_width.max(starts[row] + data.len());
            }
            self.store.matrix_mut(dataset)?.grow_width(new_width)?;
            self.store.matrix_mut(times_ds)?.grow_width(new_width)?;

            for (row, source) in mapping.sources().iter().enumerate() {
                let (data, times) = batch.row(source).expect("source sets verified equal");
                self.store
                    .matrix_mut(dataset)?
                    .write_row_segment(row, starts[row], data)?;
                self.store
                    .matrix_mut(times_ds)?
                    .write_row_segment(row, starts[row], times)?;
            }
            return Ok(dataset);
        }

        let unit = super::regular::require_unit(batch.field(), &batch.unit)?.to_string();
        let time_unit =
            super::regular::require_time_unit(batch.field(), &batch.time_unit)?.to_string();

        let rows = mapping.len();
        let width = mapping
            .sources()
            .iter()
            .map(|source| batch.row(source).expect("source sets verified equal").0.len())
            .max()
            .unwrap_or(0);
        let bound = fixed.then_some(width);

        let mut data_matrix = Matrix::filled(rows, width, bound, f64::NAN);
        let mut time_matrix = Matrix::filled(rows, width, bound, f64::NAN);
        for (row, source) in mapping.sources().iter().enumerate() {
            let (data, times) = batch.row(source).expect("source sets verified equal");
            data_matrix.write_row_segment(row, 0, data)?;
            time_matrix.write_row_segment(row, 0, times)?;
        }

        let dataset =
            self.store
                .create_dataset(group, batch.field(), Payload::Matrix(data_matrix))?;
        let time_group = self.store.resolve("/map/time")?;
        let times_ds =
            self.store
                .create_dataset(time_group, &ts_name, Payload::Matrix(time_matrix))?;
        self.store.set_attr(times_ds, "unit", time_unit);
        self.store.set_attr(dataset, "source", mapping.dataset());
        self.store.set_attr(dataset, "time", times_ds);
        self.store.set_attr(dataset, "field", batch.field());
        self.store.set_attr(dataset, "unit", unit);
        self.store.set_attr(dataset, "dtype", batch.dtype.as_str());
        debug!(path = %self.store.path_of(dataset), rows, width, "created padded array");
        Ok(dataset)
    }

    /// Append event times into the population's NaN-padded array.
    ///
    /// As [`append_nonuniform_padded`](Recorder::append_nonuniform_padded)
    /// but without a time matrix, under `/data/event/<population>/<field>`.
    pub fn append_event_padded(
        &mut self,
        mapping: &MappingHandle,
        batch: &EventBatch,
        fixed: bool,
    ) -> Result<ObjectId> {
        if self.dialect() != Dialect::Padded {
            return Err(Error::DialectMismatch {
                required: "padded",
                configured: self.dialect(),
            });
        }
        check_sources(mapping, batch.sources())?;

        let group = self.data_group(Namespace::Event, mapping.population())?;

        if let Some(dataset) = self.store.child(group, batch.field()) {
            let starts = self.pad_starts(dataset, mapping)?;

            let mut new_width = self.store.matrix(dataset)?.shape().1;
            for (row, source) in mapping.sources().iter().enumerate() {
                let data = batch.row(source).expect("source sets verified equal");
                new_width = new_width.max(starts[row] + data.len());
            }
            self.store.matrix_mut(dataset)?.grow_width(new_width)?;

            for (row, source) in mapping.sources().iter().enumerate() {
                let data = batch.row(source).expect("source sets verified equal");
                self.store
                    .matrix_mut(dataset)?
                    .write_row_segment(row, starts[row], data)?;
            }
            return Ok(dataset);
        }

        let unit = super::regular::require_unit(batch.field(), &batch.unit)?.to_string();
        let rows = mapping.len();
        let width = mapping
            .sources()
            .iter()
            .map(|source| batch.row(source).expect("source sets verified equal").len())
            .max()
            .unwrap_or(0);

        let mut matrix = Matrix::filled(rows, width, fixed.then_some(width), f64::NAN);
        for (row, source) in mapping.sources().iter().enumerate() {
            let data = batch.row(source).expect("source sets verified equal");
            matrix.write_row_segment(row, 0, data)?;
        }

        let dataset = self
            .store
            .create_dataset(group, batch.field(), Payload::Matrix(matrix))?;
        self.store.set_attr(dataset, "source", mapping.dataset());
        self.store.set_attr(dataset, "field", batch.field());
        self.store.set_attr(dataset, "unit", unit);
        self.store.set_attr(dataset, "dtype", batch.dtype.as_str());
        debug!(path = %self.store.path_of(dataset), rows, width, "created padded event array");
        Ok(dataset)
    }

    /// Append start offset of every row: the first sentinel cell, or the
    /// full width for rows with no sentinel.
    fn pad_starts(&self, dataset: ObjectId, mapping: &MappingHandle) -> Result<Vec<usize>> {
        let matrix = self.store.matrix(dataset)?;
        let mut starts = Vec::with_capacity(mapping.len());
        for row in 0..mapping.len() {
            starts.push(pad_start(matrix.row(row)?));
        }
        Ok(starts)
    }
}

#[cfg(test)]
mod tests {
    use super::pad_start;

    #[test]
    fn pad_start_finds_first_sentinel() {
        assert_eq!(pad_start(&[1.0, 2.0, f64::NAN, f64::NAN]), 2);
        assert_eq!(pad_start(&[f64::NAN]), 0);
    }

    #[test]
    fn full_row_appends_at_end() {
        assert_eq!(pad_start(&[1.0, 2.0]), 2);
        assert_eq!(pad_start(&[]), 0);
    }
}
