//! Ragged layout: one variable-length row per source.
//!
//! The whole population shares a single 2-D array whose rows are
//! independently sized. There is no in-place partial extension: an append
//! reads a source's current row, concatenates the new samples, and
//! rewrites the row wholesale. Rows are processed in mapping order, so a
//! failure partway through an append leaves earlier rows already extended:
//! the documented non-atomic limitation of this layout.

use tracing::debug;

use dendrite_store::{ObjectId, Payload, Ragged};

use crate::append::{check_sources, time_series_name};
use crate::batch::{EventBatch, TimedBatch};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::mapping::{MappingHandle, Namespace};
use crate::recorder::Recorder;

impl Recorder {
    /// Append nonuniform samples into the population's ragged array.
    ///
    /// Creates `/data/nonuniform/<population>/<field>` and the matching
    /// ragged time array `/map/time/<population>_<field>` on first write.
    /// With `fixed = true` both arrays are sealed after the creating batch
    /// and every later rewrite fails. Valid only under the ragged dialect.
    pub fn append_nonuniform_ragged(
        &mut self,
        mapping: &MappingHandle,
        batch: &TimedBatch,
        fixed: bool,
    ) -> Result<ObjectId> {
        if self.dialect() != Dialect::Ragged {
            return Err(Error::DialectMismatch {
                required: "ragged",
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
        let existing = self.store.child(group, batch.field());
        let created = existing.is_none();
        let (dataset, times_ds) = match existing {
            Some(dataset) => {
                let times_ds = self.store.resolve(&format!("/map/time/{ts_name}"))?;
                (dataset, times_ds)
            }
            None => {
                let unit = super::regular::require_unit(batch.field(), &batch.unit)?;
                let time_unit =
                    super::regular::require_time_unit(batch.field(), &batch.time_unit)?;
                let unit = unit.to_string();
                let time_unit = time_unit.to_string();
                let rows = mapping.len();
                let dataset = self.store.create_dataset(
                    group,
                    batch.field(),
                    Payload::Ragged(Ragged::new(rows)),
                )?;
                let time_group = self.store.resolve("/map/time")?;
                let times_ds = self.store.create_dataset(
                    time_group,
                    &ts_name,
                    Payload::Ragged(Ragged::new(rows)),
                )?;
                self.store.set_attr(times_ds, "unit", time_unit);
                self.store.set_attr(dataset, "source", mapping.dataset());
                self.store.set_attr(dataset, "time", times_ds);
                self.store.set_attr(dataset, "field", batch.field());
                self.store.set_attr(dataset, "unit", unit);
                self.store.set_attr(dataset, "dtype", batch.dtype.as_str());
                debug!(path = %self.store.path_of(dataset), rows, "created ragged array");
                (dataset, times_ds)
            }
        };

        for (row, source) in mapping.sources().iter().enumerate() {
            let (data, times) = batch.row(source).expect("source sets verified equal");
            let mut merged = self.store.ragged(dataset)?.row(row)?.to_vec();
            merged.extend_from_slice(data);
            self.store.ragged_mut(dataset)?.set_row(row, merged)?;
            let mut merged_times = self.store.ragged(times_ds)?.row(row)?.to_vec();
            merged_times.extend_from_slice(times);
            self.store.ragged_mut(times_ds)?.set_row(row, merged_times)?;
        }

        if fixed && created {
            self.store.ragged_mut(dataset)?.seal();
            self.store.ragged_mut(times_ds)?.seal();
        }
        Ok(dataset)
    }

    /// Append event times into the population's ragged array.
    ///
    /// As [`append_nonuniform_ragged`](Recorder::append_nonuniform_ragged)
    /// but without a time array; the event times are the payload, stored
    /// under `/data/event/<population>/<field>`.
    pub fn append_event_ragged(
        &mut self,
        mapping: &MappingHandle,
        batch: &EventBatch,
        fixed: bool,
    ) -> Result<ObjectId> {
        if self.dialect() != Dialect::Ragged {
            return Err(Error::DialectMismatch {
                required: "ragged",
                configured: self.dialect(),
            });
        }
        check_sources(mapping, batch.sources())?;

        let group = self.data_group(Namespace::Event, mapping.population())?;
        let existing = self.store.child(group, batch.field());
        let created = existing.is_none();
        let dataset = match existing {
            Some(dataset) => dataset,
            None => {
                let unit = super::regular::require_unit(batch.field(), &batch.unit)?.to_string();
                let rows = mapping.len();
                let dataset = self.store.create_dataset(
                    group,
                    batch.field(),
                    Payload::Ragged(Ragged::new(rows)),
                )?;
                self.store.set_attr(dataset, "source", mapping.dataset());
                self.store.set_attr(dataset, "field", batch.field());
                self.store.set_attr(dataset, "unit", unit);
                self.store.set_attr(dataset, "dtype", batch.dtype.as_str());
                debug!(path = %self.store.path_of(dataset), rows, "created ragged event array");
                dataset
            }
        };

        for (row, source) in mapping.sources().iter().enumerate() {
            let data = batch.row(source).expect("source sets verified equal");
            let mut merged = self.store.ragged(dataset)?.row(row)?.to_vec();
            merged.extend_from_slice(data);
            self.store.ragged_mut(dataset)?.set_row(row, merged)?;
        }

        if fixed && created {
            self.store.ragged_mut(dataset)?.seal();
        }
        Ok(dataset)
    }
}
