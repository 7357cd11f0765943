//! Per-source layout: one independent 1-D dataset per source.
//!
//! Each source of the population gets its own extensible vector under
//! `/data/{nonuniform|event}/<population>/<field>/<dataset>`, named by the
//! caller, with (for nonuniform data) a private time vector under
//! `/map/time`. The mapping's row for a source gains a reference to that
//! source's dataset the first time the source is written; datasets are
//! created lazily, so sources can join across batches as long as the batch
//! still covers the whole population.

use indexmap::IndexMap;
use tracing::debug;

use dendrite_model::SourceId;
use dendrite_store::{ObjectId, Payload, Vector};

use crate::append::{check_sources, per_source_time_name};
use crate::batch::{EventBatch, TimedBatch};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::mapping::{MappingHandle, Namespace};
use crate::recorder::Recorder;

impl Recorder {
    /// Append nonuniform samples, one dataset and one time vector per
    /// source.
    ///
    /// `names` assigns each source its dataset name and must cover exactly
    /// the mapping's sources. Each source's dataset and time vector grow
    /// independently by that source's new-sample count. Returns the
    /// (dataset, time vector) ids per source in mapping order. Valid only
    /// under the per-source dialect.
    pub fn append_nonuniform_per_source(
        &mut self,
        mapping: &MappingHandle,
        batch: &TimedBatch,
        names: &IndexMap<SourceId, String>,
        fixed: bool,
    ) -> Result<IndexMap<SourceId, (ObjectId, ObjectId)>> {
        if self.dialect() != Dialect::PerSource {
            return Err(Error::DialectMismatch {
                required: "per-source",
                configured: self.dialect(),
            });
        }
        check_sources(mapping, batch.sources())?;
        check_sources(mapping, names.keys())?;
        check_timed_rows(mapping, batch)?;

        let group = self.data_group(Namespace::Nonuniform, mapping.population())?;
        let data_group = self.store.require_group(group, batch.field())?;
        self.store.set_attr(data_group, "source", mapping.dataset());

        self.require_metadata_if_creating(
            data_group,
            mapping,
            names,
            batch.field(),
            &batch.unit,
            Some(&batch.time_unit),
        )?;

        let time_group = self.store.resolve("/map/time")?;
        let mut out = IndexMap::new();
        for (row, source) in mapping.sources().iter().enumerate() {
            let (data, times) = batch
                .row(source)
                .expect("source sets verified equal");
            let name = names.get(source).expect("source sets verified equal");

            if let Some(dataset) = self.store.child(data_group, name) {
                let ts_name = per_source_time_name(mapping.population(), batch.field(), name);
                let times_ds = self.store.resolve(&format!("/map/time/{ts_name}"))?;
                self.store.vector_mut(dataset)?.append(data)?;
                self.store.vector_mut(times_ds)?.append(times)?;
                out.insert(source.clone(), (dataset, times_ds));
                continue;
            }

            let bound = fixed.then_some(data.len());
            let dataset = self.store.create_dataset(
                data_group,
                name,
                Payload::Vector(Vector::new(data.to_vec(), bound)),
            )?;
            let unit = batch
                .unit
                .as_deref()
                .expect("unit checked before any dataset creation");
            self.store.set_attr(dataset, "unit", unit);
            self.store.set_attr(dataset, "field", batch.field());
            self.store.set_attr(dataset, "source", source.as_str());
            self.store.set_attr(dataset, "dtype", batch.dtype.as_str());
            self.store
                .source_refs_mut(mapping.dataset())?
                .set_ref(row, dataset)?;

            let ts_name = per_source_time_name(mapping.population(), batch.field(), name);
            let times_ds = self.store.create_dataset(
                time_group,
                &ts_name,
                Payload::Vector(Vector::new(times.to_vec(), bound)),
            )?;
            let time_unit = batch
                .time_unit
                .as_deref()
                .expect("timeunit checked before any dataset creation");
            self.store.set_attr(times_ds, "unit", time_unit);
            self.store.set_attr(dataset, "time", times_ds);
            debug!(path = %self.store.path_of(dataset), samples = data.len(), "created per-source array");
            out.insert(source.clone(), (dataset, times_ds));
        }
        Ok(out)
    }

    /// Append event times, one dataset per source.
    ///
    /// As [`append_nonuniform_per_source`](Recorder::append_nonuniform_per_source)
    /// but without time vectors; the event times are the payload. Valid
    /// under the per-source and shared-time dialects, which both store
    /// events this way.
    pub fn append_event_per_source(
        &mut self,
        mapping: &MappingHandle,
        batch: &EventBatch,
        names: &IndexMap<SourceId, String>,
        fixed: bool,
    ) -> Result<IndexMap<SourceId, ObjectId>> {
        match self.dialect() {
            Dialect::PerSource | Dialect::SharedTime => {}
            configured => {
                return Err(Error::DialectMismatch {
                    required: "per-source or shared-time",
                    configured,
                })
            }
        }
        check_sources(mapping, batch.sources())?;
        check_sources(mapping, names.keys())?;

        let group = self.data_group(Namespace::Event, mapping.population())?;
        let data_group = self.store.require_group(group, batch.field())?;
        self.store.set_attr(data_group, "source", mapping.dataset());

        self.require_metadata_if_creating(
            data_group,
            mapping,
            names,
            batch.field(),
            &batch.unit,
            None,
        )?;

        let mut out = IndexMap::new();
        for (row, source) in mapping.sources().iter().enumerate() {
            let data = batch.row(source).expect("source sets verified equal");
            let name = names.get(source).expect("source sets verified equal");

            if let Some(dataset) = self.store.child(data_group, name) {
                self.store.vector_mut(dataset)?.append(data)?;
                out.insert(source.clone(), dataset);
                continue;
            }

            let bound = fixed.then_some(data.len());
            let dataset = self.store.create_dataset(
                data_group,
                name,
                Payload::Vector(Vector::new(data.to_vec(), bound)),
            )?;
            let unit = batch
                .unit
                .as_deref()
                .expect("unit checked before any dataset creation");
            self.store.set_attr(dataset, "unit", unit);
            self.store.set_attr(dataset, "field", batch.field());
            self.store.set_attr(dataset, "source", source.as_str());
            self.store.set_attr(dataset, "dtype", batch.dtype.as_str());
            self.store
                .source_refs_mut(mapping.dataset())?
                .set_ref(row, dataset)?;
            debug!(path = %self.store.path_of(dataset), events = data.len(), "created per-source event array");
            out.insert(source.clone(), dataset);
        }
        Ok(out)
    }

    /// Validate creation metadata up front when this batch will create at
    /// least one dataset, so no dataset is written before the whole batch
    /// is known to be creatable.
    fn require_metadata_if_creating(
        &self,
        data_group: ObjectId,
        mapping: &MappingHandle,
        names: &IndexMap<SourceId, String>,
        field: &str,
        unit: &Option<String>,
        time_unit: Option<&Option<String>>,
    ) -> Result<()> {
        let creating = mapping.sources().iter().any(|source| {
            names
                .get(source)
                .is_some_and(|name| self.store.child(data_group, name).is_none())
        });
        if !creating {
            return Ok(());
        }
        if unit.is_none() {
            return Err(Error::MissingMetadata {
                field: field.to_string(),
                what: "unit",
            });
        }
        if let Some(time_unit) = time_unit {
            if time_unit.is_none() {
                return Err(Error::MissingMetadata {
                    field: field.to_string(),
                    what: "timeunit",
                });
            }
        }
        Ok(())
    }
}

/// Per-source (data, time) vectors must agree in length.
fn check_timed_rows(mapping: &MappingHandle, batch: &TimedBatch) -> Result<()> {
    for source in mapping.sources() {
        let (data, times) = batch
            .row(source)
            .expect("source sets verified equal");
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
    Ok(())
}
