//! Source mappings: the declared row order of a population.
//!
//! A mapping persists the ordered source-id list of one population under
//! `/map/<namespace>/<population>` and defines, once and for all, the row
//! order of every stored array for that population. Declarations are
//! one-shot: re-declaring a name in the same namespace is a conflict, and
//! nothing ever reorders a mapping.

use std::fmt;

use tracing::warn;

use dendrite_model::SourceId;
use dendrite_store::{ObjectId, Payload, SourceRefRows, StringVec};

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::link::LinkOutcome;
use crate::recorder::Recorder;

/// Sampling namespace a mapping (and its data) lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Regular fixed-step recordings.
    Uniform,
    /// Nonuniformly sampled recordings.
    Nonuniform,
    /// Event recordings.
    Event,
    /// Time-invariant values.
    Static,
}

impl Namespace {
    /// Path segment under `/map` and `/data`.
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Uniform => "uniform",
            Namespace::Nonuniform => "nonuniform",
            Namespace::Event => "event",
            Namespace::Static => "static",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a declared source mapping.
///
/// Returned by the `declare_*` operations and required by every append.
/// The handle caches the declared source order; the authoritative copy
/// lives in the store dataset it points at.
#[derive(Debug, Clone)]
pub struct MappingHandle {
    pub(crate) namespace: Namespace,
    pub(crate) population: String,
    pub(crate) field: Option<String>,
    pub(crate) dataset: ObjectId,
    pub(crate) sources: Vec<SourceId>,
}

impl MappingHandle {
    /// Namespace the mapping was declared under.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Population name.
    pub fn population(&self) -> &str {
        &self.population
    }

    /// Field name, for per-source mappings.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Store id of the mapping dataset.
    pub fn dataset(&self) -> ObjectId {
        self.dataset
    }

    /// Declared source order.
    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }

    /// Number of sources (row count of every aligned array).
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True when the mapping has no sources (never constructed).
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Recorder {
    /// Declare a population for regular fixed-step recordings under
    /// `/map/uniform/<population>`.
    pub fn declare_uniform(
        &mut self,
        population: &str,
        sources: &[SourceId],
    ) -> Result<MappingHandle> {
        self.declare_id_list(Namespace::Uniform, population, sources)
    }

    /// Declare a population for time-invariant values under
    /// `/map/static/<population>`.
    pub fn declare_static(
        &mut self,
        population: &str,
        sources: &[SourceId],
    ) -> Result<MappingHandle> {
        self.declare_id_list(Namespace::Static, population, sources)
    }

    /// Declare a population for nonuniform recordings stored as one array
    /// per field, under `/map/nonuniform/<population>`.
    ///
    /// Valid under the `SharedTime`, `Ragged` and `Padded` dialects; the
    /// `PerSource` dialect keys its mappings by field instead
    /// ([`declare_nonuniform_per_source`](Recorder::declare_nonuniform_per_source)).
    pub fn declare_nonuniform(
        &mut self,
        population: &str,
        sources: &[SourceId],
    ) -> Result<MappingHandle> {
        match self.dialect() {
            Dialect::SharedTime | Dialect::Ragged | Dialect::Padded => {
                self.declare_id_list(Namespace::Nonuniform, population, sources)
            }
            Dialect::PerSource => Err(Error::DialectMismatch {
                required: "shared-time, ragged or padded",
                configured: self.dialect(),
            }),
        }
    }

    /// Declare a population for event recordings stored as one array per
    /// field, under `/map/event/<population>`.
    ///
    /// Valid under the `Ragged` and `Padded` dialects; the per-source
    /// layouts use
    /// [`declare_event_per_source`](Recorder::declare_event_per_source).
    pub fn declare_event(
        &mut self,
        population: &str,
        sources: &[SourceId],
    ) -> Result<MappingHandle> {
        match self.dialect() {
            Dialect::Ragged | Dialect::Padded => {
                self.declare_id_list(Namespace::Event, population, sources)
            }
            Dialect::PerSource | Dialect::SharedTime => Err(Error::DialectMismatch {
                required: "ragged or padded",
                configured: self.dialect(),
            }),
        }
    }

    /// Declare a population for nonuniform per-source recordings of one
    /// field, under `/map/nonuniform/<population>/<field>`.
    ///
    /// Each row pairs a source id with a slot for a reference to that
    /// source's dataset; the slot is filled on the source's first write.
    /// Valid only under the `PerSource` dialect.
    pub fn declare_nonuniform_per_source(
        &mut self,
        population: &str,
        field: &str,
        sources: &[SourceId],
    ) -> Result<MappingHandle> {
        match self.dialect() {
            Dialect::PerSource => {
                self.declare_ref_rows(Namespace::Nonuniform, population, field, sources)
            }
            _ => Err(Error::DialectMismatch {
                required: "per-source",
                configured: self.dialect(),
            }),
        }
    }

    /// Declare a population for per-source event recordings of one field,
    /// under `/map/event/<population>/<field>`.
    ///
    /// Valid under the `PerSource` and `SharedTime` dialects, which both
    /// store event data as one 1-D dataset per source.
    pub fn declare_event_per_source(
        &mut self,
        population: &str,
        field: &str,
        sources: &[SourceId],
    ) -> Result<MappingHandle> {
        match self.dialect() {
            Dialect::PerSource | Dialect::SharedTime => {
                self.declare_ref_rows(Namespace::Event, population, field, sources)
            }
            _ => Err(Error::DialectMismatch {
                required: "per-source or shared-time",
                configured: self.dialect(),
            }),
        }
    }

    fn check_sources_nonempty(population: &str, sources: &[SourceId]) -> Result<()> {
        if sources.is_empty() {
            return Err(Error::EmptyInput {
                population: population.to_string(),
            });
        }
        Ok(())
    }

    fn declare_id_list(
        &mut self,
        namespace: Namespace,
        population: &str,
        sources: &[SourceId],
    ) -> Result<MappingHandle> {
        Self::check_sources_nonempty(population, sources)?;
        let base = self
            .store
            .resolve(&format!("/map/{}", namespace.as_str()))?;
        if self.store.child(base, population).is_some() {
            return Err(Error::Conflict {
                namespace,
                population: population.to_string(),
            });
        }
        let ids = sources.iter().map(|id| id.as_str().to_string()).collect();
        let dataset =
            self.store
                .create_dataset(base, population, Payload::Strings(StringVec::new(ids)))?;
        self.link_declared(dataset, sources);
        Ok(MappingHandle {
            namespace,
            population: population.to_string(),
            field: None,
            dataset,
            sources: sources.to_vec(),
        })
    }

    fn declare_ref_rows(
        &mut self,
        namespace: Namespace,
        population: &str,
        field: &str,
        sources: &[SourceId],
    ) -> Result<MappingHandle> {
        Self::check_sources_nonempty(population, sources)?;
        let base = self
            .store
            .resolve(&format!("/map/{}", namespace.as_str()))?;
        let popgrp = self.store.require_group(base, population)?;
        if self.store.child(popgrp, field).is_some() {
            return Err(Error::Conflict {
                namespace,
                population: format!("{population}/{field}"),
            });
        }
        let ids = sources.iter().map(|id| id.as_str().to_string()).collect();
        let dataset = self.store.create_dataset(
            popgrp,
            field,
            Payload::SourceRefs(SourceRefRows::new(ids)),
        )?;
        self.link_declared(dataset, sources);
        Ok(MappingHandle {
            namespace,
            population: population.to_string(),
            field: Some(field.to_string()),
            dataset,
            sources: sources.to_vec(),
        })
    }

    /// Run the cross-reference linker for a freshly declared mapping and
    /// log the outcome. A skipped link never fails the declaration.
    fn link_declared(&mut self, dataset: ObjectId, sources: &[SourceId]) {
        match self.link_mapping(dataset, sources) {
            LinkOutcome::Linked { .. } => {}
            LinkOutcome::Skipped { reason } => {
                warn!(
                    mapping = %self.store.path_of(dataset),
                    %reason,
                    "mapping not linked to model tree"
                );
            }
        }
    }
}
