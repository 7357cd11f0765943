//! The dialect append engine.
//!
//! Every append operation follows the same contract:
//!
//! 1. the batch's source set must equal the mapping's source set
//!    ([`Error::SourceMismatch`] otherwise, nothing written);
//! 2. batch rows are re-sorted to the mapping's declared order;
//! 3. a missing stored array is created after strict metadata validation
//!    ([`Error::MissingMetadata`] before anything is written);
//! 4. an existing stored array grows by the layout's append policy, never
//!    by truncation or reordering.
//!
//! One module per physical layout: `regular` (fixed-step, shared-time and
//! static 2-D arrays), `per_source` (independent 1-D datasets), `ragged`
//! (variable-length rows), `padded` (NaN-padded fixed width).

pub(crate) mod padded;
pub(crate) mod per_source;
pub(crate) mod ragged;
pub(crate) mod regular;

use std::collections::BTreeSet;

use dendrite_model::SourceId;
use dendrite_store::ObjectId;

use crate::error::{Error, Result};
use crate::mapping::{MappingHandle, Namespace};
use crate::recorder::Recorder;

/// Name of a time-axis dataset under `/map/time` shared by a whole
/// population.
pub(crate) fn time_series_name(population: &str, field: &str) -> String {
    format!("{population}_{field}")
}

/// Name of a per-source time-axis dataset under `/map/time`.
pub(crate) fn per_source_time_name(population: &str, field: &str, dataset: &str) -> String {
    format!("{population}_{field}_{dataset}")
}

/// Verify that `batch` covers exactly the mapping's sources.
pub(crate) fn check_sources<'a>(
    mapping: &MappingHandle,
    batch: impl Iterator<Item = &'a SourceId>,
) -> Result<()> {
    let declared: BTreeSet<&SourceId> = mapping.sources.iter().collect();
    let offered: BTreeSet<&SourceId> = batch.collect();
    if declared == offered {
        return Ok(());
    }
    Err(Error::SourceMismatch {
        population: mapping.population.clone(),
        missing: declared
            .difference(&offered)
            .map(|id| (*id).clone())
            .collect(),
        extra: offered
            .difference(&declared)
            .map(|id| (*id).clone())
            .collect(),
    })
}

/// Collect one row per mapping source, in mapping order. The source-set
/// check must have passed already.
pub(crate) fn ordered_rows<T>(
    mapping: &MappingHandle,
    mut row: impl FnMut(&SourceId) -> Option<T>,
) -> Vec<T> {
    mapping
        .sources
        .iter()
        .map(|source| row(source).expect("source sets verified equal"))
        .collect()
}

/// Require equal-length rows for the regular 2-D layouts.
pub(crate) fn check_even_rows(field: &str, rows: &[&[f64]]) -> Result<usize> {
    let cols = rows.first().map_or(0, |row| row.len());
    for row in rows {
        if row.len() != cols {
            return Err(Error::ShapeMismatch {
                field: field.to_string(),
                detail: format!("rows have {} and {} samples", cols, row.len()),
            });
        }
    }
    Ok(cols)
}

impl Recorder {
    /// Group holding a population's stored arrays under `/data`.
    pub(crate) fn data_group(
        &mut self,
        namespace: Namespace,
        population: &str,
    ) -> Result<ObjectId> {
        let base = self
            .store
            .resolve(&format!("/data/{}", namespace.as_str()))?;
        Ok(self.store.require_group(base, population)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dendrite_store::Store;

    fn handle(sources: &[&str]) -> MappingHandle {
        MappingHandle {
            namespace: Namespace::Uniform,
            population: "pop".to_string(),
            field: None,
            dataset: Store::new().root(),
            sources: sources.iter().map(|s| SourceId::from(*s)).collect(),
        }
    }

    #[test]
    fn check_sources_reports_missing_and_extra() {
        let mapping = handle(&["a", "b", "c"]);
        let offered = [SourceId::from("b"), SourceId::from("d")];
        let err = check_sources(&mapping, offered.iter()).unwrap_err();
        match err {
            Error::SourceMismatch { missing, extra, .. } => {
                assert_eq!(missing, vec![SourceId::from("a"), SourceId::from("c")]);
                assert_eq!(extra, vec![SourceId::from("d")]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn check_sources_ignores_order() {
        let mapping = handle(&["a", "b"]);
        let offered = [SourceId::from("b"), SourceId::from("a")];
        assert!(check_sources(&mapping, offered.iter()).is_ok());
    }

    #[test]
    fn uneven_rows_are_rejected() {
        let r0: &[f64] = &[1.0, 2.0];
        let r1: &[f64] = &[3.0];
        let err = check_even_rows("Vm", &[r0, r1]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }
}
