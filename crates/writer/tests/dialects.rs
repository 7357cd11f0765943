//! End-to-end tests for the per-source, ragged, and padded layouts.

use indexmap::IndexMap;

use dendrite::{Dialect, Error, EventBatch, Recorder, SourceId, TimedBatch};

fn cells() -> Vec<SourceId> {
    ["c0", "c1", "c2"].map(SourceId::from).into()
}

fn dataset_names() -> IndexMap<SourceId, String> {
    cells()
        .into_iter()
        .enumerate()
        .map(|(i, cell)| (cell, format!("cell{i}")))
        .collect()
}

fn timed_batch(field: &str, lens: [usize; 3], offset: f64) -> TimedBatch {
    let mut batch = TimedBatch::new(field).with_unit("mV").with_time_unit("ms");
    for (i, cell) in cells().into_iter().enumerate() {
        let data: Vec<f64> = (0..lens[i]).map(|k| offset + k as f64).collect();
        let times: Vec<f64> = (0..lens[i]).map(|k| offset + k as f64 * 0.5).collect();
        batch.insert(cell, data, times);
    }
    batch
}

fn event_batch(field: &str, lens: [usize; 3], offset: f64) -> EventBatch {
    let mut batch = EventBatch::new(field).with_unit("ms");
    for (i, cell) in cells().into_iter().enumerate() {
        let times: Vec<f64> = (0..lens[i]).map(|k| offset + k as f64).collect();
        batch.insert(cell, times);
    }
    batch
}

// ---- per-source ----

/// First per-source append creates one dataset and one time vector per
/// source and fills the mapping's reference slots; later appends grow each
/// source's vectors independently.
#[test]
fn per_source_datasets_grow_independently() {
    let mut recorder = Recorder::new(Dialect::PerSource).unwrap();
    let mapping = recorder
        .declare_nonuniform_per_source("cells", "Vm", &cells())
        .unwrap();

    let out = recorder
        .append_nonuniform_per_source(&mapping, &timed_batch("Vm", [2, 3, 1], 0.0), &dataset_names(), false)
        .unwrap();
    assert_eq!(out.len(), 3);

    // Every mapping row now references its source's dataset.
    let refs = recorder.store().source_refs(mapping.dataset()).unwrap();
    for (i, row) in refs.rows().iter().enumerate() {
        assert_eq!(row.source, format!("c{i}"));
        let (ds, ts) = out[&SourceId::from(row.source.as_str())];
        assert_eq!(row.data, Some(ds));
        assert_eq!(
            recorder.store().attr(ds, "time").unwrap().as_ref_id(),
            Some(ts)
        );
    }

    recorder
        .append_nonuniform_per_source(&mapping, &timed_batch("Vm", [1, 1, 4], 10.0), &dataset_names(), false)
        .unwrap();
    let (c2_ds, c2_ts) = out[&SourceId::from("c2")];
    assert_eq!(recorder.store().vector(c2_ds).unwrap().len(), 5);
    assert_eq!(recorder.store().vector(c2_ts).unwrap().len(), 5);
    let (c0_ds, _) = out[&SourceId::from("c0")];
    assert_eq!(recorder.store().vector(c0_ds).unwrap().len(), 3);

    assert_eq!(
        recorder.store().path_of(c0_ds),
        "/data/nonuniform/cells/Vm/cell0"
    );
    assert!(recorder
        .store()
        .resolve("/map/time/cells_Vm_cell0")
        .is_ok());
}

/// Per-source appends and declarations are refused under the whole-array
/// dialects.
#[test]
fn per_source_requires_its_dialect() {
    let mut recorder = Recorder::new(Dialect::Ragged).unwrap();
    let mapping = recorder.declare_nonuniform("cells", &cells()).unwrap();
    let err = recorder
        .append_nonuniform_per_source(
            &mapping,
            &timed_batch("Vm", [1, 1, 1], 0.0),
            &dataset_names(),
            false,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DialectMismatch {
            required: "per-source",
            ..
        }
    ));

    let err = recorder
        .declare_nonuniform_per_source("more", "Vm", &cells())
        .unwrap_err();
    assert!(matches!(err, Error::DialectMismatch { .. }));
}

/// Missing units are caught before any per-source dataset is created.
#[test]
fn per_source_checks_metadata_before_creating_anything() {
    let mut recorder = Recorder::new(Dialect::PerSource).unwrap();
    let mapping = recorder
        .declare_nonuniform_per_source("cells", "Vm", &cells())
        .unwrap();

    let mut batch = TimedBatch::new("Vm").with_time_unit("ms");
    for cell in cells() {
        batch.insert(cell, vec![1.0], vec![0.0]);
    }
    let err = recorder
        .append_nonuniform_per_source(&mapping, &batch, &dataset_names(), false)
        .unwrap_err();
    assert!(matches!(err, Error::MissingMetadata { what: "unit", .. }));
    assert!(recorder
        .store()
        .resolve("/data/nonuniform/cells/Vm/cell0")
        .is_err());
    // No reference slot was filled either.
    let refs = recorder.store().source_refs(mapping.dataset()).unwrap();
    assert!(refs.rows().iter().all(|row| row.data.is_none()));
}

/// Per-source event data: payload vectors only, no time axes.
#[test]
fn per_source_events_have_no_time_vectors() {
    let mut recorder = Recorder::new(Dialect::PerSource).unwrap();
    let mapping = recorder
        .declare_event_per_source("cells", "spikes", &cells())
        .unwrap();

    let out = recorder
        .append_event_per_source(&mapping, &event_batch("spikes", [2, 0, 1], 0.0), &dataset_names(), false)
        .unwrap();
    let ds = out[&SourceId::from("c0")];
    assert_eq!(recorder.store().path_of(ds), "/data/event/cells/spikes/cell0");
    assert_eq!(recorder.store().vector(ds).unwrap().values(), &[0.0, 1.0]);
    assert!(recorder.store().attr(ds, "time").is_none());
    assert!(recorder.store().resolve("/map/time/cells_spikes_cell0").is_err());
}

// ---- ragged ----

/// Reading a source's row after k successive ragged appends returns the
/// exact concatenation of all k chunks, in append order.
#[test]
fn ragged_rows_concatenate_in_append_order() {
    let mut recorder = Recorder::new(Dialect::Ragged).unwrap();
    let mapping = recorder.declare_nonuniform("cells", &cells()).unwrap();

    let ds = recorder
        .append_nonuniform_ragged(&mapping, &timed_batch("Vm", [2, 1, 3], 0.0), false)
        .unwrap();
    recorder
        .append_nonuniform_ragged(&mapping, &timed_batch("Vm", [1, 2, 1], 10.0), false)
        .unwrap();
    recorder
        .append_nonuniform_ragged(&mapping, &timed_batch("Vm", [2, 0, 0], 20.0), false)
        .unwrap();

    // c0: lengths 2, 1, 2 across three appends.
    assert_eq!(
        recorder.store().ragged(ds).unwrap().row(0).unwrap(),
        &[0.0, 1.0, 10.0, 20.0, 21.0]
    );
    // c1: lengths 1, 2, 0.
    assert_eq!(
        recorder.store().ragged(ds).unwrap().row(1).unwrap(),
        &[0.0, 10.0, 11.0]
    );

    // The ragged time array mirrors the data layout.
    let times = recorder.store().resolve("/map/time/cells_Vm").unwrap();
    assert_eq!(
        recorder.store().ragged(times).unwrap().row(1).unwrap(),
        &[0.0, 10.0, 10.5]
    );
}

/// Ragged event arrays follow the same concatenation contract.
#[test]
fn ragged_events_concatenate() {
    let mut recorder = Recorder::new(Dialect::Ragged).unwrap();
    let mapping = recorder.declare_event("cells", &cells()).unwrap();

    let ds = recorder
        .append_event_ragged(&mapping, &event_batch("spikes", [1, 2, 0], 0.0), false)
        .unwrap();
    recorder
        .append_event_ragged(&mapping, &event_batch("spikes", [2, 0, 1], 5.0), false)
        .unwrap();
    assert_eq!(recorder.store().path_of(ds), "/data/event/cells/spikes");
    assert_eq!(
        recorder.store().ragged(ds).unwrap().row(0).unwrap(),
        &[0.0, 5.0, 6.0]
    );
    assert_eq!(recorder.store().ragged(ds).unwrap().row(2).unwrap(), &[5.0]);
}

/// A ragged array created fixed refuses every later append.
#[test]
fn fixed_ragged_arrays_are_sealed() {
    let mut recorder = Recorder::new(Dialect::Ragged).unwrap();
    let mapping = recorder.declare_nonuniform("cells", &cells()).unwrap();

    let ds = recorder
        .append_nonuniform_ragged(&mapping, &timed_batch("Vm", [1, 1, 1], 0.0), true)
        .unwrap();
    let err = recorder
        .append_nonuniform_ragged(&mapping, &timed_batch("Vm", [1, 1, 1], 9.0), true)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Store(dendrite::StoreError::Fixed)
    ));
    assert_eq!(recorder.store().ragged(ds).unwrap().row(0).unwrap(), &[0.0]);
}

/// Ragged appends are refused under any other dialect.
#[test]
fn ragged_requires_its_dialect() {
    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    let mapping = recorder.declare_nonuniform("cells", &cells()).unwrap();
    let err = recorder
        .append_nonuniform_ragged(&mapping, &timed_batch("Vm", [1, 1, 1], 0.0), false)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DialectMismatch {
            required: "ragged",
            ..
        }
    ));
}

// ---- padded ----

/// Appending n1 then n2 samples for a source yields a row whose first
/// n1+n2 cells are the concatenation of the two writes and whose tail is
/// all sentinel; the width is the maximum written extent over all rows.
#[test]
fn padded_rows_concatenate_behind_the_sentinel() {
    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    let mapping = recorder.declare_nonuniform("cells", &cells()).unwrap();

    let ds = recorder
        .append_nonuniform_padded(&mapping, &timed_batch("Vm", [2, 4, 1], 0.0), false)
        .unwrap();
    assert_eq!(recorder.store().matrix(ds).unwrap().shape(), (3, 4));

    recorder
        .append_nonuniform_padded(&mapping, &timed_batch("Vm", [3, 1, 1], 10.0), false)
        .unwrap();
    let matrix = recorder.store().matrix(ds).unwrap();
    // Widths per row: 2+3=5, 4+1=5, 1+1=2 -> array width 5.
    assert_eq!(matrix.shape(), (3, 5));

    let c0 = matrix.row(0).unwrap();
    assert_eq!(&c0[..5], &[0.0, 1.0, 10.0, 11.0, 12.0]);

    let c2 = matrix.row(2).unwrap();
    assert_eq!(&c2[..2], &[0.0, 10.0]);
    assert!(c2[2..].iter().all(|v| v.is_nan()));

    // The padded time matrix mirrors the layout.
    let times = recorder.store().resolve("/map/time/cells_Vm").unwrap();
    let tmat = recorder.store().matrix(times).unwrap();
    assert_eq!(tmat.shape(), (3, 5));
    let t2 = tmat.row(2).unwrap();
    assert_eq!(&t2[..2], &[0.0, 10.0]);
    assert!(t2[2..].iter().all(|v| v.is_nan()));
}

/// Padded event arrays append at each row's first sentinel cell.
#[test]
fn padded_events_append_at_first_sentinel() {
    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    let mapping = recorder.declare_event("cells", &cells()).unwrap();

    let ds = recorder
        .append_event_padded(&mapping, &event_batch("spikes", [3, 1, 0], 0.0), false)
        .unwrap();
    recorder
        .append_event_padded(&mapping, &event_batch("spikes", [1, 1, 2], 7.0), false)
        .unwrap();

    let matrix = recorder.store().matrix(ds).unwrap();
    assert_eq!(matrix.shape(), (3, 4));
    assert_eq!(matrix.row(0).unwrap(), &[0.0, 1.0, 2.0, 7.0]);
    let c1 = matrix.row(1).unwrap();
    assert_eq!(&c1[..2], &[0.0, 7.0]);
    assert!(c1[2..].iter().all(|v| v.is_nan()));
    let c2 = matrix.row(2).unwrap();
    assert_eq!(&c2[..2], &[7.0, 8.0]);
    assert!(c2[2..].iter().all(|v| v.is_nan()));
}

/// A fixed padded array caps the width at creation; an oversized append
/// fails before any cell is written.
#[test]
fn fixed_padded_arrays_cap_the_width() {
    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    let mapping = recorder.declare_nonuniform("cells", &cells()).unwrap();

    let ds = recorder
        .append_nonuniform_padded(&mapping, &timed_batch("Vm", [2, 2, 2], 0.0), true)
        .unwrap();
    let err = recorder
        .append_nonuniform_padded(&mapping, &timed_batch("Vm", [1, 1, 1], 9.0), true)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Store(dendrite::StoreError::CapacityExceeded { .. })
    ));
    // Nothing was written: row 0 still holds only the creation samples.
    assert_eq!(
        recorder.store().matrix(ds).unwrap().row(0).unwrap(),
        &[0.0, 1.0]
    );
}

/// Padded appends are refused under any other dialect, and mixing layouts
/// for one (population, field) is impossible as a consequence.
#[test]
fn padded_requires_its_dialect() {
    let mut recorder = Recorder::new(Dialect::Ragged).unwrap();
    let mapping = recorder.declare_nonuniform("cells", &cells()).unwrap();
    recorder
        .append_nonuniform_ragged(&mapping, &timed_batch("Vm", [1, 1, 1], 0.0), false)
        .unwrap();

    let err = recorder
        .append_nonuniform_padded(&mapping, &timed_batch("Vm", [1, 1, 1], 2.0), false)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DialectMismatch {
            required: "padded",
            ..
        }
    ));
}
