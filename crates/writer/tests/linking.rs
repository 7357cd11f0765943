//! End-to-end tests for model-tree registration, cross-reference linking,
//! file metadata, and persistence.

use dendrite::{
    Dialect, LinkOutcome, Recorder, SkipReason, SourceId, UniformBatch,
};

fn cells() -> Vec<SourceId> {
    ["c0", "c1", "c2"].map(SourceId::from).into()
}

/// Build /modeltree/net/pop/cell{0..2} with uids c0..c2 and register it.
fn build_tree(recorder: &mut Recorder) {
    let tree = recorder.tree_mut();
    let root = tree.root();
    let net = tree.add_child(root, "net", None);
    let pop = tree.add_child(net, "pop", None);
    for i in 0..3 {
        let cell = tree.add_child(pop, format!("cell{i}"), Some(SourceId::new(format!("c{i}"))));
        tree.set_attr(cell, "type", "granule");
    }
    recorder.register_model_tree().unwrap();
}

/// Registration mirrors the tree under /model/modeltree with uid
/// attributes; nodes without a uid fall back to their tree path.
#[test]
fn model_tree_registers_groups_with_uids() {
    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    build_tree(&mut recorder);

    let store = recorder.store();
    let pop = store.resolve("/model/modeltree/net/pop").unwrap();
    assert_eq!(
        store.attr(pop, "uid").unwrap().as_str(),
        Some("/modeltree/net/pop")
    );
    let cell0 = store.resolve("/model/modeltree/net/pop/cell0").unwrap();
    assert_eq!(store.attr(cell0, "uid").unwrap().as_str(), Some("c0"));
    assert_eq!(store.attr(cell0, "type").unwrap().as_str(), Some("granule"));
}

/// Linking attaches the mapping to the closest common ancestor of its
/// sources, and only there.
#[test]
fn mapping_links_to_closest_common_ancestor() {
    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    build_tree(&mut recorder);

    let mapping = recorder.declare_uniform("cells", &cells()).unwrap();
    let store = recorder.store();

    let pop = store.resolve("/model/modeltree/net/pop").unwrap();
    let refs = store.attr(pop, "map").unwrap().as_refs().unwrap();
    assert_eq!(refs, &[mapping.dataset()]);

    let back = store.attr(mapping.dataset(), "model").unwrap().as_refs().unwrap();
    assert_eq!(back, &[pop]);

    // Neither the parent nor a child of the ancestor carries the link.
    let net = store.resolve("/model/modeltree/net").unwrap();
    assert!(store.attr(net, "map").is_none());
    let cell0 = store.resolve("/model/modeltree/net/pop/cell0").unwrap();
    assert!(store.attr(cell0, "map").is_none());
}

/// A subset population links to the deeper node that owns it.
#[test]
fn subset_links_to_single_node() {
    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    build_tree(&mut recorder);

    let mapping = recorder
        .declare_uniform("just_c1", &[SourceId::from("c1")])
        .unwrap();
    let store = recorder.store();
    let cell1 = store.resolve("/model/modeltree/net/pop/cell1").unwrap();
    assert_eq!(
        store.attr(cell1, "map").unwrap().as_refs().unwrap(),
        &[mapping.dataset()]
    );
}

/// Without a registered model tree the declaration succeeds and the link
/// is skipped, not raised.
#[test]
fn linking_skips_when_tree_is_empty() {
    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    let mapping = recorder.declare_uniform("cells", &cells()).unwrap();
    assert!(recorder.store().attr(mapping.dataset(), "model").is_none());

    // Explicit re-link reports why.
    let outcome = recorder.link(&mapping);
    assert_eq!(
        outcome,
        LinkOutcome::Skipped {
            reason: SkipReason::EmptyTree
        }
    );
}

/// A mapping declared before the tree was registered can be linked
/// afterwards through the explicit entry point.
#[test]
fn late_linking_after_tree_registration() {
    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    let mapping = recorder.declare_uniform("cells", &cells()).unwrap();

    build_tree(&mut recorder);
    let outcome = recorder.link(&mapping);
    let pop = recorder.store().resolve("/model/modeltree/net/pop").unwrap();
    assert_eq!(outcome, LinkOutcome::Linked { ancestor: pop });
    assert_eq!(
        recorder.store().attr(pop, "map").unwrap().as_refs().unwrap(),
        &[mapping.dataset()]
    );
}

/// A source unknown to the tree skips the link with a reason naming it.
#[test]
fn linking_skips_unknown_sources() {
    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    build_tree(&mut recorder);

    let mapping = recorder
        .declare_uniform("ghosts", &[SourceId::from("c0"), SourceId::from("nope")])
        .unwrap();
    let outcome = recorder.link(&mapping);
    assert_eq!(
        outcome,
        LinkOutcome::Skipped {
            reason: SkipReason::UnknownSource(SourceId::from("nope"))
        }
    );
}

/// File-level metadata lands in root attributes next to the stamped
/// timestamp and format version.
#[test]
fn file_metadata_is_stored_on_the_root() {
    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    recorder.set_title("granule survey");
    recorder.set_creator("someone");
    recorder.set_license("CC-BY");
    recorder.set_description("test recording");
    recorder.set_software(vec!["simd".to_string()]);
    recorder.set_method(vec!["rk4".to_string()]);

    let store = recorder.store();
    let root = store.root();
    assert_eq!(
        store.attr(root, "title").unwrap().as_str(),
        Some("granule survey")
    );
    assert_eq!(
        store.attr(root, "version").unwrap().as_str(),
        Some(dendrite::FORMAT_VERSION)
    );
    assert!(store.attr(root, "timestamp").is_some());
}

/// Save, reopen, append again: object ids, cross-references and data all
/// survive the round trip.
#[test]
fn reopened_stores_keep_references_and_grow() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("recording.json");

    let mut recorder = Recorder::new(Dialect::Padded).unwrap();
    build_tree(&mut recorder);
    let mapping = recorder.declare_uniform("cells", &cells()).unwrap();

    let mut batch = UniformBatch::new("Vm")
        .with_unit("mV")
        .with_time_unit("ms")
        .with_dt(0.1);
    for cell in cells() {
        batch.insert(cell, vec![1.0, 2.0]);
    }
    let ds = recorder.append_uniform(&mapping, &batch, 0.0, false).unwrap();
    recorder.save(&file).unwrap();

    let mut reopened = Recorder::open(&file, Dialect::Padded).unwrap();
    let ds2 = reopened.store().resolve("/data/uniform/cells/Vm").unwrap();
    assert_eq!(ds2, ds);
    assert_eq!(
        reopened.store().attr(ds2, "source").unwrap().as_ref_id(),
        Some(mapping.dataset())
    );
    let pop = reopened.store().resolve("/model/modeltree/net/pop").unwrap();
    assert_eq!(
        reopened.store().attr(pop, "map").unwrap().as_refs().unwrap(),
        &[mapping.dataset()]
    );

    // The mapping handle from before the round trip still appends.
    let mut batch2 = UniformBatch::new("Vm");
    for cell in cells() {
        batch2.insert(cell, vec![3.0]);
    }
    reopened
        .append_uniform(&mapping, &batch2, 0.0, false)
        .unwrap();
    assert_eq!(reopened.store().matrix(ds2).unwrap().shape(), (3, 3));
    assert_eq!(
        reopened.store().matrix(ds2).unwrap().row(0).unwrap(),
        &[1.0, 2.0, 3.0]
    );
}
