//! Model-side vocabulary for dendrite recordings.
//!
//! A recording store keeps data for *sources*, the simulated entities that
//! are organised in a hierarchical model tree. This crate owns that
//! vocabulary:
//!
//! - [`Path`] - absolute, `/`-separated location of a node in the tree
//! - [`SourceId`] - opaque stable identifier of one source
//! - [`ModelTree`] - arena-backed tree of named nodes with a versioned
//!   uid→path index
//!
//! The storage side (groups, datasets, attributes) lives in
//! `dendrite-store`; the writer that ties both together lives in `dendrite`.

pub mod ids;
pub mod path;
pub mod tree;

pub use ids::SourceId;
pub use path::{common_prefix, Path};
pub use tree::{ModelNode, ModelTree, NodeIndex};
