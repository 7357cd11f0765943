//! Hierarchical storage collaborator for dendrite recordings.
//!
//! The store is a tree of *objects* (groups and datasets) held in an
//! arena and addressed by [`ObjectId`]. Every cross-reference in the store
//! (parent links, children, reference-list attributes, per-row dataset
//! slots) is an `ObjectId`, never a memory pointer, so references survive
//! serialization and reload unchanged.
//!
//! Datasets are extensible along exactly one axis and grow only by
//! appending; nothing here truncates or reorders. The physical layouts a
//! dataset can take are the [`Payload`] variants: string lists,
//! source/reference rows, extensible 2-D matrices, 1-D vectors, and ragged
//! per-row arrays.
//!
//! On-disk representation is plain JSON via `serde`; binary formats,
//! compression, and chunking are explicit non-goals of this crate.

pub mod dataset;
pub mod error;
pub mod persist;
pub mod store;
pub mod value;

pub use dataset::{Matrix, Payload, Ragged, SourceRefRow, SourceRefRows, StringVec, Vector};
pub use error::{Error, Result};
pub use store::Store;
pub use value::{AttrValue, Dtype, ObjectId};
