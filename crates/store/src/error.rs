//! Store errors.
//!
//! Lookup failures carry the offending path; growth failures carry the
//! requested and permitted extents. The store never partially applies a
//! single dataset operation: an error from any method here means that
//! method changed nothing.

use thiserror::Error;

/// Store result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the hierarchical store.
#[derive(Debug, Error)]
pub enum Error {
    /// No object exists at the given path.
    #[error("no object at {path}")]
    NotFound {
        /// Path that failed to resolve.
        path: String,
    },

    /// A child of this name already exists under the parent group.
    #[error("{parent} already contains \"{name}\"")]
    AlreadyExists {
        /// Path of the parent group.
        parent: String,
        /// Name of the colliding child.
        name: String,
    },

    /// The object at this path is a dataset, not a group.
    #[error("{path} is not a group")]
    NotAGroup {
        /// Path of the object.
        path: String,
    },

    /// The object at this path is a group, not a dataset.
    #[error("{path} is not a dataset")]
    NotADataset {
        /// Path of the object.
        path: String,
    },

    /// A dataset was accessed through the wrong physical layout.
    #[error("dataset {path} is {found}, not {expected}")]
    WrongLayout {
        /// Path of the dataset.
        path: String,
        /// Layout the caller asked for.
        expected: &'static str,
        /// Layout the dataset actually has.
        found: &'static str,
    },

    /// Growth would exceed the fixed bound set at creation time.
    #[error("growth to {requested} elements exceeds fixed bound {bound}")]
    CapacityExceeded {
        /// Extent the operation needed.
        requested: usize,
        /// Maximum extent fixed at creation.
        bound: usize,
    },

    /// The dataset was created fixed and is sealed against further growth.
    #[error("dataset is fixed; no further growth permitted")]
    Fixed,

    /// A row index is outside the dataset's fixed row count.
    #[error("row {row} out of range ({rows} rows)")]
    RowOutOfRange {
        /// Offending row index.
        row: usize,
        /// Number of rows in the dataset.
        rows: usize,
    },

    /// A 2-D block does not have one entry per dataset row.
    #[error("block has {got} rows, dataset has {expected}")]
    RowCountMismatch {
        /// Rows the dataset holds.
        expected: usize,
        /// Rows the block supplied.
        got: usize,
    },

    /// Rows of a 2-D block have unequal lengths.
    #[error("block rows have unequal lengths ({first} vs {other})")]
    UnevenBlock {
        /// Length of the first row.
        first: usize,
        /// First differing length.
        other: usize,
    },

    /// A row-segment write overflows the row width.
    #[error("write of {len} values at column {start} overflows width {cols}")]
    SegmentOverflow {
        /// First column written.
        start: usize,
        /// Number of values written.
        len: usize,
        /// Current row width.
        cols: usize,
    },

    /// Underlying I/O failure during save/load.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure during save/load.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A persisted store was written by an incompatible format version.
    #[error("unsupported store format version {found} (expected {expected})")]
    Version {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },
}
