//! Writer errors.
//!
//! Validation errors are raised before any on-disk mutation on creation
//! paths. Append paths for the multi-row layouts (ragged, padded) proceed
//! row by row, so a mid-append failure can leave earlier rows already
//! written; see the notes on the individual append operations.

use thiserror::Error;

use dendrite_model::SourceId;

use crate::dialect::Dialect;
use crate::mapping::Namespace;

/// Writer result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the recording writer.
#[derive(Debug, Error)]
pub enum Error {
    /// A population was declared with an empty source list.
    #[error("source list for population \"{population}\" is empty")]
    EmptyInput {
        /// Population the caller tried to declare.
        population: String,
    },

    /// A population was declared twice under the same namespace.
    ///
    /// The first declaration wins; its handle stays valid. `population`
    /// includes the field segment for per-source mappings
    /// (e.g. `"cells/Vm"`).
    #[error("population \"{population}\" is already declared under /map/{namespace}")]
    Conflict {
        /// Namespace of the existing declaration.
        namespace: Namespace,
        /// Population (and field, where applicable) that collided.
        population: String,
    },

    /// A batch's source set does not equal the mapping's source set.
    ///
    /// `missing` are mapping sources absent from the batch; `extra` are
    /// batch sources unknown to the mapping. Nothing was written.
    #[error(
        "batch sources do not match mapping \"{population}\" \
         (missing {missing:?}, extra {extra:?})"
    )]
    SourceMismatch {
        /// Population whose mapping was targeted.
        population: String,
        /// Mapping sources the batch did not cover.
        missing: Vec<SourceId>,
        /// Batch sources the mapping does not contain.
        extra: Vec<SourceId>,
    },

    /// An operation was invoked under the wrong configured dialect.
    #[error("operation requires the {required} dialect, writer is configured for {configured}")]
    DialectMismatch {
        /// Dialect(s) the operation is valid under.
        required: &'static str,
        /// Dialect the writer was configured with.
        configured: Dialect,
    },

    /// Metadata required at creation time was absent.
    ///
    /// Raised before the stored array is created; the store is untouched.
    #[error("cannot create \"{field}\": {what} is required")]
    MissingMetadata {
        /// Field whose array could not be created.
        field: String,
        /// The missing item (`unit`, `timeunit`, `positive dt`).
        what: &'static str,
    },

    /// Batch geometry is inconsistent.
    #[error("shape mismatch in \"{field}\": {detail}")]
    ShapeMismatch {
        /// Field whose batch was rejected.
        field: String,
        /// What disagreed with what.
        detail: String,
    },

    /// An error surfaced by the hierarchical store.
    #[error(transparent)]
    Store(#[from] dendrite_store::Error),
}
