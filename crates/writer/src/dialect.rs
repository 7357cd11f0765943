//! Storage dialects.
//!
//! A writer is configured with exactly one dialect: the physical layout
//! used for nonuniformly sampled and event data. Regular fixed-step and
//! static data are stored the same way under every dialect. Each append
//! operation matches on the configured dialect exhaustively; invoking an
//! operation the dialect does not own fails with
//! [`DialectMismatch`](crate::Error::DialectMismatch) instead of silently
//! mixing layouts.

use std::fmt;

/// Physical layout for nonuniform and event recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// One independent 1-D dataset per source, each with its own time
    /// vector; mapping rows reference the per-source datasets.
    PerSource,
    /// One 2-D array per (population, field) with a single explicit time
    /// vector shared by every source.
    SharedTime,
    /// One 2-D variable-length array; each row independently sized.
    Ragged,
    /// One 2-D fixed-width array padded with the NaN sentinel.
    Padded,
}

impl Dialect {
    /// Canonical spelling used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::PerSource => "per-source",
            Dialect::SharedTime => "shared-time",
            Dialect::Ragged => "ragged",
            Dialect::Padded => "padded",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
