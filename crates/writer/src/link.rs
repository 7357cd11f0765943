//! Cross-reference linker.
//!
//! After a mapping is declared, the linker ties it to the model-tree node
//! that structurally owns the population: the closest common ancestor of
//! all its sources. The ancestor's group gains a reference to the mapping
//! in its `map` attribute list, and the mapping gains a reference back in
//! its `model` attribute list, so a browser of either side can find the
//! other without scanning the store.
//!
//! Linking is additive bookkeeping. Re-linking an unchanged mapping
//! appends duplicate references, so callers link each mapping exactly
//! once, at declaration.

use std::fmt;

use dendrite_model::{common_prefix, Path, SourceId};
use dendrite_store::ObjectId;

use crate::mapping::MappingHandle;
use crate::recorder::Recorder;

/// Result of one linking attempt.
///
/// A skipped link is an expected condition, not an error: populations may
/// be declared before (or without) a registered model tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Both references were written.
    Linked {
        /// Store id of the ancestor group that now references the mapping.
        ancestor: ObjectId,
    },
    /// No reference was written.
    Skipped {
        /// Why the link was skipped.
        reason: SkipReason,
    },
}

/// Why a link was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The model tree holds nothing but its root.
    EmptyTree,
    /// A mapping source id has no node in the model tree.
    UnknownSource(SourceId),
    /// No store group exists at the ancestor path.
    MissingGroup(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyTree => write!(f, "model tree is empty"),
            SkipReason::UnknownSource(id) => write!(f, "source \"{id}\" not in model tree"),
            SkipReason::MissingGroup(path) => write!(f, "no group at {path}"),
        }
    }
}

impl Recorder {
    /// Link a declared mapping to the model tree and report the outcome.
    ///
    /// Declarations link automatically; this entry point exists for the
    /// case where the model tree is registered only after a mapping was
    /// declared (and was skipped then). Linking is additive: linking the
    /// same mapping twice appends duplicate references.
    pub fn link(&mut self, mapping: &MappingHandle) -> LinkOutcome {
        let sources = mapping.sources().to_vec();
        self.link_mapping(mapping.dataset(), &sources)
    }

    /// Link a mapping dataset to the closest common ancestor of its
    /// sources in the model tree.
    ///
    /// Resolves every source id to its tree path, takes the longest common
    /// prefix, and writes the bidirectional `map`/`model` references onto
    /// the ancestor's registered group and the mapping dataset. Returns
    /// [`LinkOutcome::Skipped`] instead of failing when the tree cannot
    /// answer or the ancestor was never registered in the store.
    pub(crate) fn link_mapping(
        &mut self,
        mapping: ObjectId,
        sources: &[SourceId],
    ) -> LinkOutcome {
        if self.tree.is_empty() {
            return LinkOutcome::Skipped {
                reason: SkipReason::EmptyTree,
            };
        }

        let mut paths = Vec::with_capacity(sources.len());
        for source in sources {
            match self.tree.uid_path(source) {
                Some(path) => paths.push(path),
                None => {
                    return LinkOutcome::Skipped {
                        reason: SkipReason::UnknownSource(source.clone()),
                    }
                }
            }
        }

        // Tree paths all start with the root segment, so the common prefix
        // names a node under /model/modeltree once that segment is dropped.
        let prefix = common_prefix(&paths);
        let store_path = match prefix.strip_prefix(&Path::from("modeltree")) {
            Some(rest) => {
                let mut path = String::from("/model/modeltree");
                for segment in rest {
                    path.push('/');
                    path.push_str(segment);
                }
                path
            }
            None => {
                return LinkOutcome::Skipped {
                    reason: SkipReason::MissingGroup(format!("/model{prefix}")),
                }
            }
        };

        let ancestor = match self.store.resolve(&store_path) {
            Ok(id) => id,
            Err(_) => {
                return LinkOutcome::Skipped {
                    reason: SkipReason::MissingGroup(store_path),
                }
            }
        };

        self.store.push_ref(ancestor, "map", mapping);
        self.store.push_ref(mapping, "model", ancestor);
        LinkOutcome::Linked { ancestor }
    }
}
