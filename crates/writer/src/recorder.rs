//! The recording writer.
//!
//! [`Recorder`] owns the hierarchical store, the model tree, and the
//! configured dialect, and is the single entry point for everything the
//! format defines: file metadata, model-tree registration, mapping
//! declarations, and data appends.
//!
//! # Store layout
//!
//! ```text
//! /
//! ├── model/modeltree/...                 model-tree groups (uid attr)
//! ├── map/
//! │   ├── uniform|nonuniform|event|static/<population>[/<field>]
//! │   └── time/<population>_<field>[_<dataset>]
//! └── data/
//!     └── uniform|nonuniform|event|static/<population>/<field>
//! ```
//!
//! Execution is single-threaded and synchronous; callers serialize access.

use std::path::Path as FsPath;

use chrono::Utc;
use tracing::debug;

use dendrite_model::ModelTree;
use dendrite_store::Store;

use crate::dialect::Dialect;
use crate::error::Result;
use crate::mapping::Namespace;

/// Format version stamped into the root `version` attribute.
pub const FORMAT_VERSION: &str = "0.1";

const NAMESPACES: [Namespace; 4] = [
    Namespace::Uniform,
    Namespace::Nonuniform,
    Namespace::Event,
    Namespace::Static,
];

/// Writer for a dendrite recording store.
pub struct Recorder {
    pub(crate) store: Store,
    pub(crate) tree: ModelTree,
    dialect: Dialect,
}

impl Recorder {
    /// Create a writer over a fresh store, building the namespace skeleton
    /// and stamping the root `timestamp` and `version` attributes.
    pub fn new(dialect: Dialect) -> Result<Self> {
        let mut store = Store::new();
        Self::init_skeleton(&mut store)?;
        let root = store.root();
        store.set_attr(root, "timestamp", Utc::now().to_rfc3339());
        store.set_attr(root, "version", FORMAT_VERSION);
        Ok(Self {
            store,
            tree: ModelTree::new(),
            dialect,
        })
    }

    /// Reopen a previously saved store for further writing.
    ///
    /// The namespace skeleton is re-required (a no-op on a well-formed
    /// store); the in-memory model tree starts empty and can be rebuilt
    /// and re-registered by the caller if further linking is needed.
    pub fn open(path: impl AsRef<FsPath>, dialect: Dialect) -> Result<Self> {
        let mut store = Store::load(path)?;
        Self::init_skeleton(&mut store)?;
        Ok(Self {
            store,
            tree: ModelTree::new(),
            dialect,
        })
    }

    /// Persist the store.
    pub fn save(&self, path: impl AsRef<FsPath>) -> Result<()> {
        self.store.save(path)?;
        Ok(())
    }

    fn init_skeleton(store: &mut Store) -> Result<()> {
        store.require_group_path("/model/modeltree")?;
        store.require_group_path("/map/time")?;
        store.require_group_path("/data")?;
        for namespace in NAMESPACES {
            store.require_group_path(&format!("/map/{}", namespace.as_str()))?;
            store.require_group_path(&format!("/data/{}", namespace.as_str()))?;
        }
        Ok(())
    }

    /// The configured dialect.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Read access to the model tree.
    pub fn tree(&self) -> &ModelTree {
        &self.tree
    }

    /// Mutable access to the model tree, for building it up before
    /// [`register_model_tree`](Recorder::register_model_tree).
    pub fn tree_mut(&mut self) -> &mut ModelTree {
        &mut self.tree
    }

    // ---- file-level metadata ----

    /// Set the file title.
    pub fn set_title(&mut self, title: &str) {
        let root = self.store.root();
        self.store.set_attr(root, "title", title);
    }

    /// Set the creator (person or program).
    pub fn set_creator(&mut self, creator: &str) {
        let root = self.store.root();
        self.store.set_attr(root, "creator", creator);
    }

    /// Set the license text.
    pub fn set_license(&mut self, text: &str) {
        let root = self.store.root();
        self.store.set_attr(root, "license", text);
    }

    /// Set the free-text description.
    pub fn set_description(&mut self, description: &str) {
        let root = self.store.root();
        self.store.set_attr(root, "description", description);
    }

    /// Set the list of software that produced the data.
    pub fn set_software(&mut self, software: Vec<String>) {
        let root = self.store.root();
        self.store.set_attr(root, "software", software);
    }

    /// Set the list of numerical methods used.
    pub fn set_method(&mut self, method: Vec<String>) {
        let root = self.store.root();
        self.store.set_attr(root, "method", method);
    }

    // ---- model tree ----

    /// Mirror the model tree into `/model/modeltree`.
    ///
    /// Each node becomes a group carrying a `uid` attribute (the node's
    /// uid, or its tree path when no uid was assigned) plus the node's
    /// key/value attributes. Registration is idempotent: existing groups
    /// are reused and their attributes overwritten.
    pub fn register_model_tree(&mut self) -> Result<()> {
        let model = self.store.resolve("/model")?;

        // Pair each visited node with the store group of its parent.
        // Visit order guarantees parents are processed first.
        let mut groups = vec![None; self.tree.len()];
        let mut order = Vec::with_capacity(self.tree.len());
        self.tree.visit(|index, _| order.push(index));

        for index in order {
            let node = self.tree.node(index);
            let parent_group = match node.parent() {
                // Visit order guarantees the parent's group exists already.
                Some(parent_index) => groups[parent_index.index()]
                    .expect("visit order puts parents before children"),
                None => model,
            };
            let group = self.store.require_group(parent_group, node.name())?;
            let uid = match node.uid() {
                Some(uid) => uid.as_str().to_string(),
                None => self.tree.path_of(index).to_string(),
            };
            self.store.set_attr(group, "uid", uid);
            let attrs: Vec<(String, String)> = node
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            for (key, value) in attrs {
                self.store.set_attr(group, key, value);
            }
            groups[index.index()] = Some(group);
        }
        debug!(nodes = self.tree.len(), "registered model tree");
        Ok(())
    }
}
