//! The model tree: a hierarchical registry of recorded sources.
//!
//! Nodes are held in an arena and addressed by [`NodeIndex`]; parent and
//! child links are indices, never pointers. The tree also serves uid→path
//! lookups for the cross-reference linker through an index that is rebuilt
//! lazily: every structural mutation bumps a version counter, and a lookup
//! against a stale index triggers exactly one rebuild.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::SourceId;
use crate::path::Path;

/// Name of the implicit tree root. Mirrors the store group the tree is
/// registered under (`/model/modeltree`).
pub const TREE_ROOT: &str = "modeltree";

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// Position in the arena, usable as a dense index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the model tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelNode {
    name: String,
    uid: Option<SourceId>,
    attrs: IndexMap<String, String>,
    parent: Option<NodeIndex>,
    children: IndexMap<String, NodeIndex>,
}

impl ModelNode {
    /// Node name (the last segment of its path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique identifier, if one was assigned.
    pub fn uid(&self) -> Option<&SourceId> {
        self.uid.as_ref()
    }

    /// Key/value attributes attached to this node.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parent index; `None` for the root.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Child indices in insertion order.
    pub fn children(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.children.values().copied()
    }
}

/// Arena-backed model tree with a versioned uid→path index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTree {
    nodes: Vec<ModelNode>,
    version: u64,
    #[serde(skip)]
    uid_index: Option<UidIndex>,
}

#[derive(Debug, Clone)]
struct UidIndex {
    built_at: u64,
    paths: HashMap<SourceId, Path>,
}

impl ModelTree {
    /// Create a tree containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![ModelNode {
                name: TREE_ROOT.to_string(),
                uid: Some(SourceId::from(TREE_ROOT)),
                attrs: IndexMap::new(),
                parent: None,
                children: IndexMap::new(),
            }],
            version: 0,
            uid_index: None,
        }
    }

    /// Index of the root node.
    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    /// Borrow a node.
    pub fn node(&self, index: NodeIndex) -> &ModelNode {
        &self.nodes[index.0 as usize]
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds nothing but the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Add a child under `parent`, or return the existing child of that
    /// name. A fresh insertion invalidates the uid→path index.
    pub fn add_child(
        &mut self,
        parent: NodeIndex,
        name: impl Into<String>,
        uid: Option<SourceId>,
    ) -> NodeIndex {
        let name = name.into();
        if let Some(&existing) = self.nodes[parent.0 as usize].children.get(&name) {
            return existing;
        }
        let index = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(ModelNode {
            name: name.clone(),
            uid,
            attrs: IndexMap::new(),
            parent: Some(parent),
            children: IndexMap::new(),
        });
        self.nodes[parent.0 as usize].children.insert(name, index);
        self.version += 1;
        index
    }

    /// Set a key/value attribute on a node.
    pub fn set_attr(&mut self, node: NodeIndex, key: impl Into<String>, value: impl Into<String>) {
        self.nodes[node.0 as usize]
            .attrs
            .insert(key.into(), value.into());
    }

    /// Absolute path of a node, root segment included
    /// (e.g. `/modeltree/net/cell0`).
    pub fn path_of(&self, index: NodeIndex) -> Path {
        let mut segments = Vec::new();
        let mut cursor = Some(index);
        while let Some(idx) = cursor {
            let node = &self.nodes[idx.0 as usize];
            segments.push(node.name.clone());
            cursor = node.parent;
        }
        segments.reverse();
        Path::new(segments)
    }

    /// Find the node at `path`. The path must include the root segment.
    pub fn find(&self, path: &Path) -> Option<NodeIndex> {
        let mut segments = path.segments().iter();
        if segments.next().map(String::as_str) != Some(TREE_ROOT) {
            return None;
        }
        let mut cursor = self.root();
        for segment in segments {
            cursor = *self.nodes[cursor.0 as usize].children.get(segment)?;
        }
        Some(cursor)
    }

    /// Visit every node depth-first, parents before children, siblings in
    /// insertion order.
    pub fn visit(&self, mut f: impl FnMut(NodeIndex, &ModelNode)) {
        let mut stack = vec![self.root()];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index.0 as usize];
            f(index, node);
            for &child in node.children.values().rev() {
                stack.push(child);
            }
        }
    }

    /// Path of the node carrying `uid`, served from the versioned index.
    ///
    /// The index is rebuilt only when the tree has been mutated since the
    /// last build. When two nodes share a uid the first in visit order wins.
    pub fn uid_path(&mut self, uid: &SourceId) -> Option<Path> {
        self.ensure_uid_index();
        self.uid_index
            .as_ref()
            .and_then(|index| index.paths.get(uid))
            .cloned()
    }

    fn ensure_uid_index(&mut self) {
        let stale = match &self.uid_index {
            Some(index) => index.built_at != self.version,
            None => true,
        };
        if !stale {
            return;
        }
        let mut indices: HashMap<SourceId, NodeIndex> = HashMap::new();
        self.visit(|index, node| {
            if let Some(uid) = &node.uid {
                indices.entry(uid.clone()).or_insert(index);
            }
        });
        let paths = indices
            .into_iter()
            .map(|(uid, index)| (uid, self.path_of(index)))
            .collect();
        self.uid_index = Some(UidIndex {
            built_at: self.version,
            paths,
        });
    }
}

impl Default for ModelTree {
    fn default() -> Self {
        Self::new()
    }
}
