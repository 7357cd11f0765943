//! The object arena: groups, datasets, attributes, path addressing.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{Matrix, Payload, Ragged, SourceRefRows, StringVec, Vector};
use crate::error::{Error, Result};
use crate::value::{AttrValue, ObjectId};

/// One object in the store: a group or a dataset, with attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Object {
    pub(crate) name: String,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) attrs: IndexMap<String, AttrValue>,
    pub(crate) kind: ObjectKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum ObjectKind {
    Group { children: IndexMap<String, ObjectId> },
    Dataset { payload: Payload },
}

/// The hierarchical store.
///
/// Objects live in an arena and are addressed by [`ObjectId`]; the root
/// group has id 0 and the empty name. All mutation is single-threaded and
/// synchronous; callers serialize concurrent use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub(crate) objects: Vec<Object>,
}

impl Store {
    /// Create a store containing only the root group.
    pub fn new() -> Self {
        Self {
            objects: vec![Object {
                name: String::new(),
                parent: None,
                attrs: IndexMap::new(),
                kind: ObjectKind::Group {
                    children: IndexMap::new(),
                },
            }],
        }
    }

    /// Id of the root group.
    pub fn root(&self) -> ObjectId {
        ObjectId(0)
    }

    fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.index()]
    }

    fn object_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.index()]
    }

    /// Absolute path of an object (`/` for the root).
    pub fn path_of(&self, id: ObjectId) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let object = self.object(current);
            if !object.name.is_empty() {
                segments.push(object.name.clone());
            }
            cursor = object.parent;
        }
        if segments.is_empty() {
            return "/".to_string();
        }
        segments.reverse();
        let mut path = String::new();
        for segment in segments {
            path.push('/');
            path.push_str(&segment);
        }
        path
    }

    /// Name of an object (last path segment).
    pub fn name_of(&self, id: ObjectId) -> &str {
        &self.object(id).name
    }

    /// True when the object is a group.
    pub fn is_group(&self, id: ObjectId) -> bool {
        matches!(self.object(id).kind, ObjectKind::Group { .. })
    }

    /// Look up a direct child of a group by name.
    pub fn child(&self, parent: ObjectId, name: &str) -> Option<ObjectId> {
        match &self.object(parent).kind {
            ObjectKind::Group { children } => children.get(name).copied(),
            ObjectKind::Dataset { .. } => None,
        }
    }

    /// Child ids of a group in insertion order.
    pub fn children(&self, parent: ObjectId) -> Result<Vec<ObjectId>> {
        match &self.object(parent).kind {
            ObjectKind::Group { children } => Ok(children.values().copied().collect()),
            ObjectKind::Dataset { .. } => Err(Error::NotAGroup {
                path: self.path_of(parent),
            }),
        }
    }

    /// Resolve an absolute `/`-separated path to an object id.
    pub fn resolve(&self, path: &str) -> Result<ObjectId> {
        let mut cursor = self.root();
        for segment in path.split('/').filter(|seg| !seg.is_empty()) {
            cursor = self
                .child(cursor, segment)
                .ok_or_else(|| Error::NotFound {
                    path: path.to_string(),
                })?;
        }
        Ok(cursor)
    }

    fn insert_child(&mut self, parent: ObjectId, name: &str, object: Object) -> Result<ObjectId> {
        let parent_path = self.path_of(parent);
        match &self.object(parent).kind {
            ObjectKind::Group { children } => {
                if children.contains_key(name) {
                    return Err(Error::AlreadyExists {
                        parent: parent_path,
                        name: name.to_string(),
                    });
                }
            }
            ObjectKind::Dataset { .. } => return Err(Error::NotAGroup { path: parent_path }),
        }
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        match &mut self.object_mut(parent).kind {
            ObjectKind::Group { children } => {
                children.insert(name.to_string(), id);
            }
            ObjectKind::Dataset { .. } => unreachable!("parent kind checked above"),
        }
        Ok(id)
    }

    /// Create a new group under `parent`. Fails if the name is taken.
    pub fn create_group(&mut self, parent: ObjectId, name: &str) -> Result<ObjectId> {
        self.insert_child(
            parent,
            name,
            Object {
                name: name.to_string(),
                parent: Some(parent),
                attrs: IndexMap::new(),
                kind: ObjectKind::Group {
                    children: IndexMap::new(),
                },
            },
        )
    }

    /// Return the existing group of this name, or create it.
    pub fn require_group(&mut self, parent: ObjectId, name: &str) -> Result<ObjectId> {
        if let Some(existing) = self.child(parent, name) {
            if self.is_group(existing) {
                return Ok(existing);
            }
            return Err(Error::NotAGroup {
                path: self.path_of(existing),
            });
        }
        self.create_group(parent, name)
    }

    /// [`require_group`](Store::require_group) along a whole absolute path.
    pub fn require_group_path(&mut self, path: &str) -> Result<ObjectId> {
        let segments: Vec<String> = path
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(String::from)
            .collect();
        let mut cursor = self.root();
        for segment in &segments {
            cursor = self.require_group(cursor, segment)?;
        }
        Ok(cursor)
    }

    /// Create a dataset under `parent`. Fails if the name is taken.
    pub fn create_dataset(
        &mut self,
        parent: ObjectId,
        name: &str,
        payload: Payload,
    ) -> Result<ObjectId> {
        let id = self.insert_child(
            parent,
            name,
            Object {
                name: name.to_string(),
                parent: Some(parent),
                attrs: IndexMap::new(),
                kind: ObjectKind::Dataset { payload },
            },
        )?;
        debug!(path = %self.path_of(id), "created dataset");
        Ok(id)
    }

    // ---- attributes ----

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&mut self, id: ObjectId, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.object_mut(id).attrs.insert(key.into(), value.into());
    }

    /// Read an attribute.
    pub fn attr(&self, id: ObjectId, key: &str) -> Option<&AttrValue> {
        self.object(id).attrs.get(key)
    }

    /// All attributes of an object, in insertion order.
    pub fn attrs(&self, id: ObjectId) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.object(id)
            .attrs
            .iter()
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Append a reference to a reference-list attribute, creating the list
    /// on first use. Reference lists are append-only.
    pub fn push_ref(&mut self, id: ObjectId, key: &str, target: ObjectId) {
        let attrs = &mut self.object_mut(id).attrs;
        match attrs.get_mut(key) {
            Some(AttrValue::RefList(refs)) => refs.push(target),
            _ => {
                attrs.insert(key.to_string(), AttrValue::RefList(vec![target]));
            }
        }
    }

    // ---- typed payload access ----

    fn payload(&self, id: ObjectId) -> Result<&Payload> {
        match &self.object(id).kind {
            ObjectKind::Dataset { payload } => Ok(payload),
            ObjectKind::Group { .. } => Err(Error::NotADataset {
                path: self.path_of(id),
            }),
        }
    }

    fn payload_mut(&mut self, id: ObjectId) -> Result<&mut Payload> {
        if matches!(self.object(id).kind, ObjectKind::Group { .. }) {
            return Err(Error::NotADataset {
                path: self.path_of(id),
            });
        }
        match &mut self.object_mut(id).kind {
            ObjectKind::Dataset { payload } => Ok(payload),
            ObjectKind::Group { .. } => unreachable!("kind checked above"),
        }
    }

    fn wrong_layout(&self, id: ObjectId, expected: &'static str, found: &'static str) -> Error {
        Error::WrongLayout {
            path: self.path_of(id),
            expected,
            found,
        }
    }

    /// Borrow a dataset's matrix payload.
    pub fn matrix(&self, id: ObjectId) -> Result<&Matrix> {
        match self.payload(id)? {
            Payload::Matrix(m) => Ok(m),
            other => Err(self.wrong_layout(id, "matrix", other.kind())),
        }
    }

    /// Mutably borrow a dataset's matrix payload.
    pub fn matrix_mut(&mut self, id: ObjectId) -> Result<&mut Matrix> {
        let found = self.payload(id)?.kind();
        if found != "matrix" {
            return Err(self.wrong_layout(id, "matrix", found));
        }
        match self.payload_mut(id)? {
            Payload::Matrix(m) => Ok(m),
            _ => unreachable!("kind checked above"),
        }
    }

    /// Borrow a dataset's vector payload.
    pub fn vector(&self, id: ObjectId) -> Result<&Vector> {
        match self.payload(id)? {
            Payload::Vector(v) => Ok(v),
            other => Err(self.wrong_layout(id, "vector", other.kind())),
        }
    }

    /// Mutably borrow a dataset's vector payload.
    pub fn vector_mut(&mut self, id: ObjectId) -> Result<&mut Vector> {
        let found = self.payload(id)?.kind();
        if found != "vector" {
            return Err(self.wrong_layout(id, "vector", found));
        }
        match self.payload_mut(id)? {
            Payload::Vector(v) => Ok(v),
            _ => unreachable!("kind checked above"),
        }
    }

    /// Borrow a dataset's ragged payload.
    pub fn ragged(&self, id: ObjectId) -> Result<&Ragged> {
        match self.payload(id)? {
            Payload::Ragged(r) => Ok(r),
            other => Err(self.wrong_layout(id, "ragged", other.kind())),
        }
    }

    /// Mutably borrow a dataset's ragged payload.
    pub fn ragged_mut(&mut self, id: ObjectId) -> Result<&mut Ragged> {
        let found = self.payload(id)?.kind();
        if found != "ragged" {
            return Err(self.wrong_layout(id, "ragged", found));
        }
        match self.payload_mut(id)? {
            Payload::Ragged(r) => Ok(r),
            _ => unreachable!("kind checked above"),
        }
    }

    /// Borrow a dataset's string-list payload.
    pub fn strings(&self, id: ObjectId) -> Result<&StringVec> {
        match self.payload(id)? {
            Payload::Strings(s) => Ok(s),
            other => Err(self.wrong_layout(id, "strings", other.kind())),
        }
    }

    /// Borrow a dataset's source/reference rows.
    pub fn source_refs(&self, id: ObjectId) -> Result<&SourceRefRows> {
        match self.payload(id)? {
            Payload::SourceRefs(s) => Ok(s),
            other => Err(self.wrong_layout(id, "source-refs", other.kind())),
        }
    }

    /// Mutably borrow a dataset's source/reference rows.
    pub fn source_refs_mut(&mut self, id: ObjectId) -> Result<&mut SourceRefRows> {
        let found = self.payload(id)?.kind();
        if found != "source-refs" {
            return Err(self.wrong_layout(id, "source-refs", found));
        }
        match self.payload_mut(id)? {
            Payload::SourceRefs(s) => Ok(s),
            _ => unreachable!("kind checked above"),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_walks_groups() {
        let mut store = Store::new();
        let map = store.require_group_path("/map/uniform").unwrap();
        assert_eq!(store.path_of(map), "/map/uniform");
        assert_eq!(store.resolve("/map/uniform").unwrap(), map);
        assert!(matches!(
            store.resolve("/map/missing"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn require_group_is_idempotent_create_is_not() {
        let mut store = Store::new();
        let a = store.require_group(store.root(), "a").unwrap();
        assert_eq!(store.require_group(store.root(), "a").unwrap(), a);
        assert!(matches!(
            store.create_group(store.root(), "a"),
            Err(Error::AlreadyExists { .. })
        ));
    }

    #[test]
    fn dataset_names_collide_with_groups() {
        let mut store = Store::new();
        let root = store.root();
        store
            .create_dataset(root, "x", Payload::Vector(Vector::new(vec![], None)))
            .unwrap();
        assert!(matches!(
            store.require_group(root, "x"),
            Err(Error::NotAGroup { .. })
        ));
    }

    #[test]
    fn payload_access_checks_layout() {
        let mut store = Store::new();
        let root = store.root();
        let ds = store
            .create_dataset(root, "v", Payload::Vector(Vector::new(vec![1.0], None)))
            .unwrap();
        assert!(store.vector(ds).is_ok());
        let err = store.matrix(ds).unwrap_err();
        assert!(matches!(err, Error::WrongLayout { expected: "matrix", .. }));
    }

    #[test]
    fn push_ref_appends_in_order() {
        let mut store = Store::new();
        let root = store.root();
        let a = store.create_group(root, "a").unwrap();
        let b = store.create_group(root, "b").unwrap();
        store.push_ref(root, "map", a);
        store.push_ref(root, "map", b);
        let refs = store.attr(root, "map").unwrap().as_refs().unwrap();
        assert_eq!(refs, &[a, b]);
    }
}
