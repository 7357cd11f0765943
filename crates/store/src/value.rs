//! Handles, attribute values, and element type tags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to an object in the store arena.
///
/// Object ids are plain indices: stable for the lifetime of the store and
/// across save/load, which is what lets attribute-embedded references
/// survive reopening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A typed attribute value attached to a group or dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// UTF-8 string.
    Str(String),
    /// Double-precision float.
    F64(f64),
    /// Signed integer.
    I64(i64),
    /// List of strings (e.g. the `software` file attribute).
    StrList(Vec<String>),
    /// Single object reference (row/time axis attachments).
    Ref(ObjectId),
    /// Append-only list of object references (`map`/`model` cross-links).
    RefList(Vec<ObjectId>),
}

impl AttrValue {
    /// String payload, if this is a string attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Float payload, if this is a float attribute.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Reference payload, if this is a single-reference attribute.
    pub fn as_ref_id(&self) -> Option<ObjectId> {
        match self {
            AttrValue::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// Reference list payload, if this is a reference-list attribute.
    pub fn as_refs(&self) -> Option<&[ObjectId]> {
        match self {
            AttrValue::RefList(refs) => Some(refs),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::F64(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::I64(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::StrList(v)
    }
}

impl From<ObjectId> for AttrValue {
    fn from(id: ObjectId) -> Self {
        AttrValue::Ref(id)
    }
}

/// Declared element width of a numeric dataset.
///
/// Sample payloads are kept as `f64` in memory; the tag records the width
/// the producer declared so readers can narrow on export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dtype {
    /// 32-bit float elements.
    F32,
    /// 64-bit float elements.
    #[default]
    F64,
}

impl Dtype {
    /// Canonical attribute spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Dtype::F32 => "float32",
            Dtype::F64 => "float64",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
