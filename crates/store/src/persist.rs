//! Store persistence.
//!
//! The whole arena serializes to a single JSON document with a format
//! version header. Loading a file written by a different format version
//! fails loudly rather than guessing.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::{Object, Store};

/// Persisted format version (increment on breaking changes).
pub const STORE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PersistedStore {
    version: u32,
    objects: Vec<Object>,
}

impl Store {
    /// Serialize the store to pretty JSON at `path`, replacing any
    /// existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let persisted = PersistedStore {
            version: STORE_FORMAT_VERSION,
            objects: self.objects.clone(),
        };
        let json = serde_json::to_string_pretty(&persisted)?;
        fs::write(path, json)?;
        debug!(path = %path.display(), objects = self.objects.len(), "saved store");
        Ok(())
    }

    /// Load a store previously written by [`save`](Store::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let persisted: PersistedStore = serde_json::from_str(&json)?;
        if persisted.version != STORE_FORMAT_VERSION {
            return Err(Error::Version {
                expected: STORE_FORMAT_VERSION,
                found: persisted.version,
            });
        }
        debug!(path = %path.display(), objects = persisted.objects.len(), "loaded store");
        Ok(Store {
            objects: persisted.objects,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::dataset::{Matrix, Payload};
    use crate::store::Store;
    use crate::value::AttrValue;

    #[test]
    fn round_trip_preserves_refs_and_attrs() {
        let mut store = Store::new();
        let data = store.require_group_path("/data/uniform/cells").unwrap();
        let map = store.require_group_path("/map/uniform").unwrap();
        let ds = store
            .create_dataset(
                data,
                "Vm",
                Payload::Matrix(Matrix::from_rows(&[&[1.0, 2.0]], None, 0.0).unwrap()),
            )
            .unwrap();
        store.set_attr(ds, "unit", "mV");
        store.push_ref(ds, "model", map);

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store.json");
        store.save(&file).unwrap();
        let loaded = Store::load(&file).unwrap();

        let ds2 = loaded.resolve("/data/uniform/cells/Vm").unwrap();
        assert_eq!(ds2, ds);
        assert_eq!(
            loaded.attr(ds2, "unit"),
            Some(&AttrValue::Str("mV".to_string()))
        );
        assert_eq!(loaded.attr(ds2, "model").unwrap().as_refs().unwrap(), &[map]);
        assert_eq!(loaded.matrix(ds2).unwrap().shape(), (1, 2));
    }
}
