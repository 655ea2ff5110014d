//! Whole-file JSON object store.
//!
//! The backing file contains a single JSON object, pretty-printed with
//! 2-space indentation. `load` reads the entire object, `save` rewrites the
//! entire file in place. A file-level mutex serializes the load-mutate-save
//! cycle inside this process; the on-disk format and the last-full-write-wins
//! behavior are unchanged by the lock.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{error, warn};

/// A single JSON-object-on-disk store.
pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    /// Open a store at the given path. The file is created lazily on first
    /// access, not here.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full top-level object.
    ///
    /// A missing file (or missing parent directory) is created as an empty
    /// object first. A file that fails to parse is treated as empty; the file
    /// itself is left untouched.
    pub fn load(&self) -> Map<String, Value> {
        let _guard = self.lock.lock();
        self.read_locked()
    }

    /// Overwrite the backing file with the full object.
    ///
    /// Write failures are logged and swallowed; callers cannot observe them.
    pub fn save(&self, all: &Map<String, Value>) {
        let _guard = self.lock.lock();
        self.write_locked(all);
    }

    /// Run a load-mutate-save cycle under the file lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        let _guard = self.lock.lock();
        let mut all = self.read_locked();
        let out = f(&mut all);
        self.write_locked(&all);
        out
    }

    /// Run a read plus optional lazy cleanup under the file lock. The closure
    /// returns `(result, dirty)`; the file is rewritten only when dirty.
    pub fn update_if<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> (R, bool)) -> R {
        let _guard = self.lock.lock();
        let mut all = self.read_locked();
        let (out, dirty) = f(&mut all);
        if dirty {
            self.write_locked(&all);
        }
        out
    }

    fn read_locked(&self) -> Map<String, Value> {
        if !self.path.exists() {
            self.ensure_file();
            return Map::new();
        }

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(
                    "Store file {} is not a valid JSON object, treating as empty",
                    self.path.display()
                );
                Map::new()
            }
        }
    }

    fn write_locked(&self, all: &Map<String, Value>) {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = fs::create_dir_all(parent)
        {
            error!("Failed to create {}: {}", parent.display(), e);
            return;
        }

        let body = match serde_json::to_string_pretty(&Value::Object(all.clone())) {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to serialize store {}: {}", self.path.display(), e);
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, body) {
            error!("Failed to write {}: {}", self.path.display(), e);
        }
    }

    fn ensure_file(&self) {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = fs::create_dir_all(parent)
        {
            error!("Failed to create {}: {}", parent.display(), e);
            return;
        }
        if let Err(e) = fs::write(&self.path, "{}") {
            error!("Failed to create {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::temp_path;
    use serde_json::json;

    #[test]
    fn missing_file_loads_empty_and_is_created() {
        let path = temp_path("json-missing");
        let store = JsonStore::open(&path);

        assert!(store.load().is_empty());
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = JsonStore::open(temp_path("json-roundtrip"));

        let mut all = Map::new();
        all.insert("g1".into(), json!({"warnlimit": 5}));
        store.save(&all);

        let loaded = store.load();
        assert_eq!(loaded.get("g1").unwrap()["warnlimit"], 5);
    }

    #[test]
    fn corrupt_file_loads_empty_without_deleting() {
        let path = temp_path("json-corrupt");
        fs::write(&path, "{ not json !!").unwrap();
        let store = JsonStore::open(&path);

        assert!(store.load().is_empty());
        // File is left in place until the next write.
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json !!");

        // A write repairs it.
        store.update(|all| {
            all.insert("g1".into(), json!({"frozen": true}));
        });
        let loaded = store.load();
        assert_eq!(loaded.get("g1").unwrap()["frozen"], true);
    }

    #[test]
    fn non_object_top_level_treated_as_empty() {
        let path = temp_path("json-array");
        fs::write(&path, "[1, 2, 3]").unwrap();
        let store = JsonStore::open(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn output_is_pretty_printed() {
        let path = temp_path("json-pretty");
        let store = JsonStore::open(&path);
        store.update(|all| {
            all.insert("g1".into(), json!({"warnlimit": 3}));
        });

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"g1\""));
    }
}
