//! Session-scoped registry of background job ids.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::KeyValueStore;

/// Opaque id handed out by the job-creation API.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Set of job ids persisted as a JSON array under a single key.
///
/// Nothing here returns an error: unreadable or corrupt state reads as
/// "no jobs tracked" and failed writes are logged and dropped.
#[derive(Debug)]
pub struct JobRegistry<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> JobRegistry<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn add(&self, id: &JobId) {
        if id.as_str().trim().is_empty() {
            debug!("ignoring blank job id");
            return;
        }

        let mut ids = self.list();
        if ids.contains(id) {
            return;
        }
        ids.push(id.clone());
        self.persist(&ids);
    }

    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn remove(&self, id: &JobId) {
        let mut ids = self.list();
        let before = ids.len();
        ids.retain(|tracked| tracked != id);
        if ids.len() == before {
            return;
        }
        self.persist(&ids);
    }

    /// Tracked ids in first-insertion order, deduplicated.
    pub fn list(&self) -> Vec<JobId> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(error) => {
                warn!(key = %self.key, error = %error, "job registry unreadable");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<JobId>>(&raw) {
            Ok(parsed) => {
                let mut ids = Vec::with_capacity(parsed.len());
                for id in parsed {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                ids
            }
            Err(error) => {
                warn!(
                    key = %self.key,
                    error = %error,
                    "job registry corrupt; treating as empty"
                );
                Vec::new()
            }
        }
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.list().contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn clear(&self) {
        if let Err(error) = self.store.remove(&self.key) {
            warn!(error = %error, "failed clearing job registry");
        }
    }

    fn persist(&self, ids: &[JobId]) {
        let json = match serde_json::to_string(ids) {
            Ok(json) => json,
            Err(error) => {
                warn!(error = %error, "failed encoding job registry");
                return;
            }
        };

        match self.store.set(&self.key, &json) {
            Ok(()) => debug!(count = ids.len(), "job registry saved"),
            Err(error) => {
                warn!(key = %self.key, error = %error, "failed saving job registry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const KEY: &str = "neonpdf-jobs";

    fn ids(values: &[&str]) -> Vec<JobId> {
        values.iter().map(|value| JobId::from(*value)).collect()
    }

    #[test]
    fn add_is_idempotent() {
        let store = MemoryStore::new();
        let registry = JobRegistry::new(&store, KEY);
        let id = JobId::from("4f1c0de2");

        registry.add(&id);
        registry.add(&id);

        assert_eq!(registry.list(), vec![id]);
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn stored_form_is_a_json_string_array() {
        let store = MemoryStore::new();
        let registry = JobRegistry::new(&store, KEY);
        registry.add(&JobId::from("a"));
        registry.add(&JobId::from("b"));

        let raw = store.raw(KEY).expect("saved");
        let decoded: Vec<String> = serde_json::from_str(&raw).expect("json array");
        assert_eq!(decoded, vec!["a", "b"]);
    }

    #[test]
    fn remove_absent_id_is_a_no_op() {
        let store = MemoryStore::new();
        let registry = JobRegistry::new(&store, KEY);
        registry.add(&JobId::from("a"));
        let writes = store.writes();

        registry.remove(&JobId::from("zzz"));

        assert_eq!(store.writes(), writes);
        assert_eq!(registry.list(), ids(&["a"]));
    }

    #[test]
    fn remove_keeps_other_ids_in_order() {
        let store = MemoryStore::new();
        let registry = JobRegistry::new(&store, KEY);
        for id in ["a", "b", "c"] {
            registry.add(&JobId::from(id));
        }

        registry.remove(&JobId::from("b"));

        assert_eq!(registry.list(), ids(&["a", "c"]));
    }

    #[test]
    fn corrupt_json_reads_as_empty_and_is_repaired_by_add() {
        let store = MemoryStore::with_entry(KEY, "{not json");
        let registry = JobRegistry::new(&store, KEY);
        assert!(registry.list().is_empty());

        registry.add(&JobId::from("x"));
        assert_eq!(registry.list(), ids(&["x"]));
    }

    #[test]
    fn wrong_json_shape_reads_as_empty() {
        for raw in ["{\"a\":1}", "[1,2]", "\"a\"", "null"] {
            let store = MemoryStore::with_entry(KEY, raw);
            let registry = JobRegistry::new(&store, KEY);
            assert!(registry.list().is_empty(), "{raw} should read as empty");
        }
    }

    #[test]
    fn duplicate_entries_on_disk_are_collapsed() {
        let store = MemoryStore::with_entry(KEY, r#"["a","b","a"]"#);
        let registry = JobRegistry::new(&store, KEY);
        assert_eq!(registry.list(), ids(&["a", "b"]));
    }

    #[test]
    fn blank_ids_are_ignored() {
        let store = MemoryStore::new();
        let registry = JobRegistry::new(&store, KEY);
        registry.add(&JobId::from("  "));
        assert!(registry.is_empty());
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn broken_store_never_panics() {
        let store = MemoryStore::new();
        store.set_broken(true);
        let registry = JobRegistry::new(&store, KEY);

        registry.add(&JobId::from("a"));
        registry.remove(&JobId::from("a"));
        registry.clear();
        assert!(registry.list().is_empty());
    }

    #[test]
    fn clear_drops_the_key() {
        let store = MemoryStore::new();
        let registry = JobRegistry::new(&store, KEY);
        registry.add(&JobId::from("a"));

        registry.clear();

        assert_eq!(store.raw(KEY), None);
        assert!(registry.is_empty());
    }
}
