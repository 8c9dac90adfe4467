//! Committed record storage
//!
//! A [`MemoryStore`] is a map from record key to [`Versioned`] cell. The
//! version counter starts at 1 on first commit and increments on every
//! subsequent commit; sessions use it for optimistic conflict detection.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::session::Session;

/// A record that can live in a [`MemoryStore`]
///
/// Records are stored by value; sessions clone them into staging on first
/// read, so `Clone` must be a deep copy (true for ordinary owned data).
pub trait Record: Clone + Send + Sync + 'static {
    /// The record's primary key within its store
    fn key(&self) -> String;
}

/// A committed record together with its version counter
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    /// The committed record
    pub record: T,
    /// Commit counter, 1 after the first commit
    pub version: u64,
}

/// In-memory store of committed, versioned records
#[derive(Debug)]
pub struct MemoryStore<T: Record> {
    pub(crate) cells: RwLock<HashMap<String, Versioned<T>>>,
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> MemoryStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
        }
    }

    /// Read a committed record by key
    pub fn get(&self, key: &str) -> Option<T> {
        self.cells.read().get(key).map(|cell| cell.record.clone())
    }

    /// Read a committed record together with its version
    pub(crate) fn load(&self, key: &str) -> Option<(T, u64)> {
        self.cells
            .read()
            .get(key)
            .map(|cell| (cell.record.clone(), cell.version))
    }

    /// True if a committed record exists for the key
    pub fn contains(&self, key: &str) -> bool {
        self.cells.read().contains_key(key)
    }

    /// Keys of all committed records, unordered
    pub fn keys(&self) -> Vec<String> {
        self.cells.read().keys().cloned().collect()
    }

    /// All committed records, unordered
    pub fn snapshot(&self) -> Vec<T> {
        self.cells
            .read()
            .values()
            .map(|cell| cell.record.clone())
            .collect()
    }

    /// Number of committed records
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    /// True when no records have been committed
    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }

    /// Open a staging session against this store
    pub fn session(self: &Arc<Self>) -> Session<T> {
        Session::new(Arc::clone(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: String,
        body: String,
    }

    impl Record for Note {
        fn key(&self) -> String {
            self.id.clone()
        }
    }

    fn note(id: &str, body: &str) -> Note {
        Note {
            id: id.into(),
            body: body.into(),
        }
    }

    #[test]
    fn test_committed_reads() {
        let store = Arc::new(MemoryStore::new());

        let mut session = store.session();
        session.put(note("a", "first"));
        session.commit().unwrap();

        assert!(store.contains("a"));
        assert_eq!(store.get("a").unwrap().body, "first");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_version_increments_per_commit() {
        let store = Arc::new(MemoryStore::new());

        let mut session = store.session();
        session.put(note("a", "first"));
        session.commit().unwrap();
        assert_eq!(store.load("a").unwrap().1, 1);

        let mut session = store.session();
        session.get_mut("a").unwrap().body = "second".into();
        session.commit().unwrap();
        assert_eq!(store.load("a").unwrap().1, 2);
        assert_eq!(store.get("a").unwrap().body, "second");
    }
}
