//! Staging sessions and two-phase commit
//!
//! A [`Session`] provides read-committed isolation: the first `get` clones
//! the committed record into staging and pins the version it saw; writes
//! stay in staging and are invisible to every other session until applied.
//!
//! Commit is split in two so that several stores can commit as one unit:
//! [`Session::prepare`] locks the store and validates the pinned versions,
//! [`Prepared::apply`] installs the writes. Prepare every participating
//! session first, then apply them all; if any prepare fails, dropping the
//! earlier guards rolls the whole unit back. A single unit of work must not
//! hold two sessions on the same store.

use parking_lot::RwLockWriteGuard;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::{Result, StorageError};
use crate::store::{MemoryStore, Record, Versioned};

/// The staging half of a unit of work, bound to one store
pub struct Session<T: Record> {
    store: Arc<MemoryStore<T>>,
    // BTreeMap keeps the apply order deterministic
    staged: BTreeMap<String, T>,
    // Version observed at first read; absent for records staged as new
    pinned: HashMap<String, u64>,
}

impl<T: Record> Session<T> {
    pub(crate) fn new(store: Arc<MemoryStore<T>>) -> Self {
        Self {
            store,
            staged: BTreeMap::new(),
            pinned: HashMap::new(),
        }
    }

    /// Read a record, staging a private copy on first access
    pub fn get(&mut self, key: &str) -> Option<&T> {
        self.stage(key);
        self.staged.get(key)
    }

    /// Read a record for mutation, staging a private copy on first access
    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.stage(key);
        self.staged.get_mut(key)
    }

    /// Stage an insert (or overwrite of an already-staged record)
    pub fn put(&mut self, record: T) {
        self.staged.insert(record.key(), record);
    }

    /// True once any read or write has been staged
    pub fn is_dirty(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Keys currently staged in this session
    pub fn staged_keys(&self) -> Vec<String> {
        self.staged.keys().cloned().collect()
    }

    /// Discard all staged state
    pub fn rollback(&mut self) {
        self.staged.clear();
        self.pinned.clear();
    }

    fn stage(&mut self, key: &str) {
        if self.staged.contains_key(key) {
            return;
        }
        if let Some((record, version)) = self.store.load(key) {
            self.staged.insert(key.to_string(), record);
            self.pinned.insert(key.to_string(), version);
        }
    }

    /// Lock the store and validate every pinned version
    ///
    /// Returns a guard holding the store's write lock; nothing is written
    /// until [`Prepared::apply`]. Fails with [`StorageError::Conflict`] if
    /// any record was committed by another session since it was read here,
    /// or if a record staged as new has been created concurrently.
    pub fn prepare(&mut self) -> Result<Prepared<'_, T>> {
        let guard = self.store.cells.write();

        for (key, _) in self.staged.iter() {
            let current = guard.get(key).map(|cell| cell.version);
            match (self.pinned.get(key), current) {
                // Record staged as new: must still be absent
                (None, Some(_)) => return Err(StorageError::Conflict(key.clone())),
                // Record read at some version: must still be there, unchanged
                (Some(pinned), current) if current != Some(*pinned) => {
                    return Err(StorageError::Conflict(key.clone()))
                }
                _ => {}
            }
        }

        let writes = std::mem::take(&mut self.staged).into_iter().collect();
        self.pinned.clear();

        Ok(Prepared { guard, writes })
    }

    /// Validate and apply in one step (single-store unit of work)
    pub fn commit(&mut self) -> Result<()> {
        self.prepare()?.apply();
        Ok(())
    }
}

/// A validated, lock-holding commit for one store
///
/// Dropping this without calling [`Prepared::apply`] releases the lock and
/// discards the writes.
#[derive(Debug)]
pub struct Prepared<'a, T: Record> {
    guard: RwLockWriteGuard<'a, HashMap<String, Versioned<T>>>,
    writes: Vec<(String, T)>,
}

impl<T: Record> Prepared<'_, T> {
    /// Install the staged records and bump their versions. Infallible:
    /// validation already happened in `prepare`.
    pub fn apply(mut self) {
        for (key, record) in self.writes.drain(..) {
            let version = self.guard.get(&key).map(|cell| cell.version).unwrap_or(0);
            self.guard.insert(
                key,
                Versioned {
                    record,
                    version: version + 1,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        id: String,
        value: i64,
    }

    impl Record for Counter {
        fn key(&self) -> String {
            self.id.clone()
        }
    }

    fn counter(id: &str, value: i64) -> Counter {
        Counter {
            id: id.into(),
            value,
        }
    }

    fn seeded_store() -> Arc<MemoryStore<Counter>> {
        let store = Arc::new(MemoryStore::new());
        let mut session = store.session();
        session.put(counter("c", 10));
        session.commit().unwrap();
        store
    }

    #[test]
    fn test_read_committed_isolation() {
        let store = seeded_store();

        let mut writer = store.session();
        writer.get_mut("c").unwrap().value = 99;

        // Uncommitted writes are invisible to other sessions
        let mut reader = store.session();
        assert_eq!(reader.get("c").unwrap().value, 10);
        assert_eq!(store.get("c").unwrap().value, 10);

        writer.commit().unwrap();
        assert_eq!(store.get("c").unwrap().value, 99);
    }

    #[test]
    fn test_concurrent_commit_rejected() {
        let store = seeded_store();

        let mut first = store.session();
        first.get_mut("c").unwrap().value = 11;

        let mut second = store.session();
        second.get_mut("c").unwrap().value = 12;

        first.commit().unwrap();
        assert_eq!(
            second.commit(),
            Err(StorageError::Conflict("c".to_string()))
        );

        // The losing session changed nothing
        assert_eq!(store.get("c").unwrap().value, 11);
    }

    #[test]
    fn test_insert_conflict_on_concurrent_create() {
        let store: Arc<MemoryStore<Counter>> = Arc::new(MemoryStore::new());

        let mut first = store.session();
        first.put(counter("x", 1));

        let mut second = store.session();
        second.put(counter("x", 2));

        first.commit().unwrap();
        assert!(matches!(second.commit(), Err(StorageError::Conflict(_))));
        assert_eq!(store.get("x").unwrap().value, 1);
    }

    #[test]
    fn test_drop_without_commit_is_rollback() {
        let store = seeded_store();

        {
            let mut session = store.session();
            session.get_mut("c").unwrap().value = -5;
            // dropped here without commit
        }

        assert_eq!(store.get("c").unwrap().value, 10);
    }

    #[test]
    fn test_rollback_clears_staging() {
        let store = seeded_store();

        let mut session = store.session();
        session.get_mut("c").unwrap().value = 42;
        session.rollback();
        assert!(!session.is_dirty());
        session.commit().unwrap();

        assert_eq!(store.get("c").unwrap().value, 10);
    }

    #[test]
    fn test_two_store_prepare_then_apply() {
        let cash = seeded_store();
        let stock: Arc<MemoryStore<Counter>> = Arc::new(MemoryStore::new());

        let mut cash_session = cash.session();
        cash_session.get_mut("c").unwrap().value = 0;
        let mut stock_session = stock.session();
        stock_session.put(counter("s", 7));

        let prepared_cash = cash_session.prepare().unwrap();
        let prepared_stock = stock_session.prepare().unwrap();
        prepared_cash.apply();
        prepared_stock.apply();

        assert_eq!(cash.get("c").unwrap().value, 0);
        assert_eq!(stock.get("s").unwrap().value, 7);
    }

    #[test]
    fn test_failed_prepare_aborts_whole_unit() {
        let cash = seeded_store();
        let stock = seeded_store();

        // A competing session advances the stock store first
        let mut rival = stock.session();
        rival.get_mut("c").unwrap().value = 1;

        let mut cash_session = cash.session();
        cash_session.get_mut("c").unwrap().value = 0;
        let mut stock_session = stock.session();
        stock_session.get_mut("c").unwrap().value = 2;

        rival.commit().unwrap();

        let prepared_cash = cash_session.prepare().unwrap();
        let err = stock_session.prepare().unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        // Dropping the cash guard without apply leaves both stores untouched
        drop(prepared_cash);
        assert_eq!(cash.get("c").unwrap().value, 10);
        assert_eq!(stock.get("c").unwrap().value, 1);
    }
}
