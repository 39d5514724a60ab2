use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::{check_range, range_bounds, KeyValue, RangeCursor, WorldState};

/// A committed value together with the version that wrote it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Entry {
    pub value: Vec<u8>,
    pub version: u64,
}

/// Committed key space. Versions come from one counter, so a key that is
/// deleted and recreated never gets its old version back.
#[derive(Debug, Default)]
pub(crate) struct Committed {
    pub entries: BTreeMap<String, Entry>,
    pub last_version: u64,
}

impl Committed {
    pub fn write(&mut self, key: &str, value: Vec<u8>) {
        self.last_version += 1;
        let version = self.last_version;
        self.entries.insert(key.to_string(), Entry { value, version });
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn version_of(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|e| e.version)
    }

    /// Entries inside `[start_key, end_key)` in key order.
    pub fn range<'a>(
        &'a self,
        start_key: &'a str,
        end_key: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Entry)> + 'a {
        self.entries.range::<str, _>(range_bounds(start_key, end_key))
    }
}

/// In-memory, `BTreeMap`-based world state.
///
/// Writes through the [`WorldState`] impl on this type are applied
/// immediately. For per-transaction isolation use [`begin`](Self::begin) or
/// [`transact`](Self::transact).
///
/// Range scans iterate in lexicographic key order over a copy of the range
/// taken when the cursor opens.
pub struct InMemoryWorldState {
    committed: RwLock<Committed>,
    open_cursors: Arc<AtomicUsize>,
}

impl InMemoryWorldState {
    /// Create a new empty world state.
    pub fn new() -> Self {
        Self {
            committed: RwLock::new(Committed::default()),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Build a world state holding the given entries.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Vec<u8>>,
    {
        let mut committed = Committed::default();
        for (key, value) in entries {
            committed.write(key.as_ref(), value.into());
        }
        Self {
            committed: RwLock::new(committed),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of committed keys.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read_committed()?.entries.len())
    }

    /// Returns `true` if no key is committed.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Sorted list of all committed keys.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.read_committed()?.entries.keys().cloned().collect())
    }

    /// All committed entries in key order.
    pub fn entries(&self) -> StoreResult<Vec<KeyValue>> {
        Ok(self
            .read_committed()?
            .entries
            .iter()
            .map(|(k, e)| KeyValue::new(k.clone(), e.value.clone()))
            .collect())
    }

    /// Number of range cursors opened and not yet closed.
    ///
    /// A cursor dropped without `close` stays counted here: that is a leak.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    pub(crate) fn read_committed(&self) -> StoreResult<RwLockReadGuard<'_, Committed>> {
        self.committed
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    pub(crate) fn write_committed(&self) -> StoreResult<RwLockWriteGuard<'_, Committed>> {
        self.committed
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    pub(crate) fn cursor_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.open_cursors)
    }
}

impl Default for InMemoryWorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState for InMemoryWorldState {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let committed = self.read_committed()?;
        Ok(committed.entries.get(key).map(|e| e.value.clone()))
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.write_committed()?.write(key, value.to_vec());
        debug!(key, len = value.len(), "state put");
        Ok(())
    }

    fn del_state(&self, key: &str) -> StoreResult<()> {
        let existed = self.write_committed()?.remove(key);
        debug!(key, existed, "state delete");
        Ok(())
    }

    fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> StoreResult<Box<dyn RangeCursor + '_>> {
        check_range(start_key, end_key)?;
        let entries: Vec<KeyValue> = self
            .read_committed()?
            .range(start_key, end_key)
            .map(|(k, e)| KeyValue::new(k.clone(), e.value.clone()))
            .collect();
        Ok(Box::new(MemoryCursor::open(entries, self.cursor_counter())))
    }
}

impl std::fmt::Debug for InMemoryWorldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWorldState")
            .field("key_count", &self.len().ok())
            .field("open_cursors", &self.open_cursors())
            .finish()
    }
}

/// Cursor over a materialized range.
pub struct MemoryCursor {
    entries: std::vec::IntoIter<KeyValue>,
    /// Present while the cursor is open.
    counter: Option<Arc<AtomicUsize>>,
}

impl MemoryCursor {
    pub(crate) fn open(entries: Vec<KeyValue>, counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self {
            entries: entries.into_iter(),
            counter: Some(counter),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.counter.is_none()
    }
}

impl RangeCursor for MemoryCursor {
    fn next_entry(&mut self) -> StoreResult<Option<KeyValue>> {
        if self.is_closed() {
            return Err(StoreError::CursorClosed);
        }
        Ok(self.entries.next())
    }

    fn close(&mut self) -> StoreResult<()> {
        if let Some(counter) = self.counter.take() {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        if !self.is_closed() {
            warn!(remaining = self.entries.len(), "range cursor dropped without close");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(cursor: &mut dyn RangeCursor) -> Vec<KeyValue> {
        let mut out = Vec::new();
        while let Some(kv) = cursor.next_entry().unwrap() {
            out.push(kv);
        }
        out
    }

    fn keys_of(entries: &[KeyValue]) -> Vec<&str> {
        entries.iter().map(|kv| kv.key.as_str()).collect()
    }

    // -----------------------------------------------------------------------
    // Point operations
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let state = InMemoryWorldState::new();
        state.put_state("a", b"one").unwrap();
        assert_eq!(state.get_state("a").unwrap(), Some(b"one".to_vec()));
    }

    #[test]
    fn get_missing_returns_none() {
        let state = InMemoryWorldState::new();
        assert!(state.get_state("missing").unwrap().is_none());
    }

    #[test]
    fn put_overwrites() {
        let state = InMemoryWorldState::new();
        state.put_state("a", b"one").unwrap();
        state.put_state("a", b"two").unwrap();
        assert_eq!(state.get_state("a").unwrap(), Some(b"two".to_vec()));
        assert_eq!(state.len().unwrap(), 1);
    }

    #[test]
    fn delete_removes_key() {
        let state = InMemoryWorldState::new();
        state.put_state("a", b"one").unwrap();
        state.del_state("a").unwrap();
        assert!(state.get_state("a").unwrap().is_none());
        assert!(state.is_empty().unwrap());
    }

    #[test]
    fn delete_missing_is_not_an_error() {
        let state = InMemoryWorldState::new();
        assert!(state.del_state("never-written").is_ok());
    }

    #[test]
    fn every_write_gets_a_fresh_version() {
        let state = InMemoryWorldState::new();
        state.put_state("a", b"1").unwrap();
        let v1 = state.read_committed().unwrap().version_of("a").unwrap();
        state.del_state("a").unwrap();
        state.put_state("a", b"1").unwrap();
        let v2 = state.read_committed().unwrap().version_of("a").unwrap();
        assert!(v2 > v1);
    }

    #[test]
    fn from_entries_populates_state() {
        let state = InMemoryWorldState::from_entries([("b", b"2".to_vec()), ("a", b"1".to_vec())]);
        assert_eq!(state.keys().unwrap(), vec!["a", "b"]);
    }

    // -----------------------------------------------------------------------
    // Range scans
    // -----------------------------------------------------------------------

    #[test]
    fn full_scan_is_sorted() {
        let state = InMemoryWorldState::new();
        for key in ["3", "1", "10", "2"] {
            state.put_state(key, key.as_bytes()).unwrap();
        }
        let mut cursor = state.get_state_by_range("", "").unwrap();
        let entries = collect(cursor.as_mut());
        cursor.close().unwrap();
        assert_eq!(keys_of(&entries), vec!["1", "10", "2", "3"]);
    }

    #[test]
    fn bounded_scan() {
        let state = InMemoryWorldState::from_entries(
            ["a", "b", "c", "d"].map(|k| (k, k.as_bytes().to_vec())),
        );
        let mut cursor = state.get_state_by_range("b", "d").unwrap();
        let entries = collect(cursor.as_mut());
        cursor.close().unwrap();
        assert_eq!(keys_of(&entries), vec!["b", "c"]);
    }

    #[test]
    fn committed_range_honours_bounds() {
        let mut committed = Committed::default();
        for key in ["a", "b", "c", "d"] {
            committed.write(key, key.as_bytes().to_vec());
        }
        let keys = |start: &str, end: &str| -> Vec<String> {
            committed.range(start, end).map(|(k, _)| k.clone()).collect()
        };
        assert_eq!(keys("", ""), vec!["a", "b", "c", "d"]);
        assert_eq!(keys("b", ""), vec!["b", "c", "d"]);
        assert_eq!(keys("", "c"), vec!["a", "b"]);
        assert_eq!(keys("b", "d"), vec!["b", "c"]);
        assert_eq!(keys("bb", "bc"), Vec::<String>::new());
        assert_eq!(keys("c", "c"), Vec::<String>::new());
        assert_eq!(keys("d", "a"), Vec::<String>::new());
    }

    #[test]
    fn empty_scan() {
        let state = InMemoryWorldState::new();
        let mut cursor = state.get_state_by_range("", "").unwrap();
        assert!(cursor.next_entry().unwrap().is_none());
        cursor.close().unwrap();
    }

    #[test]
    fn inverted_scan_rejected() {
        let state = InMemoryWorldState::new();
        assert!(matches!(
            state.get_state_by_range("z", "a").map(|_| ()),
            Err(StoreError::InvalidRange { .. })
        ));
        assert_eq!(state.open_cursors(), 0);
    }

    #[test]
    fn cursor_sees_state_at_open() {
        let state = InMemoryWorldState::from_entries([("a", b"1".to_vec())]);
        let mut cursor = state.get_state_by_range("", "").unwrap();
        state.put_state("b", b"2").unwrap();
        let entries = collect(cursor.as_mut());
        cursor.close().unwrap();
        assert_eq!(keys_of(&entries), vec!["a"]);
    }

    // -----------------------------------------------------------------------
    // Cursor lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn close_releases_cursor() {
        let state = InMemoryWorldState::new();
        let mut cursor = state.get_state_by_range("", "").unwrap();
        assert_eq!(state.open_cursors(), 1);
        cursor.close().unwrap();
        assert_eq!(state.open_cursors(), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let state = InMemoryWorldState::new();
        let mut cursor = state.get_state_by_range("", "").unwrap();
        cursor.close().unwrap();
        cursor.close().unwrap();
        assert_eq!(state.open_cursors(), 0);
    }

    #[test]
    fn next_after_close_fails() {
        let state = InMemoryWorldState::from_entries([("a", b"1".to_vec())]);
        let mut cursor = state.get_state_by_range("", "").unwrap();
        cursor.close().unwrap();
        assert!(matches!(cursor.next_entry(), Err(StoreError::CursorClosed)));
    }

    #[test]
    fn dropped_cursor_counts_as_leaked() {
        let state = InMemoryWorldState::new();
        {
            let _cursor = state.get_state_by_range("", "").unwrap();
        }
        assert_eq!(state.open_cursors(), 1);
    }

    // -----------------------------------------------------------------------
    // Concurrency / Debug
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_reads_are_safe() {
        use std::thread;

        let state = Arc::new(InMemoryWorldState::from_entries([("shared", b"data".to_vec())]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    assert_eq!(state.get_state("shared").unwrap(), Some(b"data".to_vec()));
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let state = InMemoryWorldState::from_entries([("a", b"1".to_vec())]);
        let debug = format!("{state:?}");
        assert!(debug.contains("InMemoryWorldState"));
        assert!(debug.contains("key_count: Some(1)"));
    }

    #[test]
    fn poisoned_lock_is_an_error_not_an_empty_store() {
        let state = Arc::new(InMemoryWorldState::from_entries([("a", b"1".to_vec())]));
        let poisoner = Arc::clone(&state);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.committed.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(state.len(), Err(StoreError::Backend(_))));
        assert!(matches!(state.is_empty(), Err(StoreError::Backend(_))));
        assert!(state.get_state("a").is_err());
    }
}
