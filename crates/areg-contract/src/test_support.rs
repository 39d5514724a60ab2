//! Fault-injecting world state for contract tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use areg_store::{InMemoryWorldState, KeyValue, RangeCursor, StoreError, StoreResult, WorldState};

/// Which store operations should fail.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Faults {
    pub get: bool,
    pub delete: bool,
    pub open_range: bool,
    pub close: bool,
    /// Fail every put once this many puts have succeeded.
    pub put_after: Option<usize>,
    /// Fail `next_entry` once this many entries have been yielded.
    pub next_after: Option<usize>,
}

/// Wraps an [`InMemoryWorldState`] and fails the operations named in
/// [`Faults`]. Writes go straight to the inner state.
pub(crate) struct FaultyState {
    pub inner: InMemoryWorldState,
    faults: Faults,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl FaultyState {
    pub fn new(inner: InMemoryWorldState, faults: Faults) -> Self {
        Self {
            inner,
            faults,
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn injected(op: &str) -> StoreError {
        StoreError::Backend(format!("injected {op} failure"))
    }
}

impl WorldState for FaultyState {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.faults.get {
            return Err(Self::injected("get"));
        }
        self.inner.get_state(key)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        if let Some(limit) = self.faults.put_after {
            if self.puts.load(Ordering::SeqCst) >= limit {
                return Err(Self::injected("put"));
            }
        }
        self.inner.put_state(key, value)?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn del_state(&self, key: &str) -> StoreResult<()> {
        if self.faults.delete {
            return Err(Self::injected("delete"));
        }
        self.inner.del_state(key)
    }

    fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> StoreResult<Box<dyn RangeCursor + '_>> {
        if self.faults.open_range {
            return Err(Self::injected("range open"));
        }
        let inner = self.inner.get_state_by_range(start_key, end_key)?;
        Ok(Box::new(FaultyCursor {
            inner,
            faults: self.faults,
            yielded: 0,
        }))
    }
}

struct FaultyCursor<'a> {
    inner: Box<dyn RangeCursor + 'a>,
    faults: Faults,
    yielded: usize,
}

impl RangeCursor for FaultyCursor<'_> {
    fn next_entry(&mut self) -> StoreResult<Option<KeyValue>> {
        if let Some(limit) = self.faults.next_after {
            if self.yielded >= limit {
                return Err(FaultyState::injected("range next"));
            }
        }
        let entry = self.inner.next_entry()?;
        if entry.is_some() {
            self.yielded += 1;
        }
        Ok(entry)
    }

    fn close(&mut self) -> StoreResult<()> {
        self.inner.close()?;
        if self.faults.close {
            return Err(FaultyState::injected("range close"));
        }
        Ok(())
    }
}
