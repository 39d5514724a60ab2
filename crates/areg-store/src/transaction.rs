use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::memory::{Committed, InMemoryWorldState, MemoryCursor};
use crate::traits::{check_range, key_in_range, KeyValue, RangeCursor, WorldState};

/// A range scan recorded for phantom detection at commit.
#[derive(Debug)]
struct RangeRead {
    start_key: String,
    end_key: String,
    observed: Vec<(String, u64)>,
}

#[derive(Debug, Default)]
struct TxState {
    /// Committed version observed per key (`None` = absent when read).
    reads: BTreeMap<String, Option<u64>>,
    ranges: Vec<RangeRead>,
    /// Pending writes (`None` = delete).
    writes: BTreeMap<String, Option<Vec<u8>>>,
}

/// Outcome of a successful commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSummary {
    pub tx_id: String,
    pub puts: usize,
    pub deletes: usize,
}

/// One unit of work against an [`InMemoryWorldState`].
///
/// Reads see the transaction's own pending writes first, then committed
/// state. Writes are buffered and applied by [`commit`](Self::commit), which
/// first re-checks every committed value the transaction observed, including
/// the key sets of range scans. If anything changed, commit fails with
/// [`StoreError::Conflict`] and nothing is written.
///
/// Dropping a transaction without committing discards its writes.
pub struct Transaction<'a> {
    tx_id: String,
    state: &'a InMemoryWorldState,
    inner: Mutex<TxState>,
}

impl InMemoryWorldState {
    /// Start a transaction identified by `tx_id`.
    pub fn begin(&self, tx_id: impl Into<String>) -> Transaction<'_> {
        let tx_id = tx_id.into();
        debug!(tx_id = %tx_id, "transaction started");
        Transaction {
            tx_id,
            state: self,
            inner: Mutex::new(TxState::default()),
        }
    }

    /// Run `f` inside a transaction, committing on `Ok` and discarding on
    /// `Err`.
    ///
    /// A commit failure is converted into the caller's error type.
    pub fn transact<T, E, F>(&self, tx_id: impl Into<String>, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let tx = self.begin(tx_id);
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                tx.discard();
                Err(err)
            }
        }
    }
}

impl<'a> Transaction<'a> {
    /// The identifier this transaction was started with.
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Number of buffered writes (puts and deletes).
    pub fn pending_writes(&self) -> StoreResult<usize> {
        Ok(self.lock()?.writes.len())
    }

    /// Validate the read set and apply buffered writes atomically.
    pub fn commit(self) -> StoreResult<CommitSummary> {
        let tx = self
            .inner
            .into_inner()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        let mut committed = self.state.write_committed()?;

        validate_reads(&committed, &tx)?;

        let mut puts = 0;
        let mut deletes = 0;
        for (key, write) in tx.writes {
            match write {
                Some(value) => {
                    committed.write(&key, value);
                    puts += 1;
                }
                None => {
                    committed.remove(&key);
                    deletes += 1;
                }
            }
        }

        info!(tx_id = %self.tx_id, puts, deletes, "transaction committed");
        Ok(CommitSummary {
            tx_id: self.tx_id,
            puts,
            deletes,
        })
    }

    /// Drop all buffered writes.
    pub fn discard(self) {
        debug!(tx_id = %self.tx_id, pending = ?self.pending_writes().ok(), "transaction discarded");
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, TxState>> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }
}

fn validate_reads(committed: &Committed, tx: &TxState) -> StoreResult<()> {
    for (key, seen) in &tx.reads {
        if committed.version_of(key) != *seen {
            return Err(StoreError::Conflict { key: key.clone() });
        }
    }
    for range in &tx.ranges {
        let mut current = committed.range(&range.start_key, &range.end_key);
        for (key, version) in &range.observed {
            match current.next() {
                Some((k, e)) if k == key && e.version == *version => {}
                Some((k, _)) => return Err(StoreError::Conflict { key: k.clone() }),
                None => return Err(StoreError::Conflict { key: key.clone() }),
            }
        }
        if let Some((k, _)) = current.next() {
            return Err(StoreError::Conflict { key: k.clone() });
        }
    }
    Ok(())
}

impl WorldState for Transaction<'_> {
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut tx = self.lock()?;
        if let Some(pending) = tx.writes.get(key) {
            return Ok(pending.clone());
        }
        let committed = self.state.read_committed()?;
        let entry = committed.entries.get(key);
        tx.reads
            .entry(key.to_string())
            .or_insert_with(|| entry.map(|e| e.version));
        Ok(entry.map(|e| e.value.clone()))
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.lock()?
            .writes
            .insert(key.to_string(), Some(value.to_vec()));
        debug!(tx_id = %self.tx_id, key, len = value.len(), "buffered put");
        Ok(())
    }

    fn del_state(&self, key: &str) -> StoreResult<()> {
        self.lock()?.writes.insert(key.to_string(), None);
        debug!(tx_id = %self.tx_id, key, "buffered delete");
        Ok(())
    }

    fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> StoreResult<Box<dyn RangeCursor + '_>> {
        check_range(start_key, end_key)?;
        let mut tx = self.lock()?;
        let committed = self.state.read_committed()?;

        let mut observed = Vec::new();
        let mut merged: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for (key, entry) in committed.range(start_key, end_key) {
            observed.push((key.clone(), entry.version));
            merged.insert(key.clone(), entry.value.clone());
        }
        for (key, write) in tx
            .writes
            .iter()
            .filter(|(k, _)| key_in_range(k, start_key, end_key))
        {
            match write {
                Some(value) => merged.insert(key.clone(), value.clone()),
                None => merged.remove(key),
            };
        }
        tx.ranges.push(RangeRead {
            start_key: start_key.to_string(),
            end_key: end_key.to_string(),
            observed,
        });

        let entries = merged
            .into_iter()
            .map(|(key, value)| KeyValue { key, value })
            .collect();
        Ok(Box::new(MemoryCursor::open(entries, self.state.cursor_counter())))
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("tx_id", &self.tx_id)
            .field("pending_writes", &self.pending_writes().ok())
            .finish()
    }
}
