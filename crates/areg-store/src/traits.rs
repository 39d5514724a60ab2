use std::ops::Bound;

use crate::error::{StoreError, StoreResult};

/// One entry yielded by a range scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Cursor over the result of a range scan.
///
/// A cursor may hold resources on the store side, so callers must call
/// [`close`](RangeCursor::close) on every exit path. Closing twice is a no-op;
/// advancing a closed cursor fails with [`StoreError::CursorClosed`].
pub trait RangeCursor {
    /// Advance the cursor. Returns `Ok(None)` once the range is exhausted.
    fn next_entry(&mut self) -> StoreResult<Option<KeyValue>>;

    /// Release the cursor.
    fn close(&mut self) -> StoreResult<()>;
}

/// Key-value world state, as seen by the registry for one transaction.
///
/// The registry relies on exactly these four operations:
/// - point lookup, returning `Ok(None)` for an absent key
/// - unconditional upsert
/// - unconditional removal
/// - lexicographic range scan with an inclusive start and exclusive end,
///   where an empty bound means "unbounded"
///
/// Implementations must be thread-safe and must surface every backend
/// failure as an error.
pub trait WorldState: Send + Sync {
    /// Read the value stored at `key`.
    fn get_state(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Store `value` at `key`, replacing any previous value.
    fn put_state(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Remove `key`.
    fn del_state(&self, key: &str) -> StoreResult<()>;

    /// Open a cursor over `[start_key, end_key)`.
    ///
    /// Pass `""` for either bound to leave that side open; `("", "")` scans
    /// the whole namespace.
    fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> StoreResult<Box<dyn RangeCursor + '_>>;
}

/// Reject ranges whose bounded start sorts after their bounded end.
pub(crate) fn check_range(start_key: &str, end_key: &str) -> StoreResult<()> {
    if !start_key.is_empty() && !end_key.is_empty() && start_key > end_key {
        return Err(StoreError::InvalidRange {
            start: start_key.to_string(),
            end: end_key.to_string(),
        });
    }
    Ok(())
}

/// `[start_key, end_key)` as `BTreeMap::range` bounds, empty meaning open.
///
/// An inverted range collapses to the empty range `[start_key, start_key)`.
pub(crate) fn range_bounds<'a>(
    start_key: &'a str,
    end_key: &'a str,
) -> (Bound<&'a str>, Bound<&'a str>) {
    let start = if start_key.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Included(start_key)
    };
    let end = match end_key {
        "" => Bound::Unbounded,
        end if !start_key.is_empty() && end < start_key => Bound::Excluded(start_key),
        end => Bound::Excluded(end),
    };
    (start, end)
}

/// Whether `key` falls inside `[start_key, end_key)` with open empty bounds.
pub(crate) fn key_in_range(key: &str, start_key: &str, end_key: &str) -> bool {
    (start_key.is_empty() || key >= start_key) && (end_key.is_empty() || key < end_key)
}
