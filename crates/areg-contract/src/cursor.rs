use areg_store::{KeyValue, RangeCursor, StoreError, StoreResult};
use tracing::warn;

/// Owns a range cursor and closes it on every exit path.
///
/// The normal path calls [`finish`](Self::finish) so a close failure is
/// reported to the caller. Any other path (early return, `?`, unwinding)
/// closes the cursor on drop and logs a close failure instead.
pub(crate) struct ScopedCursor<'a> {
    cursor: Option<Box<dyn RangeCursor + 'a>>,
}

impl<'a> ScopedCursor<'a> {
    pub fn new(cursor: Box<dyn RangeCursor + 'a>) -> Self {
        Self {
            cursor: Some(cursor),
        }
    }

    pub fn next_entry(&mut self) -> StoreResult<Option<KeyValue>> {
        match self.cursor.as_mut() {
            Some(cursor) => cursor.next_entry(),
            None => Err(StoreError::CursorClosed),
        }
    }

    pub fn finish(mut self) -> StoreResult<()> {
        match self.cursor.take() {
            Some(mut cursor) => cursor.close(),
            None => Ok(()),
        }
    }
}

impl Drop for ScopedCursor<'_> {
    fn drop(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            if let Err(e) = cursor.close() {
                warn!(error = %e, "failed to close range cursor");
            }
        }
    }
}
