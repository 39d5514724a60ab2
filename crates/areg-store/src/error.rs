/// Errors from world-state operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend failed to serve the request.
    #[error("backend error: {0}")]
    Backend(String),

    /// A key read by the transaction changed before it could commit.
    #[error("read conflict on key {key:?}: value changed since it was read")]
    Conflict { key: String },

    /// The range cursor was advanced after being closed.
    #[error("range cursor is closed")]
    CursorClosed,

    /// The start key of a range scan sorts after its end key.
    #[error("invalid range: start {start:?} sorts after end {end:?}")]
    InvalidRange { start: String, end: String },

    /// I/O error while reading or writing a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot contents are malformed.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
