use areg_store::StoreError;
use areg_types::{CodecError, TypeError};

/// Errors returned by contract operations.
///
/// Every failure is terminal for the current operation. Nothing is retried
/// here; retry policy belongs to whoever submits the transaction.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// `create_asset` was called with an id that is already present.
    #[error("the asset {id} already exists")]
    AlreadyExists { id: String },

    /// The id is not present in world state.
    #[error("the asset {id} does not exist")]
    NotFound { id: String },

    /// An argument failed validation before the store was touched.
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// The asset could not be serialized.
    #[error("failed to encode asset {id}")]
    Encoding {
        id: String,
        #[source]
        source: CodecError,
    },

    /// Bytes stored at `key` are not a well-formed asset.
    #[error("failed to decode asset stored at key {key}")]
    Decoding {
        key: String,
        #[source]
        source: CodecError,
    },

    /// The world state rejected or failed an operation.
    #[error("world state {op} failed{}", key_context(.key))]
    Store {
        op: &'static str,
        key: Option<String>,
        #[source]
        source: StoreError,
    },
}

fn key_context(key: &Option<String>) -> String {
    match key {
        Some(key) => format!(" for key {key}"),
        None => String::new(),
    }
}

impl ContractError {
    pub(crate) fn store(op: &'static str, key: &str) -> impl FnOnce(StoreError) -> Self {
        let key = key.to_string();
        move |source| Self::Store {
            op,
            key: Some(key),
            source,
        }
    }

    pub(crate) fn scan(op: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store {
            op,
            key: None,
            source,
        }
    }
}

impl From<TypeError> for ContractError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidField { field, reason } => Self::InvalidArgument { field, reason },
        }
    }
}

/// Commit failures reported by a transaction host.
impl From<StoreError> for ContractError {
    fn from(source: StoreError) -> Self {
        let key = match &source {
            StoreError::Conflict { key } => Some(key.clone()),
            _ => None,
        };
        Self::Store {
            op: "commit",
            key,
            source,
        }
    }
}

/// Result alias for contract operations.
pub type ContractResult<T> = Result<T, ContractError>;
