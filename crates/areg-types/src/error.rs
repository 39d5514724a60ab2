use thiserror::Error;

/// Errors produced when validating registry values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Errors produced by the asset wire codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The asset could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// The stored bytes are not a well-formed asset.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
