use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Key prefix reserved by world-state hosts for composite keys.
const COMPOSITE_KEY_PREFIX: char = '\u{0000}';

/// A registered asset.
///
/// The `id` doubles as the world-state key, so at most one asset exists per
/// id. `content_hash` is opaque to the registry: it is supplied by the caller
/// and never computed or verified here.
///
/// The serde form of this type is the API shape (`id`, `owner`,
/// `contentHash`). The bytes written to world state come from
/// [`crate::codec::encode`], never from this derive.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub owner: String,
    pub content_hash: String,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        owner: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            content_hash: content_hash.into(),
        }
    }

    /// Check the field constraints of a new asset.
    ///
    /// The id must be a usable world-state key and the owner must be
    /// non-empty. The content hash is not inspected.
    pub fn validate(&self) -> Result<(), TypeError> {
        validate_key(&self.id)?;
        if self.owner.is_empty() {
            return Err(TypeError::InvalidField {
                field: "owner",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (owner: {}, hash: {})", self.id, self.owner, self.content_hash)
    }
}

/// Validate a string for use as an asset id / world-state key.
///
/// # Examples
///
/// ```
/// use areg_types::validate_key;
///
/// assert!(validate_key("photo-1").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("\u{0000}composite").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<(), TypeError> {
    if key.is_empty() {
        return Err(TypeError::InvalidField {
            field: "id",
            reason: "must not be empty".into(),
        });
    }
    if key.starts_with(COMPOSITE_KEY_PREFIX) {
        return Err(TypeError::InvalidField {
            field: "id",
            reason: "must not start with U+0000 (reserved for composite keys)".into(),
        });
    }
    Ok(())
}
