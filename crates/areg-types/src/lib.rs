//! Foundation types for the asset registry.
//!
//! Every other registry crate depends on `areg-types`. It owns the single
//! record type the registry manages and the byte form that record takes in
//! world state.
//!
//! # Key Types
//!
//! - [`Asset`]: a registered asset with a caller-chosen id, owner label, content hash
//! - [`codec`]: canonical JSON encoding of an asset in world state
//! - [`TypeError`] / [`CodecError`]: validation and codec failures

pub mod asset;
pub mod codec;
pub mod error;

pub use asset::{validate_key, Asset};
pub use codec::{decode, encode, WIRE_FIELDS};
pub use error::{CodecError, CodecResult, TypeError};
