//! World-state storage for the asset registry.
//!
//! The registry contract never owns state. Everything it reads or writes
//! goes through the [`WorldState`] capability handed to it for the duration
//! of one transaction. This crate defines that capability and provides an
//! in-memory host for it.
//!
//! # Storage Backends
//!
//! All backends implement the [`WorldState`] trait:
//!
//! - [`InMemoryWorldState`] -- `BTreeMap`-based committed state with versioned entries
//! - [`Transaction`] -- buffered writes over an [`InMemoryWorldState`], validated on commit
//!
//! # Design Rules
//!
//! 1. The store never interprets values -- it is a pure key-value store.
//! 2. Range cursors are scoped resources and must be closed by the caller.
//! 3. A transaction's writes become visible only when it commits.
//! 4. Commit fails if anything the transaction read has changed since
//!    (optimistic concurrency). Check-then-act sequences in one transaction
//!    are race-free only because of this rule. It covers transactions on one
//!    in-memory state; hosts that share a snapshot file between processes
//!    must serialize load through save themselves.
//! 5. All backend errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod snapshot;
pub mod traits;
pub mod transaction;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryWorldState;
pub use traits::{KeyValue, RangeCursor, WorldState};
pub use transaction::{CommitSummary, Transaction};
