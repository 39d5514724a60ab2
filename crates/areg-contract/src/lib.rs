//! Asset registry contract.
//!
//! [`AssetLedger`] is a stateless contract object. Each operation receives a
//! [`TransactionContext`] bound to one transaction and reaches world state
//! only through it. The host commits the transaction's writes when the
//! operation succeeds and discards them when it fails.
//!
//! # Operations
//!
//! | Operation                          | Store access                 |
//! |------------------------------------|------------------------------|
//! | [`AssetLedger::init_ledger`]       | put per seed asset           |
//! | [`AssetLedger::create_asset`]      | get, then put                |
//! | [`AssetLedger::query_asset`]       | get                          |
//! | [`AssetLedger::delete_asset`]      | get, then delete             |
//! | [`AssetLedger::asset_exists`]      | get                          |
//! | [`AssetLedger::get_all_assets`]    | full range scan              |
//!
//! # Concurrency
//!
//! `create_asset` and `delete_asset` check existence and then act. The pair
//! is race-free only if the host serializes transactions or validates reads
//! at commit, as [`areg_store::Transaction`] does. The contract itself holds
//! no locks and never retries.

pub mod context;
pub mod error;
pub mod ledger;
pub mod seed;

mod cursor;
#[cfg(test)]
mod test_support;

pub use context::{DirectContext, TransactionContext};
pub use error::{ContractError, ContractResult};
pub use ledger::AssetLedger;
pub use seed::seed_assets;
