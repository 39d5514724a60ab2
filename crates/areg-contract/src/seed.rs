use areg_types::Asset;

/// The fixed set of assets written by [`crate::AssetLedger::init_ledger`].
pub fn seed_assets() -> Vec<Asset> {
    vec![
        Asset::new("1", "Alice", "hashvalue1"),
        Asset::new("2", "Bob", "hashvalue2"),
        Asset::new("3", "Bob", "hashvalue2"),
    ]
}
