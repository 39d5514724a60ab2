use areg_types::{codec, Asset};
use tracing::{debug, info};

use crate::context::TransactionContext;
use crate::cursor::ScopedCursor;
use crate::error::{ContractError, ContractResult};
use crate::seed::seed_assets;

/// The asset registry contract.
///
/// Holds no state. Every call reads and writes world state through the
/// context it is given, and the host decides whether those writes commit.
#[derive(Clone, Copy, Debug, Default)]
pub struct AssetLedger;

impl AssetLedger {
    pub fn new() -> Self {
        Self
    }

    /// Write the seed set of assets.
    ///
    /// Seed keys are overwritten unconditionally: this is bootstrap, not a
    /// steady-state create, so no existence check is made. A failure aborts
    /// at the failing asset; earlier puts are left for the host to discard.
    pub fn init_ledger(&self, ctx: &dyn TransactionContext) -> ContractResult<()> {
        let stub = ctx.stub();
        let seed = seed_assets();
        for asset in &seed {
            let bytes = encode(asset)?;
            stub.put_state(&asset.id, &bytes)
                .map_err(ContractError::store("put", &asset.id))?;
        }
        info!(tx_id = ctx.tx_id(), assets = seed.len(), "ledger seeded");
        Ok(())
    }

    /// Register a new asset under `id`.
    ///
    /// Fails with [`ContractError::AlreadyExists`] if `id` is present; the
    /// stored value is left untouched in that case.
    pub fn create_asset(
        &self,
        ctx: &dyn TransactionContext,
        id: &str,
        owner: &str,
        content_hash: &str,
    ) -> ContractResult<()> {
        let asset = Asset::new(id, owner, content_hash);
        asset.validate()?;

        if self.asset_exists(ctx, id)? {
            return Err(ContractError::AlreadyExists { id: id.to_string() });
        }

        let bytes = encode(&asset)?;
        ctx.stub()
            .put_state(id, &bytes)
            .map_err(ContractError::store("put", id))?;
        debug!(tx_id = ctx.tx_id(), id, owner, "asset created");
        Ok(())
    }

    /// Read the asset stored under `id`.
    pub fn query_asset(&self, ctx: &dyn TransactionContext, id: &str) -> ContractResult<Asset> {
        let bytes = ctx
            .stub()
            .get_state(id)
            .map_err(ContractError::store("get", id))?
            .ok_or_else(|| ContractError::NotFound { id: id.to_string() })?;
        decode(id, &bytes)
    }

    /// Remove the asset stored under `id`.
    pub fn delete_asset(&self, ctx: &dyn TransactionContext, id: &str) -> ContractResult<()> {
        if !self.asset_exists(ctx, id)? {
            return Err(ContractError::NotFound { id: id.to_string() });
        }
        ctx.stub()
            .del_state(id)
            .map_err(ContractError::store("delete", id))?;
        debug!(tx_id = ctx.tx_id(), id, "asset deleted");
        Ok(())
    }

    /// Whether any value is stored under `id`.
    ///
    /// Presence is all that counts: a value that would fail to decode still
    /// exists.
    pub fn asset_exists(&self, ctx: &dyn TransactionContext, id: &str) -> ContractResult<bool> {
        let value = ctx
            .stub()
            .get_state(id)
            .map_err(ContractError::store("get", id))?;
        Ok(value.is_some())
    }

    /// Every asset in the namespace, in the order the store's full range
    /// scan yields them.
    ///
    /// The first entry that fails to decode aborts the whole call; a partial
    /// listing is never returned. The scan cursor is closed on every path.
    pub fn get_all_assets(&self, ctx: &dyn TransactionContext) -> ContractResult<Vec<Asset>> {
        let cursor = ctx
            .stub()
            .get_state_by_range("", "")
            .map_err(ContractError::scan("range open"))?;
        let mut cursor = ScopedCursor::new(cursor);

        let mut assets = Vec::new();
        while let Some(entry) = cursor
            .next_entry()
            .map_err(ContractError::scan("range next"))?
        {
            assets.push(decode(&entry.key, &entry.value)?);
        }
        cursor.finish().map_err(ContractError::scan("range close"))?;

        debug!(tx_id = ctx.tx_id(), count = assets.len(), "assets listed");
        Ok(assets)
    }
}

fn encode(asset: &Asset) -> ContractResult<Vec<u8>> {
    codec::encode(asset).map_err(|source| ContractError::Encoding {
        id: asset.id.clone(),
        source,
    })
}

fn decode(key: &str, bytes: &[u8]) -> ContractResult<Asset> {
    codec::decode(bytes).map_err(|source| ContractError::Decoding {
        key: key.to_string(),
        source,
    })
}
