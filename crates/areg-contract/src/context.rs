use areg_store::{Transaction, WorldState};

/// Per-invocation handle binding a contract call to one unit of work.
pub trait TransactionContext {
    /// Identifier of the transaction this call runs in.
    fn tx_id(&self) -> &str;

    /// World state as seen by this transaction.
    fn stub(&self) -> &dyn WorldState;
}

impl TransactionContext for Transaction<'_> {
    fn tx_id(&self) -> &str {
        Transaction::tx_id(self)
    }

    fn stub(&self) -> &dyn WorldState {
        self
    }
}

/// Context that talks to a world state directly, without buffering.
///
/// Useful when the store itself is the transaction (a host-provided stub) or
/// in tests with a substitute store.
pub struct DirectContext<'a> {
    tx_id: String,
    state: &'a dyn WorldState,
}

impl<'a> DirectContext<'a> {
    pub fn new(tx_id: impl Into<String>, state: &'a dyn WorldState) -> Self {
        Self {
            tx_id: tx_id.into(),
            state,
        }
    }
}

impl TransactionContext for DirectContext<'_> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn stub(&self) -> &dyn WorldState {
        self.state
    }
}
