//! Backend trait definitions

use crate::{Ledger, StoreResult};

/// Where a ledger is persisted.
///
/// `save` replaces the stored ledger as a whole.
pub trait LedgerBackend {
    /// Load the stored ledger, or `None` if nothing was stored yet
    fn load(&self) -> StoreResult<Option<Ledger>>;

    /// Replace the stored ledger
    fn save(&self, ledger: &Ledger) -> StoreResult<()>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}
