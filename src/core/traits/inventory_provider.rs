use async_trait::async_trait;

use crate::core::errors::Result;
use crate::core::models::inventory::KeyInventory;

/// Port for fetching one side's current key inventory.
///
/// Implementations live in `adapters` (HttpCustodian, HttpValidatorClient).
/// The core layer only depends on this trait, never on a concrete endpoint.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Fetch the current raw listing and normalize it into a
    /// `KeyInventory`.
    ///
    /// Any transport failure, non-success status, or malformed payload
    /// is a `Fetch` error — the cycle must abort without mutating,
    /// because reconciling against an incomplete inventory risks
    /// deleting keys that are still desired.
    async fn fetch(&self) -> Result<KeyInventory>;
}
