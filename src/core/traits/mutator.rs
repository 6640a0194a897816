use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::core::errors::Result;
use crate::core::models::cycle_report::MutationOutcome;
use crate::core::models::key_record::KeyIdentifier;

/// Port for mutating the client's key store.
///
/// Each operation issues exactly one batched remote call carrying the
/// full set — the client API is batch-oriented, and one call is as
/// close to atomic as it allows. Callers must not pass an empty set;
/// the orchestrator short-circuits those before reaching the port.
///
/// Implementations do not retry or roll back on partial failure: the
/// raw per-key outcomes surface to the orchestrator, and keys that
/// failed simply reappear in the next cycle's delta.
#[async_trait]
pub trait KeyMutator: Send + Sync {
    /// Import the given keys into the client.
    async fn apply_additions(
        &self,
        keys: &BTreeSet<KeyIdentifier>,
    ) -> Result<Vec<MutationOutcome>>;

    /// Delete the given keys from the client.
    async fn apply_removals(
        &self,
        keys: &BTreeSet<KeyIdentifier>,
    ) -> Result<Vec<MutationOutcome>>;
}
