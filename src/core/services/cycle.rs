use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, warn};

use crate::core::errors::{KeysyncError, Result};
use crate::core::models::cycle_report::{BatchStatus, CycleReport, MutationKind};
use crate::core::models::key_record::KeyIdentifier;
use crate::core::services::reconciler::Reconciler;
use crate::core::traits::inventory_provider::InventoryProvider;
use crate::core::traits::mutator::KeyMutator;

/// Orchestrates one reconciliation pass: fetch both inventories,
/// reconcile, mutate, report.
///
/// A cycle is self-contained — every inventory is re-derived from a
/// live fetch, so there is nothing to persist between ticks and a key
/// that fails to apply simply reappears in the next cycle's delta.
pub struct CycleService {
    custodian: Arc<dyn InventoryProvider>,
    client: Arc<dyn InventoryProvider>,
    mutator: Arc<dyn KeyMutator>,
    allow_empty_custodian: bool,
}

impl CycleService {
    pub fn new(
        custodian: Arc<dyn InventoryProvider>,
        client: Arc<dyn InventoryProvider>,
        mutator: Arc<dyn KeyMutator>,
        allow_empty_custodian: bool,
    ) -> Self {
        Self {
            custodian,
            client,
            mutator,
            allow_empty_custodian,
        }
    }

    /// Run one full cycle.
    ///
    /// Returns `Err` only when fetching either inventory failed — the
    /// cycle aborts with zero mutation calls, and the caller retries on
    /// the next tick. Mutation failures never abort: they are captured
    /// in the report and the affected keys retry next cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let started_at = chrono::Utc::now();
        let clock = Instant::now();

        // Both fetches must succeed before anything is mutated. A
        // partial read could schedule removals for keys that are still
        // desired.
        let (custodian_inventory, client_inventory) =
            tokio::try_join!(self.custodian.fetch(), self.client.fetch())?;

        debug!(
            custodian_keys = custodian_inventory.len(),
            client_keys = client_inventory.len(),
            "fetched both inventories"
        );

        let delta = Reconciler.reconcile(&custodian_inventory, &client_inventory);

        let mut withhold_removals = false;
        if custodian_inventory.is_empty() && !delta.to_remove.is_empty() {
            warn!(
                client_keys = delta.to_remove.len(),
                "custodian listing is empty; the delta removes every key loaded on the client"
            );
            if !self.allow_empty_custodian {
                warn!("withholding removals this cycle (allow_empty_custodian = false)");
                withhold_removals = true;
            }
        }

        // The two halves are independent: a failed import batch must
        // not block deletions, and vice versa. Their key sets are
        // disjoint, so running them concurrently cannot race.
        let removals = async {
            if withhold_removals {
                BatchStatus::Withheld
            } else {
                self.run_batch(MutationKind::Delete, &delta.to_remove).await
            }
        };
        let additions = self.run_batch(MutationKind::Import, &delta.to_add);
        let (additions, removals) = tokio::join!(additions, removals);

        Ok(CycleReport {
            started_at,
            duration: clock.elapsed(),
            custodian_keys: custodian_inventory.len(),
            client_keys: client_inventory.len(),
            additions,
            removals,
        })
    }

    /// Apply one half of the delta as a single batched call.
    async fn run_batch(
        &self,
        kind: MutationKind,
        keys: &BTreeSet<KeyIdentifier>,
    ) -> BatchStatus {
        if keys.is_empty() {
            return BatchStatus::Skipped;
        }

        let result = match kind {
            MutationKind::Import => self.mutator.apply_additions(keys).await,
            MutationKind::Delete => self.mutator.apply_removals(keys).await,
        };

        match result {
            Ok(outcomes) => {
                for outcome in outcomes.iter().filter(|o| !o.succeeded) {
                    warn!(
                        key = %outcome.identifier,
                        message = %outcome.message,
                        "client rejected {kind}; key will retry next cycle"
                    );
                }
                BatchStatus::Completed(outcomes)
            }
            Err(e) => {
                error!(operation = %kind, error = %e, "batched mutation failed");
                let reason = match e {
                    KeysyncError::Mutation { reason, .. } => reason,
                    other => other.to_string(),
                };
                BatchStatus::Failed(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::core::errors::KeysyncError;
    use crate::core::models::cycle_report::MutationOutcome;
    use crate::core::models::inventory::{KeyInventory, Side};
    use crate::core::models::key_record::KeyRecord;

    fn ids(keys: &[&str]) -> BTreeSet<KeyIdentifier> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    /// Provider serving a fixed listing, or failing every fetch.
    struct FakeProvider {
        side: Side,
        keys: Vec<&'static str>,
        fail: bool,
    }

    impl FakeProvider {
        fn serving(side: Side, keys: &[&'static str]) -> Self {
            Self {
                side,
                keys: keys.to_vec(),
                fail: false,
            }
        }

        fn failing(side: Side) -> Self {
            Self {
                side,
                keys: Vec::new(),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl InventoryProvider for FakeProvider {
        async fn fetch(&self) -> Result<KeyInventory> {
            if self.fail {
                return Err(KeysyncError::Fetch {
                    side: self.side,
                    reason: "connection refused".to_string(),
                });
            }
            Ok(KeyInventory::from_records(
                self.keys.iter().map(|k| KeyRecord::new(*k)),
            ))
        }
    }

    /// Mutator that records every batch it receives.
    #[derive(Default)]
    struct RecordingMutator {
        additions: Mutex<Vec<BTreeSet<KeyIdentifier>>>,
        removals: Mutex<Vec<BTreeSet<KeyIdentifier>>>,
        fail_additions: bool,
        rejected: BTreeSet<KeyIdentifier>,
    }

    impl RecordingMutator {
        fn outcomes(&self, keys: &BTreeSet<KeyIdentifier>) -> Vec<MutationOutcome> {
            keys.iter()
                .map(|k| MutationOutcome {
                    identifier: k.clone(),
                    succeeded: !self.rejected.contains(k),
                    message: String::new(),
                })
                .collect()
        }
    }

    #[async_trait]
    impl KeyMutator for RecordingMutator {
        async fn apply_additions(
            &self,
            keys: &BTreeSet<KeyIdentifier>,
        ) -> Result<Vec<MutationOutcome>> {
            self.additions.lock().unwrap().push(keys.clone());
            if self.fail_additions {
                return Err(KeysyncError::Mutation {
                    operation: MutationKind::Import,
                    reason: "connection reset".to_string(),
                });
            }
            Ok(self.outcomes(keys))
        }

        async fn apply_removals(
            &self,
            keys: &BTreeSet<KeyIdentifier>,
        ) -> Result<Vec<MutationOutcome>> {
            self.removals.lock().unwrap().push(keys.clone());
            Ok(self.outcomes(keys))
        }
    }

    fn service(
        custodian: FakeProvider,
        client: FakeProvider,
        mutator: RecordingMutator,
        allow_empty_custodian: bool,
    ) -> (CycleService, Arc<RecordingMutator>) {
        let mutator = Arc::new(mutator);
        let svc = CycleService::new(
            Arc::new(custodian),
            Arc::new(client),
            Arc::clone(&mutator) as Arc<dyn KeyMutator>,
            allow_empty_custodian,
        );
        (svc, mutator)
    }

    #[tokio::test]
    async fn applies_the_delta_and_reports_counts() {
        let (svc, mutator) = service(
            FakeProvider::serving(Side::Custodian, &["0xk1", "0xk2"]),
            FakeProvider::serving(Side::Client, &["0xk2", "0xk3"]),
            RecordingMutator::default(),
            true,
        );

        let report = svc.run_cycle().await.unwrap();

        assert_eq!(*mutator.additions.lock().unwrap(), vec![ids(&["0xk1"])]);
        assert_eq!(*mutator.removals.lock().unwrap(), vec![ids(&["0xk3"])]);
        assert_eq!(report.custodian_keys, 2);
        assert_eq!(report.client_keys, 2);
        assert_eq!(report.added(), 1);
        assert_eq!(report.removed(), 1);
        assert_eq!(report.failed(), 0);
    }

    #[tokio::test]
    async fn custodian_fetch_failure_means_zero_mutation_calls() {
        let (svc, mutator) = service(
            FakeProvider::failing(Side::Custodian),
            FakeProvider::serving(Side::Client, &["0xk1"]),
            RecordingMutator::default(),
            true,
        );

        let err = svc.run_cycle().await.unwrap_err();

        assert!(matches!(err, KeysyncError::Fetch { side: Side::Custodian, .. }));
        assert!(mutator.additions.lock().unwrap().is_empty());
        assert!(mutator.removals.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn client_fetch_failure_means_zero_mutation_calls() {
        let (svc, mutator) = service(
            FakeProvider::serving(Side::Custodian, &["0xk1"]),
            FakeProvider::failing(Side::Client),
            RecordingMutator::default(),
            true,
        );

        assert!(svc.run_cycle().await.is_err());
        assert!(mutator.additions.lock().unwrap().is_empty());
        assert!(mutator.removals.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn in_sync_inventories_skip_both_batches() {
        let (svc, mutator) = service(
            FakeProvider::serving(Side::Custodian, &["0xk1"]),
            FakeProvider::serving(Side::Client, &["0xk1"]),
            RecordingMutator::default(),
            true,
        );

        let report = svc.run_cycle().await.unwrap();

        assert_eq!(report.additions, BatchStatus::Skipped);
        assert_eq!(report.removals, BatchStatus::Skipped);
        assert!(mutator.additions.lock().unwrap().is_empty());
        assert!(mutator.removals.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_addition_batch_does_not_block_removals() {
        let (svc, mutator) = service(
            FakeProvider::serving(Side::Custodian, &["0xk1", "0xk2"]),
            FakeProvider::serving(Side::Client, &["0xk3"]),
            RecordingMutator {
                fail_additions: true,
                ..RecordingMutator::default()
            },
            true,
        );

        let report = svc.run_cycle().await.unwrap();

        assert!(matches!(report.additions, BatchStatus::Failed(_)));
        assert_eq!(report.removed(), 1);
        // Both halves were attempted despite the import failure.
        assert_eq!(mutator.additions.lock().unwrap().len(), 1);
        assert_eq!(mutator.removals.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn per_key_rejection_is_reported_not_fatal() {
        let (svc, _mutator) = service(
            FakeProvider::serving(Side::Custodian, &["0xk1", "0xk2"]),
            FakeProvider::serving(Side::Client, &[]),
            RecordingMutator {
                rejected: ids(&["0xk2"]),
                ..RecordingMutator::default()
            },
            true,
        );

        let report = svc.run_cycle().await.unwrap();

        assert_eq!(report.added(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn empty_custodian_wipes_the_client_by_default() {
        // The custodian is authoritative, even about having no keys
        // at all. Operators can opt out via allow_empty_custodian.
        let (svc, mutator) = service(
            FakeProvider::serving(Side::Custodian, &[]),
            FakeProvider::serving(Side::Client, &["0xk1"]),
            RecordingMutator::default(),
            true,
        );

        let report = svc.run_cycle().await.unwrap();

        assert_eq!(*mutator.removals.lock().unwrap(), vec![ids(&["0xk1"])]);
        assert_eq!(report.removed(), 1);
        assert!(report.custodian_was_empty());
    }

    #[tokio::test]
    async fn empty_custodian_removals_can_be_withheld() {
        let (svc, mutator) = service(
            FakeProvider::serving(Side::Custodian, &[]),
            FakeProvider::serving(Side::Client, &["0xk1"]),
            RecordingMutator::default(),
            false,
        );

        let report = svc.run_cycle().await.unwrap();

        assert_eq!(report.removals, BatchStatus::Withheld);
        assert!(mutator.removals.lock().unwrap().is_empty());
    }

    /// Provider and mutator sharing one store, to exercise the
    /// self-healing property end to end.
    struct StoreProvider {
        store: Arc<Mutex<BTreeSet<KeyIdentifier>>>,
    }

    #[async_trait]
    impl InventoryProvider for StoreProvider {
        async fn fetch(&self) -> Result<KeyInventory> {
            let store = self.store.lock().unwrap();
            Ok(KeyInventory::from_records(
                store.iter().cloned().map(KeyRecord::new),
            ))
        }
    }

    struct StoreMutator {
        store: Arc<Mutex<BTreeSet<KeyIdentifier>>>,
    }

    impl StoreMutator {
        fn ok_outcomes(keys: &BTreeSet<KeyIdentifier>) -> Vec<MutationOutcome> {
            keys.iter()
                .map(|k| MutationOutcome {
                    identifier: k.clone(),
                    succeeded: true,
                    message: String::new(),
                })
                .collect()
        }
    }

    #[async_trait]
    impl KeyMutator for StoreMutator {
        async fn apply_additions(
            &self,
            keys: &BTreeSet<KeyIdentifier>,
        ) -> Result<Vec<MutationOutcome>> {
            self.store.lock().unwrap().extend(keys.iter().cloned());
            Ok(Self::ok_outcomes(keys))
        }

        async fn apply_removals(
            &self,
            keys: &BTreeSet<KeyIdentifier>,
        ) -> Result<Vec<MutationOutcome>> {
            let mut store = self.store.lock().unwrap();
            for key in keys {
                store.remove(key);
            }
            Ok(Self::ok_outcomes(keys))
        }
    }

    #[tokio::test]
    async fn second_cycle_after_a_successful_first_is_a_no_op() {
        let store = Arc::new(Mutex::new(ids(&["0xstale"])));
        let svc = CycleService::new(
            Arc::new(FakeProvider::serving(Side::Custodian, &["0xk1", "0xk2"])),
            Arc::new(StoreProvider {
                store: Arc::clone(&store),
            }),
            Arc::new(StoreMutator {
                store: Arc::clone(&store),
            }),
            true,
        );

        let first = svc.run_cycle().await.unwrap();
        assert_eq!(first.added(), 2);
        assert_eq!(first.removed(), 1);

        let second = svc.run_cycle().await.unwrap();
        assert_eq!(second.additions, BatchStatus::Skipped);
        assert_eq!(second.removals, BatchStatus::Skipped);
    }
}
