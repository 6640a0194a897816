use crate::core::models::key_record::KeyIdentifier;

/// The two batched mutation operations against the client key store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// POST new remote keys to the client.
    Import,
    /// DELETE stale keys from the client.
    Delete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::Import => write!(f, "import"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

/// Per-key result of a batched mutation, as reported by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub identifier: KeyIdentifier,
    pub succeeded: bool,
    pub message: String,
}

/// What happened to one half (additions or removals) of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    /// The delta was empty; no request was sent.
    Skipped,
    /// The batched call completed; per-key outcomes inside. Individual
    /// keys may still have failed — that is reportable, not fatal.
    Completed(Vec<MutationOutcome>),
    /// The batched call itself failed. Nothing from it was confirmed;
    /// the keys reappear in the next cycle's delta.
    Failed(String),
    /// Removals withheld by the empty-custodian safeguard.
    Withheld,
}

impl BatchStatus {
    pub fn succeeded_count(&self) -> usize {
        match self {
            BatchStatus::Completed(outcomes) => {
                outcomes.iter().filter(|o| o.succeeded).count()
            }
            _ => 0,
        }
    }

    pub fn failed_count(&self) -> usize {
        match self {
            BatchStatus::Completed(outcomes) => {
                outcomes.iter().filter(|o| !o.succeeded).count()
            }
            _ => 0,
        }
    }
}

/// Aggregate outcome of one reconciliation cycle.
///
/// Everything an operator needs to see per tick: inventory sizes, what
/// was attempted, and how each half went. Discarded after reporting —
/// no state is carried into the next cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub duration: std::time::Duration,
    /// Keys listed by the custodian this cycle.
    pub custodian_keys: usize,
    /// Keys loaded on the client this cycle.
    pub client_keys: usize,
    pub additions: BatchStatus,
    pub removals: BatchStatus,
}

impl CycleReport {
    pub fn added(&self) -> usize {
        self.additions.succeeded_count()
    }

    pub fn removed(&self) -> usize {
        self.removals.succeeded_count()
    }

    /// Keys that were submitted and individually rejected by the client.
    pub fn failed(&self) -> usize {
        self.additions.failed_count() + self.removals.failed_count()
    }

    /// True when the custodian reported no keys while the client still
    /// had some: the full-removal hazard worth calling out to operators.
    pub fn custodian_was_empty(&self) -> bool {
        self.custodian_keys == 0 && self.client_keys > 0
    }
}
