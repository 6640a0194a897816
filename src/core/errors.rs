use crate::core::models::cycle_report::MutationKind;
use crate::core::models::inventory::Side;

/// All domain errors for keysync.
///
/// Each variant provides enough context to diagnose the issue
/// without needing a debugger.
#[derive(Debug, thiserror::Error)]
pub enum KeysyncError {
    #[error(
        "Failed to fetch the {side} key inventory: {reason}\n\n  \
         No changes were applied — keysync never mutates after a partial read.\n  \
         The next scheduled cycle will retry from scratch.\n\n  \
         Checks:\n    \
         → Is the {side} endpoint reachable from this host?\n    \
         → Run 'keysync status' to probe both endpoints without mutating."
    )]
    Fetch { side: Side, reason: String },

    #[error(
        "The batched {operation} request failed: {reason}\n\n  \
         Nothing from this batch was confirmed. Keys that were not applied\n  \
         will reappear in the next cycle's delta and be retried."
    )]
    Mutation {
        operation: MutationKind,
        reason: String,
    },

    #[error(
        "Unknown network '{name}'\n\n  \
         Available networks: {available}\n  \
         Add custom networks under [networks] in keysync.toml,\n  \
         or pass the custodian endpoint directly with --custodian-url."
    )]
    UnknownNetwork { name: String, available: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KeysyncError>;
