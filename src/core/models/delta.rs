use std::collections::BTreeSet;

use crate::core::models::key_record::KeyIdentifier;

/// The minimal add/remove delta between the custodian and client
/// inventories.
///
/// `to_add` and `to_remove` are disjoint by construction: a key present
/// in both inventories appears in neither set. Sorted sets keep batch
/// order and display output deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationDelta {
    /// Present on the custodian, missing from the client.
    pub to_add: BTreeSet<KeyIdentifier>,
    /// Loaded on the client, no longer known to the custodian.
    pub to_remove: BTreeSet<KeyIdentifier>,
}

impl ReconciliationDelta {
    /// True when the two inventories already match.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
