use crate::core::models::delta::ReconciliationDelta;
use crate::core::models::inventory::KeyInventory;

/// Computes the add/remove delta between the two inventories.
pub struct Reconciler;

impl Reconciler {
    /// Compare the custodian and client inventories.
    ///
    /// - Keys only the custodian knows go into `to_add`
    /// - Keys only the client holds go into `to_remove`
    /// - Keys present on both sides are left untouched (readonly
    ///   status and source URL are not part of the comparison)
    ///
    /// Pure and total: no I/O, no error path, and listing order never
    /// affects the result. An empty custodian inventory puts every
    /// client key into `to_remove` — the custodian is authoritative,
    /// even about having nothing.
    pub fn reconcile(
        &self,
        custodian: &KeyInventory,
        client: &KeyInventory,
    ) -> ReconciliationDelta {
        let custodian_keys = custodian.identifiers();
        let client_keys = client.identifiers();

        ReconciliationDelta {
            to_add: custodian_keys.difference(&client_keys).cloned().collect(),
            to_remove: client_keys.difference(&custodian_keys).cloned().collect(),
        }
    }
}
