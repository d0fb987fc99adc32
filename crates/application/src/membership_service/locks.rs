use std::collections::HashMap;
use std::sync::Arc;

use meterline_core::OrganizationId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-organization mutual exclusion for membership mutations.
///
/// Serializes check-then-act sequences inside one process. Cross-process
/// safety comes from the store evaluating the last-holder guard in the same
/// transaction as the mutation.
#[derive(Clone, Default)]
pub(crate) struct OrganizationLocks {
    locks: Arc<Mutex<HashMap<OrganizationId, Arc<Mutex<()>>>>>,
}

impl OrganizationLocks {
    /// Waits for exclusive access to `organization_id`.
    ///
    /// Dropping the guard releases the lock, so an abandoned request never
    /// leaves the organization locked. Entries nobody holds or awaits are
    /// pruned on the next acquisition, so the map stays bounded by the number
    /// of organizations with mutations in flight.
    pub(crate) async fn acquire(&self, organization_id: OrganizationId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(organization_id).or_default())
        };

        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
