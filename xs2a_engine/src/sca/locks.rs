use std::{
    collections::HashMap,
    sync::{Arc, Mutex, Weak},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serialises updates of the same authorisation within this process.
///
/// Locks are created on demand and dropped once nobody holds or waits for them. Concurrent updates from other nodes
/// are caught by the store's version check instead.
#[derive(Debug, Clone, Default)]
pub struct AuthorisationLocks {
    locks: Arc<Mutex<HashMap<String, Weak<AsyncMutex<()>>>>>,
}

impl AuthorisationLocks {
    pub async fn lock(&self, authorisation_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.retain(|_, lock| lock.strong_count() > 0);
            match locks.get(authorisation_id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    locks.insert(authorisation_id.to_string(), Arc::downgrade(&lock));
                    lock
                },
            }
        };
        lock.lock_owned().await
    }

    /// The number of authorisations currently locked or waited on.
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.values().filter(|lock| lock.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_id_is_serialised() {
        let locks = AuthorisationLocks::default();
        let guard = locks.lock("auth-1").await;
        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            let _guard = contender.lock("auth-1").await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn different_ids_do_not_block() {
        let locks = AuthorisationLocks::default();
        let _a = locks.lock("auth-1").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("auth-2")).await;
        assert!(b.is_ok());
        assert_eq!(locks.active(), 2);
    }
}
