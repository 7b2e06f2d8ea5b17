//! Named exclusive locks keyed by row id (staff calendar, promo code)

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Registry of per-key async mutexes. Holding the returned guard gives the
/// caller exclusive access to the keyed resource until the guard is dropped.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    name: &'static str,
    inner: Arc<StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl KeyedLocks {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Arc::default(),
        }
    }

    /// Wait up to `timeout` for the lock on `key`
    pub async fn acquire(&self, key: Uuid, timeout: Duration) -> AppResult<OwnedMutexGuard<()>> {
        let lock = self.entry(key)?;
        tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                AppError::LockTimeout(format!(
                    "timed out after {}ms waiting for {} lock {}",
                    timeout.as_millis(),
                    self.name,
                    key
                ))
            })
    }

    fn entry(&self, key: Uuid) -> AppResult<Arc<Mutex<()>>> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| AppError::Internal(format!("{} lock registry poisoned", self.name)))?;
        Ok(map.entry(key).or_default().clone())
    }
}
