//! Instance pool for backends that are not thread-safe
//!
//! A fixed set of instances guarded by a semaphore with one permit per
//! instance. `rent` waits for a permit and takes an instance out of the free
//! list; the returned [`PooledBackend`] puts it back when released or dropped,
//! so no two callers ever hold the same instance.

use parking_lot::Mutex;
use std::ops::Deref;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::core::PhonemizerBackend;
use crate::errors::{PhonemizerError, PhonemizerResult};

pub struct BackendPool {
    name: String,
    idle: Mutex<Vec<Box<dyn PhonemizerBackend>>>,
    permits: Semaphore,
    size: usize,
}

impl BackendPool {
    pub fn new(instances: Vec<Box<dyn PhonemizerBackend>>) -> PhonemizerResult<Self> {
        let Some(first) = instances.first() else {
            return Err(PhonemizerError::Configuration(
                "backend pool needs at least one instance".to_string(),
            ));
        };
        let name = first.name().to_string();
        let size = instances.len();
        Ok(Self {
            name,
            idle: Mutex::new(instances),
            permits: Semaphore::new(size),
            size,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total instances, rented or idle
    pub fn size(&self) -> usize {
        self.size
    }

    /// Instances not currently rented
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for a free instance
    pub async fn rent(&self) -> PhonemizerResult<PooledBackend<'_>> {
        let permit = self.permits.acquire().await.map_err(|_| {
            PhonemizerError::BackendUnavailable(format!("pool for '{}' is closed", self.name))
        })?;
        let instance = self.idle.lock().pop().ok_or_else(|| {
            PhonemizerError::BackendUnavailable(format!(
                "pool for '{}' has no idle instance",
                self.name
            ))
        })?;
        tracing::trace!(backend = %self.name, available = self.available(), "Rented instance");
        Ok(PooledBackend {
            pool: self,
            instance: Some(instance),
            _permit: permit,
        })
    }

    /// Non-blocking variant of [`BackendPool::rent`]
    pub fn try_rent(&self) -> Option<PooledBackend<'_>> {
        let permit = self.permits.try_acquire().ok()?;
        let instance = self.idle.lock().pop()?;
        Some(PooledBackend {
            pool: self,
            instance: Some(instance),
            _permit: permit,
        })
    }

    fn give_back(&self, instance: Box<dyn PhonemizerBackend>) {
        self.idle.lock().push(instance);
    }
}

/// A rented instance; returned to its pool on drop
pub struct PooledBackend<'a> {
    pool: &'a BackendPool,
    instance: Option<Box<dyn PhonemizerBackend>>,
    _permit: SemaphorePermit<'a>,
}

impl PooledBackend<'_> {
    /// Return the instance to the pool now
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for PooledBackend<'_> {
    type Target = dyn PhonemizerBackend;

    fn deref(&self) -> &Self::Target {
        match &self.instance {
            Some(instance) => instance.as_ref(),
            None => unreachable!("instance is present until drop"),
        }
    }
}

// Runs before the permit field is dropped, so the instance is back in the
// free list by the time another renter can acquire
impl Drop for PooledBackend<'_> {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            self.pool.give_back(instance);
        }
    }
}
