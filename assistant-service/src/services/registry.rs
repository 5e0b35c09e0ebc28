//! Bounded in-memory registry of per-client service instances.
//!
//! Each entry sits behind its own async mutex, so calls into one assistant
//! are serialised while different conversations proceed independently.
//! Entries idle for longer than the configured TTL are evicted, either by the
//! periodic sweep or when an insert finds the registry full.

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("session not found: {0}")]
    NotFound(Uuid),

    #[error("session limit of {0} reached")]
    Full(usize),
}

struct Slot<T> {
    value: Arc<Mutex<T>>,
    last_used: Instant,
}

pub struct SessionRegistry<T> {
    entries: DashMap<Uuid, Slot<T>>,
    // Reserved slots; the cap is enforced on this, not on `entries.len()`
    reserved: AtomicUsize,
    max_entries: usize,
    idle_ttl: Duration,
}

impl<T> SessionRegistry<T> {
    pub fn new(max_entries: usize, idle_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            reserved: AtomicUsize::new(0),
            max_entries,
            idle_ttl,
        }
    }

    /// Store `value` under a fresh id. A full registry first evicts idle
    /// entries before giving up.
    pub fn insert(&self, value: T) -> Result<Uuid, RegistryError> {
        if !self.try_reserve() {
            self.evict_idle();
            if !self.try_reserve() {
                return Err(RegistryError::Full(self.max_entries));
            }
        }

        let id = Uuid::new_v4();
        self.entries.insert(
            id,
            Slot {
                value: Arc::new(Mutex::new(value)),
                last_used: Instant::now(),
            },
        );
        Ok(id)
    }

    /// Look up an entry and mark it as used.
    pub fn get(&self, id: Uuid) -> Result<Arc<Mutex<T>>, RegistryError> {
        let mut slot = self.entries.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        slot.last_used = Instant::now();
        Ok(slot.value.clone())
    }

    pub fn remove(&self, id: Uuid) -> Result<(), RegistryError> {
        self.entries
            .remove(&id)
            .ok_or(RegistryError::NotFound(id))?;
        self.reserved.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    /// Drop entries unused for longer than the idle TTL. Entries a request
    /// currently holds are kept. Returns how many were evicted.
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut evicted = 0;

        self.entries.retain(|_, slot| {
            let idle = now.duration_since(slot.last_used) >= self.idle_ttl;
            let in_use = Arc::strong_count(&slot.value) > 1;
            if idle && !in_use {
                evicted += 1;
                false
            } else {
                true
            }
        });

        if evicted > 0 {
            self.reserved.fetch_sub(evicted, Ordering::SeqCst);
            tracing::info!(evicted, remaining = self.entries.len(), "Evicted idle sessions");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn try_reserve(&self) -> bool {
        self.reserved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_entries).then_some(n + 1)
            })
            .is_ok()
    }
}
