use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use gatehouse_token::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::StoreError;
use crate::{HashWrite, RevocationStore};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    /// Unix seconds; the slot is gone from this instant on
    expires_at: Option<i64>,
}

impl Slot {
    fn is_live(&self, now: i64) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Seconds between sweeps of expired slots
pub const SWEEP_INTERVAL_SECONDS: i64 = 60;

/// In-process [`RevocationStore`] backed by a [`DashMap`].
///
/// An expired slot is dropped the next time its key is touched, and writes
/// sweep every expired slot at most once per [`SWEEP_INTERVAL_SECONDS`].
/// Time comes from the injected [`Clock`], so TTLs follow a `ManualClock` in
/// tests.
#[derive(Debug)]
pub struct MemoryStore {
    slots: DashMap<String, Slot>,
    clock: Arc<dyn Clock>,
    next_sweep: AtomicI64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let next_sweep = clock.timestamp().saturating_add(SWEEP_INTERVAL_SECONDS);
        Self {
            slots: DashMap::new(),
            clock,
            next_sweep: AtomicI64::new(next_sweep),
        }
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.purge_expired();
        self.slots.len()
    }

    /// Drop every expired slot. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.sweep(self.clock.timestamp())
    }

    fn sweep(&self, now: i64) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.is_live(now));
        let dropped = before.saturating_sub(self.slots.len());
        if dropped > 0 {
            debug!(dropped, "expired keys swept");
        }
        dropped
    }

    /// Sweep when the interval has elapsed. Must not run while an entry of
    /// `slots` is held.
    fn sweep_if_due(&self, now: i64) {
        let due = self.next_sweep.load(Ordering::Acquire);
        if now < due {
            return;
        }
        let next = now.saturating_add(SWEEP_INTERVAL_SECONDS);
        if self
            .next_sweep
            .compare_exchange(due, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.sweep(now);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge(&self, key: &str) -> i64 {
        let now = self.clock.timestamp();
        if self.slots.remove_if(key, |_, slot| !slot.is_live(now)).is_some() {
            trace!(key, "expired key dropped");
        }
        now
    }

    fn deadline(&self, key: &str, now: i64, ttl: Duration) -> Result<i64, StoreError> {
        let seconds = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
        if seconds == 0 {
            return Err(StoreError::InvalidExpire(key.to_string()));
        }
        let seconds =
            i64::try_from(seconds).map_err(|_| StoreError::InvalidExpire(key.to_string()))?;
        Ok(now.saturating_add(seconds))
    }
}

#[async_trait]
impl RevocationStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.purge(key);
        match self.slots.get(key) {
            Some(slot) => match &slot.value {
                Value::Str(value) => Ok(Some(value.clone())),
                Value::Hash(_) => Err(StoreError::WrongType(key.to_string())),
            },
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let now = self.clock.timestamp();
        let expires_at = ttl.map(|ttl| self.deadline(key, now, ttl)).transpose()?;
        self.sweep_if_due(now);
        self.slots.insert(
            key.to_string(),
            Slot {
                value: Value::Str(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        self.purge(key);
        Ok(self.slots.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        self.purge(key);
        Ok(self.slots.contains_key(key))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = self.purge(key);
        let deadline = self.deadline(key, now, ttl)?;
        match self.slots.get_mut(key) {
            Some(mut slot) => {
                slot.expires_at = Some(deadline);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn expire_at(&self, key: &str, timestamp: i64) -> Result<bool, StoreError> {
        self.purge(key);
        match self.slots.get_mut(key) {
            Some(mut slot) => {
                slot.expires_at = Some(timestamp);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.purge(key);
        match self.slots.get(key) {
            Some(slot) => match &slot.value {
                Value::Hash(fields) => Ok(fields.clone()),
                Value::Str(_) => Err(StoreError::WrongType(key.to_string())),
            },
            None => Ok(HashMap::new()),
        }
    }

    async fn hset(&self, key: &str, fields: HashMap<String, String>) -> Result<(), StoreError> {
        let now = self.purge(key);
        self.sweep_if_due(now);
        let mut slot = self.slots.entry(key.to_string()).or_insert_with(|| Slot {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut slot.value {
            Value::Hash(existing) => {
                existing.extend(fields);
                Ok(())
            }
            Value::Str(_) => Err(StoreError::WrongType(key.to_string())),
        }
    }

    async fn hset_if_absent_expire_at(
        &self,
        key: &str,
        fields: HashMap<String, String>,
        timestamp: i64,
    ) -> Result<HashWrite, StoreError> {
        let now = self.clock.timestamp();
        self.sweep_if_due(now);
        let fresh = Slot {
            value: Value::Hash(fields),
            expires_at: Some(timestamp),
        };

        // The entry guard holds the shard lock for the whole check-and-write.
        match self.slots.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    return match &occupied.get().value {
                        Value::Hash(existing) => Ok(HashWrite::Exists(existing.clone())),
                        Value::Str(_) => Err(StoreError::WrongType(key.to_string())),
                    };
                }
                occupied.insert(fresh);
                Ok(HashWrite::Written)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                Ok(HashWrite::Written)
            }
        }
    }
}
