use crate::error::SessionResult;
use crate::store::BackingStore;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use time::{OffsetDateTime, PrimitiveDateTime};

struct Partition {
    fields: HashMap<String, String>,
    expires_at: Option<OffsetDateTime>,
}

impl Partition {
    fn new() -> Self {
        Self {
            fields: HashMap::new(),
            expires_at: None,
        }
    }

    fn is_expired(&self, now: OffsetDateTime) -> bool {
        match self.expires_at {
            Some(exp) => now >= exp,
            None => false,
        }
    }
}

/// In-memory backing store built on a concurrent hash map.
///
/// Mirrors the Redis hash commands closely enough to stand in for a server in tests and
/// single-process deployments.
pub struct InMemoryBackingStore {
    partitions: DashMap<String, Partition>,
    cleanup_hint: Mutex<OffsetDateTime>,
}

impl Default for InMemoryBackingStore {
    fn default() -> Self {
        Self {
            partitions: DashMap::new(),
            cleanup_hint: Mutex::new(OffsetDateTime::now_utc()),
        }
    }
}

impl InMemoryBackingStore {
    /// Constructs a store with no background maintenance. Expiration is handled lazily on access.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute expiry deadline of a live partition, if one is set.
    pub fn expires_at(&self, partition: &str) -> Option<OffsetDateTime> {
        let now = Self::now();
        self.partitions
            .get(partition)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|entry| entry.expires_at)
    }

    /// Number of live partitions.
    pub fn len(&self) -> usize {
        let now = Self::now();
        self.partitions
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    /// Deadline `ttl` after `now`, saturating at the latest representable instant.
    fn deadline(now: OffsetDateTime, ttl: Duration) -> OffsetDateTime {
        time::Duration::try_from(ttl)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
    }

    fn maybe_cleanup(&self, now: OffsetDateTime) {
        let mut guard = self.cleanup_hint.lock();
        if now - *guard < time::Duration::seconds(60) {
            return;
        }

        let stale_keys: Vec<_> = self
            .partitions
            .iter()
            .filter_map(|entry| {
                if entry.value().is_expired(now) {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect();

        for key in stale_keys {
            self.partitions
                .remove_if(&key, |_, partition| partition.is_expired(now));
        }

        *guard = now;
    }

    /// Drops the partition if it has expired. Returns true when it was removed.
    fn evict_if_expired(&self, partition: &str, now: OffsetDateTime) -> bool {
        self.partitions
            .remove_if(partition, |_, entry| entry.is_expired(now))
            .is_some()
    }
}

impl BackingStore for InMemoryBackingStore {
    fn hget(&self, partition: &str, field: &str) -> SessionResult<Option<String>> {
        let now = Self::now();
        self.maybe_cleanup(now);
        if self.evict_if_expired(partition, now) {
            return Ok(None);
        }
        Ok(self
            .partitions
            .get(partition)
            .and_then(|entry| entry.fields.get(field).cloned()))
    }

    fn hset(&self, partition: &str, field: &str, value: &str) -> SessionResult<()> {
        let now = Self::now();
        self.maybe_cleanup(now);
        self.evict_if_expired(partition, now);
        self.partitions
            .entry(partition.to_owned())
            .or_insert_with(Partition::new)
            .fields
            .insert(field.to_owned(), value.to_owned());
        Ok(())
    }

    fn hdel(&self, partition: &str, field: &str) -> SessionResult<u64> {
        let now = Self::now();
        if self.evict_if_expired(partition, now) {
            return Ok(0);
        }
        let removed = match self.partitions.get_mut(partition) {
            Some(mut entry) => entry.fields.remove(field).is_some(),
            None => false,
        };
        if removed {
            self.partitions
                .remove_if(partition, |_, entry| entry.fields.is_empty());
        }
        Ok(u64::from(removed))
    }

    fn hgetall(&self, partition: &str) -> SessionResult<HashMap<String, String>> {
        let now = Self::now();
        self.maybe_cleanup(now);
        if self.evict_if_expired(partition, now) {
            return Ok(HashMap::new());
        }
        Ok(self
            .partitions
            .get(partition)
            .map(|entry| entry.fields.clone())
            .unwrap_or_default())
    }

    fn expire(&self, partition: &str, ttl: Duration) -> SessionResult<()> {
        let now = Self::now();
        if self.evict_if_expired(partition, now) {
            return Ok(());
        }
        if let Some(mut entry) = self.partitions.get_mut(partition) {
            entry.expires_at = Some(Self::deadline(now, ttl));
        }
        Ok(())
    }

    fn delete(&self, partition: &str) -> SessionResult<()> {
        self.partitions.remove(partition);
        Ok(())
    }

    fn ttl(&self, partition: &str) -> SessionResult<Option<Duration>> {
        let now = Self::now();
        Ok(self.expires_at(partition).map(|exp| {
            let remaining = exp - now;
            remaining.try_into().unwrap_or(Duration::ZERO)
        }))
    }
}
