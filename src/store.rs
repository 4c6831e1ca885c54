use crate::error::SessionResult;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Hash-map-per-key storage that session drivers persist into.
///
/// The contract follows Redis hash semantics: writing a field keeps any expiry already set on the
/// key, removing the last field removes the key, and keys past their expiry read as absent.
/// Field-level operations are expected to be atomic; nothing spanning several calls is.
pub trait BackingStore: Send + Sync + 'static {
    /// Reads a single field.
    fn hget(&self, partition: &str, field: &str) -> SessionResult<Option<String>>;

    /// Writes a single field, creating the partition if needed.
    fn hset(&self, partition: &str, field: &str, value: &str) -> SessionResult<()>;

    /// Removes a field and returns how many fields were removed.
    fn hdel(&self, partition: &str, field: &str) -> SessionResult<u64>;

    /// Reads every field of the partition. A missing partition yields an empty map.
    fn hgetall(&self, partition: &str) -> SessionResult<HashMap<String, String>>;

    /// Sets the partition to expire `ttl` from now. Has no effect on missing partitions.
    fn expire(&self, partition: &str, ttl: Duration) -> SessionResult<()>;

    /// Drops the whole partition.
    fn delete(&self, partition: &str) -> SessionResult<()>;

    /// Remaining lifetime of the partition, or `None` when it is missing or never expires.
    fn ttl(&self, partition: &str) -> SessionResult<Option<Duration>>;
}

impl<S: BackingStore + ?Sized> BackingStore for Arc<S> {
    fn hget(&self, partition: &str, field: &str) -> SessionResult<Option<String>> {
        (**self).hget(partition, field)
    }

    fn hset(&self, partition: &str, field: &str, value: &str) -> SessionResult<()> {
        (**self).hset(partition, field, value)
    }

    fn hdel(&self, partition: &str, field: &str) -> SessionResult<u64> {
        (**self).hdel(partition, field)
    }

    fn hgetall(&self, partition: &str) -> SessionResult<HashMap<String, String>> {
        (**self).hgetall(partition)
    }

    fn expire(&self, partition: &str, ttl: Duration) -> SessionResult<()> {
        (**self).expire(partition, ttl)
    }

    fn delete(&self, partition: &str) -> SessionResult<()> {
        (**self).delete(partition)
    }

    fn ttl(&self, partition: &str) -> SessionResult<Option<Duration>> {
        (**self).ttl(partition)
    }
}
