use crate::config::RedisConfig;
use crate::error::{config_error, driver_unavailable, redis_error, SessionResult};
use crate::store::BackingStore;
use parking_lot::Mutex;
use redis::{
    Client, Commands, Connection, ConnectionAddr, ConnectionInfo, RedisConnectionInfo,
};
use std::collections::HashMap;
use std::time::Duration;

const DRIVER: &str = "redis";

/// Redis-backed store. The connection is opened once at construction and shared by every call.
///
/// Constructors accept connection URLs or [`RedisConfig`] only; no Redis client types appear in
/// the public API.
pub struct RedisBackingStore {
    conn: Mutex<Connection>,
}

impl RedisBackingStore {
    /// Connects using a Redis URL such as `redis://:secret@localhost:6379/0`.
    pub fn from_url(url: impl AsRef<str>) -> SessionResult<Self> {
        let client = Client::open(url.as_ref()).map_err(|err| config_error(err.to_string()))?;
        Self::connect(client)
    }

    /// Connects using host, port and password settings.
    pub fn from_config(config: &RedisConfig) -> SessionResult<Self> {
        let client = Client::open(Self::connection_info(config))
            .map_err(|err| config_error(err.to_string()))?;
        Self::connect(client)
    }

    /// Bare hosts are passed through as-is, so IPv6 literals like `::1` need no brackets.
    fn connection_info(config: &RedisConfig) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                password: config.password.clone().filter(|p| !p.is_empty()),
                ..Default::default()
            },
        }
    }

    fn connect(client: Client) -> SessionResult<Self> {
        match client.get_connection() {
            Ok(conn) => {
                tracing::info!("connected to redis session store");
                Ok(Self {
                    conn: Mutex::new(conn),
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "redis session store unreachable");
                Err(driver_unavailable(
                    DRIVER,
                    format!(
                        "could not connect to redis ({err}); check REDIS_HOST, REDIS_PORT and REDIS_PASSWORD"
                    ),
                ))
            }
        }
    }

    fn ttl_millis(ttl: Duration) -> i64 {
        let ttl_ms = ttl.as_millis().max(1);
        if ttl_ms > i64::MAX as u128 {
            i64::MAX
        } else {
            ttl_ms as i64
        }
    }
}

impl BackingStore for RedisBackingStore {
    fn hget(&self, partition: &str, field: &str) -> SessionResult<Option<String>> {
        self.conn.lock().hget(partition, field).map_err(redis_error)
    }

    fn hset(&self, partition: &str, field: &str, value: &str) -> SessionResult<()> {
        self.conn
            .lock()
            .hset::<_, _, _, ()>(partition, field, value)
            .map_err(redis_error)
    }

    fn hdel(&self, partition: &str, field: &str) -> SessionResult<u64> {
        self.conn.lock().hdel(partition, field).map_err(redis_error)
    }

    fn hgetall(&self, partition: &str) -> SessionResult<HashMap<String, String>> {
        self.conn.lock().hgetall(partition).map_err(redis_error)
    }

    fn expire(&self, partition: &str, ttl: Duration) -> SessionResult<()> {
        self.conn
            .lock()
            .pexpire::<_, ()>(partition, Self::ttl_millis(ttl))
            .map_err(redis_error)
    }

    fn delete(&self, partition: &str) -> SessionResult<()> {
        self.conn
            .lock()
            .del::<_, ()>(partition)
            .map_err(redis_error)
    }

    fn ttl(&self, partition: &str) -> SessionResult<Option<Duration>> {
        // PTTL answers -2 for missing keys and -1 for keys without expiry
        let remaining: i64 = self.conn.lock().pttl(partition).map_err(redis_error)?;
        Ok(u64::try_from(remaining).ok().map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;

    #[test]
    fn connection_info_keeps_bare_ipv6_hosts() {
        let config = RedisConfig {
            host: "::1".into(),
            port: 6380,
            password: Some("hunter2".into()),
        };
        let info = RedisBackingStore::connection_info(&config);
        assert!(matches!(info.addr, ConnectionAddr::Tcp(ref host, 6380) if host == "::1"));
        assert_eq!(info.redis.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn empty_password_is_not_sent() {
        let config = RedisConfig {
            password: Some(String::new()),
            ..RedisConfig::default()
        };
        assert_eq!(RedisBackingStore::connection_info(&config).redis.password, None);
    }

    #[test]
    fn ipv6_host_reaches_the_connect_stage() {
        let config = RedisConfig {
            host: "::1".into(),
            port: 1,
            password: None,
        };
        let err = match RedisBackingStore::from_config(&config) {
            Ok(_) => panic!("nothing listens on port 1"),
            Err(err) => err,
        };
        assert!(
            matches!(err, SessionError::DriverUnavailable { driver: "redis", .. }),
            "unexpected error: {err}"
        );
        assert!(!err.is_store_error());
    }
}
