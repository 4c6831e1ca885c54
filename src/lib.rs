#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod identity;
pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod session;
pub mod store;
pub mod value;

pub use config::{DriverKind, RedisConfig, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use identity::{ClientIdentity, ForwardedForResolver, IdentityResolver, RequestMeta};
pub use inmemory::InMemoryBackingStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisBackingStore;
pub use session::{RequestSession, ResetScope, SessionDriver, SessionMap, SessionStore};
pub use store::BackingStore;
pub use value::SessionValue;

/// Builds the session driver selected by `config`.
///
/// Fails with [`SessionError::DriverUnavailable`] when the selected backend was compiled out or
/// cannot be reached.
pub fn create_session_driver(config: &SessionConfig) -> SessionResult<Box<dyn SessionDriver>> {
    match config.driver {
        DriverKind::Memory => {
            tracing::info!(driver = "memory", "session driver ready");
            Ok(Box::new(SessionStore::from_config(
                InMemoryBackingStore::new(),
                config,
            )))
        }
        DriverKind::Redis => redis_driver(config),
    }
}

#[cfg(feature = "redis")]
fn redis_driver(config: &SessionConfig) -> SessionResult<Box<dyn SessionDriver>> {
    let backend = RedisBackingStore::from_config(&config.redis)?;
    tracing::info!(
        driver = "redis",
        host = %config.redis.host,
        port = config.redis.port,
        "session driver ready"
    );
    Ok(Box::new(SessionStore::from_config(backend, config)))
}

#[cfg(not(feature = "redis"))]
fn redis_driver(_config: &SessionConfig) -> SessionResult<Box<dyn SessionDriver>> {
    Err(error::driver_unavailable(
        "redis",
        "this build does not include the redis client; enable the `redis` feature of request-session",
    ))
}
