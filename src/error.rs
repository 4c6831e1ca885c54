use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by session drivers and their backing stores.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The selected driver cannot be used: it was compiled out or its store is unreachable.
    #[error("session driver `{driver}` is unavailable: {hint}")]
    DriverUnavailable { driver: &'static str, hint: String },

    /// Configuration could not be interpreted.
    #[error("invalid session configuration: {0}")]
    Config(String),

    /// A value could not be converted to or from JSON.
    #[error("session value serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Failure reported by the Redis connection, passed through untouched.
    #[cfg(feature = "redis")]
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

impl SessionError {
    /// Returns true when the error originated in the backing store rather than this crate.
    pub fn is_store_error(&self) -> bool {
        match self {
            #[cfg(feature = "redis")]
            SessionError::Redis(_) => true,
            _ => false,
        }
    }
}

pub(crate) fn serde_error(err: serde_json::Error) -> SessionError {
    SessionError::Serialization(err)
}

pub(crate) fn config_error(message: impl Into<String>) -> SessionError {
    SessionError::Config(message.into())
}

pub(crate) fn driver_unavailable(driver: &'static str, hint: impl Into<String>) -> SessionError {
    SessionError::DriverUnavailable {
        driver,
        hint: hint.into(),
    }
}

#[cfg(feature = "redis")]
pub(crate) fn redis_error(err: redis::RedisError) -> SessionError {
    SessionError::Redis(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_backend_failures_count_as_store_errors() {
        assert!(!driver_unavailable("redis", "compiled out").is_store_error());
        assert!(!config_error("bad port").is_store_error());
    }

    #[cfg(feature = "redis")]
    #[test]
    fn redis_failures_count_as_store_errors() {
        let err = redis_error(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "connection reset",
        )));
        assert!(err.is_store_error());
    }
}
