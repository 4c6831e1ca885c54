//! Environment-style configuration for session drivers.
//!
//! # Environment Variables
//!
//! - `SESSION_DRIVER`: `memory` or `redis` (default: memory)
//! - `REDIS_HOST`: Redis host (default: localhost)
//! - `REDIS_PORT`: Redis port (default: 6379)
//! - `REDIS_PASSWORD`: Redis password, empty for none
//! - `SESSION_TTL_SECS`: sliding lifetime of session data (default: 1200)
//! - `SESSION_FLASH_TTL_SECS`: lifetime of flash data, `0` to disable (default: 1200)

use crate::error::{config_error, SessionResult};
use std::str::FromStr;
use std::time::Duration;

/// Lifetime applied to the session partition on every write.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(1200);

/// Lifetime applied to the flash partition on every flash write.
pub const DEFAULT_FLASH_TTL: Duration = Duration::from_secs(1200);

/// Which backing store the session driver persists into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub enum DriverKind {
    #[default]
    Memory,
    Redis,
}

impl DriverKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverKind::Memory => "memory",
            DriverKind::Redis => "redis",
        }
    }
}

impl FromStr for DriverKind {
    type Err = crate::error::SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(DriverKind::Memory),
            "redis" => Ok(DriverKind::Redis),
            other => Err(config_error(format!(
                "unsupported session driver `{other}` (expected `memory` or `redis`)"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub driver: DriverKind,
    pub redis: RedisConfig,
    /// Sliding lifetime re-applied to session data on every write.
    pub session_ttl: Duration,
    /// Lifetime re-applied to flash data on every flash write. `None` keeps flash until reset.
    pub flash_ttl: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::Memory,
            redis: RedisConfig::default(),
            session_ttl: DEFAULT_SESSION_TTL,
            flash_ttl: Some(DEFAULT_FLASH_TTL),
        }
    }
}

impl SessionConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> SessionResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> SessionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let driver = match lookup("SESSION_DRIVER") {
            Some(raw) => raw.parse()?,
            None => defaults.driver,
        };

        let host = lookup("REDIS_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(defaults.redis.host);

        let port = match lookup("REDIS_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|err| config_error(format!("REDIS_PORT `{raw}`: {err}")))?,
            None => defaults.redis.port,
        };

        let password = lookup("REDIS_PASSWORD").filter(|p| !p.is_empty());

        let session_ttl = match parse_secs(&lookup, "SESSION_TTL_SECS")? {
            Some(0) => return Err(config_error("SESSION_TTL_SECS must be greater than zero")),
            Some(secs) => Duration::from_secs(secs),
            None => defaults.session_ttl,
        };

        let flash_ttl = match parse_secs(&lookup, "SESSION_FLASH_TTL_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.flash_ttl,
        };

        Ok(Self {
            driver,
            redis: RedisConfig {
                host,
                port,
                password,
            },
            session_ttl,
            flash_ttl,
        })
    }

    pub fn with_driver(mut self, driver: DriverKind) -> Self {
        self.driver = driver;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_flash_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.flash_ttl = ttl;
        self
    }
}

fn parse_secs<F>(lookup: &F, name: &str) -> SessionResult<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|err| config_error(format!("{name} `{raw}`: {err}")))
        })
        .transpose()
}
