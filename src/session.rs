use crate::config::{SessionConfig, DEFAULT_FLASH_TTL, DEFAULT_SESSION_TTL};
use crate::error::SessionResult;
use crate::identity::{ClientIdentity, ForwardedForResolver, IdentityResolver, RequestMeta};
use crate::store::BackingStore;
use crate::value::SessionValue;
use std::collections::BTreeMap;
use std::time::Duration;

/// Decoded view of everything stored for a client.
pub type SessionMap = BTreeMap<String, SessionValue>;

/// What [`SessionDriver::reset`] clears.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResetScope {
    /// Session and flash data.
    #[default]
    All,
    /// Flash data only; session data is left intact.
    FlashOnly,
}

/// Per-client session and flash data, keyed off the requesting client.
///
/// Every operation resolves the client identity from `request` before touching storage, so a
/// single driver can serve any number of clients. Flash values shadow session values with the
/// same key on read.
pub trait SessionDriver: Send + Sync {
    /// Returns the flash value for `key`, falling back to the session value.
    fn get(&self, request: &RequestMeta, key: &str) -> SessionResult<Option<SessionValue>>;

    /// Stores a session value and restarts the session expiry window.
    fn set(&self, request: &RequestMeta, key: &str, value: SessionValue) -> SessionResult<()>;

    /// Whether [`get`](Self::get) would return a value. Empty strings count as present.
    fn has(&self, request: &RequestMeta, key: &str) -> SessionResult<bool> {
        Ok(self.get(request, key)?.is_some())
    }

    /// Removes a session value. Flash data is untouched. Returns true if a value was removed.
    fn delete(&self, request: &RequestMeta, key: &str) -> SessionResult<bool>;

    /// Stores a value meant for the next render cycle only.
    fn flash(&self, request: &RequestMeta, key: &str, value: SessionValue) -> SessionResult<()>;

    fn reset(&self, request: &RequestMeta, scope: ResetScope) -> SessionResult<()>;

    /// Clears flash data and keeps session data.
    fn reset_flash(&self, request: &RequestMeta) -> SessionResult<()> {
        self.reset(request, ResetScope::FlashOnly)
    }

    /// Session and flash data merged into one map, flash winning on key collisions.
    ///
    /// The two partitions are read separately, so a concurrent writer can be observed halfway.
    fn all(&self, request: &RequestMeta) -> SessionResult<SessionMap>;
}

/// Binds a driver to one request so call sites don't repeat the metadata.
pub struct RequestSession<'a> {
    driver: &'a dyn SessionDriver,
    request: &'a RequestMeta,
}

impl<'a> RequestSession<'a> {
    pub fn new(driver: &'a dyn SessionDriver, request: &'a RequestMeta) -> Self {
        Self { driver, request }
    }

    pub fn request(&self) -> &RequestMeta {
        self.request
    }

    pub fn get(&self, key: &str) -> SessionResult<Option<SessionValue>> {
        self.driver.get(self.request, key)
    }

    pub fn set(&self, key: &str, value: impl Into<SessionValue>) -> SessionResult<()> {
        self.driver.set(self.request, key, value.into())
    }

    pub fn has(&self, key: &str) -> SessionResult<bool> {
        self.driver.has(self.request, key)
    }

    pub fn delete(&self, key: &str) -> SessionResult<bool> {
        self.driver.delete(self.request, key)
    }

    pub fn flash(&self, key: &str, value: impl Into<SessionValue>) -> SessionResult<()> {
        self.driver.flash(self.request, key, value.into())
    }

    pub fn reset(&self) -> SessionResult<()> {
        self.driver.reset(self.request, ResetScope::All)
    }

    pub fn reset_flash(&self) -> SessionResult<()> {
        self.driver.reset_flash(self.request)
    }

    pub fn all(&self) -> SessionResult<SessionMap> {
        self.driver.all(self.request)
    }
}

/// Session driver persisting into a [`BackingStore`].
///
/// Data for a client lives in two hashes, `"<identity>_session"` and `"<identity>_flash"`.
/// Holds no per-client state of its own.
pub struct SessionStore<B, R = ForwardedForResolver> {
    backend: B,
    resolver: R,
    session_ttl: Duration,
    flash_ttl: Option<Duration>,
}

impl<B: BackingStore> SessionStore<B> {
    /// Creates a driver using the default forwarded-for identity policy and lifetimes.
    pub fn new(backend: B) -> Self {
        Self::with_resolver(backend, ForwardedForResolver)
    }

    /// Creates a driver using the lifetimes from `config`.
    pub fn from_config(backend: B, config: &SessionConfig) -> Self {
        Self::new(backend)
            .with_session_ttl(config.session_ttl)
            .with_flash_ttl(config.flash_ttl)
    }
}

impl<B: BackingStore, R: IdentityResolver> SessionStore<B, R> {
    pub fn with_resolver(backend: B, resolver: R) -> Self {
        Self {
            backend,
            resolver,
            session_ttl: DEFAULT_SESSION_TTL,
            flash_ttl: Some(DEFAULT_FLASH_TTL),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_flash_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.flash_ttl = ttl;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Identity the driver would use for `request`.
    pub fn identity(&self, request: &RequestMeta) -> ClientIdentity {
        self.resolver.resolve(request)
    }

    /// Binds this driver to a single request.
    pub fn for_request<'a>(&'a self, request: &'a RequestMeta) -> RequestSession<'a> {
        RequestSession::new(self, request)
    }

    fn collect(&self, partition: &str, into: &mut SessionMap) -> SessionResult<()> {
        for (key, stored) in self.backend.hgetall(partition)? {
            into.insert(key, SessionValue::decode(stored));
        }
        Ok(())
    }
}

impl<B: BackingStore, R: IdentityResolver> SessionDriver for SessionStore<B, R> {
    fn get(&self, request: &RequestMeta, key: &str) -> SessionResult<Option<SessionValue>> {
        let identity = self.identity(request);
        tracing::trace!(identity = %identity, key, "session get");

        if let Some(stored) = self.backend.hget(&identity.flash_partition(), key)? {
            return Ok(Some(SessionValue::decode(stored)));
        }
        Ok(self
            .backend
            .hget(&identity.session_partition(), key)?
            .map(SessionValue::decode))
    }

    fn set(&self, request: &RequestMeta, key: &str, value: SessionValue) -> SessionResult<()> {
        let identity = self.identity(request);
        let partition = identity.session_partition();
        tracing::debug!(identity = %identity, key, "session set");

        self.backend.hset(&partition, key, &value.encode())?;
        self.backend.expire(&partition, self.session_ttl)
    }

    fn delete(&self, request: &RequestMeta, key: &str) -> SessionResult<bool> {
        let identity = self.identity(request);
        let removed = self.backend.hdel(&identity.session_partition(), key)?;
        tracing::debug!(identity = %identity, key, removed, "session delete");
        Ok(removed > 0)
    }

    fn flash(&self, request: &RequestMeta, key: &str, value: SessionValue) -> SessionResult<()> {
        let identity = self.identity(request);
        let partition = identity.flash_partition();
        tracing::debug!(identity = %identity, key, "session flash");

        self.backend.hset(&partition, key, &value.encode())?;
        match self.flash_ttl {
            Some(ttl) => self.backend.expire(&partition, ttl),
            None => Ok(()),
        }
    }

    fn reset(&self, request: &RequestMeta, scope: ResetScope) -> SessionResult<()> {
        let identity = self.identity(request);
        tracing::debug!(identity = %identity, ?scope, "session reset");

        if scope == ResetScope::All {
            self.backend.delete(&identity.session_partition())?;
        }
        self.backend.delete(&identity.flash_partition())
    }

    fn all(&self, request: &RequestMeta) -> SessionResult<SessionMap> {
        let identity = self.identity(request);
        tracing::trace!(identity = %identity, "session all");

        let mut merged = SessionMap::new();
        self.collect(&identity.session_partition(), &mut merged)?;
        self.collect(&identity.flash_partition(), &mut merged)?;
        Ok(merged)
    }
}
