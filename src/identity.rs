use std::collections::BTreeMap;
use std::fmt;

/// Header consulted by [`ForwardedForResolver`].
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// The request metadata needed to identify a client.
///
/// Header names are stored lower-cased so lookups are case-insensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestMeta {
    headers: BTreeMap<String, String>,
    remote_addr: String,
}

impl RequestMeta {
    pub fn new(remote_addr: impl Into<String>) -> Self {
        Self {
            headers: BTreeMap::new(),
            remote_addr: remote_addr.into(),
        }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Builds metadata from WSGI/CGI style variables.
    ///
    /// `HTTP_X_FORWARDED_FOR` becomes the `x-forwarded-for` header and `REMOTE_ADDR` the remote
    /// address. Other non-`HTTP_` variables are ignored.
    pub fn from_cgi_env<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut meta = Self::default();
        for (name, value) in vars {
            let name = name.as_ref();
            if name == "REMOTE_ADDR" {
                meta.remote_addr = value.into();
            } else if let Some(header) = name.strip_prefix("HTTP_") {
                meta.headers
                    .insert(header.replace('_', "-").to_ascii_lowercase(), value.into());
            }
        }
        meta
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }
}

/// Partition-key prefix for a single client.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backing-store key holding durable session fields.
    pub fn session_partition(&self) -> String {
        format!("{}_session", self.0)
    }

    /// Backing-store key holding flash fields.
    pub fn flash_partition(&self) -> String {
        format!("{}_flash", self.0)
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives a stable client identity from request metadata.
pub trait IdentityResolver: Send + Sync + 'static {
    fn resolve(&self, request: &RequestMeta) -> ClientIdentity;
}

/// Uses the last `X-Forwarded-For` hop when present, otherwise the socket peer address.
///
/// The address is used verbatim: no IPv6 canonicalization or other normalization happens.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardedForResolver;

impl IdentityResolver for ForwardedForResolver {
    fn resolve(&self, request: &RequestMeta) -> ClientIdentity {
        let forwarded = request
            .header(FORWARDED_FOR_HEADER)
            .and_then(|chain| chain.rsplit(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());

        match forwarded {
            Some(hop) => ClientIdentity::new(hop),
            None => ClientIdentity::new(request.remote_addr()),
        }
    }
}

impl<F> IdentityResolver for F
where
    F: Fn(&RequestMeta) -> ClientIdentity + Send + Sync + 'static,
{
    fn resolve(&self, request: &RequestMeta) -> ClientIdentity {
        self(request)
    }
}
