//! Directory endpoint configuration.
//!
//! The engine never reads process state on its own. Callers build a [`DirectoryConfig`] (directly,
//! from a deserialized document, or through [`DirectoryConfig::from_env`]) and hand it over.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use url::Url;
use validator::Validate;

/// Base DN used when none is configured.
pub const DEFAULT_BASE_DN: &str = "dc=it-college,dc=ru";

/// Per-operation network timeout (seconds).
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 5;

/// Environment key holding the directory host.
pub const HOST_VAR: &str = "HOST";
/// Environment key holding the directory port.
pub const PORT_VAR: &str = "PORT";
/// Environment key holding the base DN (optional).
pub const BASE_DN_VAR: &str = "BASE_DN";

/// Configuration for reaching a directory server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DirectoryConfig {
    /// Directory server host name or address
    #[validate(length(min = 1))]
    pub host: String,

    /// Directory server port
    #[validate(range(min = 1))]
    pub port: u16,

    /// Base distinguished name that contains the organizational containers
    #[validate(length(min = 1))]
    #[serde(default = "default_base_dn")]
    pub base_dn: String,

    /// Connect with `ldaps://` instead of `ldap://`
    #[serde(default)]
    pub use_tls: bool,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Network timeout applied to every directory operation, in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_dn() -> String {
    DEFAULT_BASE_DN.to_string()
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_SESSION_TIMEOUT_SECS
}

impl DirectoryConfig {
    /// Create a configuration from a host, a textual port and a base DN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the port is not a positive integer or the resulting
    /// configuration fails validation.
    pub fn new(
        host: impl Into<String>,
        port: impl AsRef<str>,
        base_dn: impl Into<String>,
    ) -> Result<Self, Error> {
        let port = parse_port(port.as_ref())?;
        let config = Self {
            host: host.into(),
            port,
            base_dn: base_dn.into(),
            use_tls: false,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            timeout_secs: default_timeout_secs(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from a key lookup.
    ///
    /// `HOST` and `PORT` are required; `BASE_DN` falls back to [`DEFAULT_BASE_DN`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when a required key is missing or malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| Error::ConfigError(format!("{HOST_VAR} is not set")))?;
        let port = lookup(PORT_VAR)
            .ok_or_else(|| Error::ConfigError(format!("{PORT_VAR} is not set")))?;
        let base_dn = lookup(BASE_DN_VAR)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| {
                debug!(base_dn = DEFAULT_BASE_DN, "{BASE_DN_VAR} not set, using default");
                default_base_dn()
            });

        Self::new(host.trim(), port, base_dn)
    }

    /// Build a configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`DirectoryConfig::from_lookup`].
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Switch between `ldap://` and `ldaps://`.
    #[must_use]
    pub const fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verification(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set the per-operation timeout in seconds.
    #[must_use]
    pub const fn with_timeout_secs(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Override the base distinguished name.
    #[must_use]
    pub fn with_base_dn(mut self, base_dn: impl Into<String>) -> Self {
        self.base_dn = base_dn.into();
        self
    }

    /// URL scheme implied by the TLS setting.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.use_tls {
            "ldaps"
        } else {
            "ldap"
        }
    }

    /// Get the per-operation timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Render and validate the `scheme://host:port` endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the endpoint cannot be parsed as a URL.
    pub fn endpoint_url(&self) -> Result<Url, Error> {
        let url = Url::parse(&format!("{}://{}:{}", self.scheme(), self.host, self.port))?;
        if url.host_str().is_none() {
            return Err(Error::ConfigError(format!(
                "endpoint `{url}` has no host component"
            )));
        }
        Ok(url)
    }
}

fn parse_port(raw: &str) -> Result<u16, Error> {
    let port: u16 = raw.trim().parse()?;
    if port == 0 {
        return Err(Error::ConfigError(
            "invalid port format: port must be positive".to_string(),
        ));
    }
    Ok(port)
}
