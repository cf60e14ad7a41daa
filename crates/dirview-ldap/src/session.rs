//! Directory sessions and the ldap3-backed connector.

use async_trait::async_trait;
use ldap3::{DerefAliases, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchOptions};
use native_tls::{Certificate, TlsConnector};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::entry::LdapEntry;
use crate::search::SearchRequest;
use crate::Result;
use dirview_core::{DirectoryConfig, Error};

/// An open connection to the directory server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectorySession: Send {
    /// Performs an unauthenticated bind (empty DN, no password).
    async fn anonymous_bind(&mut self) -> Result<()>;

    /// Runs a search and returns the raw entries in server order.
    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<LdapEntry>>;

    /// Releases the connection.
    async fn unbind(&mut self) -> Result<()>;
}

/// Opens directory sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    /// Dials the server and returns an unbound session.
    async fn connect(&self) -> Result<Box<dyn DirectorySession>>;
}

/// Connector that dials the configured endpoint with `ldap3`.
pub struct LdapConnector {
    config: Arc<DirectoryConfig>,
}

impl LdapConnector {
    /// Creates a new connector instance.
    #[must_use]
    pub fn new(config: Arc<DirectoryConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DirectoryConnector for LdapConnector {
    async fn connect(&self) -> Result<Box<dyn DirectorySession>> {
        let url = self.config.endpoint_url()?;
        let settings = build_ldap_settings(&self.config)?;
        let operation_timeout = self.config.timeout();

        let (conn, ldap) = timeout(
            operation_timeout,
            LdapConnAsync::with_settings(settings, url.as_str()),
        )
        .await
        .map_err(|_| Error::ConnectionError(format!("dialing {url} timed out")))?
        .map_err(|err| Error::ConnectionError(err.to_string()))?;
        ldap3::drive!(conn);

        debug!(endpoint = %url, "directory connection established");
        Ok(Box::new(LdapSession {
            inner: ldap,
            operation_timeout,
        }))
    }
}

struct LdapSession {
    inner: ldap3::Ldap,
    operation_timeout: Duration,
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn anonymous_bind(&mut self) -> Result<()> {
        timeout(self.operation_timeout, self.inner.simple_bind("", ""))
            .await
            .map_err(|_| Error::BindError("anonymous bind timed out".to_string()))?
            .and_then(ldap3::LdapResult::success)
            .map_err(|err| Error::BindError(err.to_string()))?;
        Ok(())
    }

    async fn search(&mut self, request: &SearchRequest) -> Result<Vec<LdapEntry>> {
        let options = SearchOptions::new()
            .deref(DerefAliases::Never)
            .sizelimit(0)
            .timelimit(0);
        let search = self.inner.with_search_options(options).search(
            &request.base_dn,
            Scope::Subtree,
            &request.filter,
            request.attributes.clone(),
        );

        let (entries, _) = timeout(self.operation_timeout, search)
            .await
            .map_err(|_| Error::search(&request.base_dn, "search timed out"))?
            .and_then(ldap3::SearchResult::success)
            .map_err(|err| Error::search(&request.base_dn, err))?;

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(into_ldap_entry)
            .collect())
    }

    async fn unbind(&mut self) -> Result<()> {
        timeout(self.operation_timeout, self.inner.unbind())
            .await
            .map_err(|_| Error::ConnectionError("unbind timed out".to_string()))?
            .map_err(|err| Error::ConnectionError(err.to_string()))
    }
}

// ldap3 hands attributes over as hash maps and moves any attribute holding a non-UTF-8 value
// into `bin_attrs`. Both are folded together and sorted by name so the normalized output (and
// the winning membership attribute) is stable.
fn into_ldap_entry(entry: SearchEntry) -> LdapEntry {
    if !entry.bin_attrs.is_empty() {
        debug!(
            dn = %entry.dn,
            binary = entry.bin_attrs.len(),
            "decoding binary attributes lossily"
        );
    }

    let binary = entry.bin_attrs.into_iter().map(|(name, values)| {
        let values = values
            .iter()
            .map(|value| String::from_utf8_lossy(value).into_owned())
            .collect::<Vec<_>>();
        (name, values)
    });

    let mut attributes = entry.attrs.into_iter().chain(binary).collect::<Vec<_>>();
    attributes.sort_by(|(a, _), (b, _)| a.cmp(b));
    LdapEntry {
        dn: entry.dn,
        attributes,
    }
}

fn build_ldap_settings(config: &DirectoryConfig) -> Result<LdapConnSettings> {
    let mut settings = LdapConnSettings::new().set_conn_timeout(config.timeout());

    if !config.use_tls {
        return Ok(settings);
    }

    if !config.tls_verify {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to construct TLS connector: {err}"))
            })?;
        settings = settings.set_connector(connector).set_no_tls_verify(true);
    } else if let Some(cert_path) = config.tls_ca_cert.as_ref() {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read directory CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|err| Error::ConfigError(format!("invalid directory CA certificate: {err}")))?;
        let connector = TlsConnector::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to load directory CA certificate: {err}"))
            })?;
        settings = settings.set_connector(connector);
    }

    Ok(settings)
}
