//! Subtree searches over a single organizational container.

use tracing::debug;

use crate::container::Container;
use crate::entry::LdapEntry;
use crate::person::Person;
use crate::session::DirectorySession;
use crate::Result;
use dirview_core::Error;

/// Request every user attribute.
const ALL_USER_ATTRIBUTES: &str = "*";

/// Protocol-level search request handed to a [`DirectorySession`].
///
/// The search always covers the whole subtree below `base_dn`. Aliases are never dereferenced
/// and no size or time limit is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Search base.
    pub base_dn: String,
    /// LDAP filter.
    pub filter: String,
    /// Requested attributes.
    pub attributes: Vec<String>,
}

impl SearchRequest {
    /// Subtree search of `container` below `base_dn`, requesting all attributes.
    #[must_use]
    pub fn for_container(base_dn: &str, container: Container) -> Self {
        Self {
            base_dn: container.search_base(base_dn),
            filter: container.filter(),
            attributes: vec![ALL_USER_ATTRIBUTES.to_string()],
        }
    }
}

/// Runs the container search and returns the raw entries in server order.
///
/// # Errors
///
/// Returns [`Error::SearchError`] naming the container when the search fails.
pub async fn search_entries(
    session: &mut dyn DirectorySession,
    base_dn: &str,
    container: Container,
) -> Result<Vec<LdapEntry>> {
    let request = SearchRequest::for_container(base_dn, container);
    let entries = session
        .search(&request)
        .await
        .map_err(|err| Error::search(container.name(), search_cause(err)))?;

    debug!(
        container = container.name(),
        filter = %request.filter,
        entries = entries.len(),
        "container search finished"
    );

    Ok(entries)
}

/// Runs the container search and normalizes every entry.
///
/// # Errors
///
/// Returns [`Error::SearchError`] naming the container when the search fails.
pub async fn search_container(
    session: &mut dyn DirectorySession,
    base_dn: &str,
    container: Container,
) -> Result<Vec<Person>> {
    let entries = search_entries(session, base_dn, container).await?;
    Ok(entries
        .iter()
        .map(|entry| Person::from_entry(entry, container))
        .collect())
}

fn search_cause(err: Error) -> String {
    match err {
        Error::SearchError { message, .. } => message,
        other => other.to_string(),
    }
}
