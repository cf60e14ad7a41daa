//! Directory client: container searches, the aggregate view and membership resolution.

use std::sync::Arc;
use tracing::{info, warn};

use crate::container::Container;
use crate::membership::is_member;
use crate::person::Person;
use crate::results::{AggregateResult, ContainerResult, MembershipResult};
use crate::search::{search_container, search_entries};
use crate::session::{DirectoryConnector, DirectorySession, LdapConnector};
use crate::Result;
use dirview_core::{DirectoryConfig, Error};
use validator::Validate;

/// Directory client with pluggable LDAP backend.
///
/// Every operation opens its own anonymously bound session and releases it before returning,
/// whether the operation succeeded or not. Sessions are never shared between operations or
/// between containers.
pub struct DirectoryClient {
    config: Arc<DirectoryConfig>,
    connector: Box<dyn DirectoryConnector>,
}

impl DirectoryClient {
    /// Creates a client that uses the real LDAP connector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the configuration fails validation, or
    /// [`Error::InvalidDn`] if the base DN is blank.
    pub fn new(config: DirectoryConfig) -> Result<Self> {
        let config = Arc::new(config);
        let connector: Box<dyn DirectoryConnector> = Box::new(LdapConnector::new(config.clone()));
        Self::from_parts(config, connector)
    }

    /// Creates a client backed by a custom connector.
    ///
    /// # Errors
    ///
    /// See [`DirectoryClient::new`].
    pub fn with_connector(
        config: DirectoryConfig,
        connector: Box<dyn DirectoryConnector>,
    ) -> Result<Self> {
        Self::from_parts(Arc::new(config), connector)
    }

    fn from_parts(
        config: Arc<DirectoryConfig>,
        connector: Box<dyn DirectoryConnector>,
    ) -> Result<Self> {
        config.validate()?;
        if config.base_dn.trim().is_empty() {
            return Err(Error::InvalidDn("base DN is blank".to_string()));
        }
        Ok(Self { config, connector })
    }

    /// Returns the configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Returns the base DN that container search bases are built on.
    #[must_use]
    pub fn base_dn(&self) -> &str {
        &self.config.base_dn
    }

    /// Searches a single container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionError`], [`Error::BindError`] or [`Error::SearchError`].
    pub async fn search_container(&self, container: Container) -> Result<ContainerResult> {
        let mut session = self.open_session().await?;
        let outcome = search_container(&mut *session, self.base_dn(), container).await;
        release(session).await;

        Ok(ContainerResult::new(container, outcome?))
    }

    /// Searches a container given by name (`people`, `teachers` or `groups`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for an unknown name, otherwise see
    /// [`DirectoryClient::search_container`].
    pub async fn search_container_by_name(&self, name: &str) -> Result<ContainerResult> {
        let container = name.parse::<Container>()?;
        self.search_container(container).await
    }

    /// Searches every known container, skipping the ones that fail.
    ///
    /// Failures are logged and the container is left out of the result; this call itself never
    /// fails.
    pub async fn search_all(&self) -> AggregateResult {
        let mut aggregate = AggregateResult::default();

        for container in Container::ALL {
            match self.search_container(container).await {
                Ok(result) => aggregate.insert(result),
                Err(err) => {
                    warn!(
                        container = container.name(),
                        error = %err,
                        "could not search container, skipping"
                    );
                }
            }
        }

        info!(
            total = aggregate.total,
            containers = aggregate.containers.len(),
            "aggregate search finished"
        );
        aggregate
    }

    /// Lists the groups that have `identity` as a member.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for an empty identity, otherwise
    /// [`Error::ConnectionError`], [`Error::BindError`] or [`Error::SearchError`].
    pub async fn find_groups_for_identity(&self, identity: &str) -> Result<MembershipResult> {
        if identity.is_empty() {
            return Err(Error::InvalidRequest("uid parameter is required".to_string()));
        }

        let mut session = self.open_session().await?;
        let outcome = search_entries(&mut *session, self.base_dn(), Container::Groups).await;
        release(session).await;

        let groups = outcome?
            .iter()
            .filter(|entry| is_member(entry, identity))
            .map(|entry| Person::from_entry(entry, Container::Groups))
            .collect::<Vec<_>>();

        let result = MembershipResult::new(identity, groups);
        info!(identity, groups = result.total, "membership resolved");
        Ok(result)
    }

    async fn open_session(&self) -> Result<Box<dyn DirectorySession>> {
        let mut session = self.connector.connect().await?;
        if let Err(err) = session.anonymous_bind().await {
            release(session).await;
            return Err(err);
        }
        Ok(session)
    }
}

async fn release(mut session: Box<dyn DirectorySession>) {
    if let Err(err) = session.unbind().await {
        warn!(error = %err, "failed to release directory session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::LdapEntry;
    use crate::search::SearchRequest;
    use crate::session::{MockDirectoryConnector, MockDirectorySession};

    type SearchFn = fn(&SearchRequest) -> Result<Vec<LdapEntry>>;

    fn sample_config() -> DirectoryConfig {
        DirectoryConfig::new("ldap.example.com", "389", "dc=it-college,dc=ru").unwrap()
    }

    fn session_with(search: SearchFn) -> MockDirectorySession {
        let mut session = MockDirectorySession::new();
        session.expect_anonymous_bind().times(1).returning(|| Ok(()));
        session
            .expect_search()
            .times(1)
            .returning(move |request| search(request));
        session.expect_unbind().times(1).returning(|| Ok(()));
        session
    }

    fn connector_with(search: SearchFn, sessions: usize) -> MockDirectoryConnector {
        let mut connector = MockDirectoryConnector::new();
        connector
            .expect_connect()
            .times(sessions)
            .returning(move || Ok(Box::new(session_with(search))));
        connector
    }

    fn uid_entries(request: &SearchRequest, count: usize) -> Vec<LdapEntry> {
        (0..count)
            .map(|i| {
                LdapEntry::new(format!("uid=u{i},{}", request.base_dn))
                    .with_attribute("uid", [format!("u{i}")])
            })
            .collect()
    }

    fn group_entries(_: &SearchRequest) -> Result<Vec<LdapEntry>> {
        Ok(vec![
            LdapEntry::new("cn=students,ou=groups,dc=it-college,dc=ru")
                .with_attribute("cn", ["students"])
                .with_attribute("member", ["uid=student1,ou=people,dc=it-college,dc=ru"]),
            LdapEntry::new("cn=posix,ou=groups,dc=it-college,dc=ru")
                .with_attribute("cn", ["posix"])
                .with_attribute("memberUid", ["student10", "Student1"]),
            LdapEntry::new("cn=lab,ou=groups,dc=it-college,dc=ru")
                .with_attribute("cn", ["lab"])
                .with_attribute("memberUid", ["student1"]),
        ])
    }

    fn client_for(config: DirectoryConfig) -> Result<DirectoryClient> {
        DirectoryClient::with_connector(config, Box::new(MockDirectoryConnector::new()))
    }

    #[test]
    fn rejects_blank_base_dn() {
        let result = client_for(sample_config().with_base_dn("  "));
        assert!(matches!(result, Err(Error::InvalidDn(_))));

        let result = client_for(sample_config().with_base_dn(""));
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn base_dn_is_kept_verbatim() {
        let client = client_for(sample_config().with_base_dn(r"o=Acme\2C Inc,dc=ru")).unwrap();
        assert_eq!(client.base_dn(), r"o=Acme\2C Inc,dc=ru");
    }

    #[test]
    fn rejects_invalid_config_from_any_source() {
        let config: DirectoryConfig =
            serde_json::from_str(r#"{"host":"","port":0,"timeout_secs":0}"#).unwrap();
        assert!(matches!(client_for(config), Err(Error::ConfigError(_))));

        let config: DirectoryConfig = serde_json::from_str(r#"{"host":"ldap","port":0}"#).unwrap();
        assert!(matches!(client_for(config), Err(Error::ConfigError(_))));

        let result = client_for(sample_config().with_timeout_secs(0));
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[tokio::test]
    async fn search_container_uses_fresh_session() {
        let connector = connector_with(|request| Ok(uid_entries(request, 2)), 1);
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let result = client.search_container(Container::People).await.unwrap();
        assert_eq!(result.name, "people");
        assert_eq!(result.total, 2);
        assert_eq!(
            result.people[0].dn,
            "uid=u0,ou=people,dc=it-college,dc=ru"
        );
    }

    #[tokio::test]
    async fn search_container_by_name_rejects_unknown() {
        let mut connector = MockDirectoryConnector::new();
        connector.expect_connect().times(0);
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let result = client.search_container_by_name("staff").await;
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn search_failure_still_releases_session() {
        let connector = connector_with(|_| Err(Error::search("", "noSuchObject")), 1);
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let err = client.search_container(Container::Groups).await.unwrap_err();
        assert!(matches!(err, Error::SearchError { ref container, .. } if container == "groups"));
    }

    #[tokio::test]
    async fn bind_failure_releases_session_and_skips_search() {
        let mut connector = MockDirectoryConnector::new();
        connector.expect_connect().times(1).returning(|| {
            let mut session = MockDirectorySession::new();
            session
                .expect_anonymous_bind()
                .returning(|| Err(Error::BindError("anonymous bind rejected".to_string())));
            session.expect_search().times(0);
            session.expect_unbind().times(1).returning(|| Ok(()));
            Ok(Box::new(session))
        });
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let err = client.search_container(Container::People).await.unwrap_err();
        assert!(matches!(err, Error::BindError(_)));
    }

    #[tokio::test]
    async fn failed_unbind_does_not_mask_result() {
        let mut connector = MockDirectoryConnector::new();
        connector.expect_connect().times(1).returning(|| {
            let mut session = MockDirectorySession::new();
            session.expect_anonymous_bind().returning(|| Ok(()));
            session.expect_search().returning(|request| Ok(uid_entries(request, 1)));
            session
                .expect_unbind()
                .times(1)
                .returning(|| Err(Error::ConnectionError("broken pipe".to_string())));
            Ok(Box::new(session))
        });
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let result = client.search_container(Container::Teachers).await.unwrap();
        assert_eq!(result.total, 1);
    }

    #[tokio::test]
    async fn search_all_opens_one_session_per_container() {
        let connector = connector_with(|request| Ok(uid_entries(request, 1)), 3);
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let aggregate = client.search_all().await;
        assert_eq!(aggregate.total, 3);
        assert_eq!(
            aggregate.containers.keys().collect::<Vec<_>>(),
            ["groups", "people", "teachers"]
        );
    }

    #[tokio::test]
    async fn search_all_skips_failing_container() {
        let connector = connector_with(
            |request| {
                if request.base_dn.starts_with("ou=teachers,") {
                    Err(Error::search("", "noSuchObject"))
                } else if request.base_dn.starts_with("ou=people,") {
                    Ok(uid_entries(request, 2))
                } else {
                    Ok(uid_entries(request, 1))
                }
            },
            3,
        );
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let aggregate = client.search_all().await;
        assert_eq!(aggregate.containers.len(), 2);
        assert!(aggregate.container(Container::Teachers).is_none());
        assert_eq!(aggregate.total, 3);
        assert_eq!(aggregate.container(Container::People).unwrap().total, 2);
        assert_eq!(aggregate.container(Container::Groups).unwrap().total, 1);
    }

    #[tokio::test]
    async fn search_all_survives_unreachable_server() {
        let mut connector = MockDirectoryConnector::new();
        connector
            .expect_connect()
            .times(3)
            .returning(|| Err(Error::ConnectionError("connection refused".to_string())));
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let aggregate = client.search_all().await;
        assert_eq!(aggregate.total, 0);
        assert!(aggregate.containers.is_empty());
    }

    #[tokio::test]
    async fn finds_groups_under_both_conventions() {
        let connector = connector_with(group_entries, 1);
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let result = client.find_groups_for_identity("student1").await.unwrap();
        assert_eq!(result.identity, "student1");
        assert_eq!(result.total, 2);
        let names: Vec<_> = result
            .groups
            .iter()
            .filter_map(|group| group.attribute("cn"))
            .collect();
        assert_eq!(names, ["students", "lab"]);
        assert_eq!(
            result.groups[0].members,
            Some(vec!["uid=student1,ou=people,dc=it-college,dc=ru".to_string()])
        );
        assert!(result.groups.iter().all(|group| group.ou == "groups"));
    }

    #[tokio::test]
    async fn membership_search_targets_groups_container() {
        let connector = connector_with(
            |request| {
                assert_eq!(request.base_dn, "ou=groups,dc=it-college,dc=ru");
                assert_eq!(
                    request.filter,
                    "(|(objectClass=group)(objectClass=groupOfNames)(objectClass=posixGroup))"
                );
                Ok(Vec::new())
            },
            1,
        );
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let result = client.find_groups_for_identity("nobody").await.unwrap();
        assert_eq!(result.total, 0);
        assert!(result.groups.is_empty());
    }

    #[tokio::test]
    async fn membership_propagates_search_failure() {
        let connector = connector_with(|_| Err(Error::search("", "timeout")), 1);
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let err = client.find_groups_for_identity("student1").await.unwrap_err();
        assert!(matches!(err, Error::SearchError { .. }));
    }

    #[tokio::test]
    async fn membership_propagates_connection_failure() {
        let mut connector = MockDirectoryConnector::new();
        connector
            .expect_connect()
            .returning(|| Err(Error::ConnectionError("connection refused".to_string())));
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let err = client.find_groups_for_identity("student1").await.unwrap_err();
        assert!(matches!(err, Error::ConnectionError(_)));
    }

    #[tokio::test]
    async fn whitespace_identity_is_searched_as_given() {
        let connector = connector_with(group_entries, 1);
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let result = client.find_groups_for_identity(" ").await.unwrap();
        assert_eq!(result.identity, " ");
        assert_eq!(result.total, 0);
    }

    #[tokio::test]
    async fn empty_identity_is_rejected_without_io() {
        let mut connector = MockDirectoryConnector::new();
        connector.expect_connect().times(0);
        let client = DirectoryClient::with_connector(sample_config(), Box::new(connector)).unwrap();

        let err = client.find_groups_for_identity("").await.unwrap_err();
        assert_eq!(
            err,
            Error::InvalidRequest("uid parameter is required".to_string())
        );
    }
}
