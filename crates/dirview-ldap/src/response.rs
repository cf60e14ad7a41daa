//! JSON envelopes handed to the HTTP layer.
//!
//! Each envelope carries either the data or an `error` message, never a transport status.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::person::Person;
use crate::results::{AggregateResult, ContainerResult, MembershipResult};
use crate::Result;

/// Response for the aggregate search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Sum of all included container totals.
    pub total: usize,
    /// Per-container results.
    pub ous: BTreeMap<String, ContainerResult>,
    /// Error message when the search could not run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<AggregateResult> for SearchResponse {
    fn from(result: AggregateResult) -> Self {
        Self {
            total: result.total,
            ous: result.containers,
            error: None,
        }
    }
}

impl From<Result<AggregateResult>> for SearchResponse {
    fn from(result: Result<AggregateResult>) -> Self {
        match result {
            Ok(aggregate) => aggregate.into(),
            Err(err) => Self {
                error: Some(err.to_string()),
                ..Self::default()
            },
        }
    }
}

/// Response for a single container search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerResponse {
    /// Container name.
    pub name: String,
    /// Number of entries.
    pub total: usize,
    /// Normalized entries.
    pub people: Vec<Person>,
    /// Error message when the search failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContainerResponse {
    /// Builds the response for the container called `name`.
    #[must_use]
    pub fn from_result(name: impl Into<String>, result: Result<ContainerResult>) -> Self {
        match result {
            Ok(container) => Self {
                name: container.name,
                total: container.total,
                people: container.people,
                error: None,
            },
            Err(err) => Self {
                name: name.into(),
                total: 0,
                people: Vec::new(),
                error: Some(err.to_string()),
            },
        }
    }
}

/// Response for a membership lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroupsResponse {
    /// Identity that was looked up.
    pub uid: String,
    /// Matching groups.
    pub groups: Vec<Person>,
    /// Number of matching groups.
    pub total: usize,
    /// Error message when the lookup failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UserGroupsResponse {
    /// Builds the response for `uid`.
    #[must_use]
    pub fn from_result(uid: impl Into<String>, result: Result<MembershipResult>) -> Self {
        match result {
            Ok(membership) => Self {
                uid: membership.identity,
                groups: membership.groups,
                total: membership.total,
                error: None,
            },
            Err(err) => Self {
                uid: uid.into(),
                groups: Vec::new(),
                total: 0,
                error: Some(err.to_string()),
            },
        }
    }
}
