//! Result values produced by the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::container::Container;
use crate::person::Person;

/// Entries found in one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerResult {
    /// Container name.
    pub name: String,
    /// Number of entries.
    pub total: usize,
    /// Normalized entries in server order.
    pub people: Vec<Person>,
}

impl ContainerResult {
    /// Wraps the entries found in `container`.
    #[must_use]
    pub fn new(container: Container, people: Vec<Person>) -> Self {
        Self {
            name: container.name().to_string(),
            total: people.len(),
            people,
        }
    }
}

/// Entries from every container that could be searched.
///
/// A container missing from `containers` was skipped because its search failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Sum of the included containers' totals.
    pub total: usize,
    /// Per-container results keyed by container name.
    pub containers: BTreeMap<String, ContainerResult>,
}

impl AggregateResult {
    /// Adds a container result and updates the total.
    pub fn insert(&mut self, result: ContainerResult) {
        self.total += result.total;
        if let Some(previous) = self.containers.insert(result.name.clone(), result) {
            self.total -= previous.total;
        }
    }

    /// Looks up the result for `container`.
    #[must_use]
    pub fn container(&self, container: Container) -> Option<&ContainerResult> {
        self.containers.get(container.name())
    }
}

/// Groups that list an identity as a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipResult {
    /// Identity that was looked up.
    pub identity: String,
    /// Matching groups in server order.
    pub groups: Vec<Person>,
    /// Number of matching groups.
    pub total: usize,
}

impl MembershipResult {
    /// Builds the result for `identity`.
    #[must_use]
    pub fn new(identity: impl Into<String>, groups: Vec<Person>) -> Self {
        Self {
            identity: identity.into(),
            total: groups.len(),
            groups,
        }
    }
}
