//! Normalized directory records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::container::Container;
use crate::entry::LdapEntry;
use crate::membership::{MEMBER_ATTRIBUTE, MEMBER_UID_ATTRIBUTE};

/// Normalized person or group entry.
///
/// Scalar attributes keep their first value only. For entries from the groups container the
/// membership attributes (`member`, `memberUid`) keep their full value list in `members` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Distinguished name of the entry.
    pub dn: String,
    /// First value of every scalar attribute.
    pub attributes: BTreeMap<String, String>,
    /// Container the entry was found in.
    pub ou: String,
    /// Full membership list, only for group entries that carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
}

impl Person {
    /// Normalizes a raw entry found in `container`.
    #[must_use]
    pub fn from_entry(entry: &LdapEntry, container: Container) -> Self {
        let mut attributes = BTreeMap::new();
        let mut members = None;

        for (name, values) in &entry.attributes {
            let Some(first) = values.first() else {
                continue;
            };
            if name == "dn" {
                continue;
            }

            if container.holds_groups() && is_membership_attribute(name) {
                // Last membership attribute wins; `member` and `memberUid` are not merged.
                members = Some(values.clone());
            } else {
                attributes.insert(name.clone(), first.clone());
            }
        }

        Self {
            dn: entry.dn.clone(),
            attributes,
            ou: container.name().to_string(),
            members,
        }
    }

    /// Returns a scalar attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Preferred display name: `cn`, then `uid`, then the DN itself.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.attribute("cn")
            .or_else(|| self.attribute("uid"))
            .unwrap_or(&self.dn)
    }

    /// Number of recorded members (zero for non-group entries).
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.as_ref().map_or(0, Vec::len)
    }

    /// Returns true if the entry came from the groups container.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.ou == Container::Groups.name()
    }
}

fn is_membership_attribute(name: &str) -> bool {
    name == MEMBER_ATTRIBUTE || name == MEMBER_UID_ATTRIBUTE
}

/// Normalizes a raw entry found in `container`.
#[must_use]
pub fn normalize(entry: &LdapEntry, container: Container) -> Person {
    Person::from_entry(entry, container)
}
