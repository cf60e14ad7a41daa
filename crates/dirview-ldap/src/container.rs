//! Organizational containers searched by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use dirview_core::Error;

/// Object classes that mark an entry as a group.
const GROUP_OBJECT_CLASSES: &[&str] = &["group", "groupOfNames", "posixGroup"];
/// Object classes that mark an entry as a person.
const PERSON_OBJECT_CLASSES: &[&str] = &["person"];

/// Known organizational containers below the base DN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// `ou=people`
    People,
    /// `ou=teachers`
    Teachers,
    /// `ou=groups`
    Groups,
}

impl Container {
    /// Every container, in the order the aggregate search visits them.
    pub const ALL: [Self; 3] = [Self::People, Self::Teachers, Self::Groups];

    /// Name of the container as it appears in the `ou=` RDN.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::People => "people",
            Self::Teachers => "teachers",
            Self::Groups => "groups",
        }
    }

    /// Whether entries in this container are groups whose membership lists must be kept.
    #[must_use]
    pub const fn holds_groups(self) -> bool {
        matches!(self, Self::Groups)
    }

    /// Object classes that select entries in this container (any of them matches).
    #[must_use]
    pub const fn object_classes(self) -> &'static [&'static str] {
        match self {
            Self::Groups => GROUP_OBJECT_CLASSES,
            Self::People | Self::Teachers => PERSON_OBJECT_CLASSES,
        }
    }

    /// LDAP filter selecting this container's entries.
    #[must_use]
    pub fn filter(self) -> String {
        object_class_filter(self.object_classes())
    }

    /// Search base `ou=<name>,<base_dn>`. The base DN is used exactly as configured.
    #[must_use]
    pub fn search_base(self, base_dn: &str) -> String {
        format!("ou={},{base_dn}", self.name())
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Container {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|container| container.name() == s)
            .ok_or_else(|| Error::InvalidRequest(format!("unknown container `{s}`")))
    }
}

fn object_class_filter(classes: &[&str]) -> String {
    let terms = classes
        .iter()
        .map(|class| format!("(objectClass={class})"))
        .collect::<Vec<_>>();

    match terms.as_slice() {
        [single] => single.clone(),
        _ => format!("(|{})", terms.concat()),
    }
}
