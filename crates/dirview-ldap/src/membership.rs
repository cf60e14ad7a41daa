//! Group membership tests for the two membership conventions.
//!
//! * `member` holds full member DNs. An identity matches when a lower-cased value contains
//!   `uid=<identity>,` or `cn=<identity>,`.
//! * `memberUid` holds bare identifiers. An identity matches only on exact, case-sensitive
//!   equality.
//!
//! The `member` rule is a substring test, not RDN parsing, so it also matches the fragment when it
//! appears after the leading RDN. Such matches are logged at debug level for review.

use tracing::debug;

use crate::entry::LdapEntry;

/// Attribute listing member DNs.
pub const MEMBER_ATTRIBUTE: &str = "member";
/// Attribute listing member identifiers.
pub const MEMBER_UID_ATTRIBUTE: &str = "memberUid";

/// Returns true if `entry` lists `identity` under either membership convention.
#[must_use]
pub fn is_member(entry: &LdapEntry, identity: &str) -> bool {
    entry
        .all_values(MEMBER_ATTRIBUTE)
        .any(|member_dn| member_dn_references(member_dn, identity))
        || entry
            .all_values(MEMBER_UID_ATTRIBUTE)
            .any(|member_uid| member_uid == identity)
}

/// Returns true if `member_dn` contains a `uid=<identity>,` or `cn=<identity>,` fragment,
/// compared case-insensitively.
#[must_use]
pub fn member_dn_references(member_dn: &str, identity: &str) -> bool {
    let haystack = member_dn.to_lowercase();
    let identity = identity.to_lowercase();
    let matched = haystack.contains(&format!("uid={identity},"))
        || haystack.contains(&format!("cn={identity},"));

    if matched && !leading_rdn_names(member_dn, &identity) {
        debug!(
            member_dn,
            identity = %identity,
            "member matched by DN fragment outside the leading RDN"
        );
    }

    matched
}

/// Returns true if the first RDN of `member_dn` is `uid=<identity>` or `cn=<identity>`.
/// `identity` must already be lower-cased.
fn leading_rdn_names(member_dn: &str, identity: &str) -> bool {
    let leading = leading_rdn(member_dn).to_lowercase();
    leading.split('+').any(|ava| {
        ava.split_once('=').is_some_and(|(attribute, value)| {
            matches!(attribute.trim(), "uid" | "cn") && value.trim() == identity
        })
    })
}

/// Text up to the first comma that is not escaped with a backslash.
fn leading_rdn(dn: &str) -> &str {
    let mut escaped = false;
    for (index, ch) in dn.char_indices() {
        match ch {
            '\\' if !escaped => escaped = true,
            ',' if !escaped => return &dn[..index],
            _ => escaped = false,
        }
    }
    dn
}
