//! Directory search and group membership resolution over LDAP.
//!
//! The engine connects anonymously to a directory server, searches the `people`, `teachers` and
//! `groups` containers below a base DN, normalizes the entries, and answers which groups list a
//! given identity as a member.

#![deny(missing_docs)]

mod client;
mod container;
mod entry;
pub mod membership;
mod person;
mod response;
mod results;
mod search;
mod session;

pub use client::DirectoryClient;
pub use container::Container;
pub use entry::LdapEntry;
pub use person::{normalize, Person};
pub use response::{ContainerResponse, SearchResponse, UserGroupsResponse};
pub use results::{AggregateResult, ContainerResult, MembershipResult};
pub use search::{search_container, search_entries, SearchRequest};
pub use session::{DirectoryConnector, DirectorySession, LdapConnector};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = dirview_core::Result<T>;
