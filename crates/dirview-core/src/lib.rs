//! # dirview-core
//!
//! Core types shared by the dirview directory engine.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and structured error responses
//! - [`config`] - Explicit directory endpoint configuration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{DirectoryConfig, DEFAULT_BASE_DN, DEFAULT_SESSION_TIMEOUT_SECS};
pub use error::{Error, Result};
