//! Changelog parsing and next-version computation.
//!
//! This crate reads "Keep a Changelog" style markdown, keeps every byte it
//! does not edit, and computes the next version from the markers found in the
//! `## [Unreleased]` section.
//!
//! # Architecture
//!
//! - [`pool`] - Zero-copy string spans which remember their source text
//! - [`changelog`] - Parser, model and release mutation
//! - [`version`] - Version parsing and bump strategies
//! - [`config`] - Next-version configuration
//! - [`next`] - Next-version computation and the release bump
//! - [`cache`] - Memoization keyed by file identity and configuration
//!
//! # Example
//!
//! ```
//! use nextver_changelog::{ChangelogAndNext, NextVersionCfg};
//!
//! let content = "\n## [Unreleased]\n### Added\n- shiny\n\n## [1.2.0] - 2020-10-10\n";
//! let result = ChangelogAndNext::calculate(content, &NextVersionCfg::default()).unwrap();
//! assert_eq!(result.versions().next(), "1.3.0");
//! assert_eq!(result.versions().last(), Some("1.2.0"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod cache;
pub mod changelog;
pub mod config;
pub mod error;
pub mod next;
pub mod pool;
pub mod version;

pub use cache::{FileSignature, Signature, SignatureCache};
pub use changelog::{Changelog, DONT_PARSE_BELOW_HERE, ParseError, VersionEntry};
pub use config::{DASH_SNAPSHOT, DEFAULT_FILE, FIRST_VERSION, NextVersionCfg};
pub use error::{Error, Result};
pub use next::{ChangelogAndNext, Versions, next_versions};
pub use pool::{PoolPart, PoolString};
pub use version::{BumpType, NextVersionFunction, SemverTriggers, Version};
