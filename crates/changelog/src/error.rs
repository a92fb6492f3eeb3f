//! Error types for changelog parsing and next-version computation.
//!
//! Grammar problems inside a changelog are not errors in this sense: they are
//! collected as [`crate::changelog::ParseError`] values on the parsed document.
//! This enum covers the failures a caller has to handle.

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for changelog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while computing or caching versions.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A version string could not be parsed for bumping.
    #[error("Invalid version: {version}")]
    #[diagnostic(
        code(nextver::invalid_version),
        help("The last released version must look like `major.minor.patch` (e.g. 1.2.3)")
    )]
    InvalidVersion {
        /// The invalid version string
        version: String,
    },

    /// The snapshot suffix was about to be appended twice.
    #[error("Can't append {suffix} to {version} because it's already there!")]
    #[diagnostic(
        code(nextver::snapshot_already_present),
        help("Remove the suffix from the forced version, or disable `append_snapshot`")
    )]
    SnapshotAlreadyPresent {
        /// The computed version which already carries the suffix
        version: String,
        /// The configured snapshot suffix
        suffix: String,
    },

    /// A snapshot version was about to be written into the changelog.
    #[error("Refusing to release snapshot version {version}")]
    #[diagnostic(
        code(nextver::snapshot_release),
        help("Snapshot versions never belong in the changelog; disable `append_snapshot` to release")
    )]
    SnapshotRelease {
        /// The snapshot version
        version: String,
    },

    /// The changelog file does not exist or is not a regular file.
    #[error("Looked for changelog at '{}', but it was not present.", path.display())]
    #[diagnostic(
        code(nextver::changelog_missing),
        help("Create the changelog or point the configuration at the right file")
    )]
    ChangelogMissing {
        /// The path that was checked
        path: PathBuf,
    },

    /// The changelog has grammar errors.
    #[error("{rendered}")]
    #[diagnostic(
        code(nextver::malformed),
        help("Headers must look like `## [Unreleased]` or `## [x.y.z] - yyyy-mm-dd`")
    )]
    Malformed {
        /// One `path[:line]: message` line per error
        rendered: String,
    },

    /// I/O error while reading a changelog or a persisted cache.
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(nextver::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write", "canonicalize")
        operation: String,
    },

    /// Failed to encode a cache signature or the persisted cache.
    #[error("Serialization error: {message}")]
    #[diagnostic(code(nextver::serialization))]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },
}

impl Error {
    /// Create a new invalid version error.
    #[must_use]
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create a new double-snapshot error.
    #[must_use]
    pub fn snapshot_already_present(version: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::SnapshotAlreadyPresent {
            version: version.into(),
            suffix: suffix.into(),
        }
    }

    /// Create a new snapshot release error.
    #[must_use]
    pub fn snapshot_release(version: impl Into<String>) -> Self {
        Self::SnapshotRelease {
            version: version.into(),
        }
    }

    /// Create a new missing changelog error.
    #[must_use]
    pub fn changelog_missing(path: impl Into<PathBuf>) -> Self {
        Self::ChangelogMissing { path: path.into() }
    }

    /// Create a new malformed changelog error from pre-rendered lines.
    #[must_use]
    pub fn malformed(rendered: impl Into<String>) -> Self {
        Self::Malformed {
            rendered: rendered.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }
}
