//! Next-version computation and the release bump.

use crate::changelog::Changelog;
use crate::config::{FIRST_VERSION, NextVersionCfg};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// The next version to publish and the last one which was published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versions {
    next: String,
    last: Option<String>,
}

impl Versions {
    /// The version the next release will get.
    #[must_use]
    pub fn next(&self) -> &str {
        &self.next
    }

    /// The most recently published version, if any.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

impl fmt::Display for Versions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last {
            Some(last) if *last == self.next => write!(f, "{last} (no unreleased changes)"),
            Some(last) => write!(f, "{last} -> {}", self.next),
            None => write!(f, "(unpublished) -> {}", self.next),
        }
    }
}

/// Computes the next and last versions of a parsed changelog.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] if the last version cannot be bumped, or
/// [`Error::SnapshotAlreadyPresent`] if the snapshot suffix would be doubled.
pub fn next_versions(changelog: &Changelog, cfg: &NextVersionCfg) -> Result<Versions> {
    let last = changelog.version_last();
    let next = match (&cfg.force_next_version, &last) {
        (Some(forced), _) => forced.clone(),
        (None, None) => FIRST_VERSION.to_string(),
        // bumped already, but nothing new since
        (None, Some(last)) if changelog.no_unreleased_changes() => last.clone(),
        (None, Some(last)) => cfg
            .function
            .next_version(&changelog.unreleased_changes(), last)?,
    };
    let next = if cfg.append_snapshot {
        if !cfg.snapshot_suffix.is_empty() && next.ends_with(&cfg.snapshot_suffix) {
            return Err(Error::snapshot_already_present(next, &cfg.snapshot_suffix));
        }
        format!("{next}{}", cfg.snapshot_suffix)
    } else {
        next
    };
    debug!(next = %next, last = ?last, "Computed next version");
    Ok(Versions { next, last })
}

/// Fails unless `path` is an existing regular file.
pub(crate) fn assert_changelog_exists(path: &Path) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    Err(Error::changelog_missing(absolute))
}

fn read_changelog(path: &Path) -> Result<String> {
    assert_changelog_exists(path)?;
    std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "read"))
}

#[derive(Debug)]
enum ChangelogSource {
    Parsed(Changelog),
    Deferred {
        path: PathBuf,
        dont_parse_below_here: String,
        parsed: OnceLock<Changelog>,
    },
}

/// A changelog together with its computed [`Versions`].
///
/// When produced by a cache hit the changelog is only read and parsed on
/// first access through [`ChangelogAndNext::changelog`].
#[derive(Debug)]
pub struct ChangelogAndNext {
    changelog: ChangelogSource,
    versions: Arc<Versions>,
    origin: String,
    snapshot_suffix: String,
}

impl ChangelogAndNext {
    /// Parses `content` and computes its versions.
    ///
    /// # Errors
    ///
    /// See [`next_versions`].
    pub fn calculate(content: &str, cfg: &NextVersionCfg) -> Result<Self> {
        Self::calculate_named(content, cfg, crate::config::DEFAULT_FILE.to_string())
    }

    /// Reads and parses the changelog at `path` and computes its versions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChangelogMissing`] if `path` is not a regular file,
    /// [`Error::Io`] if it cannot be read, or anything [`next_versions`] returns.
    pub fn calculate_file(path: impl AsRef<Path>, cfg: &NextVersionCfg) -> Result<Self> {
        let path = path.as_ref();
        let content = read_changelog(path)?;
        Self::calculate_named(&content, cfg, path.display().to_string())
    }

    pub(crate) fn calculate_named(content: &str, cfg: &NextVersionCfg, origin: String) -> Result<Self> {
        let changelog = Changelog::parse_with_marker(content, &cfg.dont_parse_below_here);
        let versions = next_versions(&changelog, cfg)?;
        Ok(Self {
            changelog: ChangelogSource::Parsed(changelog),
            versions: Arc::new(versions),
            origin,
            snapshot_suffix: cfg.snapshot_suffix.clone(),
        })
    }

    pub(crate) fn deferred(path: &Path, cfg: &NextVersionCfg, versions: Arc<Versions>) -> Self {
        Self {
            changelog: ChangelogSource::Deferred {
                path: path.to_path_buf(),
                dont_parse_below_here: cfg.dont_parse_below_here.clone(),
                parsed: OnceLock::new(),
            },
            versions,
            origin: path.display().to_string(),
            snapshot_suffix: cfg.snapshot_suffix.clone(),
        }
    }

    /// The computed versions.
    #[must_use]
    pub const fn versions(&self) -> &Arc<Versions> {
        &self.versions
    }

    /// The parsed changelog, reading it first if it was not parsed yet.
    ///
    /// # Errors
    ///
    /// Returns an error if a deferred changelog can no longer be read.
    pub fn changelog(&self) -> Result<&Changelog> {
        match &self.changelog {
            ChangelogSource::Parsed(changelog) => Ok(changelog),
            ChangelogSource::Deferred {
                path,
                dont_parse_below_here,
                parsed,
            } => {
                if let Some(changelog) = parsed.get() {
                    return Ok(changelog);
                }
                let content = read_changelog(path)?;
                debug!(path = %path.display(), "Parsing deferred changelog");
                Ok(parsed.get_or_init(|| Changelog::parse_with_marker(&content, dont_parse_below_here)))
            }
        }
    }

    /// The changelog with `[Unreleased]` published as the next version on `date`.
    ///
    /// Returns `None` when there is nothing to release.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotRelease`] if the next version is a snapshot, or
    /// [`Error::Malformed`] if the changelog has grammar errors.
    pub fn bumped(&self, date: &str) -> Result<Option<Changelog>> {
        let next = self.versions.next();
        if !self.snapshot_suffix.is_empty() && next.ends_with(&self.snapshot_suffix) {
            return Err(Error::snapshot_release(next));
        }
        if self.versions.last() == Some(next) {
            debug!(version = next, "Nothing to release");
            return Ok(None);
        }
        let changelog = self.changelog()?;
        changelog.check(&self.origin)?;
        Ok(Some(changelog.release_unreleased(next, date)))
    }

    /// [`ChangelogAndNext::bumped`] with today's UTC date.
    ///
    /// # Errors
    ///
    /// See [`ChangelogAndNext::bumped`].
    pub fn bumped_today(&self) -> Result<Option<Changelog>> {
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        self.bumped(&today)
    }
}
