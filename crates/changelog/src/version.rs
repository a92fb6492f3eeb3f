//! Version parsing and next-version bump rules.
//!
//! This module provides:
//! - A lenient [`Version`] parser for the last published version
//! - [`BumpType`] and the rules for applying it
//! - [`NextVersionFunction`], the configurable bump strategy

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    /// No version change.
    None,
    /// Patch version bump (0.0.X).
    Patch,
    /// Minor version bump (0.X.0).
    Minor,
    /// Major version bump (X.0.0).
    Major,
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// A published version, parsed leniently.
///
/// Accepts `major[.minor[.patch[.qualifier]]]` with an optional `v` prefix,
/// `-prerelease` and `+build`. Missing numeric components read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Major version number.
    pub major: u64,
    /// Minor version number.
    pub minor: u64,
    /// Patch version number.
    pub patch: u64,
    /// Anything after the third dot (e.g. "4" in "1.2.3.4").
    pub qualifier: Option<String>,
    /// Pre-release identifier (e.g., "alpha", "beta.1").
    pub prerelease: Option<String>,
    /// Build metadata (e.g., "20230101", "commit.abc123").
    pub build: Option<String>,
}

impl Version {
    /// Create a new version.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            qualifier: None,
            prerelease: None,
            build: None,
        }
    }

    /// Apply a bump type to this version. The result is always plain `major.minor.patch`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] if the bumped component would overflow.
    pub fn bump(&self, bump_type: BumpType) -> Result<Self> {
        let next = |value: u64, name: &str| {
            value.checked_add(1).ok_or_else(|| {
                Error::invalid_version(format!("{self} ({name} component cannot be bumped)"))
            })
        };
        Ok(match bump_type {
            BumpType::Major => Self::new(next(self.major, "major")?, 0, 0),
            BumpType::Minor => Self::new(self.major, next(self.minor, "minor")?, 0),
            BumpType::Patch => Self::new(self.major, self.minor, next(self.patch, "patch")?),
            BumpType::None => Self::new(self.major, self.minor, self.patch),
        })
    }

    /// Check if this is the initial development version (0.x.x).
    #[must_use]
    pub const fn is_initial_development(&self) -> bool {
        self.major == 0
    }

    /// Get adjusted bump type for pre-1.0 versions.
    ///
    /// Breaking changes in 0.x.x are treated as minor bumps (0.1.0 → 0.2.0).
    #[must_use]
    pub fn adjusted_bump_type(&self, bump: BumpType) -> BumpType {
        if self.is_initial_development() && bump == BumpType::Major {
            BumpType::Minor
        } else {
            bump
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

fn parse_component(whole: &str, name: &str, part: Option<&str>) -> Result<u64> {
    match part {
        None => Ok(0),
        Some(text) => text.parse().map_err(|_| {
            Error::invalid_version(format!("{whole} (invalid {name} component '{text}')"))
        }),
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        let s = s.strip_prefix('v').unwrap_or(s);
        if s.is_empty() {
            return Err(Error::invalid_version(s));
        }

        let (version_pre, build) = match s.split_once('+') {
            Some((v, b)) => (v, Some(b.to_string())),
            None => (s, None),
        };
        let (version, prerelease) = match version_pre.split_once('-') {
            Some((v, p)) => (v, Some(p.to_string())),
            None => (version_pre, None),
        };

        let mut parts = version.splitn(4, '.');
        let major = parse_component(s, "major", parts.next())?;
        let minor = parse_component(s, "minor", parts.next())?;
        let patch = parse_component(s, "patch", parts.next())?;
        let qualifier = parts.next().map(ToString::to_string);

        Ok(Self {
            major,
            minor,
            patch,
            qualifier,
            prerelease,
            build,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref qualifier) = self.qualifier {
            write!(f, ".{qualifier}")?;
        }
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{pre}")?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

/// Substrings of the unreleased notes which trigger a bigger-than-patch bump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemverTriggers {
    /// Any of these bumps major (minor while still on 0.x).
    pub if_found_bump_breaking: Vec<String>,
    /// Any of these bumps minor.
    pub if_found_bump_added: Vec<String>,
}

impl Default for SemverTriggers {
    fn default() -> Self {
        Self {
            if_found_bump_breaking: vec!["**BREAKING**".to_string()],
            if_found_bump_added: vec!["### Added".to_string()],
        }
    }
}

impl SemverTriggers {
    /// The bump requested by the unreleased notes, before any 0.x adjustment.
    #[must_use]
    pub fn bump_type(&self, unreleased_changes: &str) -> BumpType {
        let found = |triggers: &[String]| {
            triggers
                .iter()
                .any(|trigger| unreleased_changes.contains(trigger.as_str()))
        };
        if found(&self.if_found_bump_breaking) {
            BumpType::Major
        } else if found(&self.if_found_bump_added) {
            BumpType::Minor
        } else {
            BumpType::Patch
        }
    }
}

/// Strategy which computes the next version from the unreleased notes and the last version.
///
/// `BrandPrefix` and `Condense` wrap another strategy, so they compose:
///
/// ```
/// use nextver_changelog::NextVersionFunction;
///
/// let function = NextVersionFunction::semver().brand_prefix();
/// assert_eq!(function.next_version("### Added", "7.1.2.0").unwrap(), "7.1.3.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextVersionFunction {
    /// Standard semver: `**BREAKING**` bumps major, `### Added` bumps minor, anything else patch.
    Semver(SemverTriggers),
    /// Supports `brand.major.minor.patch`; the brand is carried through untouched.
    BrandPrefix(Box<Self>),
    /// Turns `x.y.0` into `x.y`.
    Condense(Box<Self>),
}

impl Default for NextVersionFunction {
    fn default() -> Self {
        Self::semver()
    }
}

impl NextVersionFunction {
    /// Standard semver with the default triggers.
    #[must_use]
    pub fn semver() -> Self {
        Self::Semver(SemverTriggers::default())
    }

    /// Wraps this strategy so the first dot-delimited component is a brand prefix.
    #[must_use]
    pub fn brand_prefix(self) -> Self {
        Self::BrandPrefix(Box::new(self))
    }

    /// Wraps this strategy so a trailing `.0` is removed from its result.
    #[must_use]
    pub fn condense(self) -> Self {
        Self::Condense(Box::new(self))
    }

    /// Replaces the substrings which trigger a minor bump.
    #[must_use]
    pub fn if_found_bump_added<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers_mut().if_found_bump_added = triggers.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the substrings which trigger a major bump.
    #[must_use]
    pub fn if_found_bump_breaking<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers_mut().if_found_bump_breaking =
            triggers.into_iter().map(Into::into).collect();
        self
    }

    /// The triggers of the innermost semver strategy.
    #[must_use]
    pub fn triggers(&self) -> &SemverTriggers {
        match self {
            Self::Semver(triggers) => triggers,
            Self::BrandPrefix(inner) | Self::Condense(inner) => inner.triggers(),
        }
    }

    fn triggers_mut(&mut self) -> &mut SemverTriggers {
        match self {
            Self::Semver(triggers) => triggers,
            Self::BrandPrefix(inner) | Self::Condense(inner) => inner.triggers_mut(),
        }
    }

    /// Computes the next version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] if `last_version` cannot be parsed or bumped.
    pub fn next_version(&self, unreleased_changes: &str, last_version: &str) -> Result<String> {
        match self {
            Self::Semver(triggers) => {
                let last: Version = last_version.parse()?;
                let bump = last.adjusted_bump_type(triggers.bump_type(unreleased_changes));
                Ok(last.bump(bump)?.to_string())
            }
            Self::BrandPrefix(inner) => {
                let Some((brand, rest)) = last_version.split_once('.') else {
                    return Err(Error::invalid_version(format!(
                        "{last_version} (expected a brand prefix like '7.1.2.0')"
                    )));
                };
                let next = inner.next_version(unreleased_changes, rest)?;
                Ok(format!("{brand}.{next}"))
            }
            Self::Condense(inner) => {
                let next = inner.next_version(unreleased_changes, last_version)?;
                Ok(match next.strip_suffix(".0") {
                    Some(condensed) => condensed.to_string(),
                    None => next,
                })
            }
        }
    }
}
