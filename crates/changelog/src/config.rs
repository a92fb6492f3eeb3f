//! Next-version configuration.
//!
//! [`NextVersionCfg`] is part of the cache signature, so every field that can
//! change the computed versions lives here and serializes deterministically.

use crate::changelog::DONT_PARSE_BELOW_HERE;
use crate::version::NextVersionFunction;
use serde::{Deserialize, Serialize};

/// Conventional changelog file name.
pub const DEFAULT_FILE: &str = "CHANGELOG.md";

/// Version proposed when nothing has been published yet.
pub const FIRST_VERSION: &str = "0.1.0";

/// Default suffix appended when `append_snapshot` is set.
pub const DASH_SNAPSHOT: &str = "-SNAPSHOT";

/// Configuration for computing the next version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextVersionCfg {
    /// Strategy used to bump the last version.
    pub function: NextVersionFunction,
    /// Use this verbatim instead of computing anything.
    pub force_next_version: Option<String>,
    /// Append `snapshot_suffix` to the computed version.
    pub append_snapshot: bool,
    /// Suffix used by `append_snapshot`.
    pub snapshot_suffix: String,
    /// Marker below which the changelog is not parsed.
    pub dont_parse_below_here: String,
}

impl Default for NextVersionCfg {
    fn default() -> Self {
        Self {
            function: NextVersionFunction::default(),
            force_next_version: None,
            append_snapshot: false,
            snapshot_suffix: DASH_SNAPSHOT.to_string(),
            dont_parse_below_here: DONT_PARSE_BELOW_HERE.to_string(),
        }
    }
}

impl NextVersionCfg {
    /// Set the bump strategy.
    #[must_use]
    pub fn with_function(mut self, function: NextVersionFunction) -> Self {
        self.function = function;
        self
    }

    /// Force the next version, skipping the bump strategy.
    #[must_use]
    pub fn with_force_next_version(mut self, version: impl Into<String>) -> Self {
        self.force_next_version = Some(version.into());
        self
    }

    /// Toggle the snapshot suffix.
    #[must_use]
    pub const fn with_append_snapshot(mut self, append_snapshot: bool) -> Self {
        self.append_snapshot = append_snapshot;
        self
    }

    /// Set the marker below which the changelog is not parsed.
    #[must_use]
    pub fn with_dont_parse_below_here(mut self, marker: impl Into<String>) -> Self {
        self.dont_parse_below_here = marker.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = NextVersionCfg::default();
        assert_eq!(cfg.function, NextVersionFunction::semver());
        assert!(cfg.force_next_version.is_none());
        assert!(!cfg.append_snapshot);
        assert_eq!(cfg.snapshot_suffix, "-SNAPSHOT");
        assert_eq!(cfg.dont_parse_below_here, "\n<!-- END CHANGELOG -->");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: NextVersionCfg =
            serde_json::from_str(r#"{"force_next_version": "2.0.0"}"#).unwrap();
        assert_eq!(cfg.force_next_version.as_deref(), Some("2.0.0"));
        assert_eq!(cfg.snapshot_suffix, "-SNAPSHOT");
    }

    #[test]
    fn test_builders() {
        let cfg = NextVersionCfg::default()
            .with_function(NextVersionFunction::semver().condense())
            .with_force_next_version("9.9")
            .with_append_snapshot(true)
            .with_dont_parse_below_here("<!-- stop -->");
        assert_eq!(cfg.force_next_version.as_deref(), Some("9.9"));
        assert!(cfg.append_snapshot);
        assert_eq!(cfg.dont_parse_below_here, "<!-- stop -->");
        assert_ne!(cfg, NextVersionCfg::default());
    }
}
