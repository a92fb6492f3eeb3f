//! Next-version tables for every bump strategy.

use nextver_changelog::{ChangelogAndNext, Error, NextVersionCfg, NextVersionFunction};

fn next(cfg: &NextVersionCfg, changelog: &str) -> String {
    ChangelogAndNext::calculate(changelog, cfg)
        .unwrap()
        .versions()
        .next()
        .to_string()
}

fn next_default(changelog: &str) -> String {
    next(&NextVersionCfg::default(), changelog)
}

#[test]
fn test_initial_release() {
    for changelog in [
        "",
        "\n## [Unreleased]",
        "\n## [Unreleased]\n### Added\n",
        "\n## [Unreleased]\n**BREAKING**\n",
        "\n## [Unreleased]\n### Added\n**BREAKING**\n",
        "\n## [Unreleased]\nSome change\n### Added\n",
        "\n## [Unreleased]\nSome change\n**BREAKING**\n",
        "\n## [Unreleased]\nSome change\n### Added\n**BREAKING**\n",
    ] {
        assert_eq!(next_default(changelog), "0.1.0", "{changelog:?}");
    }
}

#[test]
fn test_force_next_version() {
    let cfg = NextVersionCfg::default().with_force_next_version("shoopty");
    for changelog in [
        "\n## [Unreleased]\nSome change\n## [1.2.0] - 2020-10-10\n",
        "\n## [Unreleased]\nSome change\n### Added\n## [1.2.5] - 2020-10-10\n",
        "\n## [Unreleased]\nSome change\n**BREAKING**\n## [1.2.0] - 2020-10-10\n",
        "\n## [Unreleased]\nSome change\n### Added\n**BREAKING**\n## [1.2.5] - 2020-10-10\n",
        "\n## [Unreleased]\n\n## [1.2.5] - 2020-10-10\n",
        "",
    ] {
        assert_eq!(next(&cfg, changelog), "shoopty", "{changelog:?}");
    }
}

#[test]
fn test_append_snapshot() {
    let cfg = NextVersionCfg::default()
        .with_force_next_version("shoopty")
        .with_append_snapshot(true);
    assert_eq!(
        next(&cfg, "\n## [Unreleased]\nSome change\n## [1.2.0] - 2020-10-10\n"),
        "shoopty-SNAPSHOT"
    );

    let doubled = cfg.with_force_next_version("shoopty-SNAPSHOT");
    let err = ChangelogAndNext::calculate(
        "\n## [Unreleased]\nSome change\n### Added\n**BREAKING**\n## [1.2.5] - 2020-10-10\n",
        &doubled,
    )
    .unwrap_err();
    assert!(matches!(err, Error::SnapshotAlreadyPresent { .. }));
    assert_eq!(
        err.to_string(),
        "Can't append -SNAPSHOT to shoopty-SNAPSHOT because it's already there!"
    );
}

#[test]
fn test_append_snapshot_to_computed() {
    let cfg = NextVersionCfg::default().with_append_snapshot(true);
    assert_eq!(
        next(&cfg, "\n## [Unreleased]\n### Added\n## [1.2.0] - 2020-10-10\n"),
        "1.3.0-SNAPSHOT"
    );
}

#[test]
fn test_semver_oh_dot() {
    let cases = [
        ("\n## [Unreleased]\nSome change\n## [0.2.0] - 2020-10-10", "0.2.1"),
        ("\n## [Unreleased]\nSome change\n## [0.2.5] - 2020-10-10", "0.2.6"),
        ("\n## [Unreleased]\nSome change\n### Added\n## [0.2.0] - 2020-10-10\n", "0.3.0"),
        ("\n## [Unreleased]\nSome change\n### Added\n## [0.2.5] - 2020-10-10\n", "0.3.0"),
        ("\n## [Unreleased]\nSome change\n**BREAKING**\n## [0.2.0] - 2020-10-10\n", "0.3.0"),
        ("\n## [Unreleased]\nSome change\n**BREAKING**\n## [0.2.5] - 2020-10-10\n", "0.3.0"),
        (
            "\n## [Unreleased]\nSome change\n### Added\n**BREAKING**\n## [0.2.0] - 2020-10-10\n",
            "0.3.0",
        ),
        (
            "\n## [Unreleased]\nSome change\n### Added\n**BREAKING**\n## [0.2.5] - 2020-10-10\n",
            "0.3.0",
        ),
    ];
    for (changelog, expected) in cases {
        assert_eq!(next_default(changelog), expected, "{changelog:?}");
    }
}

#[test]
fn test_semver_standard() {
    let cases = [
        ("\n## [Unreleased]\nSome change\n## [1.2.0] - 2020-10-10\n", "1.2.1"),
        ("\n## [Unreleased]\nSome change\n## [1.2.5] - 2020-10-10\n", "1.2.6"),
        ("\n## [Unreleased]\nSome change\n### Added\n## [1.2.0] - 2020-10-10\n", "1.3.0"),
        ("\n## [Unreleased]\nSome change\n### Added\n## [1.2.5] - 2020-10-10\n", "1.3.0"),
        ("\n## [Unreleased]\nSome change\n**BREAKING**\n## [1.2.0] - 2020-10-10\n", "2.0.0"),
        ("\n## [Unreleased]\nSome change\n**BREAKING**\n## [1.2.5] - 2020-10-10\n", "2.0.0"),
        (
            "\n## [Unreleased]\nSome change\n### Added\n**BREAKING**\n## [1.2.0] - 2020-10-10\n",
            "2.0.0",
        ),
        (
            "\n## [Unreleased]\nSome change\n### Added\n**BREAKING**\n## [1.2.5] - 2020-10-10\n",
            "2.0.0",
        ),
    ];
    for (changelog, expected) in cases {
        assert_eq!(next_default(changelog), expected, "{changelog:?}");
    }
}

#[test]
fn test_semver_brand_prefix() {
    let cfg =
        NextVersionCfg::default().with_function(NextVersionFunction::semver().brand_prefix());
    assert_eq!(
        next(&cfg, "\n## [Unreleased]\nSome change\n## [7.1.2.0] - 2020-10-10\n"),
        "7.1.2.1"
    );
    assert_eq!(
        next(&cfg, "\n## [Unreleased]\nSome change\n### Added\n## [7.1.2.0] - 2020-10-10\n"),
        "7.1.3.0"
    );
    assert_eq!(
        next(
            &cfg,
            "\n## [Unreleased]\nSome change\n### Added\n**BREAKING**\n## [7.1.2.0] - 2020-10-10\n"
        ),
        "7.2.0.0"
    );
}

#[test]
fn test_semver_condensed() {
    let cfg = NextVersionCfg::default().with_function(NextVersionFunction::semver().condense());
    assert_eq!(
        next(&cfg, "\n## [Unreleased]\nSome change\n## [1.2.0] - 2020-10-10\n"),
        "1.2.1"
    );
    assert_eq!(
        next(&cfg, "\n## [Unreleased]\nSome change\n### Added\n## [1.2.0] - 2020-10-10\n"),
        "1.3"
    );
    assert_eq!(
        next(
            &cfg,
            "\n## [Unreleased]\nSome change\n### Added\n**BREAKING**\n## [1.2.0] - 2020-10-10\n"
        ),
        "2.0"
    );
}

#[test]
fn test_no_unreleased_changes_is_idempotent() {
    let changelog = "\n## [Unreleased]\n\n## [1.2.0] - 2020-10-10\n- x\n";
    let result = ChangelogAndNext::calculate(changelog, &NextVersionCfg::default()).unwrap();
    assert_eq!(result.versions().next(), "1.2.0");
    assert_eq!(result.versions().last(), Some("1.2.0"));
    assert_eq!(result.versions().to_string(), "1.2.0 (no unreleased changes)");
}

#[test]
fn test_custom_triggers() {
    let cfg = NextVersionCfg::default().with_function(
        NextVersionFunction::semver()
            .if_found_bump_added(["### Features"])
            .if_found_bump_breaking(["### Removed", "BREAKING CHANGE"]),
    );
    let base = "\n## [1.4.2] - 2020-10-10\n";
    assert_eq!(next(&cfg, &format!("\n## [Unreleased]\n### Added\n{base}")), "1.4.3");
    assert_eq!(next(&cfg, &format!("\n## [Unreleased]\n### Features\n{base}")), "1.5.0");
    assert_eq!(next(&cfg, &format!("\n## [Unreleased]\n### Removed\n{base}")), "2.0.0");
}

#[test]
fn test_unparseable_last_version() {
    let err = ChangelogAndNext::calculate(
        "\n## [Unreleased]\n- x\n## [banana] - 2020-10-10\n",
        &NextVersionCfg::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidVersion { .. }));
}

#[test]
fn test_last_version_at_component_limit() {
    for changelog in [
        "\n## [Unreleased]\n**BREAKING**\n## [18446744073709551615.0.0] - 2020-01-01\n",
        "\n## [Unreleased]\n### Added\n## [1.18446744073709551615.0] - 2020-01-01\n",
        "\n## [Unreleased]\n- fix\n## [1.2.18446744073709551615] - 2020-01-01\n",
    ] {
        let err = ChangelogAndNext::calculate(changelog, &NextVersionCfg::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidVersion { .. }), "{changelog}");
    }
}

#[test]
fn test_empty_last_version_bumps_from_zero() {
    let released = "\n## [] - 2020-01-01\n";
    assert_eq!(next_default(&format!("\n## [Unreleased]\n- fix{released}")), "0.0.1");
    assert_eq!(next_default(&format!("\n## [Unreleased]\n### Added{released}")), "0.1.0");
    assert_eq!(next_default(&format!("\n## [Unreleased]\n**BREAKING**{released}")), "0.1.0");
}

#[test]
fn test_custom_dont_parse_marker() {
    let cfg = NextVersionCfg::default().with_dont_parse_below_here("\n<!-- legacy -->");
    let changelog = "\n## [Unreleased]\n### Added\n## [1.0.0] - 2020-10-10\n<!-- legacy -->\n## [junk";
    let result = ChangelogAndNext::calculate(changelog, &cfg).unwrap();
    assert_eq!(result.versions().next(), "1.1.0");
    assert!(result.changelog().unwrap().errors().is_empty());
}
