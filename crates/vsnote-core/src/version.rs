use crate::error::{Result, TelemetryError};
use crate::io;
use semver::Version;
use std::cmp::Ordering;
use std::path::Path;

/// Parse a semantic version, tolerating surrounding whitespace and a leading `v`.
pub fn parse(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(trimmed).map_err(|_| TelemetryError::InvalidVersion(raw.to_string()))
}

/// SemVer precedence: major.minor.patch, then pre-release; build metadata ignored.
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.cmp_precedence(b)
}

/// Versions of all installations named `<identifier>-<version>` in `installs_dir`,
/// sorted ascending. Names with an unparseable suffix are skipped.
pub fn installed_versions(installs_dir: &Path, identifier: &str) -> Result<Vec<Version>> {
    let prefix = format!("{identifier}-");
    let mut versions = Vec::new();
    for name in io::list_names(installs_dir)? {
        let Some(suffix) = name.strip_prefix(&prefix) else {
            continue;
        };
        match parse(suffix) {
            Ok(v) => versions.push(v),
            Err(_) => tracing::warn!(dir = %name, "ignoring installation with unparseable version"),
        }
    }
    versions.sort_by(compare);
    Ok(versions)
}

/// The version installed immediately before the newest one.
///
/// With fewer than two installations this is `current` (first install).
/// Otherwise `current` counts as installed even if its directory is not
/// listed, and the second-highest distinct version wins.
pub fn previous_version(installs_dir: &Path, identifier: &str, current: &Version) -> Result<Version> {
    let mut versions = installed_versions(installs_dir, identifier)?;
    if versions.len() < 2 {
        return Ok(current.clone());
    }
    versions.push(current.clone());
    versions.sort_by(compare);
    versions.dedup_by(|a, b| compare(a, b) == Ordering::Equal);
    match versions.len() {
        0 | 1 => Ok(current.clone()),
        n => Ok(versions[n - 2].clone()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn v(s: &str) -> Version {
        parse(s).unwrap()
    }

    fn installs(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        dir
    }

    #[test]
    fn parse_accepts_v_prefix_and_whitespace() {
        assert_eq!(v(" v1.2.3 "), Version::new(1, 2, 3));
        assert!(matches!(parse("1.2"), Err(TelemetryError::InvalidVersion(_))));
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        assert_eq!(compare(&v("0.10.0"), &v("0.9.0")), Ordering::Greater);
        assert_eq!(compare(&v("1.0.0-alpha"), &v("1.0.0")), Ordering::Less);
        assert_eq!(compare(&v("1.0.0-alpha"), &v("1.0.0-beta")), Ordering::Less);
        assert_eq!(compare(&v("1.0.0+build.1"), &v("1.0.0")), Ordering::Equal);
    }

    #[test]
    fn ordering_is_reflexive_and_transitive() {
        let samples: Vec<Version> = [
            "0.1.0",
            "0.9.9",
            "0.10.0",
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-beta",
            "1.0.0",
            "1.0.0+meta",
            "1.2.0",
            "2.0.0-rc.1",
        ]
        .iter()
        .map(|s| v(s))
        .collect();

        for a in &samples {
            assert_eq!(compare(a, a), Ordering::Equal);
            for b in &samples {
                assert_eq!(compare(a, b), compare(b, a).reverse());
                for c in &samples {
                    if compare(a, b) == Ordering::Less && compare(b, c) == Ordering::Less {
                        assert_eq!(compare(a, c), Ordering::Less, "{a} < {b} < {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn installed_versions_filters_by_identifier() {
        let dir = installs(&[
            "pub.note-0.10.0",
            "pub.note-0.9.0",
            "pub.note-garbage",
            "other.ext-5.0.0",
            ".obsolete",
        ]);
        let versions = installed_versions(dir.path(), "pub.note").unwrap();
        assert_eq!(versions, vec![v("0.9.0"), v("0.10.0")]);
    }

    #[test]
    fn previous_is_second_highest() {
        let dir = installs(&["pub.note-1.0.0", "pub.note-1.3.0", "pub.note-0.5.0"]);
        assert_eq!(
            previous_version(dir.path(), "pub.note", &v("1.3.0")).unwrap(),
            v("1.0.0")
        );
    }

    #[test]
    fn current_counts_as_installed() {
        let dir = installs(&["pub.note-1.0.0", "pub.note-1.2.0"]);
        assert_eq!(
            previous_version(dir.path(), "pub.note", &v("1.3.0")).unwrap(),
            v("1.2.0")
        );
    }

    #[test]
    fn running_an_older_build_than_newest_install_is_not_an_upgrade() {
        // 1.2.0 is installed but 1.1.0 is running: nothing between them is replayed.
        let dir = installs(&["pub.note-1.0.0", "pub.note-1.2.0"]);
        assert_eq!(
            previous_version(dir.path(), "pub.note", &v("1.1.0")).unwrap(),
            v("1.1.0")
        );
    }

    #[test]
    fn duplicate_versions_collapse() {
        let dir = installs(&["pub.note-1.2.0", "pub.note-1.3.0", "pub.note-v1.3.0"]);
        assert_eq!(
            previous_version(dir.path(), "pub.note", &v("1.3.0")).unwrap(),
            v("1.2.0")
        );
    }

    #[test]
    fn duplicates_of_current_only_have_no_previous() {
        let dir = installs(&["pub.note-1.3.0", "pub.note-v1.3.0"]);
        assert_eq!(
            previous_version(dir.path(), "pub.note", &v("1.3.0")).unwrap(),
            v("1.3.0")
        );
    }

    #[test]
    fn single_install_has_no_previous() {
        let dir = installs(&["pub.note-1.3.0"]);
        assert_eq!(
            previous_version(dir.path(), "pub.note", &v("1.3.0")).unwrap(),
            v("1.3.0")
        );
    }

    #[test]
    fn missing_installs_dir_has_no_previous() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("extensions");
        assert_eq!(
            previous_version(&missing, "pub.note", &v("1.3.0")).unwrap(),
            v("1.3.0")
        );
    }
}
