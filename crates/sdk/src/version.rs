//! The version marker of an installed Flutter SDK.

use flutterkit_core::constants::VERSION_FILE;
use semver::Version;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// The SDK version as captured in the `version` marker file.
///
/// This version is coarse grained and not meant for presentation; it exists
/// to sanity-check the presence of baseline features. Parsing is defensive:
/// absent or garbled content yields an unknown version for which every
/// capability query answers `false`. Immutable once constructed; a new SDK
/// discovery creates a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlutterSdkVersion {
    version: Option<Version>,
    raw: Option<String>,
}

impl FlutterSdkVersion {
    /// Read the version marker at its well-known location under an SDK root.
    #[must_use]
    pub fn read_from_sdk(home: &Path) -> Self {
        Self::read_from_file(&home.join(VERSION_FILE))
    }

    /// Read an arbitrary version marker file, as supplied by an alternate
    /// backend's workspace descriptor.
    #[must_use]
    pub fn read_from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_text(&text),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no readable version marker");
                Self::unknown()
            }
        }
    }

    /// Parse version marker contents. Never fails; unparseable input becomes
    /// the unknown version.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let line = text.lines().find(|l| !l.trim().is_empty()).map(str::trim);
        match line {
            Some(line) => Self {
                version: parse_lenient(line),
                raw: Some(line.to_string()),
            },
            None => Self::unknown(),
        }
    }

    /// The version used when the marker is missing or unreadable.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            version: None,
            raw: None,
        }
    }

    /// Whether a version could be parsed at all.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.version.is_some()
    }

    /// Whether `flutter test` supports `--machine` structured output.
    #[must_use]
    pub fn supports_test_machine_mode(&self) -> bool {
        self.at_least(&Version::new(0, 10, 2))
    }

    /// Whether `flutter test` supports selecting tests with `--plain-name`.
    #[must_use]
    pub fn supports_test_name_filtering(&self) -> bool {
        self.at_least(&Version::new(1, 0, 0))
    }

    fn at_least(&self, min: &Version) -> bool {
        match &self.version {
            Some(version) => version >= min,
            None => false,
        }
    }
}

impl fmt::Display for FlutterSdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => write!(f, "{raw}"),
            None => write!(f, "unknown version"),
        }
    }
}

/// Parse a version string, tolerating a leading `v`, missing components
/// ("1.2"), and trailing noise ("1.2.3.hotfix").
fn parse_lenient(line: &str) -> Option<Version> {
    let line = line.strip_prefix('v').unwrap_or(line);
    if let Ok(version) = Version::parse(line) {
        return Some(version);
    }
    let numeric: String = line
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut parts = numeric.split('.').filter(|p| !p.is_empty());
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_version() {
        let version = FlutterSdkVersion::from_text("0.10.2\n");
        assert!(version.is_valid());
        assert!(version.supports_test_machine_mode());
        assert!(!version.supports_test_name_filtering());
        assert_eq!(version.to_string(), "0.10.2");
    }

    #[test]
    fn test_parse_release_version() {
        let version = FlutterSdkVersion::from_text("1.2.1");
        assert!(version.supports_test_machine_mode());
        assert!(version.supports_test_name_filtering());
    }

    #[test]
    fn test_parse_tolerates_short_and_noisy_forms() {
        assert!(FlutterSdkVersion::from_text("v1.0").supports_test_name_filtering());
        assert!(FlutterSdkVersion::from_text("1.0.0.hotfix").supports_test_name_filtering());
        assert!(FlutterSdkVersion::from_text("0.10.2-pre.54").is_valid());
    }

    #[test]
    fn test_garbage_degrades_to_unknown() {
        for text in ["", "   \n", "not a version", "x.y.z"] {
            let version = FlutterSdkVersion::from_text(text);
            assert!(!version.supports_test_machine_mode(), "{text:?}");
            assert!(!version.supports_test_name_filtering(), "{text:?}");
        }
        assert_eq!(FlutterSdkVersion::unknown().to_string(), "unknown version");
    }

    #[test]
    fn test_missing_marker_file_degrades_to_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let version = FlutterSdkVersion::read_from_sdk(dir.path());
        assert!(!version.is_valid());
    }

    #[test]
    fn test_read_from_sdk_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("version"), "1.5.4\n").unwrap();
        let version = FlutterSdkVersion::read_from_sdk(dir.path());
        assert!(version.supports_test_name_filtering());
    }
}
