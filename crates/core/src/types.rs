//! Domain types shared across the flutterkit workspace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::trace;

/// How a command is being run from the host IDE's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// Plain run, no debugger attached.
    Run,
    /// Run with a debugger; the process starts paused.
    Debug,
    /// Run under the profiler.
    Profile,
    /// Run as a test session.
    Test,
}

/// The launch mode requested for a `flutter run`/`attach` invocation.
///
/// Profile and release are mutually exclusive flags on the command line;
/// debug is the absence of both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlutterLaunchMode {
    Debug,
    Profile,
    Release,
}

/// A connected device a command can be targeted at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlutterDevice {
    id: String,
}

impl FlutterDevice {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The identifier passed to `--device-id=`.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for FlutterDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Host-supplied feature toggles consulted while shaping command arguments.
///
/// The host IDE owns persistence of these; command builders only read them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlutterSettings {
    /// Pass `--verbose` to run/attach/test invocations.
    pub verbose_logging: bool,
    /// Pass `--track-widget-creation` to debug-mode launches.
    pub track_widget_creation: bool,
}

/// The root directory of a pub package (contains a `pubspec.yaml`).
///
/// Commands that operate on a project run with this directory as their
/// working directory, and target files are rendered relative to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubRoot {
    root: PathBuf,
}

impl PubRoot {
    /// Returns the pub root for a directory, or `None` if the directory does
    /// not exist or has no `pubspec.yaml`.
    #[must_use]
    pub fn for_directory(dir: &Path) -> Option<Self> {
        if !dir.is_dir() || !dir.join("pubspec.yaml").is_file() {
            trace!("no pub root at {}", dir.display());
            return None;
        }
        Some(Self {
            root: dir.to_path_buf(),
        })
    }

    /// Construct a pub root without checking the filesystem.
    ///
    /// Intended for callers that already validated the directory.
    #[must_use]
    pub fn from_path_unchecked(dir: impl Into<PathBuf>) -> Self {
        Self { root: dir.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Renders `target` relative to this root, or `None` if the target does
    /// not live under the root.
    #[must_use]
    pub fn relative_path(&self, target: &Path) -> Option<PathBuf> {
        target.strip_prefix(&self.root).ok().map(Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_inside_root() {
        let root = PubRoot::from_path_unchecked("/projects/app");
        assert_eq!(
            root.relative_path(Path::new("/projects/app/lib/main.dart")),
            Some(PathBuf::from("lib/main.dart"))
        );
    }

    #[test]
    fn test_relative_path_outside_root() {
        let root = PubRoot::from_path_unchecked("/projects/app");
        assert_eq!(root.relative_path(Path::new("/projects/other/main.dart")), None);
    }

    #[test]
    fn test_for_directory_requires_pubspec() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PubRoot::for_directory(dir.path()).is_none());

        std::fs::write(dir.path().join("pubspec.yaml"), "name: app\n").unwrap();
        let root = PubRoot::for_directory(dir.path()).unwrap();
        assert_eq!(root.root(), dir.path());
    }

    #[test]
    fn test_device_display() {
        let device = FlutterDevice::new("macos");
        assert_eq!(device.to_string(), "macos");
        assert_eq!(device.device_id(), "macos");
    }
}
