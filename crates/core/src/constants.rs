//! Well-known paths and limits for a Flutter SDK installation.

use std::time::Duration;

/// Relative path of the Dart SDK nested inside a Flutter SDK root.
///
/// A project's Dart toolchain path must end with this suffix for the
/// enclosing Flutter SDK root to be derivable from it.
pub const DART_SDK_SUFFIX: &str = "bin/cache/dart-sdk";

/// Relative path of the `flutter` tool inside an SDK root.
#[cfg(not(windows))]
pub const FLUTTER_TOOL: &str = "bin/flutter";

/// Relative path of the `flutter` tool inside an SDK root.
#[cfg(windows)]
pub const FLUTTER_TOOL: &str = "bin/flutter.bat";

/// Marker file used by the structural "is this really an SDK root" check.
pub const FLUTTER_PUBSPEC_MARKER: &str = "packages/flutter/pubspec.yaml";

/// Name of the version marker file at the SDK root.
pub const VERSION_FILE: &str = "version";

/// Name of the `pub` tool inside a Dart SDK's `bin` directory.
#[cfg(not(windows))]
pub const PUB_TOOL: &str = "pub";

/// Name of the `pub` tool inside a Dart SDK's `bin` directory.
#[cfg(windows)]
pub const PUB_TOOL: &str = "pub.bat";

/// Device id of the headless tester device.
pub const FLUTTER_TESTER_DEVICE: &str = "flutter-tester";

/// Bounded wait applied to the machine-mode config query.
///
/// This is the only hardcoded process timeout in the workspace.
pub const CONFIG_QUERY_TIMEOUT: Duration = Duration::from_millis(5000);
