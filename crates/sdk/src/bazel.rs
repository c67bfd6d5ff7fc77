//! The alternate (Bazel) backend.
//!
//! In a Bazel workspace the Flutter SDK root and version marker live at
//! workspace-relative locations, and the `packages pub` operation talks to
//! the underlying `pub` tool directly instead of going through the `flutter`
//! wrapper. Everything else reuses the standard command-shaping logic.

use flutterkit_command::{CommandSpec, OperationKind};
use flutterkit_core::{constants::PUB_TOOL, Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Descriptor of a Bazel workspace that carries a vendored Flutter SDK.
///
/// The host IDE locates and loads this; discovery only consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Workspace {
    root: PathBuf,
    sdk_home: Option<String>,
    version_file: Option<String>,
}

impl Workspace {
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        sdk_home: Option<String>,
        version_file: Option<String>,
    ) -> Self {
        Self {
            root: root.into(),
            sdk_home,
            version_file,
        }
    }

    /// Load a JSON workspace descriptor from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read", e))?;
        Ok(serde_json::from_str(&text)?)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Workspace-relative path of the Flutter SDK, when configured.
    #[must_use]
    pub fn sdk_home(&self) -> Option<&str> {
        self.sdk_home.as_deref()
    }

    /// Workspace-relative path of the version marker, when configured.
    #[must_use]
    pub fn version_file(&self) -> Option<&str> {
        self.version_file.as_deref()
    }
}

/// Resolves the project-scoped Dart toolchain.
///
/// The standard backend derives the Dart SDK from the Flutter SDK root; the
/// Bazel backend asks the host for the project's own Dart SDK instead.
pub trait DartToolchainResolver: Send + Sync {
    /// Home directory of the configured Dart SDK, if any.
    fn dart_sdk_home(&self) -> Option<PathBuf>;
}

/// A fixed-path resolver, useful for hosts that already know the location.
pub struct FixedDartToolchain(pub PathBuf);

impl DartToolchainResolver for FixedDartToolchain {
    fn dart_sdk_home(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Behavioral overrides carried by an alternate-backend SDK handle.
///
/// Command construction checks for this record and applies the rewrite
/// instead of relying on a separate handle type.
pub struct BackendOverride {
    resolver: Arc<dyn DartToolchainResolver>,
}

impl BackendOverride {
    #[must_use]
    pub fn new(resolver: Arc<dyn DartToolchainResolver>) -> Self {
        Self { resolver }
    }

    /// Dart SDK home as reported by the project-scoped resolver.
    #[must_use]
    pub fn dart_sdk_home(&self) -> Option<PathBuf> {
        self.resolver.dart_sdk_home()
    }

    /// Rewrite a built `packages pub` spec to talk to `pub` directly:
    /// the sub-command tokens are stripped, the program becomes the Dart
    /// SDK's `pub` tool, and the working directory and remaining arguments
    /// are preserved.
    pub fn rewrite_pub_spec(&self, spec: CommandSpec) -> Result<CommandSpec> {
        let tokens = OperationKind::PackagesPub.sub_command();
        let mut args = spec.args().to_vec();
        if let Some(idx) = find_token_sequence(&args, tokens) {
            args.drain(idx..idx + tokens.len());
        }

        let dart_sdk = self.resolver.dart_sdk_home().ok_or_else(|| {
            Error::toolchain_not_found("no Dart toolchain configured for this project")
        })?;
        let pub_tool = dart_sdk.join("bin").join(PUB_TOOL);

        Ok(CommandSpec::with_raw_args(
            spec.kind(),
            pub_tool,
            spec.work_dir().map(Path::to_path_buf),
            args,
        ))
    }
}

impl fmt::Debug for BackendOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendOverride").finish_non_exhaustive()
    }
}

/// Index of the first occurrence of `tokens` as a contiguous run in `args`.
fn find_token_sequence(args: &[String], tokens: &[&str]) -> Option<usize> {
    if tokens.is_empty() || args.len() < tokens.len() {
        return None;
    }
    (0..=args.len() - tokens.len()).find(|&i| {
        args[i..i + tokens.len()]
            .iter()
            .zip(tokens)
            .all(|(a, t)| a == t)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_token_sequence() {
        let args: Vec<String> = ["packages", "pub", "global", "list"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(find_token_sequence(&args, &["packages", "pub"]), Some(0));
        assert_eq!(find_token_sequence(&args, &["global", "list"]), Some(2));
        assert_eq!(find_token_sequence(&args, &["pub", "global", "missing"]), None);
    }

    #[test]
    fn test_rewrite_strips_sub_command_and_swaps_program() {
        let backend = BackendOverride::new(Arc::new(FixedDartToolchain(PathBuf::from(
            "/workspace/dart-sdk",
        ))));
        let spec = CommandSpec::new(
            OperationKind::PackagesPub,
            "/workspace/flutter/bin/flutter",
            Some(PathBuf::from("/workspace/app")),
            vec!["get".to_string(), "--offline".to_string()],
        );

        let rewritten = backend.rewrite_pub_spec(spec).unwrap();
        assert_eq!(rewritten.args(), ["get", "--offline"]);
        assert_eq!(
            rewritten.program(),
            Path::new("/workspace/dart-sdk/bin/pub")
        );
        assert_eq!(rewritten.work_dir(), Some(Path::new("/workspace/app")));
        assert_eq!(rewritten.display_command(), "flutter get --offline");
    }

    #[test]
    fn test_rewrite_without_toolchain_fails() {
        struct NoToolchain;
        impl DartToolchainResolver for NoToolchain {
            fn dart_sdk_home(&self) -> Option<PathBuf> {
                None
            }
        }

        let backend = BackendOverride::new(Arc::new(NoToolchain));
        let spec = CommandSpec::new(
            OperationKind::PackagesPub,
            "/workspace/flutter/bin/flutter",
            None,
            vec!["get".to_string()],
        );
        assert!(matches!(
            backend.rewrite_pub_spec(spec),
            Err(Error::ToolchainNotFound { .. })
        ));
    }

    #[test]
    fn test_workspace_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");
        std::fs::write(
            &path,
            r#"{"root":"/workspace","sdk_home":"third_party/flutter","version_file":"third_party/flutter/version"}"#,
        )
        .unwrap();

        let workspace = Workspace::load(&path).unwrap();
        assert_eq!(workspace.root(), Path::new("/workspace"));
        assert_eq!(workspace.sdk_home(), Some("third_party/flutter"));
        assert!(Workspace::load(&dir.path().join("missing.json")).is_err());
    }
}
