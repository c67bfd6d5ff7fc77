//! The versioned handle to an installed Flutter SDK.
//!
//! A handle is the identity `{root path, version}` plus a small memoized
//! config-value cache. Command builders live here: each produces an
//! immutable [`CommandSpec`] and never spawns a process itself.

use crate::bazel::{BackendOverride, DartToolchainResolver, Workspace};
use crate::registry::{cache_key, SdkRegistry};
use crate::version::FlutterSdkVersion;
use flutterkit_command::{executor, CommandSpec, OperationKind, RunningCommand};
use flutterkit_core::constants::{
    DART_SDK_SUFFIX, FLUTTER_PUBSPEC_MARKER, FLUTTER_TESTER_DEVICE, FLUTTER_TOOL,
};
use flutterkit_core::{
    Error, FlutterDevice, FlutterLaunchMode, FlutterSettings, PubRoot, Result, RunMode,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// An installed Flutter SDK.
///
/// Root path and version are immutable after construction; the config cache
/// is populated lazily by [`query_config`]. An optional backend override
/// redirects toolchain resolution and rewrites the `packages pub` operation
/// for Bazel workspaces.
///
/// [`query_config`]: FlutterSdk::query_config
#[derive(Debug)]
pub struct FlutterSdk {
    home: PathBuf,
    version: FlutterSdkVersion,
    backend: Option<BackendOverride>,
    pub(crate) config_cache: Mutex<HashMap<String, Option<String>>>,
}

impl FlutterSdk {
    fn new(home: PathBuf, version: FlutterSdkVersion, backend: Option<BackendOverride>) -> Self {
        Self {
            home,
            version,
            backend,
            config_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Return the SDK at `path`, or `None` if the path does not exist or is
    /// not structurally a Flutter SDK root.
    #[must_use]
    pub fn for_path(path: &Path) -> Option<Arc<Self>> {
        if !is_sdk_root(path) {
            debug!(path = %path.display(), "not a Flutter SDK root");
            return None;
        }
        let version = FlutterSdkVersion::read_from_sdk(path);
        Some(Arc::new(Self::new(path.to_path_buf(), version, None)))
    }

    /// Return the memoized SDK for a project, derived from the project's
    /// Dart toolchain path.
    ///
    /// Absent when the project has no Dart toolchain configured, when the
    /// toolchain path does not end with the nested-SDK suffix
    /// `bin/cache/dart-sdk`, or when the derived root fails the structural
    /// check.
    #[must_use]
    pub fn for_project(
        registry: &SdkRegistry,
        project_id: &str,
        dart_sdk_path: Option<&Path>,
    ) -> Option<Arc<Self>> {
        let dart_path = dart_sdk_path?;
        if !dart_path.ends_with(DART_SDK_SUFFIX) {
            return None;
        }
        // Strip the three suffix components to recover the Flutter root.
        let sdk_root = dart_path.ancestors().nth(3)?;

        let key = cache_key(project_id, sdk_root);
        registry.get_or_create(&key, || Self::for_path(sdk_root))
    }

    /// Return the SDK vendored in a Bazel workspace.
    ///
    /// Bypasses the standard path-suffix check; root and version marker are
    /// resolved relative to the workspace. The resulting handle carries a
    /// backend override that consults `resolver` for the Dart toolchain and
    /// rewrites the `packages pub` operation.
    ///
    /// Not every standard feature is defined for a Bazel handle; callers
    /// should only use the operations the workspace supports.
    #[must_use]
    pub fn for_bazel(
        workspace: &Workspace,
        resolver: Arc<dyn DartToolchainResolver>,
    ) -> Option<Arc<Self>> {
        let home = workspace.root().join(workspace.sdk_home()?);
        if !home.is_dir() {
            debug!(home = %home.display(), "workspace SDK home does not exist");
            return None;
        }
        let version = match workspace.version_file() {
            Some(rel) => FlutterSdkVersion::read_from_file(&workspace.root().join(rel)),
            None => FlutterSdkVersion::unknown(),
        };
        Some(Arc::new(Self::new(
            home,
            version,
            Some(BackendOverride::new(resolver)),
        )))
    }

    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    #[must_use]
    pub fn version(&self) -> &FlutterSdkVersion {
        &self.version
    }

    /// Path of the `flutter` tool this handle invokes.
    #[must_use]
    pub fn flutter_tool_path(&self) -> PathBuf {
        self.home.join(FLUTTER_TOOL)
    }

    /// Path of the Dart SDK for this handle, or `None` if it doesn't exist.
    ///
    /// The standard backend looks inside the Flutter SDK's cache directory;
    /// an alternate backend asks its project-scoped toolchain resolver.
    #[must_use]
    pub fn dart_sdk_path(&self) -> Option<PathBuf> {
        if let Some(backend) = &self.backend {
            return backend.dart_sdk_home();
        }
        let path = self.home.join(DART_SDK_SUFFIX);
        path.is_dir().then_some(path)
    }

    fn spec(&self, kind: OperationKind, work_dir: Option<PathBuf>, args: Vec<String>) -> CommandSpec {
        CommandSpec::new(kind, self.flutter_tool_path(), work_dir, args)
    }

    // ---- per-operation builders ----

    #[must_use]
    pub fn flutter_version(&self) -> CommandSpec {
        self.spec(OperationKind::Version, Some(self.home.clone()), vec![])
    }

    #[must_use]
    pub fn flutter_upgrade(&self) -> CommandSpec {
        self.spec(OperationKind::Upgrade, Some(self.home.clone()), vec![])
    }

    #[must_use]
    pub fn flutter_clean(&self, root: &PubRoot) -> CommandSpec {
        self.spec(OperationKind::Clean, Some(root.root().to_path_buf()), vec![])
    }

    #[must_use]
    pub fn flutter_doctor(&self) -> CommandSpec {
        self.spec(OperationKind::Doctor, Some(self.home.clone()), vec![])
    }

    /// Build `flutter create` for a new application directory.
    ///
    /// Runs in the parent directory; the final argument is the bare
    /// directory name. `None` when `app_dir` has no parent or name.
    #[must_use]
    pub fn flutter_create(&self, app_dir: &Path, additional_args: &[String]) -> Option<CommandSpec> {
        let parent = app_dir.parent()?.to_path_buf();
        let name = app_dir.file_name()?.to_string_lossy().into_owned();

        let mut args = additional_args.to_vec();
        // Keep the directory name as the last argument.
        args.push(name);
        Some(self.spec(OperationKind::Create, Some(parent), args))
    }

    #[must_use]
    pub fn flutter_packages_get(&self, root: &PubRoot) -> CommandSpec {
        self.spec(
            OperationKind::PackagesGet,
            Some(root.root().to_path_buf()),
            vec![],
        )
    }

    #[must_use]
    pub fn flutter_packages_upgrade(&self, root: &PubRoot) -> CommandSpec {
        self.spec(
            OperationKind::PackagesUpgrade,
            Some(root.root().to_path_buf()),
            vec![],
        )
    }

    /// Build `flutter packages pub <args>`.
    ///
    /// Under a backend override the spec is rewritten to talk to the `pub`
    /// tool directly; that rewrite fails when the project's Dart toolchain
    /// cannot be resolved.
    pub fn flutter_packages_pub(&self, root: Option<&PubRoot>, args: &[String]) -> Result<CommandSpec> {
        let spec = self.spec(
            OperationKind::PackagesPub,
            root.map(|r| r.root().to_path_buf()),
            args.to_vec(),
        );
        match &self.backend {
            Some(backend) => backend.rewrite_pub_spec(spec),
            None => Ok(spec),
        }
    }

    #[must_use]
    pub fn flutter_make_host_app_editable(&self, root: &PubRoot) -> CommandSpec {
        self.spec(
            OperationKind::MakeHostAppEditable,
            Some(root.root().to_path_buf()),
            vec![],
        )
    }

    #[must_use]
    pub fn flutter_build(&self, root: &PubRoot, additional_args: &[String]) -> CommandSpec {
        self.spec(
            OperationKind::Build,
            Some(root.root().to_path_buf()),
            additional_args.to_vec(),
        )
    }

    #[must_use]
    pub fn flutter_config(&self, additional_args: &[String]) -> CommandSpec {
        self.spec(
            OperationKind::Config,
            Some(self.home.clone()),
            additional_args.to_vec(),
        )
    }

    #[must_use]
    pub fn flutter_list_samples(&self, index_file: &Path) -> CommandSpec {
        self.spec(
            OperationKind::ListSamples,
            Some(self.home.clone()),
            vec![index_file.to_string_lossy().into_owned()],
        )
    }

    /// Build `flutter run` for `main` inside `root`.
    ///
    /// Fails with [`Error::TargetOutsideRoot`] when `main` is not under the
    /// pub root; that is a caller contract violation, not a user condition.
    pub fn flutter_run(
        &self,
        root: &PubRoot,
        main: &Path,
        device: Option<&FlutterDevice>,
        mode: RunMode,
        launch_mode: FlutterLaunchMode,
        settings: &FlutterSettings,
        additional_args: &[String],
    ) -> Result<CommandSpec> {
        let mut args = vec!["--machine".to_string()];
        if settings.verbose_logging {
            args.push("--verbose".to_string());
        }
        if launch_mode == FlutterLaunchMode::Debug && settings.track_widget_creation {
            args.push("--track-widget-creation".to_string());
        }
        if let Some(device) = device {
            args.push(format!("--device-id={}", device.device_id()));
        }
        if mode == RunMode::Debug {
            args.push("--start-paused".to_string());
        }
        match launch_mode {
            FlutterLaunchMode::Profile => args.push("--profile".to_string()),
            FlutterLaunchMode::Release => args.push("--release".to_string()),
            FlutterLaunchMode::Debug => {}
        }
        args.extend(additional_args.iter().cloned());

        // Relative target path, to keep the command line short.
        args.push(relative_target(root, main)?);
        Ok(self.spec(OperationKind::Run, Some(root.root().to_path_buf()), args))
    }

    /// Build `flutter attach` for `main` inside `root`.
    pub fn flutter_attach(
        &self,
        root: &PubRoot,
        main: &Path,
        device: Option<&FlutterDevice>,
        launch_mode: FlutterLaunchMode,
        settings: &FlutterSettings,
        additional_args: &[String],
    ) -> Result<CommandSpec> {
        let mut args = vec!["--machine".to_string()];
        if settings.verbose_logging {
            args.push("--verbose".to_string());
        }
        match launch_mode {
            FlutterLaunchMode::Profile => args.push("--profile".to_string()),
            FlutterLaunchMode::Release => args.push("--release".to_string()),
            FlutterLaunchMode::Debug => {}
        }
        if let Some(device) = device {
            args.push(format!("--device-id={}", device.device_id()));
        }
        args.extend(additional_args.iter().cloned());

        args.push(relative_target(root, main)?);
        Ok(self.spec(OperationKind::Attach, Some(root.root().to_path_buf()), args))
    }

    /// Build the webdev daemon invocation used for web runs.
    #[must_use]
    pub fn flutter_run_web(&self, root: &PubRoot, additional_args: &[String]) -> CommandSpec {
        self.spec(
            OperationKind::WebRun,
            Some(root.root().to_path_buf()),
            additional_args.to_vec(),
        )
    }

    /// Build `flutter run` against the headless tester device.
    #[must_use]
    pub fn flutter_run_on_tester(&self, root: &PubRoot, main_path: &str) -> CommandSpec {
        let args = vec![
            "--machine".to_string(),
            format!("--device-id={FLUTTER_TESTER_DEVICE}"),
            main_path.to_string(),
        ];
        self.spec(OperationKind::Run, Some(root.root().to_path_buf()), args)
    }

    /// Build `flutter test` for a file or directory inside `root`.
    ///
    /// Version preconditions are fatal rather than silently downgraded:
    /// debugging requires machine-mode support, and name filtering requires
    /// `--plain-name` support. Callers are expected to consult
    /// [`FlutterSdkVersion`] first.
    pub fn flutter_test(
        &self,
        root: &PubRoot,
        file_or_dir: &Path,
        test_name_substring: Option<&str>,
        mode: RunMode,
        settings: &FlutterSettings,
    ) -> Result<CommandSpec> {
        let mut args = Vec::new();
        if self.version.supports_test_machine_mode() {
            args.push("--machine".to_string());
            // Otherwise run normally; output lands in a plain console.
        }
        if mode == RunMode::Debug {
            if !self.version.supports_test_machine_mode() {
                return Err(Error::unsupported_feature(
                    "debug tests",
                    self.version.to_string(),
                ));
            }
            args.push("--start-paused".to_string());
        }
        if settings.verbose_logging {
            args.push("--verbose".to_string());
        }
        if let Some(name) = test_name_substring {
            if !self.version.supports_test_name_filtering() {
                return Err(Error::unsupported_feature(
                    "select tests by name",
                    self.version.to_string(),
                ));
            }
            args.push("--plain-name".to_string());
            args.push(name.to_string());
        }

        if file_or_dir != root.root() {
            args.push(relative_target(root, file_or_dir)?);
        }

        Ok(self.spec(OperationKind::Test, Some(root.root().to_path_buf()), args))
    }

    // ---- execution helpers ----

    /// Run `flutter --version` to completion and verify the nested Dart SDK
    /// exists afterwards.
    ///
    /// Blocks without timeout; call from a background context only.
    #[must_use]
    pub fn sync_and_verify(&self) -> bool {
        match executor::run_and_wait(&self.flutter_version()) {
            Some(output) if output.status.success() => {
                self.home.join(DART_SDK_SUFFIX).is_dir()
            }
            Some(output) => {
                warn!(code = ?output.status.code(), "flutter --version failed");
                false
            }
            None => false,
        }
    }

    /// Run `flutter create` and wait for it to finish.
    ///
    /// Returns the created pub root, or `None` when the command could not be
    /// built, could not be started, or exited nonzero.
    #[must_use]
    pub fn create_files(&self, base_dir: &Path, additional_args: &[String]) -> Option<PubRoot> {
        let spec = self.flutter_create(base_dir, additional_args)?;
        let output = executor::run_and_wait(&spec)?;
        if !output.status.success() {
            warn!(code = ?output.status.code(), dir = %base_dir.display(), "flutter create failed");
            return None;
        }
        PubRoot::for_directory(base_dir)
    }

    /// Start `flutter packages get` for `root` without blocking.
    #[must_use]
    pub fn start_packages_get(&self, root: &PubRoot) -> Option<RunningCommand> {
        executor::spawn(&self.flutter_packages_get(root))
    }

    /// Start `flutter packages upgrade` for `root` without blocking.
    #[must_use]
    pub fn start_packages_upgrade(&self, root: &PubRoot) -> Option<RunningCommand> {
        executor::spawn(&self.flutter_packages_upgrade(root))
    }

    /// Start `flutter make-host-app-editable` for `root` without blocking.
    #[must_use]
    pub fn start_make_host_app_editable(&self, root: &PubRoot) -> Option<RunningCommand> {
        executor::spawn(&self.flutter_make_host_app_editable(root))
    }
}

/// Structural "is this really an SDK root" check.
fn is_sdk_root(path: &Path) -> bool {
    path.join(FLUTTER_TOOL).is_file() && path.join(FLUTTER_PUBSPEC_MARKER).is_file()
}

fn relative_target(root: &PubRoot, target: &Path) -> Result<String> {
    let rel = root
        .relative_path(target)
        .ok_or_else(|| Error::target_outside_root(target, root.root()))?;
    Ok(rel.to_string_lossy().into_owned())
}
