//! The closed set of `flutter` operations and the immutable command value.

use std::path::{Path, PathBuf};

/// One operation of the wrapped `flutter` tool.
///
/// Each kind carries a fixed sub-command token sequence that prefixes the
/// argument list. The sequence is also what the alternate backend strips
/// back out when it talks to the underlying `pub` tool directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Version,
    Upgrade,
    Clean,
    Doctor,
    Create,
    PackagesGet,
    PackagesUpgrade,
    PackagesPub,
    MakeHostAppEditable,
    Build,
    Config,
    ListSamples,
    Run,
    Attach,
    Test,
    WebRun,
}

impl OperationKind {
    /// The fixed sub-command tokens for this operation.
    #[must_use]
    pub fn sub_command(self) -> &'static [&'static str] {
        match self {
            OperationKind::Version => &["--version"],
            OperationKind::Upgrade => &["upgrade"],
            OperationKind::Clean => &["clean"],
            OperationKind::Doctor => &["doctor"],
            OperationKind::Create => &["create"],
            OperationKind::PackagesGet => &["packages", "get"],
            OperationKind::PackagesUpgrade => &["packages", "upgrade"],
            OperationKind::PackagesPub => &["packages", "pub"],
            OperationKind::MakeHostAppEditable => &["make-host-app-editable"],
            OperationKind::Build => &["build"],
            OperationKind::Config => &["config"],
            OperationKind::ListSamples => &["create", "--list-samples"],
            OperationKind::Run => &["run"],
            OperationKind::Attach => &["attach"],
            OperationKind::Test => &["test"],
            OperationKind::WebRun => &["packages", "pub", "global", "run", "webdev", "daemon"],
        }
    }

    /// Short human-readable name, used for logging and console titles.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            OperationKind::Version => "Flutter version",
            OperationKind::Upgrade => "Flutter upgrade",
            OperationKind::Clean => "Flutter clean",
            OperationKind::Doctor => "Flutter doctor",
            OperationKind::Create => "Flutter create",
            OperationKind::PackagesGet => "Flutter packages get",
            OperationKind::PackagesUpgrade => "Flutter packages upgrade",
            OperationKind::PackagesPub => "Flutter pub",
            OperationKind::MakeHostAppEditable => "Flutter make-host-app-editable",
            OperationKind::Build => "Flutter build",
            OperationKind::Config => "Flutter config",
            OperationKind::ListSamples => "Flutter sample index",
            OperationKind::Run => "Flutter run",
            OperationKind::Attach => "Flutter attach",
            OperationKind::Test => "Flutter test",
            OperationKind::WebRun => "Flutter web run",
        }
    }
}

/// An immutable description of one process invocation.
///
/// Building a spec never spawns a process; execution happens separately in
/// [`crate::executor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    kind: OperationKind,
    program: PathBuf,
    work_dir: Option<PathBuf>,
    args: Vec<String>,
    display: String,
}

impl CommandSpec {
    /// Build a spec for `kind`: the argument list is the kind's sub-command
    /// tokens followed by `args`.
    #[must_use]
    pub fn new(
        kind: OperationKind,
        program: impl Into<PathBuf>,
        work_dir: Option<PathBuf>,
        args: Vec<String>,
    ) -> Self {
        let mut full_args: Vec<String> =
            kind.sub_command().iter().map(|s| (*s).to_string()).collect();
        full_args.extend(args);
        let display = Self::render_display(&full_args);
        Self {
            kind,
            program: program.into(),
            work_dir,
            args: full_args,
            display,
        }
    }

    /// Build a spec whose argument list is taken verbatim, without the
    /// sub-command prefix. Used by backend overrides that rewrite an
    /// already-built spec.
    #[must_use]
    pub fn with_raw_args(
        kind: OperationKind,
        program: impl Into<PathBuf>,
        work_dir: Option<PathBuf>,
        args: Vec<String>,
    ) -> Self {
        let display = Self::render_display(&args);
        Self {
            kind,
            program: program.into(),
            work_dir,
            args,
            display,
        }
    }

    fn render_display(args: &[String]) -> String {
        let mut words = Vec::with_capacity(args.len() + 1);
        words.push("flutter".to_string());
        words.extend(args.iter().cloned());
        words.join(" ")
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_deref()
    }

    /// The full argv after the program itself.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The human-readable rendering shown in consoles and logs.
    #[must_use]
    pub fn display_command(&self) -> &str {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_command_tokens() {
        assert_eq!(OperationKind::PackagesGet.sub_command(), ["packages", "get"]);
        assert_eq!(OperationKind::Version.sub_command(), ["--version"]);
        assert_eq!(
            OperationKind::ListSamples.sub_command(),
            ["create", "--list-samples"]
        );
        assert_eq!(
            OperationKind::WebRun.sub_command(),
            ["packages", "pub", "global", "run", "webdev", "daemon"]
        );
    }

    #[test]
    fn test_titles_name_the_operation() {
        assert_eq!(OperationKind::PackagesGet.title(), "Flutter packages get");
        assert_eq!(OperationKind::ListSamples.title(), "Flutter sample index");
        assert_eq!(OperationKind::WebRun.title(), "Flutter web run");
    }

    #[test]
    fn test_spec_prepends_sub_command() {
        let spec = CommandSpec::new(
            OperationKind::PackagesPub,
            "/sdk/bin/flutter",
            None,
            vec!["global".to_string(), "list".to_string()],
        );
        assert_eq!(spec.args(), ["packages", "pub", "global", "list"]);
        assert_eq!(spec.display_command(), "flutter packages pub global list");
    }

    #[test]
    fn test_raw_args_skip_sub_command() {
        let spec = CommandSpec::with_raw_args(
            OperationKind::PackagesPub,
            "/dart/bin/pub",
            None,
            vec!["global".to_string(), "list".to_string()],
        );
        assert_eq!(spec.args(), ["global", "list"]);
        assert_eq!(spec.display_command(), "flutter global list");
    }

    #[test]
    fn test_spec_is_value_like() {
        let a = CommandSpec::new(OperationKind::Doctor, "/sdk/bin/flutter", None, vec![]);
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.display_command(), "flutter doctor");
        assert!(a.work_dir().is_none());
    }
}
