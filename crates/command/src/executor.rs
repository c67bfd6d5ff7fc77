//! Turns a [`CommandSpec`] into an OS process.
//!
//! Two execution modes are offered:
//!
//! - [`run_and_wait`] blocks the calling thread until the process exits, with
//!   no timeout. Callers must invoke it from a background context only.
//! - [`spawn`] starts the process and returns immediately with a
//!   [`RunningCommand`] that exposes a stream of output events and a
//!   completion future.
//!
//! Both modes surface "no process could be started" as `None` rather than an
//! error; the failure is logged.

use crate::spec::CommandSpec;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// One notification from a spawned process.
///
/// Output events for a single stream arrive in the order the stream emitted
/// them; no ordering holds between stdout and stderr, nor between separate
/// commands. `Exited` is always the final event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    /// A line of standard output (without the trailing newline).
    Stdout(String),
    /// A line of standard error (without the trailing newline).
    Stderr(String),
    /// The process terminated; `None` when killed by a signal.
    Exited(Option<i32>),
}

/// A live process spawned from a [`CommandSpec`].
///
/// Dropping the handle does not terminate the process; call [`kill`] for a
/// best-effort termination request.
///
/// [`kill`]: RunningCommand::kill
pub struct RunningCommand {
    display: String,
    pid: Option<u32>,
    events: mpsc::UnboundedReceiver<CommandEvent>,
    exit: Option<oneshot::Receiver<Option<i32>>>,
    exit_code: Option<i32>,
    kill: Option<oneshot::Sender<()>>,
}

impl RunningCommand {
    /// OS process id, when the process started successfully.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// The human-readable command line this process was started from.
    #[must_use]
    pub fn display_command(&self) -> &str {
        &self.display
    }

    /// Receive the next event, or `None` once the channel is drained after
    /// [`CommandEvent::Exited`].
    pub async fn next_event(&mut self) -> Option<CommandEvent> {
        self.events.recv().await
    }

    /// Wait for the process to exit and return its exit code.
    ///
    /// Returns `None` when the process was killed by a signal. Idempotent;
    /// later calls return the recorded code without waiting.
    pub async fn wait(&mut self) -> Option<i32> {
        if let Some(rx) = self.exit.take() {
            self.exit_code = rx.await.unwrap_or(None);
        }
        self.exit_code
    }

    /// Request termination. Best-effort: already-delivered output events are
    /// not retracted, and the request is ignored if the process has exited.
    pub fn kill(&mut self) {
        if let Some(tx) = self.kill.take() {
            let _ = tx.send(());
        }
    }
}

/// Start the process and block until it exits, capturing its output.
///
/// There is no timeout; never call this from a context that must stay
/// responsive. Spawn failure is logged and reported as `None`.
#[must_use]
pub fn run_and_wait(spec: &CommandSpec) -> Option<std::process::Output> {
    debug!(operation = spec.kind().title(), command = %spec.display_command(), "running to completion");
    let mut cmd = std::process::Command::new(spec.program());
    cmd.args(spec.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = spec.work_dir() {
        cmd.current_dir(dir);
    }
    match cmd.output() {
        Ok(output) => Some(output),
        Err(e) => {
            warn!(operation = spec.kind().title(), command = %spec.display_command(), error = %e, "failed to start process");
            None
        }
    }
}

/// Spawn the process without blocking and return a live handle, or `None`
/// when it could not be started.
///
/// Must be called from within a Tokio runtime; the output pumps and the
/// process supervisor run as background tasks.
#[must_use]
pub fn spawn(spec: &CommandSpec) -> Option<RunningCommand> {
    debug!(operation = spec.kind().title(), command = %spec.display_command(), "spawning");
    let mut cmd = Command::new(spec.program());
    cmd.args(spec.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = spec.work_dir() {
        cmd.current_dir(dir);
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(operation = spec.kind().title(), command = %spec.display_command(), error = %e, "failed to start process");
            return None;
        }
    };

    let pid = child.id();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (exit_tx, exit_rx) = oneshot::channel();
    let (kill_tx, mut kill_rx) = oneshot::channel::<()>();

    let stdout_pump = child
        .stdout
        .take()
        .map(|out| tokio::spawn(pump_lines(out, event_tx.clone(), false)));
    let stderr_pump = child
        .stderr
        .take()
        .map(|err| tokio::spawn(pump_lines(err, event_tx.clone(), true)));

    let display = spec.display_command().to_string();
    let supervisor_display = display.clone();
    tokio::spawn(async move {
        let status = tokio::select! {
            status = child.wait() => status,
            requested = &mut kill_rx => {
                // A dropped handle resolves the channel too; only an actual
                // kill() call terminates the process.
                if requested.is_ok() {
                    if let Err(e) = child.start_kill() {
                        warn!(command = %supervisor_display, error = %e, "kill request failed");
                    }
                }
                child.wait().await
            }
        };

        // Drain remaining output before announcing termination so Exited is
        // always the last event on the channel.
        if let Some(pump) = stdout_pump {
            let _ = pump.await;
        }
        if let Some(pump) = stderr_pump {
            let _ = pump.await;
        }

        let code = match status {
            Ok(status) => status.code(),
            Err(e) => {
                warn!(command = %supervisor_display, error = %e, "wait failed");
                None
            }
        };
        let _ = event_tx.send(CommandEvent::Exited(code));
        let _ = exit_tx.send(code);
    });

    Some(RunningCommand {
        display,
        pid,
        events: event_rx,
        exit: Some(exit_rx),
        exit_code: None,
        kill: Some(kill_tx),
    })
}

async fn pump_lines<R>(reader: R, tx: mpsc::UnboundedSender<CommandEvent>, is_stderr: bool)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let event = if is_stderr {
            CommandEvent::Stderr(line)
        } else {
            CommandEvent::Stdout(line)
        };
        if tx.send(event).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::OperationKind;

    fn shell_spec(script: &str) -> CommandSpec {
        CommandSpec::with_raw_args(
            OperationKind::Version,
            "sh",
            None,
            vec!["-c".to_string(), script.to_string()],
        )
    }

    #[test]
    fn test_run_and_wait_captures_exit_code() {
        let output = run_and_wait(&shell_spec("exit 3")).unwrap();
        assert_eq!(output.status.code(), Some(3));
    }

    #[test]
    fn test_run_and_wait_captures_stdout() {
        let output = run_and_wait(&shell_spec("echo hello")).unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\n");
    }

    #[test]
    fn test_run_and_wait_missing_program_is_absent() {
        let spec = CommandSpec::new(
            OperationKind::Doctor,
            "/nonexistent/bin/flutter",
            None,
            vec![],
        );
        assert!(run_and_wait(&spec).is_none());
    }

    #[tokio::test]
    async fn test_spawn_streams_lines_in_order() {
        let mut running = spawn(&shell_spec("echo one; echo two; echo oops >&2")).unwrap();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exited = None;
        while let Some(event) = running.next_event().await {
            match event {
                CommandEvent::Stdout(line) => stdout.push(line),
                CommandEvent::Stderr(line) => stderr.push(line),
                CommandEvent::Exited(code) => {
                    exited = Some(code);
                    break;
                }
            }
        }
        assert_eq!(stdout, ["one", "two"]);
        assert_eq!(stderr, ["oops"]);
        assert_eq!(exited, Some(Some(0)));
        assert_eq!(running.wait().await, Some(0));
    }

    #[tokio::test]
    async fn test_spawn_missing_program_is_absent() {
        let spec = CommandSpec::new(
            OperationKind::Doctor,
            "/nonexistent/bin/flutter",
            None,
            vec![],
        );
        assert!(spawn(&spec).is_none());
    }

    #[tokio::test]
    async fn test_wait_is_idempotent() {
        let mut running = spawn(&shell_spec("exit 7")).unwrap();
        assert_eq!(running.wait().await, Some(7));
        assert_eq!(running.wait().await, Some(7));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kill_terminates_process() {
        let mut running = spawn(&shell_spec("sleep 30")).unwrap();
        running.kill();
        // Killed by SIGKILL, so no exit code.
        assert_eq!(running.wait().await, None);
    }
}
