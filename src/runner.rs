//! External process invocation with timeouts and bounded capture.
//!
//! Every external tool call in the gateway goes through [`run`]. The
//! contract it enforces:
//!
//! * stdin is closed — tools are driven by arguments and files only;
//! * stdout and stderr are captured independently and concurrently, so a
//!   child that floods one pipe can never deadlock against a full buffer;
//! * capture is capped per stream, keeping the **tail** — the embedded
//!   report and the final error message live at the end of tool output,
//!   the startup banner does not;
//! * a hard wall-clock timeout SIGKILLs the child's entire process group
//!   (the child is started in its own session), so a JVM that forked
//!   helpers cannot leave orphans behind;
//! * a timed-out invocation still returns whatever partial output was
//!   captured — callers need the tail for diagnostics;
//! * a missing executable is a classified outcome
//!   ([`ExitKind::NotFound`]), not an `Err` — deployment defects are
//!   reported through the verdict path like any other tool problem.
//!
//! Timeout always wins over exit status: a process killed by the timeout
//! is [`ExitKind::TimedOut`] even though the kill also produces an exit.
//! The same deadline bounds the output drain — a child that exits but
//! leaves a forked helper holding the pipes still counts as timed out
//! once the budget expires, and the helper is killed with the group.

use crate::config::ToolCommand;
use crate::error::GatewayError;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// One planned tool invocation. Immutable, constructed per call.
#[derive(Debug, Clone)]
pub struct InvocationSpec {
    /// Human-readable tool label used in logs and error bodies.
    pub tool: String,
    /// Executable to launch.
    pub program: String,
    /// Ordered argument list (fixed leading args followed by per-call args).
    pub args: Vec<String>,
    /// Working directory; inherited when `None`.
    pub current_dir: Option<PathBuf>,
    /// Hard wall-clock budget.
    pub timeout: Duration,
    /// Per-stream capture cap in bytes (tail kept).
    pub capture_cap: usize,
}

impl InvocationSpec {
    /// Build a spec from a configured [`ToolCommand`] plus per-call
    /// arguments.
    pub fn new(
        tool: impl Into<String>,
        cmd: &ToolCommand,
        args: impl IntoIterator<Item = String>,
        timeout: Duration,
        capture_cap: usize,
    ) -> Self {
        let mut full_args = cmd.leading_args.clone();
        full_args.extend(args);
        Self {
            tool: tool.into(),
            program: cmd.program.clone(),
            args: full_args,
            current_dir: None,
            timeout,
            capture_cap,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// The process exited on its own with this code (-1 when killed by a
    /// signal other than our timeout kill).
    Completed(i32),
    /// The wall-clock budget expired and the process group was killed.
    TimedOut,
    /// The executable could not be located or started.
    NotFound,
}

/// Captured outcome of one invocation. Owned by the issuing caller,
/// consumed immediately by the matching normalizer, never shared.
#[derive(Debug)]
pub struct InvocationResult {
    pub exit: ExitKind,
    /// Captured stdout (lossy UTF-8, tail-capped).
    pub stdout: String,
    /// Captured stderr (lossy UTF-8, tail-capped).
    pub stderr: String,
}

impl InvocationResult {
    /// Whether the process completed with exit code 0.
    pub fn passed(&self) -> bool {
        self.exit == ExitKind::Completed(0)
    }

    /// Bounded tails of both streams for error bodies.
    pub fn tails(&self, max_bytes: usize) -> (String, String) {
        (
            tail(&self.stdout, max_bytes).to_string(),
            tail(&self.stderr, max_bytes).to_string(),
        )
    }
}

/// Last `max_bytes` of `text`, trimmed forward to a char boundary.
pub fn tail(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

/// Execute an external tool according to `spec`.
///
/// Returns `Err` only for failures of the gateway itself (spawn errors
/// other than not-found, wait errors). Tool-side problems — nonzero exit,
/// timeout, missing executable — are classified in the returned
/// [`InvocationResult`] and left to the caller to interpret, because their
/// meaning differs per tool (a nonzero exit from a validator is routine).
pub async fn run(spec: &InvocationSpec) -> Result<InvocationResult, GatewayError> {
    debug!(tool = %spec.tool, program = %spec.program, args = ?spec.args, "Invoking tool");

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &spec.current_dir {
        cmd.current_dir(dir);
    }

    // New session so the timeout kill can target the whole subtree via the
    // process group, not just the direct child.
    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 && libc::setpgid(0, 0) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(tool = %spec.tool, program = %spec.program, "Executable not found");
            return Ok(InvocationResult {
                exit: ExitKind::NotFound,
                stdout: String::new(),
                stderr: String::new(),
            });
        }
        Err(e) => {
            return Err(GatewayError::Internal(format!(
                "Failed to spawn '{}': {e}",
                spec.tool
            )))
        }
    };

    let pid = child.id();
    let cap = spec.capture_cap;
    let deadline = tokio::time::Instant::now() + spec.timeout;
    let mut stdout_task = tokio::spawn(capture_tail(child.stdout.take(), cap));
    let mut stderr_task = tokio::spawn(capture_tail(child.stderr.take(), cap));

    let mut exit = tokio::select! {
        status = child.wait() => {
            let status = status.map_err(|e| {
                GatewayError::Internal(format!("Failed to wait for '{}': {e}", spec.tool))
            })?;
            ExitKind::Completed(status.code().unwrap_or(-1))
        }
        _ = tokio::time::sleep_until(deadline) => {
            warn!(tool = %spec.tool, secs = spec.timeout.as_secs(), "Timeout expired, killing process group");
            hard_kill(pid, &mut child).await;
            ExitKind::TimedOut
        }
    };

    // The child exiting does not close the pipes: a forked helper that
    // inherited them keeps the capture alive. The drain is bounded by the
    // same deadline; when it expires, the process group is killed (closing
    // the pipes) and the invocation counts as timed out.
    let drained = tokio::time::timeout_at(deadline, async {
        ((&mut stdout_task).await, (&mut stderr_task).await)
    })
    .await;
    let (stdout, stderr) = match drained {
        Ok((stdout, stderr)) => (stdout.unwrap_or_default(), stderr.unwrap_or_default()),
        Err(_) => {
            warn!(tool = %spec.tool, secs = spec.timeout.as_secs(), "Pipes still open past the deadline, killing process group");
            hard_kill(pid, &mut child).await;
            exit = ExitKind::TimedOut;
            (
                stdout_task.await.unwrap_or_default(),
                stderr_task.await.unwrap_or_default(),
            )
        }
    };

    debug!(tool = %spec.tool, exit = ?exit, stdout_len = stdout.len(), stderr_len = stderr.len(), "Invocation finished");
    Ok(InvocationResult {
        exit,
        stdout,
        stderr,
    })
}

/// SIGKILL the child's process group, then the child itself, then reap it.
async fn hard_kill(pid: Option<u32>, child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) {
        unsafe {
            let _ = libc::kill(-pid, libc::SIGKILL);
            let _ = libc::kill(pid, libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    let _ = child.start_kill();
    let _ = child.wait().await;
}

/// Drain a pipe into a tail-capped buffer. Never errors; a broken pipe just
/// ends the capture with whatever arrived.
async fn capture_tail<R: AsyncRead + Unpin>(reader: Option<R>, cap: usize) -> String {
    let Some(mut reader) = reader else {
        return String::new();
    };
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.len() > cap {
                    let excess = buf.len() - cap;
                    buf.drain(..excess);
                }
            }
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolCommand;

    fn spec(program: &str, args: &[&str], timeout_ms: u64) -> InvocationSpec {
        InvocationSpec::new(
            "test-tool",
            &ToolCommand::bare(program),
            args.iter().map(|s| s.to_string()),
            Duration::from_millis(timeout_ms),
            64 * 1024,
        )
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_zero() {
        let result = run(&spec("echo", &["hello"], 5_000)).await.unwrap();
        assert_eq!(result.exit, ExitKind::Completed(0));
        assert!(result.passed());
        assert!(result.stdout.contains("hello"));
        assert!(result.stderr.is_empty());
    }

    #[tokio::test]
    async fn classifies_nonzero_exit() {
        let result = run(&spec("false", &[], 5_000)).await.unwrap();
        assert!(!result.passed());
        assert!(matches!(result.exit, ExitKind::Completed(c) if c != 0));
    }

    #[tokio::test]
    async fn missing_executable_is_not_found() {
        let result = run(&spec("definitely-not-a-real-binary-9321", &[], 5_000))
            .await
            .unwrap();
        assert_eq!(result.exit, ExitKind::NotFound);
    }

    #[tokio::test]
    async fn timeout_kills_and_keeps_partial_output() {
        let result = run(&spec("sh", &["-c", "echo started; sleep 10"], 500))
            .await
            .unwrap();
        assert_eq!(result.exit, ExitKind::TimedOut);
        assert!(result.stdout.contains("started"));
    }

    #[tokio::test]
    async fn capture_keeps_the_tail_when_capped() {
        let mut s = spec("sh", &["-c", "yes tailmarker | head -c 200000; echo FINAL"], 10_000);
        s.capture_cap = 4096;
        let result = run(&s).await.unwrap();
        assert!(result.stdout.len() <= 4096 + 8);
        assert!(result.stdout.contains("FINAL"), "tail must survive the cap");
    }

    #[test]
    fn tail_respects_char_boundaries() {
        let text = "aä漢字end";
        let t = tail(text, 4);
        assert!(text.ends_with(t));
        assert!(t.len() <= 4);
        assert_eq!(tail("short", 100), "short");
    }
}
