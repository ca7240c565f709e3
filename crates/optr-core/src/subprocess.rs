//! Synchronous subprocess execution with a hard timeout.
//!
//! Every external command the crate runs goes through here so that no
//! invocation can hang the caller indefinitely.

use crate::error::{OptrError, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub struct CmdOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run `program` with `args`, optionally in `cwd`, killing it after `timeout`.
///
/// Uses dedicated threads for stdout/stderr reading (avoiding pipe-buffer
/// deadlocks) and a waiter thread with `mpsc::recv_timeout` for the timeout
/// (no busy-wait). `op` labels the invocation in errors.
pub fn run_with_timeout(
    op: &'static str,
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<CmdOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn()?;
    let child_pid = child.id();

    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> String {
        let mut buf = String::new();
        if let Some(mut r) = stdout_handle {
            let _ = r.read_to_string(&mut buf);
        }
        buf
    });
    let stderr_thread = std::thread::spawn(move || -> String {
        let mut buf = String::new();
        if let Some(mut r) = stderr_handle {
            let _ = r.read_to_string(&mut buf);
        }
        buf
    });

    // The child is moved to a waiter thread; on timeout we kill by PID. The
    // waiter unblocks once the killed process exits, and the reader threads
    // get EOF on the closed pipes.
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(child.wait());
    });

    let status = match rx.recv_timeout(timeout) {
        Ok(result) => result?,
        Err(_) => {
            kill_process(child_pid);
            return Err(OptrError::Timeout {
                op,
                secs: timeout.as_secs(),
            });
        }
    };

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    Ok(CmdOutput {
        success: status.success(),
        stdout,
        stderr,
    })
}

/// Terminate a process by PID. Best-effort; errors are ignored.
fn kill_process(pid: u32) {
    let _ = Command::new("kill")
        .arg("-9")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_on_success() {
        let out = run_with_timeout("echo", "echo", &["hello"], None, Duration::from_secs(5))
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn reports_nonzero_exit() {
        let out = run_with_timeout(
            "shell",
            "sh",
            &["-c", "echo oops >&2; exit 3"],
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(!out.success);
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn kills_on_timeout() {
        let err = run_with_timeout(
            "sleep",
            "sleep",
            &["30"],
            None,
            Duration::from_millis(100),
        )
        .unwrap_err();
        assert!(matches!(err, OptrError::Timeout { op: "sleep", .. }));
    }

    #[test]
    fn missing_program_is_io_error() {
        let err = run_with_timeout(
            "bogus",
            "definitely-not-a-real-binary-xyz",
            &[],
            None,
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, OptrError::Io(_)));
    }
}
