use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::security::ValidationError;

/// Wall-clock limit applied when nothing else is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every command the server runs
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub timeout: Duration,
    pub working_dir: Option<PathBuf>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            working_dir: None,
        }
    }
}

/// Why a command did not produce usable output.
///
/// The `Display` text of each variant is what follows `"Error: "` in the
/// tool response.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Command timed out after {} seconds", .timeout.as_secs())]
    TimedOut { timeout: Duration },

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error("Invalid grep pattern: {0}")]
    InvalidFilter(#[from] regex::Error),
}

impl CommandError {
    /// Text returned to the client in place of the command output
    pub fn to_tool_text(&self) -> String {
        format!("Error: {}", self)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::NonZeroExit { code, .. } => *code,
            _ => None,
        }
    }
}

/// Run `command` through the platform shell, capturing stdout and stderr.
///
/// Exit status 0 yields stdout verbatim. On timeout the child (and on Unix its
/// whole process group) is killed and reaped before returning.
pub async fn run_shell(command: &str, ctx: &ExecutionContext) -> Result<String, CommandError> {
    debug!(command, "Spawning shell");

    let mut cmd = shell_command(command);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(ref dir) = ctx.working_dir {
        cmd.current_dir(dir);
    }
    // Own process group, so a timeout can take down anything the shell forked
    #[cfg(unix)]
    {
        cmd.process_group(0);
    }

    let mut child = cmd.spawn()?;
    // Taken now: once the shell is reaped `child.id()` is gone, but the group
    // it led can still hold background processes
    let pgid = child.id();

    match tokio::time::timeout(ctx.timeout, wait_for_output(&mut child)).await {
        Ok(result) => {
            let (status, stdout, stderr) = result?;
            debug!(command, status = %status, "Command finished");
            output_to_result(status, stdout, stderr)
        }
        Err(_) => {
            warn!(
                command,
                timeout_secs = ctx.timeout.as_secs(),
                "Command timed out, terminating"
            );
            terminate(&mut child, pgid).await;
            Err(CommandError::TimedOut {
                timeout: ctx.timeout,
            })
        }
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

async fn wait_for_output(child: &mut Child) -> io::Result<(ExitStatus, String, String)> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    tokio::try_join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn terminate(child: &mut Child, pgid: Option<u32>) {
    #[cfg(unix)]
    {
        if let Some(pgid) = pgid {
            kill_process_group(pgid);
        }
    }
    #[cfg(not(unix))]
    let _ = pgid;
    // Kills the shell if it is still alive and reaps it either way
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Child already gone");
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    // SAFETY: killpg only sends a signal; the group id came from our own child
    let rc = unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        debug!(pgid, error = %io::Error::last_os_error(), "killpg failed");
    }
}

fn output_to_result(
    status: ExitStatus,
    stdout: String,
    stderr: String,
) -> Result<String, CommandError> {
    if status.success() {
        Ok(stdout)
    } else {
        Err(CommandError::NonZeroExit {
            code: status.code(),
            stderr,
        })
    }
}
