//! Builder for executing external tool commands with timeout and
//! cancellation support.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use splitforge_core::{Error, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::tools::{ToolConfig, DEFAULT_TIMEOUT};

/// Stderr lines kept for the error message of a failed streaming run.
const STDERR_TAIL: usize = 12;

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use splitforge_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> splitforge_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .args(["-v", "quiet", "-print_format", "json", "-show_format"])
///     .arg("/path/to/video.mp4")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Start a command for a discovered tool, inheriting its timeout.
    pub fn for_tool(tool: &ToolConfig) -> Self {
        Self {
            program: tool.path.clone(),
            args: Vec::new(),
            timeout: tool.timeout,
        }
    }

    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Arguments collected so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] if spawning fails, the process times out, or
    /// it exits with a non-zero status (the message includes stderr).
    pub async fn execute(&self) -> Result<ToolOutput> {
        let name = self.program_name();
        tracing::debug!(tool = %name, args = ?self.args, "executing");

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::tool(&name, format!("failed to spawn: {e}")))?;

        // On timeout the future is dropped and kill_on_drop reaps the child.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::tool(name, format!("I/O error waiting for process: {e}")))
            }
            Err(_) => {
                return Err(Error::tool(name, format!("timed out after {:?}", self.timeout)))
            }
        };

        let tool_output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            return Err(Error::tool(
                name,
                format!(
                    "exited with status {}: {}",
                    output.status,
                    tool_output.stderr.trim()
                ),
            ));
        }

        Ok(tool_output)
    }

    /// Execute the command, handing every stderr line to `on_line` as it
    /// arrives. Stdout is discarded.
    ///
    /// Used with `ffmpeg -progress pipe:2`, which writes `key=value` progress
    /// blocks to stderr. When `cancel` fires the child is killed and
    /// [`Error::Cancelled`] is returned.
    pub async fn execute_with_stderr_callback(
        &self,
        mut on_line: impl FnMut(&str),
        cancel: Option<CancellationToken>,
    ) -> Result<ExitStatus> {
        let name = self.program_name();
        tracing::debug!(tool = %name, args = ?self.args, "executing (streaming stderr)");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::tool(&name, format!("failed to spawn: {e}")))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::tool(&name, "stderr was not captured"))?;
        // Split on raw bytes: ffmpeg echoes metadata and paths that need not be UTF-8.
        let mut lines = BufReader::new(stderr).split(b'\n');
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);

        let cancel = cancel.unwrap_or_default();
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                line = lines.next_segment() => match line {
                    Ok(Some(bytes)) => {
                        let line = String::from_utf8_lossy(&bytes)
                            .trim_end_matches('\r')
                            .to_string();
                        on_line(&line);
                        if tail.len() == STDERR_TAIL {
                            tail.pop_front();
                        }
                        tail.push_back(line);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        return Err(Error::tool(name, format!("failed to read stderr: {e}")));
                    }
                },
                _ = cancel.cancelled() => {
                    let _ = child.kill().await;
                    tracing::info!(tool = %name, "cancelled");
                    return Err(Error::Cancelled(format!("{name} was cancelled")));
                }
                _ = &mut deadline => {
                    let _ = child.kill().await;
                    return Err(Error::tool(name, format!("timed out after {:?}", self.timeout)));
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| Error::tool(&name, format!("I/O error waiting for process: {e}")))?;

        if !status.success() {
            let tail: Vec<String> = tail.into_iter().collect();
            return Err(Error::tool(
                name,
                format!("exited with status {status}: {}", tail.join("\n").trim()),
            ));
        }

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn execute_echo() {
        let output = ToolCommand::new(PathBuf::from("echo"))
            .arg("hello")
            .execute()
            .await;

        // Minimal environments may lack echo.
        if let Ok(out) = output {
            assert!(out.status.success());
            assert!(out.stdout.trim().contains("hello"));
        }
    }

    #[tokio::test]
    async fn execute_nonexistent_tool() {
        let err = ToolCommand::new(PathBuf::from("nonexistent_tool_xyz_12345"))
            .execute()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }

    #[tokio::test]
    async fn timeout_fires() {
        let result = ToolCommand::new(PathBuf::from("sleep"))
            .arg("10")
            .timeout(Duration::from_millis(100))
            .execute()
            .await;
        let err = result.unwrap_err().to_string();
        assert!(
            err.contains("timed out") || err.contains("failed to spawn"),
            "unexpected error: {err}"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stderr_lines_reach_callback() {
        let mut seen = Vec::new();
        let status = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "echo out_time_us=1000000 >&2; echo progress=end >&2"])
            .execute_with_stderr_callback(|line| seen.push(line.to_string()), None)
            .await
            .unwrap();
        assert!(status.success());
        assert_eq!(seen, vec!["out_time_us=1000000", "progress=end"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_utf8_stderr_is_decoded_lossily() {
        let mut seen = Vec::new();
        let status = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "printf 'title : caf\\351\\n' >&2; echo progress=end >&2"])
            .execute_with_stderr_callback(|line| seen.push(line.to_string()), None)
            .await
            .unwrap();
        assert!(status.success());
        assert_eq!(seen.len(), 2, "{seen:?}");
        assert!(seen[0].starts_with("title : caf"));
        assert!(seen[0].contains('\u{FFFD}'));
        assert_eq!(seen[1], "progress=end");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_stream_reports_stderr_tail() {
        let err = ToolCommand::new(PathBuf::from("sh"))
            .args(["-c", "echo 'Invalid data found' >&2; exit 3"])
            .execute_with_stderr_callback(|_| {}, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid data found"), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancellation_kills_the_child() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = ToolCommand::new(PathBuf::from("sleep"))
            .arg("10")
            .execute_with_stderr_callback(|_| {}, Some(token))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
