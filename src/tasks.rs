//! Build/watch task runner launched alongside the server.

use std::path::PathBuf;
use std::process::Stdio;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Launches the component's default build task (e.g. `grunt default`).
#[derive(Debug, Clone)]
pub struct TaskRunner {
    command: Vec<String>,
    dir: PathBuf,
}

impl TaskRunner {
    /// Create a runner for `command` (program followed by arguments) in `dir`.
    pub fn new(command: Vec<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            command,
            dir: dir.into(),
        }
    }

    /// Start the task and watch it in the background.
    ///
    /// The child inherits stdout/stderr so its output shows up next to the
    /// server logs, and is killed when the runtime shuts down.
    pub fn spawn(&self) -> std::io::Result<JoinHandle<()>> {
        let (program, args) = self.command.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty task command")
        })?;

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let command_line = self.command.join(" ");
        info!(command = %command_line, "Started build task");

        Ok(tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    info!(command = %command_line, "Build task finished");
                },
                Ok(status) => {
                    warn!(
                        command = %command_line,
                        code = ?status.code(),
                        "Build task exited with error"
                    );
                },
                Err(e) => warn!(command = %command_line, "Failed to wait for build task: {}", e),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_reported() {
        let runner = TaskRunner::new(vec!["no-such-task-runner-4242".to_string()], ".");
        assert!(runner.spawn().is_err());
    }

    #[tokio::test]
    async fn test_empty_command_is_rejected() {
        let runner = TaskRunner::new(Vec::new(), ".");
        let err = runner.spawn().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_in_component_dir() {
        let dir = tempfile::tempdir().unwrap();
        let runner = TaskRunner::new(
            vec!["sh".into(), "-c".into(), "touch ran.txt".into()],
            dir.path(),
        );

        runner.spawn().unwrap().await.unwrap();
        assert!(dir.path().join("ran.txt").exists());
    }
}
