//! Ephemeral execution workspace: a temp directory that is destroyed on
//! drop, file materialization, and command execution with captured
//! output.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured outcome of one command run inside the sandbox.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
    pub timed_out: bool,
}

/// An isolated working directory, removed when dropped.
pub struct Sandbox {
    #[allow(dead_code)]
    temp_dir: TempDir,
    pub root_path: PathBuf,
}

impl Sandbox {
    pub fn new() -> std::io::Result<Self> {
        let temp_dir = tempfile::Builder::new().prefix("katagen-judge-").tempdir()?;
        Ok(Self {
            root_path: temp_dir.path().to_path_buf(),
            temp_dir,
        })
    }

    /// Write files into the sandbox, creating parent directories.
    pub fn prepare(&self, files: &[(PathBuf, &str)]) -> std::io::Result<()> {
        for (path, content) in files {
            let full_path = self.root_path.join(path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full_path, content)?;
        }
        Ok(())
    }

    /// Run a command in the sandbox with optional stdin, killing it at the
    /// timeout.
    pub async fn run(
        &self,
        cmd: &str,
        args: &[String],
        stdin: Option<&str>,
        timeout: Duration,
    ) -> std::io::Result<ExecutionResult> {
        let started = Instant::now();
        let mut child = Command::new(cmd)
            .args(args)
            .current_dir(&self.root_path)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(input) = stdin {
            if let Some(mut handle) = child.stdin.take() {
                handle.write_all(input.as_bytes()).await?;
            }
        }

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => {
                let output = output?;
                Ok(ExecutionResult {
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    exit_code: output.status.code().unwrap_or(-1),
                    duration: started.elapsed(),
                    timed_out: false,
                })
            }
            Err(_) => Ok(ExecutionResult {
                success: false,
                stdout: String::new(),
                stderr: format!("process killed after {timeout:?}"),
                exit_code: -1,
                duration: started.elapsed(),
                timed_out: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sandbox_lifecycle() {
        let sandbox = Sandbox::new().unwrap();
        sandbox
            .prepare(&[(PathBuf::from("hello.sh"), "echo 'Hello katagen'")])
            .unwrap();
        let result = sandbox
            .run(
                "sh",
                &["hello.sh".to_string()],
                None,
                Duration::from_secs(10),
            )
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "Hello katagen");
        assert!(!result.timed_out);
    }

    #[tokio::test]
    async fn stdin_is_piped() {
        let sandbox = Sandbox::new().unwrap();
        let result = sandbox
            .run("cat", &[], Some("piped input"), Duration::from_secs(10))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.stdout, "piped input");
    }

    #[tokio::test]
    async fn timeout_kills_the_process() {
        let sandbox = Sandbox::new().unwrap();
        let result = sandbox
            .run(
                "sh",
                &["-c".to_string(), "sleep 30".to_string()],
                None,
                Duration::from_millis(100),
            )
            .await
            .unwrap();
        assert!(result.timed_out);
        assert!(!result.success);
    }
}
