use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::process::Command;

use super::error::MetricError;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs an external program and returns its captured stdout.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(&'a self, program: &'a str, args: &'a [&'a str]) -> BoxFuture<'a, Result<String, MetricError>>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    fn run<'a>(&'a self, program: &'a str, args: &'a [&'a str]) -> BoxFuture<'a, Result<String, MetricError>> {
        (**self).run(program, args)
    }
}

/// Spawns the program with tokio. The child is killed and reaped when the
/// future is dropped, so a timeout or a cancelled cycle never leaks it.
#[derive(Debug, Clone)]
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl TokioCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        TokioCommandRunner { timeout }
    }
}

impl CommandRunner for TokioCommandRunner {
    fn run<'a>(&'a self, program: &'a str, args: &'a [&'a str]) -> BoxFuture<'a, Result<String, MetricError>> {
        Box::pin(async move {
            let mut cmd = Command::new(program);
            cmd.args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true);

            let child = cmd.spawn().map_err(|e| MetricError::Spawn {
                program: program.to_string(),
                source: Arc::new(e),
            })?;

            let output = tokio::time::timeout(self.timeout, child.wait_with_output())
                .await
                .map_err(|_| MetricError::Timeout {
                    program: program.to_string(),
                    timeout: self.timeout,
                })?
                .map_err(|e| MetricError::Spawn {
                    program: program.to_string(),
                    source: Arc::new(e),
                })?;

            if !output.status.success() {
                return Err(MetricError::ExitStatus {
                    program: program.to_string(),
                    status: output.status.to_string(),
                });
            }

            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        })
    }
}
