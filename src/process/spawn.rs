//! Agent process spawning and lifecycle supervision.

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};

use super::args::build_args;
use super::io::{ProcessLineReader, StderrTail};
#[cfg(unix)]
use super::TERMINATE_GRACE;
use crate::client::GenerationRequest;
use crate::config::ClientConfig;
use crate::{Error, Invocation, Result};

/// A running agent subprocess.
///
/// Each generation call owns exactly one `AgentProcess`; it is never shared
/// across requests. The supervisor guarantees the process is reaped exactly
/// once, on every exit path. Dropping an un-reaped process kills it as a
/// backstop.
pub struct AgentProcess {
    child: Child,
    stdout: Option<ProcessLineReader>,
    stderr: Option<StderrTail>,
    invocation: Invocation,
    reaped: Option<ExitStatus>,
}

impl AgentProcess {
    /// Spawn the agent for one generation request.
    ///
    /// An already-cancelled request short-circuits before any process is
    /// spawned. Launch failures classify as [`Error::Spawn`].
    pub async fn spawn(config: &ClientConfig, request: &GenerationRequest) -> Result<Self> {
        let invocation = Invocation::new(config.binary(), build_args(request));

        if request.cancellation.is_cancelled() {
            return Err(Error::aborted(invocation));
        }

        let mut cmd = build_command(config, &invocation);
        let mut child = cmd
            .spawn()
            .map_err(|err| Error::spawn(invocation.clone(), err))?;

        let stdout = child.stdout.take().expect("stdout was configured");
        let stderr = child.stderr.take().expect("stderr was configured");

        Ok(Self {
            child,
            stdout: Some(ProcessLineReader::new(stdout)),
            stderr: Some(StderrTail::spawn(stderr)),
            invocation,
            reaped: None,
        })
    }

    /// Take the stdout line reader. Can only be taken once.
    pub fn take_stdout(&mut self) -> Option<ProcessLineReader> {
        self.stdout.take()
    }

    /// Take the stderr tail collector. Can only be taken once.
    pub fn take_stderr(&mut self) -> Option<StderrTail> {
        self.stderr.take()
    }

    /// The invocation this process was started with.
    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// The OS process id, if the process is still running.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the process to exit and reap it.
    ///
    /// Idempotent: a second call returns the cached exit status.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        if let Some(status) = self.reaped {
            return Ok(status);
        }
        let status = self.child.wait().await?;
        self.reaped = Some(status);
        Ok(status)
    }

    /// Terminate the process and reap it.
    ///
    /// On Unix the process first receives SIGTERM; if it has not exited
    /// within the grace window it is killed. Other platforms kill outright.
    /// Idempotent: calling this on an already-reaped process is a no-op.
    pub async fn shutdown(&mut self) -> Option<ExitStatus> {
        if let Some(status) = self.reaped {
            return Some(status);
        }

        #[cfg(unix)]
        if let Some(status) = self.terminate_unix().await {
            self.reaped = Some(status);
            return Some(status);
        }

        if let Err(err) = self.child.kill().await {
            tracing::debug!(error = %err, "kill failed, process likely exited");
        }
        match self.child.wait().await {
            Ok(status) => {
                self.reaped = Some(status);
                Some(status)
            }
            Err(err) => {
                tracing::debug!(error = %err, "wait after kill failed");
                None
            }
        }
    }

    #[cfg(unix)]
    async fn terminate_unix(&mut self) -> Option<ExitStatus> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let pid = self.child.id()?;
        let nix_pid = Pid::from_raw(i32::try_from(pid).ok()?);
        let _ = kill(nix_pid, Signal::SIGTERM);

        match tokio::time::timeout(TERMINATE_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(_)) | Err(_) => None,
        }
    }
}

impl Drop for AgentProcess {
    fn drop(&mut self) {
        if self.reaped.is_none() {
            let _ = self.child.start_kill();
        }
    }
}

/// Build the tokio Command for the given invocation.
fn build_command(config: &ClientConfig, invocation: &Invocation) -> Command {
    let mut cmd = Command::new(&invocation.binary);
    cmd.args(&invocation.args);

    if let Some(dir) = config.working_directory() {
        cmd.current_dir(dir);
    }

    if !config.inherit_env {
        cmd.env_clear();
    }
    for (key, value) in config.build_env() {
        cmd.env(key, value);
    }

    // The prompt travels as an argument; nothing is written to stdin.
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    cmd
}
