//! Shell and ipmitool command executors.
//! Every remote interaction goes through `CommandExecutor` so the hardware layer
//! only ever sees raw stdout text.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::credentials::Credentials;

/// Raw result of a successfully executed command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>) -> Self {
        Self { stdout: stdout.into() }
    }

    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines()
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command line and return its stdout.
    async fn run(&self, command: &str) -> Result<CommandOutput, ExecError>;
}

/// Spawn a prepared process, collect output, and map non-zero exits to `ExecError::Failed`.
async fn collect(
    mut cmd: tokio::process::Command,
    display: &str,
) -> Result<CommandOutput, ExecError> {
    cmd.stdin(Stdio::null());

    let output = cmd.output().await.map_err(|source| ExecError::Spawn {
        command: display.to_string(),
        source,
    })?;

    if !output.status.success() {
        return Err(ExecError::Failed {
            command: display.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(CommandOutput::new(String::from_utf8_lossy(&output.stdout)))
}

/// Runs commands on the local machine through `sh -c`.
#[derive(Debug, Default, Clone)]
pub struct LocalShell;

#[async_trait]
impl CommandExecutor for LocalShell {
    async fn run(&self, command: &str) -> Result<CommandOutput, ExecError> {
        let mut cmd = tokio::process::Command::new("sh");
        cmd.args(["-c", command]);

        trace!("Executing locally: {}", command);
        collect(cmd, command).await
    }
}

/// Runs commands on a remote host over ssh.
/// Uses key-based auth unless a password is configured, in which case the call is
/// wrapped in `sshpass -e`.
#[derive(Debug, Clone)]
pub struct SshShell {
    host: String,
    credentials: Credentials,
}

impl SshShell {
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self { host: host.into(), credentials }
    }

    fn destination(&self) -> String {
        match &self.credentials.username {
            Some(user) if !user.is_empty() => format!("{}@{}", user, self.host),
            _ => self.host.clone(),
        }
    }
}

#[async_trait]
impl CommandExecutor for SshShell {
    async fn run(&self, command: &str) -> Result<CommandOutput, ExecError> {
        let mut cmd = match self.credentials.password.as_deref() {
            Some(password) if !password.is_empty() => {
                let mut cmd = tokio::process::Command::new("sshpass");
                cmd.env("SSHPASS", password);
                cmd.args(["-e", "ssh"]);
                cmd
            }
            _ => {
                let mut cmd = tokio::process::Command::new("ssh");
                cmd.args(["-o", "BatchMode=yes"]);
                cmd
            }
        };
        cmd.arg(self.destination()).arg("--").arg(command);

        debug!("Executing on {}: {}", self.host, command);
        collect(cmd, command).await
    }
}

/// Single-quote a value for `sh` so it stays one argument, escaping embedded quotes.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// How ipmitool reaches the management controller.
#[derive(Debug, Clone)]
pub enum IpmiInterface {
    /// In-band: ipmitool runs on the managed host itself.
    Local,
    /// Out-of-band over the network, addressed by BMC hostname.
    Lan {
        host: String,
        username: String,
        password: String,
    },
}

/// ipmitool front-end. Interface flag values are quoted; the caller's arguments are
/// appended verbatim after them.
#[derive(Clone)]
pub struct IpmiTool {
    shell: Arc<dyn CommandExecutor>,
    interface: IpmiInterface,
}

impl IpmiTool {
    pub fn new(shell: Arc<dyn CommandExecutor>, interface: IpmiInterface) -> Self {
        Self { shell, interface }
    }

    pub fn interface(&self) -> &IpmiInterface {
        &self.interface
    }

    pub fn command_line(&self, args: &str) -> String {
        match &self.interface {
            IpmiInterface::Local => format!("ipmitool {}", args),
            IpmiInterface::Lan { host, username, password } => format!(
                "ipmitool -I lan -H {} -U {} -P {} {}",
                shell_quote(host),
                shell_quote(username),
                shell_quote(password),
                args
            ),
        }
    }

    pub async fn execute(&self, args: &str) -> Result<CommandOutput, ExecError> {
        debug!("Executing: ipmitool {}", args);
        self.shell.run(&self.command_line(args)).await
    }
}
