//! The remote shell seam used to bootstrap and drive instances.

use crate::core::domain::error::ShellResult;
use async_trait::async_trait;

/// Authentication options for opening a shell session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellAuth {
    /// Password authentication.
    pub password: Option<String>,
    /// In-memory private keys, tried in order.
    pub key_data: Vec<String>,
    /// Port override; transports default to 22.
    pub port: Option<u16>,
}

impl ShellAuth {
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            ..Default::default()
        }
    }

    pub fn with_key_data(private_key: impl Into<String>) -> Self {
        Self {
            key_data: vec![private_key.into()],
            ..Default::default()
        }
    }
}

/// Result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Opens shell sessions to remote hosts.
///
/// Implementations must report an endpoint that is not accepting
/// connections yet as [`ShellError::ConnectionRefused`](crate::ShellError::ConnectionRefused).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShellTransport: Send + Sync {
    async fn open(
        &self,
        address: &str,
        username: &str,
        auth: &ShellAuth,
    ) -> ShellResult<Box<dyn ShellSession>>;
}

/// An open shell session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShellSession: Send + Sync {
    /// Runs `commands` in order and returns one output per command.
    async fn run(&mut self, commands: &[String]) -> ShellResult<Vec<CommandOutput>>;
}
