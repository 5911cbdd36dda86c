//! Options sent alongside a block creation request.

use serde::Serialize;

/// Credential and login options for `create_block`.
///
/// Exactly one of `ssh_public_key` and `password` is set when built by
/// [`Server::save`](crate::Server::save).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateBlockOptions {
    /// Public key installed for `username`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_public_key: Option<String>,
    /// Initial password for `username`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Login created on the block.
    pub username: String,
}

impl CreateBlockOptions {
    pub fn with_public_key(public_key: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            ssh_public_key: Some(public_key.into()),
            password: None,
            username: username.into(),
        }
    }

    pub fn with_password(password: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            ssh_public_key: None,
            password: Some(password.into()),
            username: username.into(),
        }
    }
}
