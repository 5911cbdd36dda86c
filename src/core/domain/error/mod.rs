use std::path::PathBuf;
use thiserror::Error;

/// The main error type for compute block operations.
///
/// This enum represents all possible errors that can occur while
/// creating, managing or bootstrapping a server, including validation,
/// provider, shell and filesystem failures.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Represents failures reported by the provider API connection
    ///
    /// # Fields
    /// * `0` - A description of what the provider rejected
    #[error("Connection error: {0}")]
    Connection(String),

    /// Represents validation failures with detailed context
    ///
    /// # Fields
    /// * `source` - The underlying validation error
    #[error("Validation error: {source}")]
    Validation { source: ValidationError },

    /// Represents failures of the remote shell transport
    #[error("Shell error: {0}")]
    Shell(#[from] ShellError),

    /// Represents failures reading key material from disk
    ///
    /// # Fields
    /// * `path` - The file that could not be read
    /// * `source` - The underlying I/O error
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Represents attribute (de)serialization failures
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ValidationError> for ComputeError {
    fn from(error: ValidationError) -> Self {
        ComputeError::Validation { source: error }
    }
}

impl ComputeError {
    /// Returns true if this error was raised by a local precondition check.
    pub fn is_validation(&self) -> bool {
        matches!(self, ComputeError::Validation { .. })
    }
}

/// Specialized error type for validation failures.
///
/// Validation errors are always raised before any call into the
/// connection or shell collaborators.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Represents a missing or unusable required field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents an invalid combination of arguments
    ///
    /// # Fields
    /// * `0` - Description of the argument problem
    #[error("Argument error: {0}")]
    Argument(String),
}

impl ValidationError {
    pub(crate) fn missing(field: &str) -> Self {
        ValidationError::Field {
            field: field.to_string(),
            message: format!("{field} is required for this operation"),
        }
    }
}

/// Errors raised by a remote shell transport.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The remote endpoint is not accepting connections yet.
    #[error("connection refused by {address}")]
    ConnectionRefused { address: String },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("command execution failed: {0}")]
    Execution(String),
}

/// Type alias for Results that may fail with a ComputeError
pub type ComputeResult<T> = Result<T, ComputeError>;

/// Type alias for Results returned by shell transports
pub type ShellResult<T> = Result<T, ShellError>;
