use crate::core::domain::error::{ComputeError, ComputeResult, ValidationError};
use std::path::{Path, PathBuf};

/// An absolute filesystem path to SSH key material.
///
/// Built from a user supplied or configured path: a leading `~` is expanded
/// to the home directory and relative paths are anchored at the current
/// working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath(PathBuf);

impl KeyPath {
    /// Expands and absolutizes `raw`, reporting problems against `field`.
    ///
    /// # Errors
    ///
    /// * `ComputeError::Validation` if `raw` is empty
    /// * `ComputeError::Io` if the current directory cannot be determined
    pub fn resolve(raw: &Path, field: &str) -> ComputeResult<Self> {
        validate_key_path(raw, field)?;

        let expanded = match raw.to_str() {
            Some(text) => PathBuf::from(shellexpand::tilde(text).into_owned()),
            None => raw.to_path_buf(),
        };

        let absolute = std::path::absolute(&expanded).map_err(|source| ComputeError::Io {
            path: expanded.clone(),
            source,
        })?;

        Ok(Self(absolute))
    }

    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Consumes the object and returns the inner path.
    #[must_use]
    pub fn into_inner(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for KeyPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Validates a raw key path before expansion.
pub(crate) fn validate_key_path(raw: &Path, field: &str) -> Result<(), ValidationError> {
    if raw.as_os_str().is_empty() {
        return Err(ValidationError::Field {
            field: field.to_string(),
            message: "Key path cannot be empty".to_string(),
        });
    }
    Ok(())
}
