use crate::core::domain::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of reboot requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RebootType {
    /// Graceful restart through the guest OS.
    #[default]
    Soft,
    /// Power cycle.
    Hard,
}

impl RebootType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soft => "SOFT",
            Self::Hard => "HARD",
        }
    }
}

impl fmt::Display for RebootType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebootType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SOFT" => Ok(Self::Soft),
            "HARD" => Ok(Self::Hard),
            other => Err(ValidationError::Field {
                field: "type".to_string(),
                message: format!("Unknown reboot type '{other}' (expected SOFT or HARD)"),
            }),
        }
    }
}
