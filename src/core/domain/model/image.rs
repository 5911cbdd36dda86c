//! Domain model for OS images ("block templates").

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An OS image from the provider's image catalog.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Image {
    /// Image identifier.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the image is shared with all customers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    /// Creation timestamp as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Image {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            public: None,
            created_at: None,
            extra: Map::new(),
        }
    }
}
