//! Domain model for hardware profiles ("block products").

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A hardware/sizing profile from the provider's flavor catalog.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Flavor {
    /// Profile identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hourly cost as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Value>,
    /// Memory in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram: Option<u64>,
    /// Disk size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk: Option<u64>,
    /// CPU cores.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cores: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Flavor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            cost: None,
            ram: None,
            disk: None,
            cores: None,
            extra: Map::new(),
        }
    }
}
