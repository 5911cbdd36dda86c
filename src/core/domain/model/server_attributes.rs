//! Provider attributes of a compute block.
//!
//! These are the fields the Blue Box API reports for a block. They are what
//! gets merged from create responses and what `setup` dumps to
//! `~/attributes.json` on the instance.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Built-in hardware profile assigned when no flavor is given.
pub const DEFAULT_FLAVOR_ID: &str = "94fd37a7-2606-47f7-84d5-9000deda52ae";

/// The status value that marks a block as usable.
pub const RUNNING_STATUS: &str = "running";

/// A network address assigned to a block.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IpAddress {
    /// The address itself (IPv4 or IPv6 literal).
    pub address: String,
    /// Any other fields the provider reports for the address.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IpAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            extra: Map::new(),
        }
    }
}

/// Attribute set of a compute block as reported by the provider.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ServerAttributes {
    /// Provider assigned identity, present once the block exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Memory in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    /// Storage in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<u64>,
    /// CPU share.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Assigned addresses, in provider order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<IpAddress>>,
    /// Provider state label (e.g., "queued", "running").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Hardware profile identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_id: Option<String>,
    /// OS image identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// Provider specific template data, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Value>,
    /// Fields this model does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerAttributes {
    /// Attributes of a block that has not been created yet.
    pub fn with_default_flavor() -> Self {
        Self {
            flavor_id: Some(DEFAULT_FLAVOR_ID.to_string()),
            ..Default::default()
        }
    }

    /// Returns the first assigned address, if any.
    pub fn first_address(&self) -> Option<&str> {
        self.ips
            .as_ref()
            .and_then(|ips| ips.first())
            .map(|ip| ip.address.as_str())
    }

    /// Copies every field of `incoming` onto this attribute set.
    ///
    /// Incoming values overwrite local ones. Unknown keys land in `extra`.
    /// Either every field is applied or, on a type mismatch, none is.
    pub fn merge(&mut self, incoming: Map<String, Value>) -> Result<(), serde_json::Error> {
        let mut merged = self.clone();
        for (key, value) in incoming {
            match key.as_str() {
                "id" => merged.id = serde_json::from_value(value)?,
                "memory" => merged.memory = serde_json::from_value(value)?,
                "storage" => merged.storage = serde_json::from_value(value)?,
                "cpu" => merged.cpu = serde_json::from_value(value)?,
                "hostname" => merged.hostname = serde_json::from_value(value)?,
                "ips" => merged.ips = serde_json::from_value(value)?,
                "status" => merged.status = serde_json::from_value(value)?,
                "flavor_id" => merged.flavor_id = serde_json::from_value(value)?,
                "image_id" => merged.image_id = serde_json::from_value(value)?,
                "template" => merged.template = Some(value).filter(|v| !v.is_null()),
                _ => {
                    merged.extra.insert(key, value);
                }
            }
        }
        *self = merged;
        Ok(())
    }
}
