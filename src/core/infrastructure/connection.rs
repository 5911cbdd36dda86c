//! The provider API seam.
//!
//! A `Connection` talks to the Blue Box API on behalf of a server. HTTP
//! transport and request signing live in the implementation; errors it
//! returns are handed to the caller unchanged.

use crate::core::domain::{
    error::ComputeResult,
    model::{block_options::CreateBlockOptions, flavor::Flavor, image::Image},
    value_object::RebootType,
};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Provider operations used by [`Server`](crate::Server).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connection: Send + Sync {
    /// Creates a block from a flavor and an image.
    ///
    /// Returns the response body: the attributes of the new block.
    async fn create_block(
        &self,
        flavor_id: &str,
        image_id: &str,
        options: &CreateBlockOptions,
    ) -> ComputeResult<Map<String, Value>>;

    /// Destroys the block with the given id.
    async fn destroy_block(&self, id: &str) -> ComputeResult<()>;

    /// Reboots the block with the given id.
    async fn reboot_block(&self, id: &str, reboot_type: RebootType) -> ComputeResult<()>;

    /// Looks up a flavor. `Ok(None)` means the provider does not know the id.
    async fn get_flavor(&self, id: &str) -> ComputeResult<Option<Flavor>>;

    /// Looks up an image. `Ok(None)` means the provider does not know the id.
    async fn get_image(&self, id: &str) -> ComputeResult<Option<Image>>;
}
