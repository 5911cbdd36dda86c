pub mod block_options;
pub mod flavor;
pub mod image;
pub mod server;
pub mod server_attributes;
