mod key_path;
mod reboot_type;

pub use key_path::KeyPath;
pub use reboot_type::RebootType;
