//! Typed, async model of a Blue Box compute block.
//!
//! A [`Server`] holds the provider attributes of one block and drives its
//! lifecycle through two injected collaborators:
//!
//! - a [`Connection`] to the provider API (create, destroy, reboot, and
//!   flavor/image lookups)
//! - a [`ShellTransport`] for post-provisioning bootstrap and ad hoc
//!   remote commands
//!
//! Default SSH key locations come from [`Credentials`].

mod core;

pub use crate::core::{
    config::{Credentials, PRIVATE_KEY_PATH_ENV, PUBLIC_KEY_PATH_ENV, SetupRetry},
    domain::{
        error::{ComputeError, ComputeResult, ShellError, ShellResult, ValidationError},
        model::{
            block_options::CreateBlockOptions,
            flavor::Flavor,
            image::Image,
            server::{DEFAULT_USERNAME, Server},
            server_attributes::{DEFAULT_FLAVOR_ID, IpAddress, RUNNING_STATUS, ServerAttributes},
        },
        value_object::{KeyPath, RebootType},
    },
    infrastructure::{
        connection::Connection,
        shell::{CommandOutput, ShellAuth, ShellSession, ShellTransport},
    },
};

#[cfg(test)]
pub(crate) use crate::core::infrastructure::{
    connection::MockConnection,
    shell::{MockShellSession, MockShellTransport},
};

#[cfg(test)]
mod tests;
