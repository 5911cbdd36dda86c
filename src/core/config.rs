//! Configuration shared by servers: default key locations and the retry
//! policy used while bootstrapping a freshly provisioned block.

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable holding the default private key path.
pub const PRIVATE_KEY_PATH_ENV: &str = "BLUEBOX_PRIVATE_KEY_PATH";

/// Environment variable holding the default public key path.
pub const PUBLIC_KEY_PATH_ENV: &str = "BLUEBOX_PUBLIC_KEY_PATH";

static GLOBAL_CREDENTIALS: OnceLock<Credentials> = OnceLock::new();

/// Default SSH key locations used when a server has no explicit key.
///
/// Paths may be relative or start with `~`; they are resolved when a
/// server first needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    #[serde(default)]
    pub public_key_path: Option<PathBuf>,
}

impl Credentials {
    /// Reads key paths from `BLUEBOX_PRIVATE_KEY_PATH` and
    /// `BLUEBOX_PUBLIC_KEY_PATH`. Unset or empty variables leave the
    /// corresponding path unset.
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var_os(name)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };
        Self {
            private_key_path: read(PRIVATE_KEY_PATH_ENV),
            public_key_path: read(PUBLIC_KEY_PATH_ENV),
        }
    }

    /// Process-wide credentials, loaded from the environment on first use.
    pub fn global() -> &'static Credentials {
        GLOBAL_CREDENTIALS.get_or_init(Self::from_env)
    }
}

/// Retry policy for [`Server::setup`](crate::Server::setup) while the
/// instance refuses shell connections.
///
/// The default retries forever with a one second pause. Setting
/// `max_attempts` bounds the wait; once exhausted, the last refusal is
/// returned to the caller instead of retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupRetry {
    /// Pause between attempts.
    pub delay: Duration,
    /// Total attempts including the first one. `None` means unbounded.
    pub max_attempts: Option<u32>,
}

impl SetupRetry {
    /// Returns true if another attempt may follow attempt number `attempt`.
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt < max)
    }
}

impl Default for SetupRetry {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}
