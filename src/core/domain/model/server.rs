//! Domain model for a single compute block ("server").
//!
//! A [`Server`] is a mutable record of a block's attributes plus the
//! operations that change remote state through an injected [`Connection`]
//! and [`ShellTransport`].

use crate::core::{
    config::{Credentials, SetupRetry},
    domain::{
        error::{ComputeError, ComputeResult, ShellError, ShellResult, ValidationError},
        model::{
            block_options::CreateBlockOptions,
            flavor::Flavor,
            image::Image,
            server_attributes::{IpAddress, RUNNING_STATUS, ServerAttributes},
        },
        value_object::{KeyPath, RebootType},
    },
    infrastructure::{
        connection::Connection,
        shell::{CommandOutput, ShellAuth, ShellSession, ShellTransport},
    },
};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Login used when none is set.
pub const DEFAULT_USERNAME: &str = "deploy";

/// A compute block managed through the provider API.
///
/// # Examples
///
/// ```no_run
/// use bluebox_compute::{ComputeResult, Connection, Server, ShellAuth, ShellTransport};
/// use std::sync::Arc;
///
/// async fn provision(
///     connection: Arc<dyn Connection>,
///     shell: Arc<dyn ShellTransport>,
/// ) -> ComputeResult<()> {
///     let mut server = Server::new(connection, shell);
///     server.set_image_id("a00baa5e-4bfc-4b2f-a0e8-fb1b0e1e2b1c");
///     server.set_password("initial-secret");
///     server.save().await?;
///
///     server.setup(&ShellAuth::with_password("initial-secret")).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    connection: Arc<dyn Connection>,
    shell: Arc<dyn ShellTransport>,
    credentials: Credentials,
    setup_retry: SetupRetry,
    attributes: ServerAttributes,
    password: Option<String>,
    username: Option<String>,
    private_key: Option<String>,
    private_key_path: Option<PathBuf>,
    resolved_private_key_path: Option<KeyPath>,
    public_key: Option<String>,
    public_key_path: Option<PathBuf>,
    resolved_public_key_path: Option<KeyPath>,
    ssh_session: Option<Box<dyn ShellSession>>,
}

impl Server {
    /// Creates a server that does not exist remotely yet.
    ///
    /// The default flavor is assigned and key paths fall back to
    /// [`Credentials::global`].
    pub fn new(connection: Arc<dyn Connection>, shell: Arc<dyn ShellTransport>) -> Self {
        Self {
            connection,
            shell,
            credentials: Credentials::global().clone(),
            setup_retry: SetupRetry::default(),
            attributes: ServerAttributes::with_default_flavor(),
            password: None,
            username: None,
            private_key: None,
            private_key_path: None,
            resolved_private_key_path: None,
            public_key: None,
            public_key_path: None,
            resolved_public_key_path: None,
            ssh_session: None,
        }
    }

    /// Creates a server from an attribute mapping.
    ///
    /// The default flavor is assigned first, so a `flavor_id` (or `product`)
    /// in `attributes` wins. Besides provider attributes, the mapping may
    /// carry `password`, `username`, `public_key`, `private_key` and the
    /// key paths. Unknown keys are kept as extra attributes.
    ///
    /// # Errors
    ///
    /// Returns `ComputeError::Serialization` if a known key has a value of
    /// the wrong type.
    pub fn from_attributes(
        connection: Arc<dyn Connection>,
        shell: Arc<dyn ShellTransport>,
        attributes: Map<String, Value>,
    ) -> ComputeResult<Self> {
        let mut server = Self::new(connection, shell);
        server.merge_attributes(attributes)?;
        Ok(server)
    }

    /// Replaces the credential configuration used to find default keys.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self.resolved_private_key_path = None;
        self.resolved_public_key_path = None;
        self
    }

    /// Replaces the retry policy used by [`Server::setup`].
    pub fn with_setup_retry(mut self, setup_retry: SetupRetry) -> Self {
        self.setup_retry = setup_retry;
        self
    }

    pub fn attributes(&self) -> &ServerAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut ServerAttributes {
        &mut self.attributes
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.id.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.attributes.status.as_deref()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.attributes.hostname.as_deref()
    }

    pub fn ips(&self) -> &[IpAddress] {
        self.attributes.ips.as_deref().unwrap_or_default()
    }

    pub fn flavor_id(&self) -> Option<&str> {
        self.attributes.flavor_id.as_deref()
    }

    pub fn set_flavor_id(&mut self, flavor_id: impl Into<String>) {
        self.attributes.flavor_id = Some(flavor_id.into());
    }

    pub fn image_id(&self) -> Option<&str> {
        self.attributes.image_id.as_deref()
    }

    pub fn set_image_id(&mut self, image_id: impl Into<String>) {
        self.attributes.image_id = Some(image_id.into());
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(password.into());
    }

    /// Returns the login name, `"deploy"` unless set.
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(DEFAULT_USERNAME)
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = Some(username.into());
    }

    #[deprecated(since = "0.1.0", note = "use `username` instead")]
    pub fn user(&self) -> &str {
        warn!("Server::user is deprecated, use Server::username instead");
        self.username()
    }

    #[deprecated(since = "0.1.0", note = "use `set_username` instead")]
    pub fn set_user(&mut self, username: impl Into<String>) {
        warn!("Server::set_user is deprecated, use Server::set_username instead");
        self.set_username(username);
    }

    /// Returns true if the provider reports the block as running.
    pub fn is_ready(&self) -> bool {
        self.attributes.status.as_deref() == Some(RUNNING_STATUS)
    }

    /// Resolves the private key path.
    ///
    /// Uses the explicitly set path or the configured default, expands `~`
    /// and makes it absolute. The result is cached.
    ///
    /// # Errors
    ///
    /// * `ComputeError::Validation` if no path is set or configured
    /// * `ComputeError::Io` if the path cannot be made absolute
    pub fn private_key_path(&mut self) -> ComputeResult<&Path> {
        resolve_key_path(
            &mut self.resolved_private_key_path,
            self.private_key_path.as_deref(),
            self.credentials.private_key_path.as_deref(),
            "private_key_path",
        )
    }

    pub fn set_private_key_path(&mut self, path: impl Into<PathBuf>) {
        self.private_key_path = Some(path.into());
        self.resolved_private_key_path = None;
    }

    /// Resolves the public key path. See [`Server::private_key_path`].
    pub fn public_key_path(&mut self) -> ComputeResult<&Path> {
        resolve_key_path(
            &mut self.resolved_public_key_path,
            self.public_key_path.as_deref(),
            self.credentials.public_key_path.as_deref(),
            "public_key_path",
        )
    }

    pub fn set_public_key_path(&mut self, path: impl Into<PathBuf>) {
        self.public_key_path = Some(path.into());
        self.resolved_public_key_path = None;
    }

    /// Returns the private key, reading it from
    /// [`Server::private_key_path`] on first use.
    ///
    /// The contents are kept for the life of the server; later changes to
    /// the file are not seen.
    ///
    /// # Errors
    ///
    /// * `ComputeError::Validation` if no key or key path is available
    /// * `ComputeError::Io` if the key file cannot be read
    pub async fn private_key(&mut self) -> ComputeResult<&str> {
        if self.private_key.is_none() {
            let path = self.private_key_path()?.to_path_buf();
            self.private_key = Some(read_key(&path).await?);
        }
        Ok(self.private_key.as_deref().unwrap_or_default())
    }

    pub fn set_private_key(&mut self, private_key: impl Into<String>) {
        self.private_key = Some(private_key.into());
        self.ssh_session = None;
    }

    /// Returns the public key, reading it from [`Server::public_key_path`]
    /// on first use. See [`Server::private_key`].
    pub async fn public_key(&mut self) -> ComputeResult<&str> {
        if self.public_key.is_none() {
            let path = self.public_key_path()?.to_path_buf();
            self.public_key = Some(read_key(&path).await?);
        }
        Ok(self.public_key.as_deref().unwrap_or_default())
    }

    pub fn set_public_key(&mut self, public_key: impl Into<String>) {
        self.public_key = Some(public_key.into());
    }

    #[deprecated(since = "0.1.0", note = "use `public_key` instead")]
    pub async fn ssh_key(&mut self) -> ComputeResult<&str> {
        warn!("Server::ssh_key is deprecated, use Server::public_key instead");
        self.public_key().await
    }

    #[deprecated(since = "0.1.0", note = "use `set_public_key` instead")]
    pub fn set_ssh_key(&mut self, public_key: impl Into<String>) {
        warn!("Server::set_ssh_key is deprecated, use Server::set_public_key instead");
        self.set_public_key(public_key);
    }

    /// Destroys the block.
    ///
    /// The local record is left as is; further lifecycle calls are the
    /// caller's responsibility.
    ///
    /// # Errors
    ///
    /// * `ComputeError::Validation` if the server has no id
    /// * Any error returned by the connection
    pub async fn destroy(&self) -> ComputeResult<()> {
        let id = self.require_id()?;
        debug!(id, "Destroying block");
        self.connection.destroy_block(id).await?;
        info!(id, "Block destroyed");
        Ok(())
    }

    /// Looks up the flavor of this server.
    ///
    /// `Ok(None)` means the provider does not know `flavor_id`.
    pub async fn flavor(&self) -> ComputeResult<Option<Flavor>> {
        let flavor_id = require(self.attributes.flavor_id.as_deref(), "flavor_id")?;
        self.connection.get_flavor(flavor_id).await
    }

    /// Looks up the image of this server.
    ///
    /// `Ok(None)` means the provider does not know `image_id`.
    pub async fn image(&self) -> ComputeResult<Option<Image>> {
        let image_id = require(self.attributes.image_id.as_deref(), "image_id")?;
        self.connection.get_image(image_id).await
    }

    /// Reboots the block.
    ///
    /// # Errors
    ///
    /// * `ComputeError::Validation` if the server has no id
    /// * Any error returned by the connection
    pub async fn reboot(&self, reboot_type: RebootType) -> ComputeResult<()> {
        let id = self.require_id()?;
        debug!(id, %reboot_type, "Rebooting block");
        self.connection.reboot_block(id, reboot_type).await
    }

    /// Creates the block.
    ///
    /// A public key takes precedence over a password when both are
    /// available; `username` is always sent. On success every field of the
    /// provider response is merged into the attributes, overwriting local
    /// values. Calling `save` again attempts another creation.
    ///
    /// # Errors
    ///
    /// * `ComputeError::Validation` if `flavor_id` or `image_id` is missing,
    ///   or if neither a password nor a public key is available
    /// * `ComputeError::Io` if a configured public key cannot be read
    /// * Any error returned by the connection, unchanged
    pub async fn save(&mut self) -> ComputeResult<()> {
        let flavor_id = require(self.attributes.flavor_id.as_deref(), "flavor_id")?.to_string();
        let image_id = require(self.attributes.image_id.as_deref(), "image_id")?.to_string();
        let username = self.username().to_string();

        let options = match (self.available_public_key().await?, self.password.as_deref()) {
            (Some(public_key), _) => CreateBlockOptions::with_public_key(public_key, username),
            (None, Some(password)) => CreateBlockOptions::with_password(password, username),
            (None, None) => {
                return Err(ValidationError::Argument(
                    "password or public_key is required for this operation".to_string(),
                )
                .into());
            }
        };

        debug!(
            flavor_id = %flavor_id,
            image_id = %image_id,
            username = %options.username,
            public_key = options.ssh_public_key.is_some(),
            "Creating block"
        );
        let body = self
            .connection
            .create_block(&flavor_id, &image_id, &options)
            .await?;
        self.merge_attributes(body)?;
        info!(id = ?self.attributes.id, status = ?self.attributes.status, "Block created");
        Ok(())
    }

    /// Bootstraps a freshly created block over a one-shot shell session.
    ///
    /// Connects to the first address as `username` using `credentials` and
    /// runs, as one batch: create `~/.ssh`, append the public key to
    /// `authorized_keys`, lock the root password, and append the JSON
    /// attributes to `~/attributes.json`.
    ///
    /// While the instance refuses connections the whole open-and-run is
    /// retried after [`SetupRetry::delay`]. With the default policy this
    /// never gives up; set [`SetupRetry::max_attempts`] to bound it.
    ///
    /// # Errors
    ///
    /// * `ComputeError::Validation` if `id` or `ips` is missing, or no
    ///   public key is available
    /// * `ComputeError::Shell` for non-refusal shell failures, or the last
    ///   refusal once `max_attempts` is exhausted
    pub async fn setup(&mut self, credentials: &ShellAuth) -> ComputeResult<Vec<CommandOutput>> {
        self.require_id()?;
        let address = self.require_address()?.to_string();
        let public_key = self.public_key().await?.trim_end().to_string();
        let username = self.username().to_string();

        let commands = vec![
            "mkdir .ssh".to_string(),
            format!(
                "echo {} >> ~/.ssh/authorized_keys",
                shell_quote(&public_key)
            ),
            "passwd -l root".to_string(),
            format!(
                "echo {} >> ~/attributes.json",
                shell_quote(&serde_json::to_string(&self.attributes)?)
            ),
        ];

        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match run_batch(self.shell.as_ref(), &address, &username, credentials, &commands).await
            {
                Err(ShellError::ConnectionRefused { .. })
                    if self.setup_retry.allows_retry_after(attempt) =>
                {
                    warn!(
                        address = %address,
                        attempt,
                        delay_ms = self.setup_retry.delay.as_millis() as u64,
                        "Shell connection refused, retrying setup"
                    );
                    tokio::time::sleep(self.setup_retry.delay).await;
                }
                Ok(outputs) => {
                    info!(address = %address, attempt, "Block bootstrapped");
                    return Ok(outputs);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Runs `commands` over a key-authenticated shell session.
    ///
    /// The session is opened on first use and reused by later calls.
    ///
    /// # Errors
    ///
    /// * `ComputeError::Validation` if `id` or `ips` is missing, or no
    ///   private key is available
    /// * `ComputeError::Shell` if the session cannot be opened or the
    ///   commands fail
    pub async fn ssh<I, S>(&mut self, commands: I) -> ComputeResult<Vec<CommandOutput>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_id()?;
        let address = self.require_address()?.to_string();
        let private_key = self.private_key().await?.to_string();
        let username = self.username().to_string();
        let commands: Vec<String> = commands.into_iter().map(Into::into).collect();

        let session = match self.ssh_session.take() {
            Some(session) => session,
            None => {
                debug!(address = %address, username = %username, "Opening shell session");
                self.shell
                    .open(&address, &username, &ShellAuth::with_key_data(private_key))
                    .await?
            }
        };
        let session = self.ssh_session.insert(session);
        Ok(session.run(&commands).await?)
    }

    /// Copies every field of `incoming` onto this server.
    ///
    /// Provider attributes are applied atomically; a type mismatch leaves
    /// the server unchanged. A nested `product` record sets `flavor_id`.
    pub(crate) fn merge_attributes(&mut self, mut incoming: Map<String, Value>) -> ComputeResult<()> {
        let password = take_string(&mut incoming, "password")?;
        let username = take_string(&mut incoming, "username")?;
        let user = take_string(&mut incoming, "user")?;
        let public_key = take_string(&mut incoming, "public_key")?;
        let ssh_key = take_string(&mut incoming, "ssh_key")?;
        let private_key = take_string(&mut incoming, "private_key")?;
        let private_key_path = take_string(&mut incoming, "private_key_path")?;
        let public_key_path = take_string(&mut incoming, "public_key_path")?;
        let product = incoming.remove("product");

        self.attributes.merge(incoming)?;

        if let Some(product) = product {
            self.set_product(&product);
        }
        if let Some(password) = password {
            self.set_password(password);
        }
        if let Some(username) = username.or(user) {
            self.set_username(username);
        }
        if let Some(public_key) = public_key.or(ssh_key) {
            self.set_public_key(public_key);
        }
        if let Some(private_key) = private_key {
            self.set_private_key(private_key);
        }
        if let Some(path) = private_key_path {
            self.set_private_key_path(path);
        }
        if let Some(path) = public_key_path {
            self.set_public_key_path(path);
        }
        Ok(())
    }

    /// Sets `flavor_id` from a provider "product" record.
    fn set_product(&mut self, product: &Value) {
        if let Some(id) = product.get("id").and_then(Value::as_str) {
            self.attributes.flavor_id = Some(id.to_string());
        }
    }

    /// Returns the public key if one is set or a path to it is known.
    async fn available_public_key(&mut self) -> ComputeResult<Option<String>> {
        if self.public_key.is_none()
            && self.public_key_path.is_none()
            && self.credentials.public_key_path.is_none()
        {
            return Ok(None);
        }
        Ok(Some(self.public_key().await?.to_string()))
    }

    fn require_id(&self) -> ComputeResult<&str> {
        require(self.attributes.id.as_deref(), "id")
    }

    fn require_address(&self) -> ComputeResult<&str> {
        require(self.attributes.first_address(), "ips")
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("attributes", &self.attributes)
            .field("username", &self.username())
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("public_key_path", &self.public_key_path)
            .field("private_key_path", &self.private_key_path)
            .field("ssh_session", &self.ssh_session.is_some())
            .finish()
    }
}

fn require<'a>(value: Option<&'a str>, field: &str) -> ComputeResult<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError::missing(field).into())
}

fn resolve_key_path<'a>(
    cache: &'a mut Option<KeyPath>,
    explicit: Option<&Path>,
    configured: Option<&Path>,
    field: &str,
) -> ComputeResult<&'a Path> {
    if cache.is_none() {
        let raw = explicit
            .or(configured)
            .ok_or_else(|| ValidationError::missing(field))?;
        *cache = Some(KeyPath::resolve(raw, field)?);
    }
    cache
        .as_ref()
        .map(KeyPath::as_path)
        .ok_or_else(|| ValidationError::missing(field).into())
}

async fn read_key(path: &Path) -> ComputeResult<String> {
    debug!(path = %path.display(), "Reading key material");
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ComputeError::Io {
            path: path.to_path_buf(),
            source,
        })
}

async fn run_batch(
    shell: &dyn ShellTransport,
    address: &str,
    username: &str,
    auth: &ShellAuth,
    commands: &[String],
) -> ShellResult<Vec<CommandOutput>> {
    let mut session = shell.open(address, username, auth).await?;
    session.run(commands).await
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> ComputeResult<Option<String>> {
    match map.remove(key) {
        Some(value) => Ok(serde_json::from_value::<Option<String>>(value)?),
        None => Ok(None),
    }
}

/// Quotes `value` as a single shell word.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
