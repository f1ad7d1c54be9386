//! Lazily established Spacewalk session
//!
//! Configuration, login, channel list, request headers and the HTTP
//! connection are each built on first use and then reused for every later
//! request. A failed step leaves its slot empty, so the next request tries
//! again.

use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::{Certificate, Client, ClientBuilder};
use tracing::{debug, info};

use spacewalk_config::{ConfigLoader, ServerConfig};
use spacewalk_core::error::MethodError;
use spacewalk_core::types::{ChannelSet, HeaderBundle, LoginInfo};

use crate::auth::AuthService;
use crate::ClientResult;

/// Redirect hops the transport follows, as advertised to the server
pub const MAX_REDIRECTS: usize = 3;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-process session state
pub struct Session<A> {
    loader: Option<ConfigLoader>,
    auth: A,
    config: Option<ServerConfig>,
    login: Option<LoginInfo>,
    channels: Option<ChannelSet>,
    headers: Option<HeaderBundle>,
    connection: Option<Client>,
}

impl<A: AuthService> Session<A> {
    /// Session that loads its configuration on first use
    pub fn new(loader: ConfigLoader, auth: A) -> Self {
        Self {
            loader: Some(loader),
            auth,
            config: None,
            login: None,
            channels: None,
            headers: None,
            connection: None,
        }
    }

    /// Session with an already loaded configuration
    pub fn with_config(config: ServerConfig, auth: A) -> Self {
        Self {
            loader: None,
            auth,
            config: Some(config),
            login: None,
            channels: None,
            headers: None,
            connection: None,
        }
    }

    /// Load the server configuration once
    pub async fn ensure_config(&mut self) -> ClientResult<&ServerConfig> {
        let config = match self.config.take() {
            Some(config) => config,
            None => {
                let loader = self.loader.as_ref().ok_or_else(|| {
                    MethodError::config("config", "no configuration source available")
                })?;
                loader.load().await?
            }
        };
        Ok(self.config.insert(config))
    }

    /// Log in once; `NotRegistered` when the service has no credentials
    pub async fn ensure_login(&mut self) -> ClientResult<&LoginInfo> {
        let login = match self.login.take() {
            Some(login) => login,
            None => {
                self.ensure_config().await?;
                let config = self.config()?;
                let login = self
                    .auth
                    .login(config)
                    .await?
                    .filter(|login| !login.is_empty())
                    .ok_or(MethodError::NotRegistered)?;
                debug!("Received {} login fields", login.len());
                login
            }
        };
        Ok(self.login.insert(login))
    }

    /// Fetch the channel list once; it must contain a base channel
    pub async fn ensure_channels(&mut self) -> ClientResult<&ChannelSet> {
        let channels = match self.channels.take() {
            Some(channels) => channels,
            None => {
                self.ensure_config().await?;
                let channels = self.auth.channels(self.config()?).await?;
                let root = channels.root_label()?;
                info!("Using base channel {} ({} subscribed)", root, channels.len());
                channels
            }
        };
        Ok(self.channels.insert(channels))
    }

    /// Label of the base channel
    pub async fn root_channel(&mut self) -> ClientResult<&str> {
        self.ensure_channels().await?.root_label()
    }

    /// Derive the request headers once; login must already be established
    pub fn ensure_headers(&mut self) -> ClientResult<&HeaderBundle> {
        let headers = match self.headers.take() {
            Some(headers) => headers,
            None => {
                let login = self.login.as_ref().ok_or_else(|| MethodError::Authentication {
                    message: "login must complete before request headers are derived"
                        .to_string(),
                })?;
                HeaderBundle::from_login(login)?
            }
        };
        Ok(self.headers.insert(headers))
    }

    /// Open the single HTTP connection for this process
    pub async fn ensure_connection(&mut self) -> ClientResult<&Client> {
        let client = match self.connection.take() {
            Some(client) => client,
            None => {
                self.ensure_config().await?;
                let config = self.config()?;
                debug!(
                    "Opening {} connection to {}",
                    if config.use_tls { "TLS" } else { "plain" },
                    config.netloc()
                );
                build_client(config, config.use_tls).await?
            }
        };
        Ok(self.connection.insert(client))
    }

    /// The loaded configuration
    pub fn config(&self) -> ClientResult<&ServerConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| MethodError::config("config", "configuration has not been loaded"))
    }

    pub fn is_logged_in(&self) -> bool {
        self.login.is_some()
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }
}

impl<A> Session<A> {
    /// The open connection, if any
    pub fn connection(&self) -> Option<&Client> {
        self.connection.as_ref()
    }

    /// Release the connection; idempotent
    pub fn close(&mut self) {
        if self.connection.take().is_some() {
            debug!("Closed connection to the spacewalk server");
        }
    }
}

impl<A> Drop for Session<A> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Build an HTTP client for the server.
///
/// With TLS, only the configured CA certificates are trusted.
pub(crate) async fn build_client(config: &ServerConfig, use_tls: bool) -> ClientResult<Client> {
    let mut builder = ClientBuilder::new()
        .redirect(Policy::limited(MAX_REDIRECTS))
        .pool_max_idle_per_host(1)
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("apt-transport-spacewalk/", env!("CARGO_PKG_VERSION")));

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    if use_tls {
        if config.ca_cert_paths.is_empty() {
            return Err(MethodError::BadTlsConfig {
                reason: "no CA certificate configured".to_string(),
            });
        }
        builder = builder.tls_built_in_root_certs(false);
        for path in &config.ca_cert_paths {
            let pem = tokio::fs::read(path).await.map_err(|e| MethodError::BadTlsConfig {
                reason: format!("cannot read CA certificate {}: {}", path, e),
            })?;
            let certificate = Certificate::from_pem(&pem).map_err(|e| MethodError::BadTlsConfig {
                reason: format!("invalid CA certificate {}: {}", path, e),
            })?;
            builder = builder.add_root_certificate(certificate);
        }
    }

    builder
        .build()
        .map_err(|e| MethodError::network(format!("Failed to create HTTP client: {}", e), e))
}
