//! Server configuration derived from the up2date file

use std::time::Duration;

use camino::Utf8PathBuf;
use tracing::debug;
use url::Url;

use spacewalk_core::error::MethodError;
use crate::{ConfigResult, up2date::Up2dateConfig};

/// Where up2date keeps the registered system id by default
pub const DEFAULT_SYSTEM_ID_PATH: &str = "/etc/sysconfig/rhn/systemid";

/// Immutable settings for talking to the Spacewalk server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// XML-RPC endpoint, e.g. `https://spacewalk.example.com/XMLRPC`
    pub base_url: Url,
    /// Whether content is fetched over TLS
    pub use_tls: bool,
    /// Trusted CA certificates (PEM), in configuration order
    pub ca_cert_paths: Vec<Utf8PathBuf>,
    /// Registered system id file
    pub system_id_path: Utf8PathBuf,
    /// Upper bound for one HTTP exchange, unbounded when absent
    pub timeout: Option<Duration>,
}

impl ServerConfig {
    /// Build the server configuration from parsed up2date values.
    ///
    /// `serverURL` is required. TLS is used for content unless the server
    /// URL is plain `http` or `useNoSSLForPackages` is set; when it is used,
    /// `sslCACert` must name at least one certificate.
    pub fn from_up2date(config: &Up2dateConfig) -> ConfigResult<Self> {
        let raw_url = config
            .get_str("serverURL")
            .ok_or_else(|| MethodError::config("serverURL", "required key is missing"))?;
        let base_url = Url::parse(raw_url)
            .map_err(|e| MethodError::config("serverURL", format!("'{}': {}", raw_url, e)))?;

        match base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(MethodError::config(
                    "serverURL",
                    format!("unsupported scheme '{}'", other),
                ))
            }
        }
        if base_url.host_str().is_none() {
            return Err(MethodError::config("serverURL", "URL has no host"));
        }

        let use_tls = base_url.scheme() == "https" && !config.get_flag("useNoSSLForPackages");

        let ca_cert_paths: Vec<Utf8PathBuf> = config
            .get_list("sslCACert")
            .into_iter()
            .map(Utf8PathBuf::from)
            .collect();
        if use_tls && ca_cert_paths.is_empty() {
            return Err(MethodError::BadTlsConfig {
                reason: "sslCACert must list at least one CA certificate".to_string(),
            });
        }

        let system_id_path =
            Utf8PathBuf::from(config.get_str("systemIdPath").unwrap_or(DEFAULT_SYSTEM_ID_PATH));

        let timeout = config
            .get_int("timeout")
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs as u64));

        if config.get_flag("enableProxy") {
            debug!("Proxy settings are present but not supported, connecting directly");
        }

        Ok(Self {
            base_url,
            use_tls,
            ca_cert_paths,
            system_id_path,
            timeout,
        })
    }

    /// Server host name
    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    /// `host[:port]` as written in the server URL
    pub fn netloc(&self) -> String {
        match self.base_url.port() {
            Some(port) => format!("{}:{}", self.host(), port),
            None => self.host().to_string(),
        }
    }

    /// Whether a front-end URI targets this server.
    ///
    /// Compares the host and the explicitly written port, ignoring scheme.
    pub fn serves(&self, uri: &Url) -> bool {
        uri.host_str() == self.base_url.host_str() && uri.port() == self.base_url.port()
    }

    /// Absolute URL of a backend content path
    pub fn content_url(&self, path: &str) -> ConfigResult<Url> {
        let mut url = self.base_url.clone();
        if !self.use_tls && url.scheme() != "http" {
            url.set_scheme("http")
                .map_err(|_| MethodError::config("serverURL", "cannot switch to plain http"))?;
        }
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }
}
