//! Authentication and channel listing collaborators
//!
//! The session treats login and channel discovery as opaque calls behind
//! [`AuthService`]. [`XmlRpcAuth`] is the production implementation: it
//! presents the registered system id to the server's up2date XML-RPC
//! handler.

use std::io::ErrorKind;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use spacewalk_config::ServerConfig;
use spacewalk_core::error::MethodError;
use spacewalk_core::types::{Channel, ChannelSet, LoginInfo};

use crate::session::build_client;
use crate::xmlrpc::{self, Value};
use crate::ClientResult;

/// Source of login credentials and channel subscriptions
#[allow(async_fn_in_trait)]
pub trait AuthService {
    /// Log the system in; `None` when the system is not registered
    async fn login(&self, config: &ServerConfig) -> ClientResult<Option<LoginInfo>>;

    /// Channels the system is subscribed to
    async fn channels(&self, config: &ServerConfig) -> ClientResult<ChannelSet>;
}

/// up2date XML-RPC authentication using the system id file
#[derive(Debug, Clone, Default)]
pub struct XmlRpcAuth;

impl XmlRpcAuth {
    pub fn new() -> Self {
        Self
    }

    /// Read the system id; a missing file means the system is not registered
    async fn system_id(&self, config: &ServerConfig) -> ClientResult<Option<String>> {
        match tokio::fs::read_to_string(&config.system_id_path).await {
            Ok(system_id) => Ok(Some(system_id)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No system id at {}", config.system_id_path);
                Ok(None)
            }
            Err(e) => Err(MethodError::io(
                format!("Failed to read system id {}", config.system_id_path),
                e,
            )),
        }
    }

    /// POST one call to the XML-RPC endpoint and decode the response text
    async fn call(&self, config: &ServerConfig, method: &str, params: &[&str]) -> ClientResult<String> {
        let client = build_client(config, config.base_url.scheme() == "https").await?;
        let response = client
            .post(config.base_url.clone())
            .header(CONTENT_TYPE, "text/xml")
            .body(xmlrpc::encode_call(method, params))
            .send()
            .await
            .map_err(|e| MethodError::network(format!("{} request failed: {}", method, e), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MethodError::Network {
                message: format!("{} returned status {}", method, status),
                source: None,
            });
        }

        response
            .text()
            .await
            .map_err(|e| MethodError::network(format!("Failed to read {} response: {}", method, e), e))
    }
}

impl AuthService for XmlRpcAuth {
    async fn login(&self, config: &ServerConfig) -> ClientResult<Option<LoginInfo>> {
        let Some(system_id) = self.system_id(config).await? else {
            return Ok(None);
        };

        let body = self.call(config, "up2date.login", &[system_id.as_str()]).await?;
        let value = xmlrpc::decode_response(&body).map_err(|e| MethodError::Authentication {
            message: format!("Login failed: {}", e),
        })?;

        let login = match value {
            Value::Struct(members) => login_from_members(members),
            _ => return Ok(None),
        };
        info!("Logged in as server {}", login.server_id().unwrap_or("unknown"));
        Ok(Some(login))
    }

    async fn channels(&self, config: &ServerConfig) -> ClientResult<ChannelSet> {
        let system_id = self
            .system_id(config)
            .await?
            .ok_or(MethodError::NotRegistered)?;

        let body = self.call(config, "up2date.listChannels", &[system_id.as_str()]).await?;
        let value = xmlrpc::decode_response(&body).map_err(|e| MethodError::ChannelResolution {
            reason: format!("listChannels failed: {}", e),
        })?;

        channels_from_value(&value)
    }
}

/// Keep the scalar members of a login struct as header values
fn login_from_members(members: indexmap::IndexMap<String, Value>) -> LoginInfo {
    members
        .into_iter()
        .filter_map(|(name, value)| value.to_text().map(|text| (name, text)))
        .collect()
}

fn channels_from_value(value: &Value) -> ClientResult<ChannelSet> {
    let items = value.as_array().ok_or_else(|| MethodError::ChannelResolution {
        reason: "channel list is not an array".to_string(),
    })?;

    items
        .iter()
        .map(|item| {
            let members = item.as_struct().ok_or_else(|| MethodError::ChannelResolution {
                reason: "channel entry is not a struct".to_string(),
            })?;
            let label = members
                .get("label")
                .and_then(Value::to_text)
                .ok_or_else(|| MethodError::ChannelResolution {
                    reason: "channel entry has no label".to_string(),
                })?;
            let parent = members
                .get("parent_channel")
                .and_then(Value::to_text)
                .unwrap_or_default();
            Ok(Channel::new(label, parent))
        })
        .collect()
}
