//! Test doubles for the authentication collaborator

use std::cell::Cell;

use spacewalk_config::up2date::parse_up2date;
use spacewalk_config::ServerConfig;
use spacewalk_core::types::{Channel, ChannelSet, LoginInfo, REQUIRED_LOGIN_FIELDS};

use crate::auth::AuthService;
use crate::ClientResult;

/// Login information carrying every mandatory field
pub fn sample_login() -> LoginInfo {
    let values = ["1000010000", "", "c2VjcmV0LXRva2Vu", "1700000000.0", "3600.0"];
    REQUIRED_LOGIN_FIELDS.iter().copied().zip(values).collect()
}

/// Base channel `root` with one child channel
pub fn sample_channels(root: &str) -> ChannelSet {
    ChannelSet::new(vec![
        Channel::new(root, ""),
        Channel::new(format!("{}-updates", root), root),
    ])
}

/// Plain HTTP configuration pointing at `server_uri` (e.g. a mock server)
pub fn plain_config(server_uri: &str) -> ServerConfig {
    let up2date = parse_up2date(&format!("serverURL={}/XMLRPC\n", server_uri))
        .expect("valid test configuration");
    ServerConfig::from_up2date(&up2date).expect("valid test configuration")
}

/// Authentication service answering from fixed data and counting calls
pub struct StaticAuth {
    login: Option<LoginInfo>,
    channels: ChannelSet,
    login_calls: Cell<usize>,
    channel_calls: Cell<usize>,
}

impl StaticAuth {
    pub fn new(login: Option<LoginInfo>, channels: ChannelSet) -> Self {
        Self {
            login,
            channels,
            login_calls: Cell::new(0),
            channel_calls: Cell::new(0),
        }
    }

    /// Registered system subscribed to `root`
    pub fn registered(root: &str) -> Self {
        Self::new(Some(sample_login()), sample_channels(root))
    }

    /// System without credentials
    pub fn unregistered() -> Self {
        Self::new(None, ChannelSet::default())
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.get()
    }

    pub fn channel_calls(&self) -> usize {
        self.channel_calls.get()
    }
}

impl AuthService for StaticAuth {
    async fn login(&self, _config: &ServerConfig) -> ClientResult<Option<LoginInfo>> {
        self.login_calls.set(self.login_calls.get() + 1);
        Ok(self.login.clone())
    }

    async fn channels(&self, _config: &ServerConfig) -> ClientResult<ChannelSet> {
        self.channel_calls.set(self.channel_calls.get() + 1);
        Ok(self.channels.clone())
    }
}
