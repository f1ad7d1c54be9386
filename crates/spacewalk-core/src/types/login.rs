//! Login credentials and the request headers derived from them.

use indexmap::IndexMap;

use crate::error::{MethodError, MethodResult};

/// Login fields every authenticated request must carry, in check order
pub const REQUIRED_LOGIN_FIELDS: [&str; 5] = [
    "X-RHN-Server-Id",
    "X-RHN-Auth-User-Id",
    "X-RHN-Auth",
    "X-RHN-Auth-Server-Time",
    "X-RHN-Auth-Expire-Offset",
];

/// Header advertising how many redirects the transport follows
pub const TRANSPORT_CAPABILITY_HEADER: &str = "X-RHN-Transport-Capability";
pub const TRANSPORT_CAPABILITY_VALUE: &str = "follow-redirects=3";

/// Login information as returned by the authentication service.
///
/// Kept as the raw key/value map; the mandatory fields are only checked
/// when headers are derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginInfo {
    fields: IndexMap<String, String>,
}

impl LoginInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn server_id(&self) -> Option<&str> {
        self.get("X-RHN-Server-Id")
    }
}

impl<K, V> FromIterator<(K, V)> for LoginInfo
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Headers attached to every authenticated content request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBundle {
    headers: IndexMap<String, String>,
}

impl HeaderBundle {
    /// Derive the header set from login information.
    ///
    /// Fails with `MissingAuthField` naming the first mandatory field that
    /// is absent, in [`REQUIRED_LOGIN_FIELDS`] order.
    pub fn from_login(login: &LoginInfo) -> MethodResult<Self> {
        let mut headers = IndexMap::with_capacity(REQUIRED_LOGIN_FIELDS.len() + 1);
        for field in REQUIRED_LOGIN_FIELDS {
            let value = login.get(field).ok_or_else(|| MethodError::MissingAuthField {
                field: field.to_string(),
            })?;
            headers.insert(field.to_string(), value.to_string());
        }
        headers.insert(
            TRANSPORT_CAPABILITY_HEADER.to_string(),
            TRANSPORT_CAPABILITY_VALUE.to_string(),
        );
        Ok(Self { headers })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}
