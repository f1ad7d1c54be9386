//! up2date configuration file parsing
//!
//! The format is one `key=value` pair per line. Lines starting with `#` are
//! comments and `key[comment]=...` lines carry descriptions, both ignored.
//! A value containing `;` is a list, a value that parses as an integer is
//! an integer, anything else is a string.

use indexmap::IndexMap;
use tracing::trace;

use spacewalk_core::error::MethodError;
use crate::ConfigResult;

/// A single parsed configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    List(Vec<String>),
}

impl ConfigValue {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.contains(';') {
            return ConfigValue::List(
                raw.split(';')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        match raw.parse::<i64>() {
            Ok(n) => ConfigValue::Int(n),
            Err(_) => ConfigValue::String(raw.to_string()),
        }
    }
}

/// Parsed up2date configuration, keys in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Up2dateConfig {
    values: IndexMap<String, ConfigValue>,
}

impl Up2dateConfig {
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Non-empty string value of a key
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ConfigValue::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(ConfigValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Value as a list; a single string becomes a one-element list
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(ConfigValue::List(items)) => items.clone(),
            Some(ConfigValue::String(s)) if !s.is_empty() => vec![s.clone()],
            Some(ConfigValue::Int(n)) => vec![n.to_string()],
            _ => Vec::new(),
        }
    }

    /// Boolean flag, written as `1`/`0` by up2date
    pub fn get_flag(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(ConfigValue::Int(n)) => *n != 0,
            Some(ConfigValue::String(s)) => {
                matches!(s.to_ascii_lowercase().as_str(), "true" | "yes" | "on")
            }
            _ => false,
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: ConfigValue) {
        self.values.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parse the content of an up2date configuration file
pub fn parse_up2date(content: &str) -> ConfigResult<Up2dateConfig> {
    let mut config = Up2dateConfig::default();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| {
            MethodError::config(
                format!("line {}", index + 1),
                format!("expected 'key=value', found '{}'", line),
            )
        })?;

        let key = key.trim();
        if key.contains('[') {
            trace!("Skipping description line for {}", key);
            continue;
        }
        if key.is_empty() {
            return Err(MethodError::config(
                format!("line {}", index + 1),
                "empty key",
            ));
        }

        config.set(key, ConfigValue::parse(value));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
# Automatically generated Red Hat Update Agent config file, do not edit.
# Format: 1.0
serverURL[comment]=Remote server URL
serverURL=https://spacewalk.example.com/XMLRPC

sslCACert[comment]=The CA cert used to verify the ssl server
sslCACert=/usr/share/rhn/RHN-ORG-TRUSTED-SSL-CERT;/etc/pki/extra.pem

useNoSSLForPackages=0
enableProxy=0
httpProxy=
timeout=300
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_up2date(SAMPLE).unwrap();
        assert_eq!(
            config.get_str("serverURL"),
            Some("https://spacewalk.example.com/XMLRPC")
        );
        assert_eq!(
            config.get_list("sslCACert"),
            vec![
                "/usr/share/rhn/RHN-ORG-TRUSTED-SSL-CERT".to_string(),
                "/etc/pki/extra.pem".to_string()
            ]
        );
        assert!(!config.get_flag("useNoSSLForPackages"));
        assert_eq!(config.get_int("timeout"), Some(300));
        assert_eq!(config.get_str("httpProxy"), None);
        assert!(config.get("serverURL[comment]").is_none());
    }

    #[test]
    fn test_single_value_as_list() {
        let config = parse_up2date("sslCACert=/usr/share/rhn/cert.pem\n").unwrap();
        assert_eq!(config.get_list("sslCACert"), vec!["/usr/share/rhn/cert.pem".to_string()]);
        assert!(config.get_list("missing").is_empty());
    }

    #[test]
    fn test_flag_values() {
        let config = parse_up2date("a=1\nb=0\nc=yes\nd=no\n").unwrap();
        assert!(config.get_flag("a"));
        assert!(!config.get_flag("b"));
        assert!(config.get_flag("c"));
        assert!(!config.get_flag("d"));
        assert!(!config.get_flag("e"));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let config = parse_up2date("serverURL=https://h/XMLRPC?a=b\n").unwrap();
        assert_eq!(config.get_str("serverURL"), Some("https://h/XMLRPC?a=b"));
    }

    #[test]
    fn test_line_without_separator_rejected() {
        let err = parse_up2date("serverURL\n").unwrap_err();
        match err {
            MethodError::Config { field, .. } => assert_eq!(field, "line 1"),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }
}
