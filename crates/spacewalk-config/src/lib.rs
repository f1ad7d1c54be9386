//! Configuration loading for the Spacewalk APT transport
//!
//! Reads the up2date client configuration (`/etc/sysconfig/rhn/up2date`)
//! and turns it into the immutable [`ServerConfig`] used by the session.

pub mod loader;
pub mod server;
pub mod up2date;

// Re-export main types
pub use loader::{ConfigLoader, ConfigSource, DEFAULT_CONFIG_PATH};
pub use server::ServerConfig;
pub use up2date::{ConfigValue, Up2dateConfig};

use spacewalk_core::error::MethodError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, MethodError>;
