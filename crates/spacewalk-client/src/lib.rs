//! Spacewalk session and content client for the APT acquire method
//!
//! This crate owns everything between a parsed acquire request and the
//! bytes on disk: the lazily established session (login, channels,
//! headers, connection), the front-end to backend path rewrite, and the
//! streaming fetch with MD5/SHA-256 digests.

pub mod auth;
pub mod fetch;
pub mod rewrite;
pub mod session;
pub mod xmlrpc;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-export main types
pub use auth::{AuthService, XmlRpcAuth};
pub use fetch::{FetchEngine, FrameSink};
pub use rewrite::rewrite_document;
pub use session::Session;

use spacewalk_core::error::MethodError;

/// Result type for client operations
pub type ClientResult<T> = Result<T, MethodError>;
