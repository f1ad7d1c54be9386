//! # spacewalk-core
//!
//! Core types and utilities shared across the Spacewalk APT transport crates.
//!
//! This crate provides:
//! - `MethodError`, the error taxonomy reported back to APT
//! - Frame, login, channel and fetch data types
//! - The streaming MD5/SHA-256 digest accumulator

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{MethodError, MethodResult};
pub use types::{
    Channel, ChannelSet, FetchRequest, FetchResult, Frame, HeaderBundle, LoginInfo, MessageCode,
};
pub use utils::{ContentDigests, DigestAccumulator};
