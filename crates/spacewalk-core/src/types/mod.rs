//! Core data types for the acquire method.
//!
//! - Protocol frames and message codes
//! - Login information and derived request headers
//! - Subscribed channel sets
//! - Fetch requests and results

pub mod channel;
pub mod fetch;
pub mod frame;
pub mod login;

// Re-export all public types
pub use channel::{Channel, ChannelSet};
pub use fetch::{FetchRequest, FetchResult};
pub use frame::{Frame, MessageCode};
pub use login::{HeaderBundle, LoginInfo, REQUIRED_LOGIN_FIELDS};
