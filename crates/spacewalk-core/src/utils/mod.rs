//! Utility functions and helpers.

pub mod digest;

pub use digest::{ContentDigests, DigestAccumulator};
