//! Acquire protocol frames.
//!
//! A frame is a status line `"<code> <text>"` followed by `"<field>: <value>"`
//! lines and a terminating blank line. This module only models frames; the
//! byte-level reader and writer live with the method binary.

use indexmap::IndexMap;

use crate::error::MethodError;
use crate::types::fetch::{FetchRequest, FetchResult};

/// Message codes understood or emitted by the method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageCode {
    Capabilities,
    Status,
    UriStart,
    UriDone,
    UriFailure,
    UriAcquire,
}

impl MessageCode {
    /// Numeric protocol code
    pub fn code(self) -> u16 {
        match self {
            MessageCode::Capabilities => 100,
            MessageCode::Status => 102,
            MessageCode::UriStart => 200,
            MessageCode::UriDone => 201,
            MessageCode::UriFailure => 400,
            MessageCode::UriAcquire => 600,
        }
    }

    /// Human-readable tag following the code on the status line
    pub fn tag(self) -> &'static str {
        match self {
            MessageCode::Capabilities => "Capabilities",
            MessageCode::Status => "Status",
            MessageCode::UriStart => "URI Start",
            MessageCode::UriDone => "URI Done",
            MessageCode::UriFailure => "URI Failure",
            MessageCode::UriAcquire => "URI Acquire",
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            100 => Some(MessageCode::Capabilities),
            102 => Some(MessageCode::Status),
            200 => Some(MessageCode::UriStart),
            201 => Some(MessageCode::UriDone),
            400 => Some(MessageCode::UriFailure),
            600 => Some(MessageCode::UriAcquire),
            _ => None,
        }
    }
}

/// One protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub code: u16,
    pub text: String,
    fields: IndexMap<String, String>,
}

impl Frame {
    /// Create a frame with no fields
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
            fields: IndexMap::new(),
        }
    }

    /// Create an empty frame for a known message code
    pub fn message(code: MessageCode) -> Self {
        Self::new(code.code(), code.tag())
    }

    /// Look up a field value by exact name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Set a field; a repeated name keeps its position and takes the new value
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Set a field only when a value is present
    pub fn with_optional_field<V: Into<String>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_field(name, value),
            None => self,
        }
    }

    /// Fields in the order they were first set
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn message_code(&self) -> Option<MessageCode> {
        MessageCode::from_code(self.code)
    }

    /// `100 Capabilities`, sent once when the method starts
    pub fn capabilities() -> Self {
        Self::message(MessageCode::Capabilities)
            .with_field("Version", "1.0")
            .with_field("Single-Instance", "true")
    }

    /// `102 Status` progress message for a URI
    pub fn status(uri: &str, message: &str) -> Self {
        Self::message(MessageCode::Status)
            .with_field("URI", uri)
            .with_field("Message", message)
    }

    /// `200 URI Start`, sent before the body is consumed
    pub fn uri_start(uri: &str, size: Option<u64>, last_modified: Option<&str>) -> Self {
        Self::message(MessageCode::UriStart)
            .with_field("URI", uri)
            .with_optional_field("Size", size.map(|s| s.to_string()))
            .with_optional_field("Last-Modified", last_modified)
    }

    /// `201 URI Done` for a completed transfer
    pub fn uri_done(request: &FetchRequest, result: &FetchResult) -> Self {
        Self::message(MessageCode::UriDone)
            .with_field("URI", request.uri.as_str())
            .with_field("Filename", request.destination.as_str())
            .with_field("Size", result.size.to_string())
            .with_optional_field("Last-Modified", result.last_modified.as_deref())
            .with_field("MD5-Hash", result.md5.as_str())
            .with_field("MD5Sum-Hash", result.md5.as_str())
            .with_field("SHA256-Hash", result.sha256.as_str())
    }

    /// `400 URI Failure` describing why a URI could not be fetched
    pub fn uri_failure(uri: Option<&str>, error: &MethodError) -> Self {
        Self::message(MessageCode::UriFailure)
            .with_optional_field("URI", uri)
            .with_field("Message", error.failure_message())
            .with_optional_field("FailReason", error.fail_reason())
    }
}
