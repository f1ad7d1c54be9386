//! Acquisition requests and their results.

use camino::Utf8PathBuf;
use url::Url;

use crate::error::{MethodError, MethodResult};
use crate::types::frame::{Frame, MessageCode};

/// One `600 URI Acquire` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// URI as sent by the front end
    pub uri: Url,
    /// File the body is written to
    pub destination: Utf8PathBuf,
    /// Modification time of the copy the front end already has
    pub last_modified_hint: Option<String>,
    pub index_file: bool,
    pub fail_ignore: bool,
}

impl FetchRequest {
    /// Build a request from an acquire frame.
    ///
    /// `URI` and `Filename` are required; the boolean fields accept
    /// `true`/`yes`/`1` in any case.
    pub fn from_frame(frame: &Frame) -> MethodResult<Self> {
        if frame.message_code() != Some(MessageCode::UriAcquire) {
            return Err(MethodError::Protocol {
                message: format!("expected an acquire message, got {}", frame.code),
            });
        }

        let raw_uri = required(frame, "URI")?;
        let uri = Url::parse(raw_uri).map_err(|e| MethodError::Protocol {
            message: format!("invalid URI '{}': {}", raw_uri, e),
        })?;
        let destination = Utf8PathBuf::from(required(frame, "Filename")?);

        Ok(Self {
            uri,
            destination,
            last_modified_hint: frame
                .field("Last-Modified")
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            index_file: flag(frame, "Index-File"),
            fail_ignore: flag(frame, "Fail-Ignore"),
        })
    }
}

fn required<'a>(frame: &'a Frame, field: &str) -> MethodResult<&'a str> {
    frame
        .field(field)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MethodError::MissingField {
            field: field.to_string(),
        })
}

fn flag(frame: &Frame, field: &str) -> bool {
    frame
        .field(field)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "yes" | "1"))
        .unwrap_or(false)
}

/// Outcome of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Bytes written to the destination
    pub size: u64,
    pub last_modified: Option<String>,
    /// Lowercase hex MD5 of the written bytes
    pub md5: String,
    /// Lowercase hex SHA-256 of the written bytes
    pub sha256: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acquire() -> Frame {
        Frame::new(600, "URI Acquire")
            .with_field("URI", "spacewalk://sw.example.com/dists/channels:/main/Release")
            .with_field("Filename", "/var/lib/apt/lists/partial/Release")
    }

    #[test]
    fn test_from_frame_minimal() {
        let request = FetchRequest::from_frame(&acquire()).unwrap();
        assert_eq!(request.uri.host_str(), Some("sw.example.com"));
        assert_eq!(request.destination.as_str(), "/var/lib/apt/lists/partial/Release");
        assert_eq!(request.last_modified_hint, None);
        assert!(!request.index_file);
        assert!(!request.fail_ignore);
    }

    #[test]
    fn test_from_frame_optional_fields() {
        let frame = acquire()
            .with_field("Last-Modified", "Tue, 02 Jan 2024 10:00:00 GMT")
            .with_field("Index-File", "true")
            .with_field("Fail-Ignore", "YES");

        let request = FetchRequest::from_frame(&frame).unwrap();
        assert_eq!(
            request.last_modified_hint.as_deref(),
            Some("Tue, 02 Jan 2024 10:00:00 GMT")
        );
        assert!(request.index_file);
        assert!(request.fail_ignore);
    }

    #[test]
    fn test_missing_filename() {
        let frame = Frame::new(600, "URI Acquire").with_field("URI", "spacewalk://h/x");
        match FetchRequest::from_frame(&frame).unwrap_err() {
            MethodError::MissingField { field } => assert_eq!(field, "Filename"),
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_uri() {
        let frame = Frame::new(600, "URI Acquire")
            .with_field("URI", "not a uri")
            .with_field("Filename", "/tmp/out");
        assert!(matches!(
            FetchRequest::from_frame(&frame),
            Err(MethodError::Protocol { .. })
        ));
    }
}
