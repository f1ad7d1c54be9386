//! Authenticated content fetching
//!
//! One GET per acquire request over the session's connection. The body is
//! streamed to the destination file while MD5 and SHA-256 are computed over
//! the same chunks.

use camino::Utf8Path;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LAST_MODIFIED};
use reqwest::{Response, StatusCode};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use spacewalk_core::error::MethodError;
use spacewalk_core::types::{FetchRequest, FetchResult, Frame, HeaderBundle};
use spacewalk_core::utils::{ContentDigests, DigestAccumulator};

use crate::auth::AuthService;
use crate::rewrite::rewrite_document;
use crate::session::Session;
use crate::ClientResult;

/// Destination for progress frames emitted while a request is served
#[allow(async_fn_in_trait)]
pub trait FrameSink {
    async fn send(&mut self, frame: Frame) -> ClientResult<()>;
}

impl FrameSink for Vec<Frame> {
    async fn send(&mut self, frame: Frame) -> ClientResult<()> {
        self.push(frame);
        Ok(())
    }
}

/// Fetches acquire requests through a [`Session`]
#[derive(Debug, Clone, Default)]
pub struct FetchEngine;

impl FetchEngine {
    pub fn new() -> Self {
        Self
    }

    /// Serve one acquire request.
    ///
    /// Emits `102 Status` frames while the session is established and a
    /// `200 URI Start` frame before the body is read. Non-200 responses are
    /// drained and returned as `HttpStatus` without touching the
    /// destination.
    pub async fn fetch<A, S>(
        &self,
        session: &mut Session<A>,
        request: &FetchRequest,
        sink: &mut S,
    ) -> ClientResult<FetchResult>
    where
        A: AuthService,
        S: FrameSink,
    {
        let uri = request.uri.as_str();

        let config = session.ensure_config().await?;
        if !config.serves(&request.uri) {
            return Err(MethodError::HostMismatch {
                requested: request.uri.host_str().unwrap_or_default().to_string(),
                configured: config.netloc(),
            });
        }

        if !session.is_logged_in() {
            sink.send(Frame::status(uri, "Logging into the spacewalk server")).await?;
            session.ensure_login().await?;
            sink.send(Frame::status(uri, "Logged in")).await?;
        }

        let document = rewrite_document(request.uri.path(), session.root_channel().await?);
        let headers = header_map(session.ensure_headers()?)?;
        let target = session.config()?.content_url(&document)?;
        let client = session.ensure_connection().await?;

        debug!(
            "GET {} (index: {}, last modified: {:?})",
            target, request.index_file, request.last_modified_hint
        );
        sink.send(Frame::status(uri, "Waiting for headers")).await?;
        let mut response = client
            .get(target)
            .headers(headers)
            .send()
            .await
            .map_err(|e| MethodError::network(format!("Request for {} failed: {}", uri, e), e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let drain_error = drain(&mut response).await.err().map(Box::new);
            if let Some(err) = &drain_error {
                warn!("Failed to drain {} response for {}: {}", status, uri, err);
            }
            return Err(MethodError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                drain_error,
            });
        }

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        sink.send(Frame::uri_start(uri, response.content_length(), last_modified.as_deref()))
            .await?;

        let digests = match stream_to_file(response, &request.destination).await {
            Ok(digests) => digests,
            Err(err) => {
                discard_partial(&request.destination).await;
                return Err(err);
            }
        };
        debug!("Wrote {} bytes to {}", digests.size, request.destination);

        Ok(FetchResult {
            size: digests.size,
            last_modified,
            md5: digests.md5,
            sha256: digests.sha256,
        })
    }
}

fn header_map(bundle: &HeaderBundle) -> ClientResult<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(bundle.len());
    for (name, value) in bundle.iter() {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| MethodError::Authentication {
            message: format!("Invalid login field name '{}': {}", name, e),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| MethodError::Authentication {
            message: format!("Invalid value for {}: {}", name, e),
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Read and discard the rest of a body so the connection can be reused
async fn drain(response: &mut Response) -> ClientResult<()> {
    while response
        .chunk()
        .await
        .map_err(|e| MethodError::transfer(format!("Failed to drain response: {}", e), e))?
        .is_some()
    {}
    Ok(())
}

async fn stream_to_file(mut response: Response, destination: &Utf8Path) -> ClientResult<ContentDigests> {
    let mut file = File::create(destination)
        .await
        .map_err(|e| MethodError::transfer(format!("Cannot create {}: {}", destination, e), e))?;
    let mut digests = DigestAccumulator::new();

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| MethodError::transfer(format!("Failed to read response body: {}", e), e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| MethodError::transfer(format!("Failed to write {}: {}", destination, e), e))?;
        digests.update(&chunk);
    }

    file.flush()
        .await
        .map_err(|e| MethodError::transfer(format!("Failed to flush {}: {}", destination, e), e))?;
    drop(file);
    drop(response);

    Ok(digests.finalize())
}

async fn discard_partial(destination: &Utf8Path) {
    match tokio::fs::remove_file(destination).await {
        Ok(()) => debug!("Removed partial file {}", destination),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {}", destination, e),
    }
}
