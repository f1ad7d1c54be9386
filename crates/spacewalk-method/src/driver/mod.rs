//! Acquire method main loop
//!
//! Announces capabilities, then serves `600 URI Acquire` requests one at a
//! time until the front end closes the pipe. Failures of a single request
//! are reported as `400 URI Failure` and never end the loop.

use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use spacewalk_client::{AuthService, FetchEngine, Session};
use spacewalk_core::error::{MethodError, MethodResult};
use spacewalk_core::types::{FetchRequest, Frame, MessageCode};

use crate::protocol::{FrameReader, FrameWriter};

/// Input ended normally
pub const EXIT_SUCCESS: i32 = 0;

/// Startup failed (configuration, TLS setup, runtime)
pub const EXIT_FATAL: i32 = 1;

/// The front end sent a message the method does not understand
pub const EXIT_UNEXPECTED_MESSAGE: i32 = 100;

/// Process exit code for the outcome of [`AcquireMethod::run`]
pub fn exit_code(outcome: MethodResult<i32>) -> i32 {
    match outcome {
        Ok(code) => code,
        Err(err) => {
            error!("Cannot continue: {}", err);
            EXIT_FATAL
        }
    }
}

/// What the loop does after a frame has been handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop(i32),
}

/// An acquire method bound to its input, output and session
pub struct AcquireMethod<R, W, A> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    session: Session<A>,
    engine: FetchEngine,
}

impl<R, W, A> AcquireMethod<R, W, A>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    A: AuthService,
{
    pub fn new(input: R, output: W, session: Session<A>) -> Self {
        Self {
            reader: FrameReader::new(input),
            writer: FrameWriter::new(output),
            session,
            engine: FetchEngine::new(),
        }
    }

    /// Run until end of input or an unexpected message; returns the exit code.
    ///
    /// The connection is opened before capabilities are announced, so TLS
    /// setup errors end the process before any request is read. Other
    /// errors are failures of the pipe itself.
    pub async fn run(&mut self) -> MethodResult<i32> {
        self.session.ensure_connection().await?;
        self.writer.write_frame(&Frame::capabilities()).await?;

        let code = loop {
            let flow = match self.reader.read_frame().await {
                Ok(Some(frame)) => self.handle_frame(frame).await?,
                Ok(None) => {
                    debug!("End of input");
                    Flow::Stop(EXIT_SUCCESS)
                }
                Err(err @ MethodError::Protocol { .. }) => {
                    error!("Unreadable message from the front end: {}", err);
                    Flow::Stop(EXIT_UNEXPECTED_MESSAGE)
                }
                Err(err) => {
                    self.session.close();
                    return Err(err);
                }
            };

            if let Flow::Stop(code) = flow {
                break code;
            }
        };

        self.session.close();
        Ok(code)
    }

    /// Dispatch one frame from the front end
    pub async fn handle_frame(&mut self, frame: Frame) -> MethodResult<Flow> {
        match frame.message_code() {
            Some(MessageCode::UriAcquire) => {
                self.acquire(&frame).await?;
                Ok(Flow::Continue)
            }
            _ => {
                error!("Unexpected message {} {}", frame.code, frame.text);
                Ok(Flow::Stop(EXIT_UNEXPECTED_MESSAGE))
            }
        }
    }

    /// Serve one acquire request and answer with `201` or `400`
    async fn acquire(&mut self, frame: &Frame) -> MethodResult<()> {
        let request = match FetchRequest::from_frame(frame) {
            Ok(request) => request,
            Err(err) => {
                warn!("Rejected acquire request: {}", err);
                return self
                    .writer
                    .write_frame(&Frame::uri_failure(frame.field("URI"), &err))
                    .await;
            }
        };

        let reply = match self
            .engine
            .fetch(&mut self.session, &request, &mut self.writer)
            .await
        {
            Ok(result) => {
                info!("Fetched {} ({} bytes)", request.uri, result.size);
                Frame::uri_done(&request, &result)
            }
            Err(err) => {
                warn!("Failed to fetch {}: {}", request.uri, err);
                Frame::uri_failure(Some(request.uri.as_str()), &err)
            }
        };
        self.writer.write_frame(&reply).await
    }
}

#[cfg(test)]
mod tests;
