//! Byte-level acquire protocol codec
//!
//! Frames are read from the front end's pipe one line at a time and written
//! back as complete blocks, flushed immediately so the front end never waits
//! on a buffered reply.

use std::io::ErrorKind;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use spacewalk_client::{ClientResult, FrameSink};
use spacewalk_core::error::{MethodError, MethodResult};
use spacewalk_core::types::Frame;

/// Reads frames from the front end
pub struct FrameReader<R> {
    reader: R,
    line: String,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }

    /// Read the next frame.
    ///
    /// Returns `None` when the input closes before a new frame starts. A
    /// frame cut short by end of input is returned as read so far.
    pub async fn read_frame(&mut self) -> MethodResult<Option<Frame>> {
        // Blank lines between frames carry nothing
        let status_line = loop {
            match self.next_line().await? {
                None => return Ok(None),
                Some(line) if line.is_empty() => continue,
                Some(line) => break line,
            }
        };

        let mut frame = parse_status_line(&status_line)?;
        while let Some(line) = self.next_line().await? {
            if line.is_empty() {
                trace!("Read frame {} with {} fields", frame.code, frame.field_count());
                return Ok(Some(frame));
            }
            let (name, value) = parse_field_line(&line)?;
            frame.set_field(name, value);
        }

        debug!("Input closed inside frame {}", frame.code);
        Ok(Some(frame))
    }

    /// Next line without its terminator, `None` at end of input
    async fn next_line(&mut self) -> MethodResult<Option<String>> {
        self.line.clear();
        let read = self
            .reader
            .read_line(&mut self.line)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidData => MethodError::Protocol {
                    message: format!("input is not valid UTF-8: {}", e),
                },
                _ => MethodError::io("Failed to read from the front end".to_string(), e),
            })?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(self.line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

fn parse_status_line(line: &str) -> MethodResult<Frame> {
    let (code, text) = line.split_once(' ').unwrap_or((line, ""));
    let code = code.parse::<u16>().map_err(|_| MethodError::Protocol {
        message: format!("invalid message code in '{}'", line),
    })?;
    Ok(Frame::new(code, text.trim()))
}

fn parse_field_line(line: &str) -> MethodResult<(&str, &str)> {
    let (name, value) = line.split_once(':').ok_or_else(|| MethodError::Protocol {
        message: format!("header line without ':' in '{}'", line),
    })?;
    Ok((name.trim(), value.trim()))
}

/// Writes frames to the front end
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.writer
    }

    /// Write one frame and flush it
    pub async fn write_frame(&mut self, frame: &Frame) -> MethodResult<()> {
        trace!("Writing frame {} {}", frame.code, frame.text);
        self.writer
            .write_all(render(frame).as_bytes())
            .await
            .map_err(|e| MethodError::io("Failed to write to the front end".to_string(), e))?;
        self.writer
            .flush()
            .await
            .map_err(|e| MethodError::io("Failed to flush output".to_string(), e))
    }
}

impl<W: AsyncWrite + Unpin> FrameSink for FrameWriter<W> {
    async fn send(&mut self, frame: Frame) -> ClientResult<()> {
        self.write_frame(&frame).await
    }
}

/// Wire form of a frame, including the terminating blank line
pub fn render(frame: &Frame) -> String {
    let mut out = format!("{} {}\n", frame.code, frame.text);
    for (name, value) in frame.fields() {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests;
