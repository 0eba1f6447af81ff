//! Server-Sent Events framing.
//!
//! Splits a byte stream into frames on blank lines and yields the payload of
//! each frame's `data:` lines. Bytes are buffered until a frame is complete,
//! so frames and multi-byte characters may be split across chunks.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tracing::warn;

/// Byte stream as produced by `reqwest::Response::bytes_stream`
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Yields the `data:` payload of each SSE frame
pub struct SseDataStream {
    inner: ByteStream,
    buffer: Vec<u8>,
    done: bool,
}

impl SseDataStream {
    /// Frame `stream`
    pub fn new(stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(stream),
            buffer: Vec::new(),
            done: false,
        }
    }

    fn next_frame(&mut self) -> Option<String> {
        let (end, separator_len) = find_frame_end(&self.buffer)?;
        let frame: Vec<u8> = self.buffer.drain(..end + separator_len).take(end).collect();
        Some(String::from_utf8_lossy(&frame).into_owned())
    }
}

impl Stream for SseDataStream {
    type Item = Result<String, reqwest::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            while let Some(frame) = self.next_frame() {
                if let Some(data) = frame_data(&frame) {
                    return Poll::Ready(Some(Ok(data)));
                }
            }

            if self.done {
                return Poll::Ready(None);
            }

            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => self.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(err))) => return Poll::Ready(Some(Err(err))),
                Poll::Ready(None) => {
                    self.done = true;
                    let rest = std::mem::take(&mut self.buffer);
                    let rest = String::from_utf8_lossy(&rest);
                    if let Some(data) = frame_data(&rest) {
                        return Poll::Ready(Some(Ok(data)));
                    }
                    if !rest.trim().is_empty() {
                        warn!("SSE stream ended with an incomplete frame: {}", rest.trim());
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Position of the first blank-line separator and its length
fn find_frame_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Concatenated `data:` lines of one frame, or `None` for frames without
/// data (comments, bare `event:` lines, keep-alives)
pub fn frame_data(frame: &str) -> Option<String> {
    let lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data).trim_end_matches('\r'))
        .collect();

    if lines.is_empty() {
        return None;
    }

    let data = lines.join("\n");
    if data.trim().is_empty() {
        return None;
    }
    Some(data)
}
