//! Line framing over an async byte stream

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::trace;

use super::{TelnetFilter, TransportError};

const READ_CHUNK: usize = 1024;

/// Reads `\n` terminated lines, dropping a trailing `\r`
///
/// Invalid UTF-8 is replaced rather than rejected.
pub struct LineReader<R> {
    reader: R,
    buffer: Vec<u8>,
    telnet: Option<(TelnetFilter, mpsc::UnboundedSender<Vec<u8>>)>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            telnet: None,
        }
    }

    /// Strip telnet negotiation and hand the refusals to `replies`
    pub fn with_telnet(mut self, replies: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        self.telnet = Some((TelnetFilter::new(), replies));
        self
    }

    /// Next line, or `None` once the peer closed the stream
    ///
    /// A final unterminated line is still returned before `None`.
    pub async fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = self.buffer.drain(..=end).collect();
                return Ok(Some(decode(&raw[..end])));
            }

            let n = self
                .reader
                .read(&mut chunk)
                .await
                .map_err(TransportError::ReceiveFailed)?;
            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let raw = std::mem::take(&mut self.buffer);
                return Ok(Some(decode(&raw)));
            }

            match &mut self.telnet {
                Some((filter, replies)) => {
                    let mut answer = Vec::new();
                    filter.filter(&chunk[..n], &mut self.buffer, &mut answer);
                    if !answer.is_empty() {
                        trace!(bytes = answer.len(), "Refusing telnet options");
                        // the writer is gone only when the session is ending
                        let _ = replies.send(answer);
                    }
                }
                None => self.buffer.extend_from_slice(&chunk[..n]),
            }
        }
    }
}

fn decode(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
