//! Event stream
//!
//! `GET /event` is a server-sent-event stream with one JSON event per
//! `data:` block.

use std::collections::VecDeque;

use reqwest::Response;
use tracing::{debug, warn};

use super::events::HostEvent;
use super::HostError;

/// Incremental SSE framing. Bytes go in, complete `data` payloads come out.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every payload it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);

            if line.is_empty() {
                if !self.data.is_empty() {
                    out.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
                None => (&*line, ""),
            };
            if field == "data" {
                self.data.push(value.to_string());
            }
        }
        out
    }
}

/// Live subscription to the host event bus
pub struct EventSubscription {
    response: Response,
    decoder: SseDecoder,
    pending: VecDeque<String>,
}

impl EventSubscription {
    pub(crate) fn new(response: Response) -> Self {
        Self {
            response,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
        }
    }

    /// Next decodable event, `None` once the host closes the stream.
    /// Payloads that fail to decode are logged and skipped.
    pub async fn next_event(&mut self) -> Result<Option<HostEvent>, HostError> {
        loop {
            while let Some(payload) = self.pending.pop_front() {
                match HostEvent::parse(&payload) {
                    Ok(event) => return Ok(Some(event)),
                    Err(e) => warn!(error = %e, "Skipping undecodable event"),
                }
            }

            match self.response.chunk().await {
                Ok(Some(chunk)) => self.pending.extend(self.decoder.push(&chunk)),
                Ok(None) => {
                    debug!("Event stream closed");
                    return Ok(None);
                }
                Err(e) => return Err(HostError::Stream(e.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b"data: {\"type\":\"session.idle\"}\n\n");
        assert_eq!(out, vec!["{\"type\":\"session.idle\"}"]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"type\":").is_empty());
        assert!(decoder.push(b"\"a\"}\r\n").is_empty());
        assert_eq!(decoder.push(b"\r\n"), vec!["{\"type\":\"a\"}"]);
    }

    #[test]
    fn test_multiline_data_and_comments() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b": keepalive\nevent: message\ndata: one\ndata:two\n\ndata: three\n\n");
        assert_eq!(out, vec!["one\ntwo", "three"]);
    }

    #[test]
    fn test_multibyte_split_is_preserved() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: ■ done\n\n".as_bytes();
        let (a, b) = bytes.split_at(7);
        assert!(decoder.push(a).is_empty());
        assert_eq!(decoder.push(b), vec!["■ done"]);
    }

    #[test]
    fn test_blank_lines_without_data_emit_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"\n\n\n").is_empty());
    }
}
