// Server-sent event decoding for the telemetry feed
use crate::domain::errors::FeedError;
use bytes::{Buf, BytesMut};

/// Upper bound for one line and for the data of one event.
pub const MAX_EVENT_BYTES: usize = 1024 * 1024;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Incremental decoder for `text/event-stream` bodies.
///
/// Feed it network chunks in arrival order; it returns the `data` payload
/// of every complete event whose type is unset or `message`. Lines end in
/// LF, CRLF or a bare CR.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: BytesMut,
    // Bytes of `pending` already searched for a line terminator
    scanned: usize,
    // Last line ended in CR; a leading LF in the next chunk belongs to it
    skip_lf: bool,
    started: bool,
    data: Vec<String>,
    data_len: usize,
    event_type: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> Result<Vec<String>, FeedError> {
        self.pending.extend_from_slice(chunk);

        if !self.started {
            if self.pending.len() < BOM.len() && BOM.starts_with(&self.pending) {
                return Ok(Vec::new());
            }
            if self.pending.starts_with(BOM) {
                self.pending.advance(BOM.len());
            }
            self.started = true;
        }

        let mut events = Vec::new();
        loop {
            if self.skip_lf && !self.pending.is_empty() {
                if self.pending[0] == b'\n' {
                    self.pending.advance(1);
                }
                self.skip_lf = false;
            }

            let found = self.pending[self.scanned..]
                .iter()
                .position(|b| *b == b'\n' || *b == b'\r')
                .map(|i| i + self.scanned);

            let Some(end) = found else {
                self.scanned = self.pending.len();
                if self.pending.len() > MAX_EVENT_BYTES {
                    return Err(FeedError::Stream(format!(
                        "event stream line exceeds {} bytes",
                        MAX_EVENT_BYTES
                    )));
                }
                break;
            };

            let line = self.pending.split_to(end);
            self.skip_lf = self.pending[0] == b'\r';
            self.pending.advance(1);
            self.scanned = 0;

            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    fn process_line(&mut self, line: &str) -> Result<Option<String>, FeedError> {
        if line.is_empty() {
            return Ok(self.dispatch());
        }
        if line.starts_with(':') {
            return Ok(None);
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data_len += value.len() + 1;
                if self.data_len > MAX_EVENT_BYTES {
                    return Err(FeedError::Stream(format!(
                        "event stream event exceeds {} bytes",
                        MAX_EVENT_BYTES
                    )));
                }
                self.data.push(value.to_string());
            }
            "event" => self.event_type = Some(value.to_string()),
            // id and retry only matter for automatic reconnection, which is not used
            _ => {}
        }
        Ok(None)
    }

    fn dispatch(&mut self) -> Option<String> {
        let event_type = self.event_type.take();
        self.data_len = 0;
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();

        match event_type.as_deref() {
            None | Some("") | Some("message") => Some(payload),
            Some(other) => {
                tracing::debug!(event = other, "Skipping non-message feed event");
                None
            }
        }
    }
}
