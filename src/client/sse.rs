//! Minimal server-sent-events decoding for the suggestion push channel.
//!
//! Handles the subset the service emits: `data:` and `event:` fields,
//! blank-line event dispatch, optional `\r\n` line endings, and fragments
//! split arbitrarily across transport chunks. Comment lines and unknown
//! fields are ignored.

use crate::models::PushEvent;

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk, returning every event it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<PushEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
            } else if let Some(value) = line.strip_prefix("event:") {
                self.event = Some(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
        }
        events
    }

    fn dispatch(&mut self) -> Option<PushEvent> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        match event.as_deref() {
            Some("close") | Some("closed") => Some(PushEvent::Closed),
            _ if data.is_empty() => None,
            _ => Some(PushEvent::Fragment(data.join("\n"))),
        }
    }
}
