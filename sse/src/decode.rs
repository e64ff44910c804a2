//! Incremental decoder for the SSE wire format.
//!
//! Feeds on raw byte chunks as they arrive from the transport and emits
//! complete frames. Chunk boundaries carry no meaning: a frame may span
//! many chunks and one chunk may complete many frames, so the decoder
//! buffers until it sees a full line.
//!
//! Field handling follows the WHATWG event-stream grammar:
//! - `data:` lines accumulate and are joined with `\n` at dispatch
//! - `id:` updates the last event id, which is attached to every
//!   subsequent event and survives across frames
//! - `retry:` emits a reconnection-delay frame when the value is a
//!   well-formed integer (milliseconds), and is ignored otherwise
//! - lines starting with `:` are comments (used by servers as keep-alives)
//! - `event:` and unknown fields are ignored; the bridge forwards payloads
//!   opaquely and has no use for event names
//!
//! An event is dispatched on each empty line, but only if data accumulated;
//! an empty line after only `id:` or `event:` lines dispatches nothing.

use std::time::Duration;

/// A decoded SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// A complete event: accumulated data plus the current last event id.
    Event {
        /// Last event id observed at dispatch time, if any.
        id: Option<String>,
        /// Event data, multi-line values joined with `\n`.
        data: String,
    },
    /// A comment line, leading `:` and one optional space removed.
    Comment(String),
    /// A `retry:` directive, already converted from milliseconds.
    Retry(Duration),
}

/// Incremental SSE decoder.
///
/// Push bytes in with [`push`](SseDecoder::push); complete frames come out.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
    last_id: Option<String>,
    seen_first_line: bool,
}

impl SseDecoder {
    /// Create a fresh decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent event id observed on the stream, if any.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    /// Feed a chunk of bytes, returning every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop(); // the \n itself
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if !self.seen_first_line {
                self.seen_first_line = true;
                if line.starts_with(&[0xEF, 0xBB, 0xBF]) {
                    line.drain(..3);
                }
            }
            let line = String::from_utf8_lossy(&line).into_owned();
            self.process_line(&line, &mut frames);
        }
        frames
    }

    fn process_line(&mut self, line: &str, frames: &mut Vec<SseFrame>) {
        if line.is_empty() {
            if !self.data_lines.is_empty() {
                frames.push(SseFrame::Event {
                    id: self.last_id.clone(),
                    data: self.data_lines.join("\n"),
                });
                self.data_lines.clear();
            }
            return;
        }

        if let Some(comment) = line.strip_prefix(':') {
            frames.push(SseFrame::Comment(
                comment.strip_prefix(' ').unwrap_or(comment).to_string(),
            ));
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data_lines.push(value.to_string()),
            // An id containing NUL must be ignored per the grammar.
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            "retry" => {
                if let Ok(millis) = value.parse::<u64>() {
                    frames.push(SseFrame::Retry(Duration::from_millis(millis)));
                }
            }
            _ => {}
        }
    }
}
