/// SSE (Server-Sent Events) `data:` line parser and frame encoders.
///
/// Only `data: ` lines carry meaning for completion streams; every other
/// field (`event:`, `id:`, `retry:`, comments, blank separators) is skipped.
use memchr::memchr_iter;
use serde_json::Value;

use crate::protocol::chunk::ChoiceDelta;

/// Exact line prefix of a data field, including the single space.
pub const DATA_PREFIX: &str = "data: ";
/// Payload of the terminal event.
pub const DONE_MARKER: &str = "[DONE]";

const DONE_FRAME: &str = "data: [DONE]\n\n";

/// One unit produced by the frame parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// A non-empty content delta.
    Content(String),
    /// The `[DONE]` terminal marker.
    Done,
}

/// A `data:` payload that is not valid JSON.
#[derive(Debug, thiserror::Error)]
#[error("invalid SSE data payload: {source}")]
pub struct FrameParseError {
    payload: String,
    #[source]
    source: serde_json::Error,
}

impl FrameParseError {
    /// The offending payload text (after the `data: ` prefix).
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Parser output for one line: a chunk, or a reported (non-fatal) parse error.
pub type FrameResult = Result<StreamChunk, FrameParseError>;

// ---------------------------------------------------------------------------
// FrameParser: line-level state
// ---------------------------------------------------------------------------

/// Line-level parser.
///
/// Once `[DONE]` has been seen, later lines produce no chunks, but malformed
/// payloads after it are still reported.
#[derive(Debug, Default)]
pub struct FrameParser {
    done: bool,
}

impl FrameParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Parse one line (without its `\n`) and append its outcome, if any.
    pub fn parse_line_into(&mut self, line: &str, out: &mut Vec<FrameResult>) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };

        if payload == DONE_MARKER {
            if !self.done {
                self.done = true;
                out.push(Ok(StreamChunk::Done));
            }
            return;
        }

        let parsed: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(source) => {
                out.push(Err(FrameParseError {
                    payload: payload.to_string(),
                    source,
                }));
                return;
            }
        };

        if self.done {
            return;
        }
        if let Some(content) = ChoiceDelta::decode(&parsed).content() {
            out.push(Ok(StreamChunk::Content(content.to_string())));
        }
    }
}

/// Parse a complete text buffer into chunks and parse errors, in line order.
#[must_use]
pub fn parse_sse_chunk(buffer: &str) -> Vec<FrameResult> {
    let mut parser = FrameParser::new();
    let mut out = Vec::new();
    for line in buffer.split('\n') {
        parser.parse_line_into(line, &mut out);
    }
    out
}

// ---------------------------------------------------------------------------
// IncrementalFrameParser: buffers partial lines across reads
// ---------------------------------------------------------------------------

/// Incremental parser for text arriving in arbitrary pieces.
///
/// Complete lines are parsed as soon as their `\n` arrives; an unterminated
/// trailing line is held until more text arrives or [`finish_into`] is called.
///
/// [`finish_into`]: IncrementalFrameParser::finish_into
#[derive(Debug, Default)]
pub struct IncrementalFrameParser {
    buffer: String,
    read_offset: usize,
    frames: FrameParser,
}

impl IncrementalFrameParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.frames.is_done()
    }

    /// Feed decoded text and append results for every completed line.
    pub fn feed_into(&mut self, text: &str, out: &mut Vec<FrameResult>) {
        self.buffer.push_str(text);
        let mut processed_up_to = self.read_offset;
        let scan_start = processed_up_to;
        let bytes = self.buffer.as_bytes();
        for rel_pos in memchr_iter(b'\n', &bytes[scan_start..]) {
            let line_end = scan_start + rel_pos;
            self.frames
                .parse_line_into(&self.buffer[processed_up_to..line_end], out);
            processed_up_to = line_end + 1;
        }

        self.read_offset = processed_up_to;
        if self.read_offset == self.buffer.len() {
            self.buffer.clear();
            self.read_offset = 0;
            return;
        }
        let should_compact = self.read_offset > 0
            && (self.read_offset >= self.buffer.len() / 2 || self.read_offset >= 8 * 1024);
        if should_compact {
            self.buffer.drain(..self.read_offset);
            self.read_offset = 0;
        }
    }

    /// Parse whatever unterminated line is still buffered (end of stream).
    pub fn finish_into(&mut self, out: &mut Vec<FrameResult>) {
        if self.read_offset < self.buffer.len() {
            self.frames
                .parse_line_into(&self.buffer[self.read_offset..], out);
        }
        self.buffer.clear();
        self.read_offset = 0;
    }
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

/// Format an unnamed SSE data frame: `data: {json}\n\n`.
#[must_use]
pub fn data_frame(json: &str) -> String {
    let mut out = String::with_capacity(8 + json.len());
    out.push_str(DATA_PREFIX);
    out.push_str(json);
    out.push_str("\n\n");
    out
}

/// Format the terminal `[DONE]` frame.
#[must_use]
pub fn done_frame() -> String {
    DONE_FRAME.to_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
