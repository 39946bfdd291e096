use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

use super::decoder::Utf8StreamDecoder;
use super::sse::{FrameParseError, FrameResult, IncrementalFrameParser, StreamChunk};

/// Errors surfaced while aggregating a completion stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A malformed `data:` payload. Aggregation continues.
    #[error("Error parsing SSE data: {0}")]
    Parse(#[from] FrameParseError),
    /// The byte stream itself failed. Aggregation stops.
    #[error("Stream processing failed: {0}")]
    Transport(String),
}

impl StreamError {
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, StreamError::Transport(_))
    }
}

/// One step of an aggregated completion stream.
#[derive(Debug)]
pub enum StreamEvent {
    Content(String),
    Error(StreamError),
    /// Emitted exactly once, after `[DONE]` or at natural end of stream. Always last.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Reading,
    Finished,
}

/// Caller-driven aggregator over a byte stream of SSE text.
///
/// Each [`next_event`] call pulls from the underlying stream only when no
/// parsed events are pending. After the buffer holding `[DONE]` has been
/// parsed, or after a read error, the underlying stream is never polled again.
///
/// [`next_event`]: StreamAggregator::next_event
pub struct StreamAggregator<S> {
    reader: Pin<Box<S>>,
    decoder: Utf8StreamDecoder,
    parser: IncrementalFrameParser,
    parsed: Vec<FrameResult>,
    pending: VecDeque<StreamEvent>,
    phase: Phase,
}

impl<S, E> StreamAggregator<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: fmt::Display,
{
    #[must_use]
    pub fn new(reader: S) -> Self {
        Self {
            reader: Box::pin(reader),
            decoder: Utf8StreamDecoder::new(),
            parser: IncrementalFrameParser::new(),
            parsed: Vec::with_capacity(8),
            pending: VecDeque::with_capacity(8),
            phase: Phase::Reading,
        }
    }

    /// Next event, or `None` once the stream has completed or failed.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.phase == Phase::Finished {
                return None;
            }

            match self.reader.as_mut().next().await {
                Some(Ok(bytes)) => {
                    let text = self.decoder.decode(&bytes);
                    self.parser.feed_into(&text, &mut self.parsed);
                    self.drain_parsed();
                }
                Some(Err(err)) => {
                    self.phase = Phase::Finished;
                    return Some(StreamEvent::Error(StreamError::Transport(err.to_string())));
                }
                None => {
                    let tail = self.decoder.finish();
                    self.parser.feed_into(&tail, &mut self.parsed);
                    self.parser.finish_into(&mut self.parsed);
                    self.drain_parsed();
                    if self.phase == Phase::Reading {
                        self.phase = Phase::Finished;
                        self.pending.push_back(StreamEvent::Complete);
                    }
                }
            }
        }
    }

    fn drain_parsed(&mut self) {
        for result in self.parsed.drain(..) {
            match result {
                Ok(StreamChunk::Content(text)) => self.pending.push_back(StreamEvent::Content(text)),
                Ok(StreamChunk::Done) => {}
                Err(err) => self.pending.push_back(StreamEvent::Error(err.into())),
            }
        }
        if self.phase == Phase::Reading && self.parser.is_done() {
            self.phase = Phase::Finished;
            self.pending.push_back(StreamEvent::Complete);
        }
    }
}

impl<S, E> StreamAggregator<S>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    /// Expose the aggregator as a `Stream` of events.
    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send {
        futures_util::stream::unfold(self, |mut aggregator| async move {
            let event = aggregator.next_event().await?;
            Some((event, aggregator))
        })
    }
}

/// Callbacks for [`process_stream`]. Only `on_chunk` is required.
pub trait StreamHandler {
    fn on_chunk(&mut self, content: &str);

    fn on_error(&mut self, _error: &StreamError) {}

    fn on_complete(&mut self) {}
}

impl<F> StreamHandler for F
where
    F: FnMut(&str),
{
    fn on_chunk(&mut self, content: &str) {
        self(content);
    }
}

/// Drive `reader` to completion, dispatching every event to `handler`.
///
/// `on_complete` fires at most once. A read error fires `on_error` once and
/// nothing fires after it. Parse errors fire `on_error` and processing goes on.
pub async fn process_stream<S, E, H>(reader: S, handler: &mut H)
where
    S: Stream<Item = Result<Bytes, E>>,
    E: fmt::Display,
    H: StreamHandler + ?Sized,
{
    let mut aggregator = StreamAggregator::new(reader);
    while let Some(event) = aggregator.next_event().await {
        match event {
            StreamEvent::Content(text) => handler.on_chunk(&text),
            StreamEvent::Error(err) => {
                if err.is_fatal() {
                    tracing::error!(error = %err, "stream processing error");
                } else {
                    tracing::warn!(error = %err, "skipping malformed SSE data");
                }
                handler.on_error(&err);
            }
            StreamEvent::Complete => handler.on_complete(),
        }
    }
}
