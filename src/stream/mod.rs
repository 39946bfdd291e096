//! Client-side streaming pipeline: bytes -> text -> SSE chunks -> events.

pub mod aggregator;
pub mod decoder;
pub mod metrics;
pub mod sse;

pub use aggregator::{process_stream, StreamAggregator, StreamError, StreamEvent, StreamHandler};
pub use decoder::Utf8StreamDecoder;
pub use metrics::{ExchangeMetrics, ResponseMetrics};
pub use sse::{parse_sse_chunk, FrameParseError, FrameResult, IncrementalFrameParser, StreamChunk};
