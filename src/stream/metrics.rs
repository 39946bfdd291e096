use std::fmt;

use serde::{Deserialize, Serialize};

/// Characters per approximate token.
const CHARS_PER_TOKEN: f64 = 4.0;

/// Approximate token count of `content` (UTF-16 code units / 4, fractional).
#[must_use]
pub fn approx_tokens(content: &str) -> f64 {
    content.encode_utf16().count() as f64 / CHARS_PER_TOKEN
}

/// Latency and throughput of one completed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetrics {
    /// Time to first token, milliseconds.
    pub ttft_ms: u64,
    /// Submission to completion, milliseconds.
    pub response_time_ms: u64,
    /// Approximate tokens per second over the generation window.
    pub tps: f64,
}

impl fmt::Display for ResponseMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TTFT: {}ms RT: {:.2}s TPS: {:.2}",
            self.ttft_ms,
            self.response_time_ms as f64 / 1000.0,
            self.tps
        )
    }
}

/// Per-exchange accumulator. Timestamps are milliseconds from any fixed origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeMetrics {
    start_ms: u64,
    first_chunk_ms: Option<u64>,
    token_count: f64,
}

impl ExchangeMetrics {
    /// Reset state for a new submission at `now_ms`.
    #[must_use]
    pub fn start(now_ms: u64) -> Self {
        Self {
            start_ms: now_ms,
            first_chunk_ms: None,
            token_count: 0.0,
        }
    }

    pub fn record_chunk(&mut self, content: &str, now_ms: u64) {
        if self.first_chunk_ms.is_none() {
            self.first_chunk_ms = Some(now_ms);
        }
        self.token_count += approx_tokens(content);
    }

    #[must_use]
    pub fn token_count(&self) -> f64 {
        self.token_count
    }

    #[must_use]
    pub fn first_chunk_ms(&self) -> Option<u64> {
        self.first_chunk_ms
    }

    /// Final metrics at completion time, or `None` if no content ever arrived.
    #[must_use]
    pub fn finish(&self, now_ms: u64) -> Option<ResponseMetrics> {
        let first_chunk_ms = self.first_chunk_ms?;
        let generation_secs = now_ms.saturating_sub(first_chunk_ms) as f64 / 1000.0;
        let tps = if generation_secs > 0.0 {
            self.token_count / generation_secs
        } else {
            0.0
        };
        Some(ResponseMetrics {
            ttft_ms: first_chunk_ms.saturating_sub(self.start_ms),
            response_time_ms: now_ms.saturating_sub(self.start_ms),
            tps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_exchange() {
        let mut metrics = ExchangeMetrics::start(0);
        metrics.record_chunk(&"a".repeat(15), 100);
        metrics.record_chunk(&"b".repeat(25), 600);
        let result = metrics.finish(1100).unwrap();
        assert_eq!(result.ttft_ms, 100);
        assert_eq!(result.response_time_ms, 1100);
        assert!((result.tps - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_chunk_time_is_sticky() {
        let mut metrics = ExchangeMetrics::start(1_000);
        metrics.record_chunk("ab", 1_250);
        metrics.record_chunk("cd", 1_900);
        assert_eq!(metrics.first_chunk_ms(), Some(1_250));
        assert!((metrics.token_count() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_content_leaves_metrics_unattached() {
        let metrics = ExchangeMetrics::start(5);
        assert!(metrics.finish(500).is_none());
    }

    #[test]
    fn test_zero_generation_window_gives_zero_tps() {
        let mut metrics = ExchangeMetrics::start(0);
        metrics.record_chunk("hello", 40);
        let result = metrics.finish(40).unwrap();
        assert_eq!(result.tps, 0.0);
        assert_eq!(result.ttft_ms, 40);
    }

    #[test]
    fn test_token_proxy_counts_utf16_units() {
        assert!((approx_tokens("😄😄😄😄") - 2.0).abs() < 1e-9);
        assert!((approx_tokens("72°F") - 1.0).abs() < 1e-9);
        assert!((approx_tokens("abc") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_display() {
        let metrics = ResponseMetrics {
            ttft_ms: 120,
            response_time_ms: 2_346,
            tps: 31.257,
        };
        assert_eq!(metrics.to_string(), "TTFT: 120ms RT: 2.35s TPS: 31.26");
    }
}
