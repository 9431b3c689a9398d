//! Request-scoped generation counters and the metrics derived from them.
//!
//! All times are integer milliseconds on the session clock. The counters are
//! reset at the start of every request and updated once per engine event;
//! [`MetricsSnapshot`] is computed on demand and never stored.

pub mod performance;

pub use performance::SessionClock;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// The four scalar counters tracked for the current request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationCounters {
    /// Clock reading when the request started
    pub start_time: i64,
    /// Elapsed milliseconds from start to the first engine event
    pub first_token_time: i64,
    /// Clock reading of the most recent engine event
    pub last_token_time: i64,
    /// Engine events observed since the last reset
    pub token_count: u64,
}

impl GenerationCounters {
    /// Clear all counters and mark `now` as the request start.
    pub fn reset(&mut self, now: i64) {
        *self = Self {
            start_time: now,
            ..Self::default()
        };
    }

    /// Account for one engine event observed at `now`.
    pub fn record_event(&mut self, now: i64) {
        if self.token_count == 0 {
            self.first_token_time = now - self.start_time;
        }
        self.last_token_time = now;
        self.token_count += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let latency = self.last_token_time - self.start_time;
        let throughput = if latency > 0 {
            self.token_count as f64 * 1000.0 / latency as f64
        } else {
            0.0
        };
        let tpot = if self.token_count > 1 {
            (latency - self.first_token_time) / (self.token_count as i64 - 1)
        } else {
            0
        };

        MetricsSnapshot {
            ttft_ms: self.first_token_time,
            tpot_ms: tpot,
            latency_ms: latency,
            throughput,
            token_count: self.token_count,
        }
    }
}

/// Performance figures for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Time to first token
    pub ttft_ms: i64,
    /// Average inter-token time, excluding the first token
    pub tpot_ms: i64,
    /// Request start to last token
    pub latency_ms: i64,
    /// Tokens per second over the whole request
    pub throughput: f64,
    pub token_count: u64,
}

impl MetricsSnapshot {
    /// Pretty-printed JSON form, used by machine-readable output.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\nTTFT: {}ms\nTPOT: {}ms\nLatency: {}ms\nThroughput: {:.2} tokens/sec",
            self.ttft_ms, self.tpot_ms, self.latency_ms, self.throughput
        )
    }
}
