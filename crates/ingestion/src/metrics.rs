//! Source metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics shared by the source task and its owner
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Total messages handed to the channel
    pub messages_received: AtomicU64,

    /// Lines that could not be parsed
    pub parse_errors: AtomicU64,

    /// Blank lines skipped
    pub blank_lines: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record message received
    pub fn record_received(&self, source: &str) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("chat_relay_source_messages_total", "source" => source.to_string())
            .increment(1);
    }

    /// Record parse error
    pub fn record_parse_error(&self, source: &str) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("chat_relay_source_parse_errors_total", "source" => source.to_string())
            .increment(1);
    }

    /// Record blank line
    pub fn record_blank(&self) {
        self.blank_lines.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            blank_lines: self.blank_lines.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub parse_errors: u64,
    pub blank_lines: u64,
}
