//! Batcher metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Metrics shared by the batcher handle and its two loops
#[derive(Debug, Default)]
pub struct BatcherMetrics {
    /// Current pending queue length
    queue_len: AtomicUsize,
    /// Total fragments accepted by enqueue
    fragments_enqueued: AtomicU64,
    /// Total blocks handed to the sink successfully
    blocks_sent: AtomicU64,
    /// Total chars in successfully sent blocks
    chars_sent: AtomicU64,
    /// Blocks at or above the big-message threshold
    big_blocks: AtomicU64,
    /// Total sink failures
    sink_failures: AtomicU64,
    /// Fragments dropped because they could never fit a block
    starved_fragments: AtomicU64,
    /// Delay chosen after the latest flush, in milliseconds
    last_delay_ms: AtomicU64,
}

impl BatcherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn fragments_enqueued(&self) -> u64 {
        self.fragments_enqueued.load(Ordering::Relaxed)
    }

    pub fn add_fragments_enqueued(&self, count: usize) {
        self.fragments_enqueued
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn blocks_sent(&self) -> u64 {
        self.blocks_sent.load(Ordering::Relaxed)
    }

    pub fn chars_sent(&self) -> u64 {
        self.chars_sent.load(Ordering::Relaxed)
    }

    /// Record one successful send of `chars` chars
    pub fn record_sent(&self, chars: usize, big: bool) {
        self.blocks_sent.fetch_add(1, Ordering::Relaxed);
        self.chars_sent.fetch_add(chars as u64, Ordering::Relaxed);
        if big {
            self.big_blocks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn big_blocks(&self) -> u64 {
        self.big_blocks.load(Ordering::Relaxed)
    }

    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    pub fn inc_sink_failures(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn starved_fragments(&self) -> u64 {
        self.starved_fragments.load(Ordering::Relaxed)
    }

    pub fn inc_starved_fragments(&self) {
        self.starved_fragments.fetch_add(1, Ordering::Relaxed);
    }

    /// Delay chosen after the latest flush (zero before the first flush)
    pub fn last_delay(&self) -> Duration {
        Duration::from_millis(self.last_delay_ms.load(Ordering::Relaxed))
    }

    pub fn set_last_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.last_delay_ms.store(millis, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            fragments_enqueued: self.fragments_enqueued(),
            blocks_sent: self.blocks_sent(),
            chars_sent: self.chars_sent(),
            big_blocks: self.big_blocks(),
            sink_failures: self.sink_failures(),
            starved_fragments: self.starved_fragments(),
            last_delay: self.last_delay(),
        }
    }
}

/// Snapshot of batcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub fragments_enqueued: u64,
    pub blocks_sent: u64,
    pub chars_sent: u64,
    pub big_blocks: u64,
    pub sink_failures: u64,
    pub starved_fragments: u64,
    pub last_delay: Duration,
}
