//! Relay statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::RelayMetricsAggregator;

/// Why the relay loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// The chat source closed (EOF or mock limit)
    #[default]
    EndOfInput,
    /// `--max-messages` reached
    MaxMessages,
    /// `--timeout` elapsed
    Timeout,
    /// Ctrl+C / SIGTERM
    Signal,
}

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Chat source name
    pub source: String,

    /// Why the loop ended
    pub stop_reason: StopReason,

    /// Total duration of the run
    pub duration: Duration,

    /// Number of configured sinks
    pub active_sinks: usize,

    /// Per-message aggregation
    pub relay: RelayMetricsAggregator,

    /// Batcher counters at shutdown
    pub batcher: MetricsSnapshot,

    /// Chat source counters at shutdown
    pub ingestion: ingestion::MetricsSnapshot,
}

impl PipelineStats {
    /// Relayed messages per minute
    pub fn messages_per_minute(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.relay.relayed as f64 * 60.0 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Average chars per sent block
    pub fn avg_block_chars(&self) -> f64 {
        if self.batcher.blocks_sent > 0 {
            self.batcher.chars_sent as f64 / self.batcher.blocks_sent as f64
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Relay Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Source: {} ({:?})", self.source, self.stop_reason);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Lines parsed: {}", self.ingestion.messages_received);
        println!("   ├─ Parse errors: {}", self.ingestion.parse_errors);
        println!("   ├─ Messages/min: {:.1}", self.messages_per_minute());
        println!("   └─ Active sinks: {}", self.active_sinks);

        let summary = self.relay.summary();

        println!("\n💬 Messages");
        println!("   ├─ Relayed: {} ({:.2}%)", summary.relayed, summary.relay_rate);
        println!("   ├─ Skipped (echo): {}", summary.skipped);
        println!("   ├─ Rejected: {}", summary.rejected);
        println!("   ├─ Fragments: {}", summary.fragments);
        println!("   └─ Length (chars): {}", summary.message_chars);

        println!("\n📤 Dispatch");
        println!("   ├─ Blocks sent: {}", self.batcher.blocks_sent);
        println!("   ├─ Big blocks: {}", self.batcher.big_blocks);
        println!("   ├─ Avg block chars: {:.1}", self.avg_block_chars());
        println!("   ├─ Sink failures: {}", self.batcher.sink_failures);
        println!("   └─ Undelivered fragments: {}", self.batcher.queue_len);

        if !summary.top_authors.is_empty() {
            println!("\n🏆 Top Authors");
            for (author, count) in &summary.top_authors {
                println!("   ├─ {}: {}", author, count);
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let mut stats = PipelineStats {
            duration: Duration::from_secs(30),
            ..Default::default()
        };
        stats.relay.relayed = 10;
        stats.batcher.blocks_sent = 4;
        stats.batcher.chars_sent = 200;

        assert!((stats.messages_per_minute() - 20.0).abs() < 1e-9);
        assert!((stats.avg_block_chars() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rates_zero_safe() {
        let stats = PipelineStats::default();
        assert_eq!(stats.messages_per_minute(), 0.0);
        assert_eq!(stats.avg_block_chars(), 0.0);
    }
}
