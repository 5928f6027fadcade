//! Dispatch timer - flushes the block to the sink on a size-dependent cadence

use std::sync::Arc;
use std::time::Duration;

use contracts::{BatchingConfig, TextSink};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

use crate::block::BlockBuffer;
use crate::metrics::BatcherMetrics;

/// Delay policy between flushes
///
/// The delay depends on the block that was just sent, not on the one
/// accumulating next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub msg_delay: Duration,
    pub big_msg_delay: Duration,
    pub big_msg_length: usize,
}

impl Cadence {
    pub fn from_config(config: &BatchingConfig) -> Self {
        Self {
            msg_delay: config.msg_delay(),
            big_msg_delay: config.big_msg_delay(),
            big_msg_length: config.big_msg_length,
        }
    }

    /// Whether a block of `sent_len` chars counts as big
    pub fn is_big(&self, sent_len: usize) -> bool {
        sent_len >= self.big_msg_length
    }

    /// Delay to wait after sending `sent_len` chars
    pub fn next_delay(&self, sent_len: usize) -> Duration {
        if self.is_big(sent_len) {
            self.big_msg_delay
        } else {
            self.msg_delay
        }
    }
}

/// Periodic flush loop owning the sink
pub struct DispatchTimer<S> {
    sink: S,
    block: Arc<BlockBuffer>,
    cadence: Cadence,
    metrics: Arc<BatcherMetrics>,
}

impl<S: TextSink> DispatchTimer<S> {
    pub fn new(
        sink: S,
        block: Arc<BlockBuffer>,
        cadence: Cadence,
        metrics: Arc<BatcherMetrics>,
    ) -> Self {
        Self {
            sink,
            block,
            cadence,
            metrics,
        }
    }

    /// Swap out the block, send it if non-empty, return the next delay
    ///
    /// Sink errors are recorded and swallowed so the loop keeps running.
    pub async fn flush_once(&mut self) -> Duration {
        let text = self.block.take();
        let sent_len = text.chars().count();

        if !text.is_empty() {
            match self.sink.send(&text).await {
                Ok(()) => {
                    let big = self.cadence.is_big(sent_len);
                    self.metrics.record_sent(sent_len, big);
                    debug!(sink = %self.sink.name(), chars = sent_len, big, "Block sent");
                }
                Err(e) => {
                    self.metrics.inc_sink_failures();
                    observability::record_sink_failure(self.sink.name());
                    error!(
                        sink = %self.sink.name(),
                        chars = sent_len,
                        error = %e,
                        "Send failed"
                    );
                    // Continue processing - a downstream outage must not halt batching
                }
            }
        }

        let delay = self.cadence.next_delay(sent_len);
        self.metrics.set_last_delay(delay);
        if !text.is_empty() {
            observability::record_block_flushed(sent_len, delay);
        }
        delay
    }

    /// Run until cancelled, then close the sink
    #[instrument(
        name = "dispatch_timer_loop",
        skip(self, cancel),
        fields(sink = %self.sink.name())
    )]
    pub async fn run(mut self, cancel: CancellationToken) {
        debug!(cadence = ?self.cadence, "Dispatch timer started");

        loop {
            let delay = self.flush_once().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let discarded = self.block.take();
        if !discarded.is_empty() {
            debug!(chars = discarded.chars().count(), "Partial block discarded");
        }
        if let Err(e) = self.sink.close().await {
            error!(sink = %self.sink.name(), error = %e, "Close failed on shutdown");
        }

        debug!("Dispatch timer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, Fragment};
    use std::sync::Mutex;

    /// Mock sink for testing
    struct MockSink {
        sent: Arc<Mutex<Vec<String>>>,
        should_fail: bool,
    }

    impl TextSink for MockSink {
        fn name(&self) -> &str {
            "mock"
        }

        async fn send(&mut self, text: &str) -> Result<(), ContractError> {
            if self.should_fail {
                return Err(ContractError::sink_failure("mock", "mock failure"));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn timer(should_fail: bool) -> (DispatchTimer<MockSink>, Arc<BlockBuffer>, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let block = Arc::new(BlockBuffer::new(144));
        let timer = DispatchTimer::new(
            MockSink {
                sent: Arc::clone(&sent),
                should_fail,
            },
            Arc::clone(&block),
            Cadence::from_config(&BatchingConfig::default()),
            Arc::new(BatcherMetrics::new()),
        );
        (timer, block, sent)
    }

    #[test]
    fn test_cadence_threshold() {
        let cadence = Cadence::from_config(&BatchingConfig::default());
        assert_eq!(cadence.next_delay(0), Duration::from_millis(1500));
        assert_eq!(cadence.next_delay(99), Duration::from_millis(1500));
        assert_eq!(cadence.next_delay(100), Duration::from_secs(3));
        assert_eq!(cadence.next_delay(144), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_idle_flush_sends_nothing() {
        let (mut timer, _block, sent) = timer(false);
        for _ in 0..5 {
            assert_eq!(timer.flush_once().await, Duration::from_millis(1500));
        }
        assert!(sent.lock().unwrap().is_empty());
        assert_eq!(timer.metrics.blocks_sent(), 0);
    }

    #[tokio::test]
    async fn test_big_block_selects_big_delay() {
        let (mut timer, block, sent) = timer(false);

        block.try_append(&Fragment::new("x".repeat(120)));
        assert_eq!(timer.flush_once().await, Duration::from_secs(3));
        assert_eq!(timer.metrics.last_delay(), Duration::from_secs(3));

        block.try_append(&Fragment::new("small"));
        assert_eq!(timer.flush_once().await, Duration::from_millis(1500));
        assert_eq!(timer.metrics.last_delay(), Duration::from_millis(1500));

        assert_eq!(sent.lock().unwrap().len(), 2);
        assert_eq!(timer.metrics.big_blocks(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_recorded_and_block_cleared() {
        let (mut timer, block, _sent) = timer(true);

        block.try_append(&Fragment::new("lost"));
        timer.flush_once().await;
        assert_eq!(timer.metrics.sink_failures(), 1);
        assert!(block.is_empty());

        // Next cycle still runs
        block.try_append(&Fragment::new("again"));
        timer.flush_once().await;
        assert_eq!(timer.metrics.sink_failures(), 2);
    }
}
