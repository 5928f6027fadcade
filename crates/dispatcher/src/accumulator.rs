//! Block accumulator - drains the pending queue into the shared block

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, trace};

use crate::block::{AppendOutcome, BlockBuffer};
use crate::metrics::BatcherMetrics;
use crate::queue::PendingQueue;

/// Consumer loop packing fragments into the block
pub struct BlockAccumulator {
    queue: Arc<PendingQueue>,
    block: Arc<BlockBuffer>,
    metrics: Arc<BatcherMetrics>,
    /// Bounded wait while the queue is empty
    idle_wait: Duration,
    /// Pause while the block is too full for the head fragment
    backoff: Duration,
}

impl BlockAccumulator {
    pub fn new(
        queue: Arc<PendingQueue>,
        block: Arc<BlockBuffer>,
        metrics: Arc<BatcherMetrics>,
        idle_wait: Duration,
        backoff: Duration,
    ) -> Self {
        Self {
            queue,
            block,
            metrics,
            idle_wait,
            backoff,
        }
    }

    /// Try to move the head fragment into the block
    ///
    /// Peek, append and pop happen under the queue lock, so the head can
    /// neither change nor be taken twice. Starved fragments are consumed.
    pub fn step(&self) -> Option<AppendOutcome> {
        self.queue.with_front(|fragment| {
            let outcome = self.block.try_append(fragment);
            let consumed = !matches!(outcome, AppendOutcome::WouldOverflow);
            (outcome, consumed)
        })
    }

    /// Run until cancelled
    #[instrument(name = "block_accumulator_loop", skip(self, cancel))]
    pub async fn run(self, cancel: CancellationToken) {
        debug!(max_block = self.block.max_len(), "Block accumulator started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.step() {
                None => {
                    self.metrics.set_queue_len(0);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = self.queue.wait_non_empty(self.idle_wait) => {}
                    }
                }
                Some(AppendOutcome::Appended { block_len }) => {
                    self.metrics.set_queue_len(self.queue.len());
                    trace!(block_len, "Fragment appended");
                }
                Some(AppendOutcome::WouldOverflow) => {
                    trace!(
                        block_len = self.block.char_len(),
                        "Block full, waiting for flush"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.backoff) => {}
                    }
                }
                Some(AppendOutcome::Starved { length }) => {
                    self.metrics.inc_starved_fragments();
                    observability::record_starved_fragment(length);
                    error!(
                        length,
                        max_block = self.block.max_len(),
                        "Starved fragment can never fit a block, dropped"
                    );
                }
            }
        }

        debug!("Block accumulator stopped");
    }
}
