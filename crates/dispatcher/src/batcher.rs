//! Batcher - public entry point owning the accumulator and timer tasks

use std::sync::Arc;

use contracts::{BatchingConfig, ContractError, Fragment, TextSink};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::accumulator::BlockAccumulator;
use crate::block::BlockBuffer;
use crate::chunker::chunk;
use crate::error::DispatcherError;
use crate::metrics::BatcherMetrics;
use crate::queue::PendingQueue;
use crate::timer::{Cadence, DispatchTimer};

/// Handle to a running batcher
///
/// `submit` never blocks; the two background tasks run until `shutdown`
/// or until the cancellation token fires.
pub struct Batcher {
    config: BatchingConfig,
    sink_name: String,
    queue: Arc<PendingQueue>,
    block: Arc<BlockBuffer>,
    metrics: Arc<BatcherMetrics>,
    cancel: CancellationToken,
    accumulator_handle: JoinHandle<()>,
    timer_handle: JoinHandle<()>,
}

impl Batcher {
    /// Validate the configuration and spawn both loops
    ///
    /// # Errors
    /// `InvalidConfiguration` if any bound is invalid; nothing is spawned then.
    pub fn spawn<S: TextSink + 'static>(
        config: BatchingConfig,
        sink: S,
    ) -> Result<Self, DispatcherError> {
        Self::spawn_with_token(config, sink, CancellationToken::new())
    }

    /// Like [`Batcher::spawn`], stopping when `cancel` fires
    #[instrument(
        name = "batcher_spawn",
        skip(config, sink, cancel),
        fields(sink = %sink.name())
    )]
    pub fn spawn_with_token<S: TextSink + 'static>(
        config: BatchingConfig,
        sink: S,
        cancel: CancellationToken,
    ) -> Result<Self, DispatcherError> {
        config.validate()?;

        let sink_name = sink.name().to_string();
        let queue = Arc::new(PendingQueue::new());
        let block = Arc::new(BlockBuffer::new(config.max_block_length));
        let metrics = Arc::new(BatcherMetrics::new());

        let accumulator = BlockAccumulator::new(
            Arc::clone(&queue),
            Arc::clone(&block),
            Arc::clone(&metrics),
            config.idle_wait(),
            config.backoff(),
        );
        let timer = DispatchTimer::new(
            sink,
            Arc::clone(&block),
            Cadence::from_config(&config),
            Arc::clone(&metrics),
        );

        let accumulator_handle = tokio::spawn(accumulator.run(cancel.clone()));
        let timer_handle = tokio::spawn(timer.run(cancel.clone()));

        info!(
            max_fragment = config.max_fragment_length,
            max_block = config.max_block_length,
            msg_delay_s = config.msg_delay_s,
            big_msg_delay_s = config.big_msg_delay_s,
            big_msg_length = config.big_msg_length,
            "Batcher started"
        );

        Ok(Self {
            config,
            sink_name,
            queue,
            block,
            metrics,
            cancel,
            accumulator_handle,
            timer_handle,
        })
    }

    /// Chunk `message` and enqueue the fragments
    ///
    /// Returns the number of fragments enqueued (zero for an empty message).
    pub fn submit(&self, message: &str) -> Result<usize, DispatcherError> {
        let fragments = chunk(message, self.config.max_fragment_length)?;
        self.enqueue(fragments)
    }

    /// Enqueue pre-built fragments atomically and in order
    ///
    /// # Errors
    /// - `StarvedFragment` if any fragment is longer than the block bound
    ///   (nothing is enqueued then)
    /// - `ShutDown` once the batcher was cancelled
    pub fn enqueue(&self, fragments: Vec<Fragment>) -> Result<usize, DispatcherError> {
        if self.cancel.is_cancelled() {
            return Err(DispatcherError::ShutDown);
        }

        let max = self.config.max_block_length;
        if let Some(oversized) = fragments.iter().find(|f| f.char_len() > max) {
            return Err(ContractError::StarvedFragment {
                length: oversized.char_len(),
                max,
            }
            .into());
        }

        let fragments: Vec<Fragment> = fragments.into_iter().filter(|f| !f.is_empty()).collect();
        let count = fragments.len();
        if count == 0 {
            return Ok(0);
        }

        let queue_len = self.queue.enqueue(fragments);
        self.metrics.add_fragments_enqueued(count);
        self.metrics.set_queue_len(queue_len);
        observability::record_fragments_enqueued(count, queue_len);

        Ok(count)
    }

    pub fn config(&self) -> &BatchingConfig {
        &self.config
    }

    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<BatcherMetrics> {
        &self.metrics
    }

    /// Fragments waiting in the queue
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Chars currently in the block
    pub fn block_len(&self) -> usize {
        self.block.char_len()
    }

    /// Token cancelling both loops
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel both loops and wait for them
    ///
    /// Pending fragments and the partially built block are discarded.
    #[instrument(name = "batcher_shutdown", skip(self), fields(sink = %self.sink_name))]
    pub async fn shutdown(self) {
        self.cancel.cancel();

        if let Err(e) = self.accumulator_handle.await {
            error!(error = ?e, "Accumulator task panicked");
        }
        if let Err(e) = self.timer_handle.await {
            error!(error = ?e, "Timer task panicked");
        }

        let discarded = self.queue.clear();
        self.metrics.set_queue_len(0);
        if discarded > 0 {
            debug!(fragments = discarded, "Pending fragments discarded");
        }

        info!(
            blocks_sent = self.metrics.blocks_sent(),
            sink_failures = self.metrics.sink_failures(),
            "Batcher shutdown complete"
        );
    }
}
