//! Relay orchestrator - wires the chat source, formatter and batcher together.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{AppBlueprint, ChatMessage, SinkConfig, SinkType};
use dispatcher::Batcher;
use ingestion::{ChatFormatter, IngestionMetrics, LineChatSource, MockChatConfig, MockChatSource};
use observability::{record_chat_message, RelayMetricsAggregator};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{PipelineStats, StopReason};
use crate::error::CliError;

/// Poll interval while waiting for the batcher to drain
const DRAIN_POLL: Duration = Duration::from_millis(100);

/// Where chat messages come from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// `author: content` lines on stdin
    Stdin,
    /// Synthetic messages
    Mock { rate_hz: f64 },
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Loaded application configuration
    pub blueprint: AppBlueprint,

    /// Chat source
    pub source: SourceKind,

    /// Maximum number of messages to relay (None = unlimited)
    pub max_messages: Option<u64>,

    /// Relay timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Longest wait for pending text at end of input
    pub drain_timeout: Duration,

    /// Channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Source kept alive for the duration of the run
enum ActiveSource {
    Line(LineChatSource),
    Mock(MockChatSource),
}

impl ActiveSource {
    fn name(&self) -> &str {
        match self {
            Self::Line(source) => source.name(),
            Self::Mock(source) => &source.config().source_name,
        }
    }

    fn stop(&self) {
        match self {
            Self::Line(source) => source.stop(),
            Self::Mock(source) => source.stop(),
        }
    }
}

/// Main relay orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until end of input, limit, timeout or `cancel`
    pub async fn run(self, cancel: CancellationToken) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup Dispatcher
        info!("Setting up batcher...");
        let batcher = dispatcher::create_batcher(blueprint, cancel.child_token())
            .await
            .context("Failed to create batcher")?;
        let batcher_metrics = Arc::clone(batcher.metrics());
        info!(sink = %batcher.sink_name(), "Batcher started");

        // Start chat source
        let ingestion_metrics = Arc::new(IngestionMetrics::new());
        let (source, rx) = self.start_source(Arc::clone(&ingestion_metrics));
        info!(source = %source.name(), max_messages = ?self.config.max_messages, "Relay running");

        let formatter = ChatFormatter::new(blueprint.chat.clone());
        let (relay, stop_reason) = relay_loop(
            rx,
            &batcher,
            &formatter,
            RelayLimits {
                source_name: source.name(),
                max_messages: self.config.max_messages,
                timeout: self.config.timeout,
            },
            &cancel,
        )
        .await;

        // Shutdown
        info!(reason = ?stop_reason, "Shutting down relay...");
        source.stop();

        if stop_reason == StopReason::EndOfInput || stop_reason == StopReason::MaxMessages {
            drain(&batcher, self.config.drain_timeout, &cancel).await;
        }

        let undelivered = batcher.pending_len();
        batcher.shutdown().await;
        let mut batcher_snapshot = batcher_metrics.snapshot();
        batcher_snapshot.queue_len = undelivered;

        let stats = PipelineStats {
            source: source.name().to_string(),
            stop_reason,
            duration: start_time.elapsed(),
            active_sinks: blueprint.sinks.len(),
            relay,
            batcher: batcher_snapshot,
            ingestion: ingestion_metrics.snapshot(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            relayed = stats.relay.relayed,
            blocks_sent = stats.batcher.blocks_sent,
            "Relay shutdown complete"
        );

        Ok(stats)
    }

    fn start_source(
        &self,
        metrics: Arc<IngestionMetrics>,
    ) -> (ActiveSource, mpsc::Receiver<ChatMessage>) {
        match self.config.source {
            SourceKind::Stdin => {
                let source = LineChatSource::new("stdin");
                let rx = source.start(
                    BufReader::new(tokio::io::stdin()),
                    self.config.buffer_size,
                    Some(metrics),
                );
                (ActiveSource::Line(source), rx)
            }
            SourceKind::Mock { rate_hz } => {
                info!(rate_hz, "Running in MOCK mode (no chat connection required)");
                let source = MockChatSource::new(MockChatConfig {
                    rate_hz,
                    max_messages: self.config.max_messages,
                    ..Default::default()
                });
                let rx = source.start(self.config.buffer_size, Some(metrics));
                (ActiveSource::Mock(source), rx)
            }
        }
    }
}

/// Bounds of one relay loop
pub struct RelayLimits<'a> {
    pub source_name: &'a str,
    pub max_messages: Option<u64>,
    pub timeout: Option<Duration>,
}

/// Format and submit every message until a stop condition
pub async fn relay_loop(
    mut rx: mpsc::Receiver<ChatMessage>,
    batcher: &Batcher,
    formatter: &ChatFormatter,
    limits: RelayLimits<'_>,
    cancel: &CancellationToken,
) -> (RelayMetricsAggregator, StopReason) {
    let mut relay = RelayMetricsAggregator::new();
    let print_chat_log = formatter.config().print_chat_log;

    let deadline = async {
        match limits.timeout {
            Some(timeout) => tokio::time::sleep(timeout).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let stop_reason = loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break StopReason::Signal,
            _ = &mut deadline => {
                warn!(timeout = ?limits.timeout, "Relay timed out");
                break StopReason::Timeout;
            }
            message = rx.recv() => match message {
                Some(message) => message,
                None => break StopReason::EndOfInput,
            },
        };

        let Some(line) = formatter.format(&message) else {
            debug!(author = %message.author, "Echo message skipped");
            relay.record_skipped();
            record_chat_message(limits.source_name, false);
            continue;
        };

        if print_chat_log {
            println!("{line}");
        }

        match batcher.submit(&line) {
            Ok(fragments) => {
                relay.record_relayed(&message, line.chars().count(), fragments);
                record_chat_message(limits.source_name, true);
            }
            Err(e) => {
                warn!(author = %message.author, error = %e, "Message rejected");
                relay.record_rejected();
                record_chat_message(limits.source_name, false);
            }
        }

        if limits.max_messages.is_some_and(|max| relay.relayed >= max) {
            info!(messages = relay.relayed, "Reached max messages limit");
            break StopReason::MaxMessages;
        }
    };

    (relay, stop_reason)
}

/// Wait until the queue and the block are empty, bounded by `limit`
async fn drain(batcher: &Batcher, limit: Duration, cancel: &CancellationToken) {
    let wait = async {
        while batcher.pending_len() > 0 || batcher.block_len() > 0 {
            tokio::time::sleep(DRAIN_POLL).await;
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => debug!("Drain interrupted by shutdown signal"),
        result = tokio::time::timeout(limit, wait) => match result {
            Ok(()) => debug!("Pending text flushed"),
            Err(_) => warn!(
                pending = batcher.pending_len(),
                block_chars = batcher.block_len(),
                "Drain timed out, discarding pending text"
            ),
        },
    }
}

/// Point every OSC sink at `addr`, adding one if none is configured
pub fn apply_osc_override(blueprint: &mut AppBlueprint, addr: &str) -> Result<(), CliError> {
    addr.parse::<SocketAddr>()
        .map_err(|e| CliError::invalid_override("--osc-addr", format!("'{addr}': {e}")))?;

    let mut found = false;
    for sink in blueprint
        .sinks
        .iter_mut()
        .filter(|s| s.sink_type == SinkType::Osc)
    {
        sink.params.insert("addr".to_string(), addr.to_string());
        found = true;
    }
    if !found {
        blueprint.sinks.push(SinkConfig::osc("chatbox", addr));
    }
    Ok(())
}
