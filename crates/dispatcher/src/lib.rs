//! # Dispatcher
//!
//! 出站批处理与限速分发模块。
//!
//! 负责：
//! - 将任意长度的消息切分为有界片段 (chunker)
//! - 片段排队并打包进有界 block (queue / accumulator)
//! - 按动态节奏把 block 刷新到 sink (timer)
//!
//! Data flow: `submit` → chunker → pending queue → block accumulator →
//! block → dispatch timer → sink.

pub mod accumulator;
pub mod batcher;
pub mod block;
pub mod chunker;
pub mod codec;
pub mod error;
pub mod factory;
pub mod metrics;
pub mod queue;
pub mod sinks;
pub mod timer;

pub use batcher::Batcher;
pub use block::{AppendOutcome, BlockBuffer};
pub use chunker::chunk;
pub use codec::{decode_message, encode_message, OscArg, OscMessage, CHATBOX_INPUT};
pub use contracts::{Fragment, TextSink};
pub use error::DispatcherError;
pub use factory::{create_batcher, create_sink, create_sink_set};
pub use metrics::{BatcherMetrics, MetricsSnapshot};
pub use queue::PendingQueue;
pub use sinks::{AnySink, FileSink, LogSink, OscSink, SinkSet};
pub use timer::Cadence;
