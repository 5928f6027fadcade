//! # Ingestion
//!
//! Chat ingestion module.
//!
//! Responsibilities:
//! - Read chat messages from a line-oriented reader (stdin) or a mock generator
//! - Render messages into relay lines (badge icons, echo filtering)
//! - Send to downstream via tokio mpsc
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{ChatFormatter, LineChatSource};
//!
//! let source = LineChatSource::new("stdin");
//! let mut rx = source.start(tokio::io::BufReader::new(tokio::io::stdin()), 100, None);
//! let formatter = ChatFormatter::new(blueprint.chat.clone());
//!
//! while let Some(message) = rx.recv().await {
//!     if let Some(line) = formatter.format(&message) {
//!         batcher.submit(&line)?;
//!     }
//! }
//! ```

mod error;
mod formatter;
mod line;
mod metrics;
mod mock;

// Re-exports
pub use contracts::ChatMessage;
pub use error::{IngestionError, Result};
pub use formatter::ChatFormatter;
pub use line::{parse_line, LineChatSource};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use mock::{MockChatConfig, MockChatSource};
