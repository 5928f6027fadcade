//! LogSink - logs every flushed block via tracing

use contracts::{ContractError, TextSink, BLOCK_SEPARATOR};
use tracing::{info, instrument};

/// Sink that logs blocks for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_block(&self, text: &str) {
        let fragments = text.split(BLOCK_SEPARATOR).count();
        info!(
            sink = %self.name,
            chars = text.chars().count(),
            fragments,
            text = %text.replace(BLOCK_SEPARATOR, " | "),
            "Block flushed"
        );
    }
}

impl TextSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sink_send", skip(self, text), fields(sink = %self.name))]
    async fn send(&mut self, text: &str) -> Result<(), ContractError> {
        self.log_block(text);
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
