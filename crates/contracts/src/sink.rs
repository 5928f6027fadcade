//! TextSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for downstream display channels.

use crate::ContractError;

/// Text output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(TextSink: Send)]
pub trait LocalTextSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Send one flushed block
    ///
    /// # Errors
    /// Returns `ContractError::SinkFailure` (should include context)
    async fn send(&mut self, text: &str) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
