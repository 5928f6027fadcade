//! SinkSet - fans one block out to every configured sink

use contracts::{ContractError, TextSink};
use tracing::warn;

use super::{FileSink, LogSink, OscSink};

/// Any sink the factory can build
pub enum AnySink {
    Osc(OscSink),
    Log(LogSink),
    File(FileSink),
}

impl TextSink for AnySink {
    fn name(&self) -> &str {
        match self {
            Self::Osc(s) => s.name(),
            Self::Log(s) => s.name(),
            Self::File(s) => s.name(),
        }
    }

    async fn send(&mut self, text: &str) -> Result<(), ContractError> {
        match self {
            Self::Osc(s) => s.send(text).await,
            Self::Log(s) => s.send(text).await,
            Self::File(s) => s.send(text).await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Osc(s) => s.close().await,
            Self::Log(s) => s.close().await,
            Self::File(s) => s.close().await,
        }
    }
}

/// Ordered collection of sinks treated as one
///
/// Every sink receives every block; a failing sink does not stop the
/// others and the first error is returned.
pub struct SinkSet<S = AnySink> {
    name: String,
    sinks: Vec<S>,
}

impl<S: TextSink> SinkSet<S> {
    pub fn new(sinks: Vec<S>) -> Self {
        let name = sinks
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(",");
        Self { name, sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sink_names(&self) -> impl Iterator<Item = &str> {
        self.sinks.iter().map(|s| s.name())
    }
}

impl<S: TextSink> TextSink for SinkSet<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, text: &str) -> Result<(), ContractError> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.send(text).await {
                warn!(sink = %sink.name(), error = %e, "Sink in set failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.close().await {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
