//! Factory - builds sinks and a running batcher from configuration

use contracts::{AppBlueprint, SinkConfig, SinkType};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::batcher::Batcher;
use crate::error::DispatcherError;
use crate::sinks::{AnySink, FileSink, LogSink, OscSink, SinkSet};

/// Create one sink from configuration
#[instrument(
    name = "dispatcher_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_sink(config: &SinkConfig) -> Result<AnySink, DispatcherError> {
    match config.sink_type {
        SinkType::Log => Ok(AnySink::Log(LogSink::new(&config.name))),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(AnySink::File(sink))
        }
        SinkType::Osc => {
            let sink = OscSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(AnySink::Osc(sink))
        }
    }
}

/// Create every configured sink, in order
#[instrument(
    name = "dispatcher_create_sink_set",
    skip(configs),
    fields(sink_count = configs.len())
)]
pub async fn create_sink_set(configs: &[SinkConfig]) -> Result<SinkSet, DispatcherError> {
    let mut sinks = Vec::with_capacity(configs.len());
    for config in configs {
        sinks.push(create_sink(config).await?);
    }
    Ok(SinkSet::new(sinks))
}

/// Convenience function to create a running batcher from a blueprint
#[instrument(name = "dispatcher_create_batcher", skip(blueprint, cancel))]
pub async fn create_batcher(
    blueprint: &AppBlueprint,
    cancel: CancellationToken,
) -> Result<Batcher, DispatcherError> {
    // Fail on bad bounds before any socket or file is opened
    blueprint.batching.validate()?;

    let sinks = create_sink_set(&blueprint.sinks).await?;
    info!(sinks = sinks.len(), "Sinks created");

    Batcher::spawn_with_token(blueprint.batching.clone(), sinks, cancel)
}
