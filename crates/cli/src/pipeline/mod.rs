//! Relay pipeline orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{apply_osc_override, Pipeline, PipelineConfig, SourceKind};
pub use stats::{PipelineStats, StopReason};
