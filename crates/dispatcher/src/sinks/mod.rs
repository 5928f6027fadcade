//! Sink implementations
//!
//! Contains OscSink, LogSink, FileSink, and the fan-out SinkSet.

mod file;
mod log;
mod osc;
mod set;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::osc::{OscSink, OscSinkConfig};
pub use self::set::{AnySink, SinkSet};
