//! Layered error definitions
//!
//! Categorized by source: config / batching / sink / codec

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid configuration (fatal, detected before anything starts)
    #[error("invalid configuration at '{field}': {message}")]
    InvalidConfiguration { field: String, message: String },

    // ===== Batching Errors =====
    /// Fragment that can never fit into a block
    #[error("starved fragment: {length} chars can never fit a block of {max} chars")]
    StarvedFragment { length: usize, max: usize },

    // ===== Sink Errors =====
    /// Downstream send did not succeed
    #[error("sink '{sink_name}' failure: {message}")]
    SinkFailure { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== Codec Errors =====
    /// Malformed OSC packet
    #[error("osc decode error: {message}")]
    OscDecode { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create invalid configuration error
    pub fn invalid_configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink failure error
    pub fn sink_failure(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkFailure {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create OSC decode error
    pub fn osc_decode(message: impl Into<String>) -> Self {
        Self::OscDecode {
            message: message.into(),
        }
    }

    /// Whether this error is a configuration problem (fatal at startup)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. } | Self::InvalidConfiguration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = ContractError::invalid_configuration("batching.max_block_length", "must be > 0");
        assert_eq!(
            err.to_string(),
            "invalid configuration at 'batching.max_block_length': must be > 0"
        );
        assert!(err.is_configuration());

        let err = ContractError::StarvedFragment {
            length: 200,
            max: 144,
        };
        assert!(err.to_string().contains("200 chars"));
        assert!(!err.is_configuration());
    }
}
