//! Batching configuration contracts shared by the loader and the dispatcher.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ContractError;

/// Outbound batching configuration
///
/// All lengths are in chars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    /// Chunk width bound; every fragment holds at most `max_fragment_length - 1` chars
    pub max_fragment_length: usize,

    /// Upper bound of a block (fragments + separators)
    pub max_block_length: usize,

    /// Delay after sending a normal block (seconds)
    pub msg_delay_s: f64,

    /// Delay after sending a big block (seconds)
    pub big_msg_delay_s: f64,

    /// A sent block this long or longer counts as big
    pub big_msg_length: usize,

    /// Bounded wait of the accumulator while the queue is empty (seconds)
    pub idle_wait_s: f64,

    /// Backoff of the accumulator while the block is full (seconds)
    pub backoff_s: f64,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            max_fragment_length: 144,
            max_block_length: 144,
            msg_delay_s: 1.5,
            big_msg_delay_s: 3.0,
            big_msg_length: 100,
            idle_wait_s: 1.0,
            backoff_s: 1.0,
        }
    }
}

impl BatchingConfig {
    /// Longest fragment the chunker can produce
    pub fn chunk_width(&self) -> usize {
        self.max_fragment_length.saturating_sub(1)
    }

    pub fn msg_delay(&self) -> Duration {
        secs(self.msg_delay_s)
    }

    pub fn big_msg_delay(&self) -> Duration {
        secs(self.big_msg_delay_s)
    }

    pub fn idle_wait(&self) -> Duration {
        secs(self.idle_wait_s)
    }

    pub fn backoff(&self) -> Duration {
        secs(self.backoff_s)
    }

    /// Check every bound; the batcher refuses to start on error
    ///
    /// # Errors
    /// `ContractError::InvalidConfiguration` naming the offending field
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.max_block_length == 0 {
            return Err(ContractError::invalid_configuration(
                "batching.max_block_length",
                "max_block_length must be > 0",
            ));
        }
        if self.max_fragment_length < 2 {
            return Err(ContractError::invalid_configuration(
                "batching.max_fragment_length",
                format!(
                    "max_fragment_length must be >= 2, got {}",
                    self.max_fragment_length
                ),
            ));
        }
        // Equal bounds are fine: the chunker emits at most max_fragment_length - 1 chars.
        if self.max_fragment_length > self.max_block_length {
            return Err(ContractError::invalid_configuration(
                "batching.max_fragment_length",
                format!(
                    "max_fragment_length ({}) must be <= max_block_length ({})",
                    self.max_fragment_length, self.max_block_length
                ),
            ));
        }
        if self.big_msg_length == 0 || self.big_msg_length >= self.max_block_length {
            return Err(ContractError::invalid_configuration(
                "batching.big_msg_length",
                format!(
                    "big_msg_length must be in 1..{}, got {}",
                    self.max_block_length, self.big_msg_length
                ),
            ));
        }

        for (field, value) in [
            ("batching.msg_delay_s", self.msg_delay_s),
            ("batching.big_msg_delay_s", self.big_msg_delay_s),
            ("batching.idle_wait_s", self.idle_wait_s),
            ("batching.backoff_s", self.backoff_s),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ContractError::invalid_configuration(
                    field,
                    format!("must be a positive number of seconds, got {value}"),
                ));
            }
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(ContractError::invalid_configuration(
                    field,
                    format!("{value} seconds is out of range"),
                ));
            }
        }

        Ok(())
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BatchingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_width(), 143);
        assert_eq!(config.msg_delay(), Duration::from_millis(1500));
        assert_eq!(config.big_msg_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_zero_block_length_rejected() {
        let config = BatchingConfig {
            max_block_length: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_block_length"), "got: {err}");
    }

    #[test]
    fn test_fragment_longer_than_block_rejected() {
        let config = BatchingConfig {
            max_fragment_length: 200,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ContractError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("<= max_block_length"), "got: {err}");
    }

    #[test]
    fn test_threshold_at_block_bound_rejected() {
        let config = BatchingConfig {
            big_msg_length: 144,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_delay_rejected() {
        let config = BatchingConfig {
            msg_delay_s: -1.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("msg_delay_s"), "got: {err}");

        let config = BatchingConfig {
            backoff_s: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delay_beyond_duration_range_rejected() {
        let config = BatchingConfig {
            msg_delay_s: 1e300,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ContractError::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("msg_delay_s"), "got: {err}");
    }

    #[test]
    fn test_equal_fragment_and_block_bounds_accepted() {
        let config = BatchingConfig {
            max_fragment_length: 50,
            max_block_length: 50,
            big_msg_length: 40,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_width(), 49);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BatchingConfig =
            serde_json::from_str(r#"{ "msg_delay_s": 2.0 }"#).unwrap();
        assert_eq!(config.msg_delay_s, 2.0);
        assert_eq!(config.max_block_length, 144);
    }
}
