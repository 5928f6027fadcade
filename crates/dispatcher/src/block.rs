//! Block buffer shared by the accumulator (append) and the timer (take)
//!
//! Invariant: the char length of the block never exceeds `max_len`.

use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{Fragment, BLOCK_SEPARATOR};

/// Result of trying to append one fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Fragment appended, block now has `block_len` chars
    Appended { block_len: usize },
    /// Fragment does not fit until the block is flushed
    WouldOverflow,
    /// Fragment cannot fit even an empty block
    Starved { length: usize },
}

#[derive(Debug, Default)]
struct BlockState {
    text: String,
    char_len: usize,
}

/// Size-bounded text block
#[derive(Debug)]
pub struct BlockBuffer {
    state: Mutex<BlockState>,
    max_len: usize,
}

impl BlockBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            state: Mutex::new(BlockState::default()),
            max_len,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BlockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append the fragment, preceded by a separator when the block is non-empty
    pub fn try_append(&self, fragment: &Fragment) -> AppendOutcome {
        if fragment.char_len() > self.max_len {
            return AppendOutcome::Starved {
                length: fragment.char_len(),
            };
        }

        let mut state = self.lock();
        let separator_len = usize::from(state.char_len > 0);
        let new_len = state.char_len + separator_len + fragment.char_len();
        if new_len > self.max_len {
            return AppendOutcome::WouldOverflow;
        }

        if separator_len > 0 {
            state.text.push(BLOCK_SEPARATOR);
        }
        state.text.push_str(fragment.as_str());
        state.char_len = new_len;

        AppendOutcome::Appended { block_len: new_len }
    }

    /// Atomically read the block and reset it to empty
    pub fn take(&self) -> String {
        let mut state = self.lock();
        state.char_len = 0;
        std::mem::take(&mut state.text)
    }

    /// Current length in chars
    pub fn char_len(&self) -> usize {
        self.lock().char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len() == 0
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_only_between_fragments() {
        let block = BlockBuffer::new(20);
        assert_eq!(
            block.try_append(&Fragment::new("ab")),
            AppendOutcome::Appended { block_len: 2 }
        );
        assert_eq!(
            block.try_append(&Fragment::new("cd")),
            AppendOutcome::Appended { block_len: 5 }
        );
        assert_eq!(block.take(), format!("ab{BLOCK_SEPARATOR}cd"));
        assert!(block.is_empty());
    }

    #[test]
    fn test_exact_fit_then_overflow() {
        let block = BlockBuffer::new(7);
        block.try_append(&Fragment::new("abc"));
        assert_eq!(
            block.try_append(&Fragment::new("def")),
            AppendOutcome::Appended { block_len: 7 }
        );
        assert_eq!(
            block.try_append(&Fragment::new("g")),
            AppendOutcome::WouldOverflow
        );
        assert_eq!(block.char_len(), 7);
    }

    #[test]
    fn test_full_width_fragment_fits_empty_block() {
        let block = BlockBuffer::new(144);
        let fragment = Fragment::new("x".repeat(143));
        assert!(matches!(
            block.try_append(&fragment),
            AppendOutcome::Appended { block_len: 143 }
        ));
        assert_eq!(block.try_append(&fragment), AppendOutcome::WouldOverflow);
    }

    #[test]
    fn test_oversized_fragment_starved() {
        let block = BlockBuffer::new(4);
        assert_eq!(
            block.try_append(&Fragment::new("toolong")),
            AppendOutcome::Starved { length: 7 }
        );
        assert!(block.is_empty());
    }

    #[test]
    fn test_length_counts_chars() {
        let block = BlockBuffer::new(3);
        assert!(matches!(
            block.try_append(&Fragment::new("🐾")),
            AppendOutcome::Appended { block_len: 1 }
        ));
        assert!(matches!(
            block.try_append(&Fragment::new("é")),
            AppendOutcome::Appended { block_len: 3 }
        ));
    }

    #[test]
    fn test_take_on_empty_block() {
        let block = BlockBuffer::new(10);
        assert_eq!(block.take(), "");
    }
}
