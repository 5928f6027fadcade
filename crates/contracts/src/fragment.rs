//! Fragment - Chunker output, Block Accumulator input
//!
//! A fragment is an immutable, length-bounded slice of one chat message.
//! Lengths are counted in chars, never bytes.

use std::fmt;
use std::sync::Arc;

/// Reserved delimiter placed between fragments inside a block (U+2028 LINE SEPARATOR)
pub const BLOCK_SEPARATOR: char = '\u{2028}';

/// Immutable text piece produced by chunking
///
/// Cheap to clone: the text is shared.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Fragment {
    text: Arc<str>,
    char_len: usize,
}

impl Fragment {
    /// Create a fragment from text
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        Self { text, char_len }
    }

    /// Fragment content
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in chars
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// Whether the fragment is empty
    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fragment").field(&&*self.text).finish()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
