//! Chunker - splits one message into size-bounded fragments

use contracts::{ContractError, Fragment};

/// Split `message` into consecutive fragments of at most `max_len - 1` chars
///
/// One char of headroom is kept so a full-width fragment plus a separator
/// still fits a block of `max_len`. Order is preserved, concatenating the
/// fragments yields `message` again, and an empty message yields no fragments.
///
/// # Errors
/// `ContractError::InvalidConfiguration` when `max_len < 2`
pub fn chunk(message: &str, max_len: usize) -> Result<Vec<Fragment>, ContractError> {
    if max_len < 2 {
        return Err(ContractError::invalid_configuration(
            "batching.max_fragment_length",
            format!("chunk bound must be >= 2, got {max_len}"),
        ));
    }
    let width = max_len - 1;

    let mut fragments = Vec::with_capacity(message.len() / width + 1);
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in message.char_indices() {
        if count == width {
            fragments.push(Fragment::new(&message[start..idx]));
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if count > 0 {
        fragments.push(Fragment::new(&message[start..]));
    }

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(fragments: &[Fragment]) -> String {
        fragments.iter().map(Fragment::as_str).collect()
    }

    #[test]
    fn test_short_message_single_fragment() {
        let fragments = chunk("alice:hello", 144).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].as_str(), "alice:hello");
    }

    #[test]
    fn test_empty_message_no_fragments() {
        assert!(chunk("", 144).unwrap().is_empty());
    }

    #[test]
    fn test_250_chars_split_143_107() {
        let message: String = (0..250).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let fragments = chunk(&message, 144).unwrap();
        let lens: Vec<_> = fragments.iter().map(Fragment::char_len).collect();
        assert_eq!(lens, vec![143, 107]);
        assert_eq!(joined(&fragments), message);
    }

    #[test]
    fn test_fragment_count_is_ceil_division() {
        for max_len in [2usize, 3, 7, 144] {
            for len in 0..300usize {
                let message = "x".repeat(len);
                let fragments = chunk(&message, max_len).unwrap();
                assert_eq!(fragments.len(), len.div_ceil(max_len - 1), "len={len} max={max_len}");
                assert!(fragments.iter().all(|f| f.char_len() <= max_len - 1));
                assert_eq!(joined(&fragments), message);
            }
        }
    }

    #[test]
    fn test_multibyte_chars_never_split() {
        let message = "🐾é漢".repeat(20);
        let fragments = chunk(&message, 8).unwrap();
        assert!(fragments.iter().all(|f| f.char_len() <= 7));
        assert_eq!(fragments.len(), 60usize.div_ceil(7));
        assert_eq!(joined(&fragments), message);
    }

    #[test]
    fn test_invalid_bound_rejected() {
        for max_len in [0, 1] {
            let err = chunk("hello", max_len).unwrap_err();
            assert!(matches!(err, ContractError::InvalidConfiguration { .. }));
        }
    }
}
