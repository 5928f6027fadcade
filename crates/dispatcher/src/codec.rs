//! Minimal OSC 1.0 message codec
//!
//! Covers what the chatbox endpoint needs: strings, int32, float32 and the
//! argument-less `T`/`F` booleans. Bundles are not supported.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use contracts::ContractError;

/// Chatbox input address
pub const CHATBOX_INPUT: &str = "/chatbox/input";

/// One OSC argument
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Str(String),
    Int(i32),
    Float(f32),
    Bool(bool),
}

impl OscArg {
    fn type_tag(&self) -> char {
        match self {
            Self::Str(_) => 's',
            Self::Int(_) => 'i',
            Self::Float(_) => 'f',
            Self::Bool(true) => 'T',
            Self::Bool(false) => 'F',
        }
    }
}

/// One OSC message
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    /// `/chatbox/input [text, immediate, notify]`
    ///
    /// `immediate = true` bypasses the in-game keyboard, `notify` plays the
    /// notification sound.
    pub fn chatbox(text: impl Into<String>, immediate: bool, notify: bool) -> Self {
        Self {
            address: CHATBOX_INPUT.to_string(),
            args: vec![
                OscArg::Str(text.into()),
                OscArg::Bool(immediate),
                OscArg::Bool(notify),
            ],
        }
    }

    /// Text of a chatbox message, if this is one
    pub fn chatbox_text(&self) -> Option<&str> {
        if self.address != CHATBOX_INPUT {
            return None;
        }
        match self.args.first() {
            Some(OscArg::Str(text)) => Some(text),
            _ => None,
        }
    }

    /// Encode to a UDP payload
    pub fn encode(&self) -> Bytes {
        let tags: String = std::iter::once(',')
            .chain(self.args.iter().map(OscArg::type_tag))
            .collect();

        let mut buf = BytesMut::with_capacity(padded_len(self.address.len()) + padded_len(tags.len()) + 64);
        put_padded_str(&mut buf, &self.address);
        put_padded_str(&mut buf, &tags);

        for arg in &self.args {
            match arg {
                OscArg::Str(s) => put_padded_str(&mut buf, s),
                OscArg::Int(v) => buf.put_i32(*v),
                OscArg::Float(v) => buf.put_f32(*v),
                OscArg::Bool(_) => {}
            }
        }

        buf.freeze()
    }

    /// Decode a UDP payload
    ///
    /// # Errors
    /// `ContractError::OscDecode` on truncated or malformed input
    pub fn decode(mut data: &[u8]) -> Result<Self, ContractError> {
        let address = take_padded_str(&mut data)?;
        if !address.starts_with('/') {
            return Err(ContractError::osc_decode(format!(
                "address must start with '/', got '{address}'"
            )));
        }

        let tags = take_padded_str(&mut data)?;
        let tags = tags
            .strip_prefix(',')
            .ok_or_else(|| ContractError::osc_decode("type tag string must start with ','"))?;

        let mut args = Vec::with_capacity(tags.len());
        for tag in tags.chars() {
            let arg = match tag {
                's' => OscArg::Str(take_padded_str(&mut data)?),
                'i' => {
                    ensure_remaining(data, 4)?;
                    OscArg::Int(data.get_i32())
                }
                'f' => {
                    ensure_remaining(data, 4)?;
                    OscArg::Float(data.get_f32())
                }
                'T' => OscArg::Bool(true),
                'F' => OscArg::Bool(false),
                other => {
                    return Err(ContractError::osc_decode(format!(
                        "unsupported type tag '{other}'"
                    )))
                }
            };
            args.push(arg);
        }

        Ok(Self { address, args })
    }
}

/// Encode `address` with `args` to a UDP payload
pub fn encode_message(address: &str, args: &[OscArg]) -> Bytes {
    OscMessage {
        address: address.to_string(),
        args: args.to_vec(),
    }
    .encode()
}

/// Decode a UDP payload, see [`OscMessage::decode`]
pub fn decode_message(data: &[u8]) -> Result<OscMessage, ContractError> {
    OscMessage::decode(data)
}

/// Length of a string plus its NUL terminator, rounded up to 4 bytes
fn padded_len(len: usize) -> usize {
    (len + 4) & !3
}

fn put_padded_str(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    buf.put_bytes(0, padded_len(s.len()) - s.len());
}

fn take_padded_str(data: &mut &[u8]) -> Result<String, ContractError> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ContractError::osc_decode("unterminated string"))?;
    let text = std::str::from_utf8(&data[..nul])
        .map_err(|e| ContractError::osc_decode(format!("invalid utf-8: {e}")))?
        .to_string();

    let consumed = padded_len(nul);
    ensure_remaining(data, consumed)?;
    data.advance(consumed);
    Ok(text)
}

fn ensure_remaining(data: &[u8], needed: usize) -> Result<(), ContractError> {
    if data.remaining() < needed {
        return Err(ContractError::osc_decode(format!(
            "truncated packet: need {needed} bytes, have {}",
            data.remaining()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chatbox_wire_layout() {
        let bytes = OscMessage::chatbox("hi", true, false).encode();
        let mut expected = Vec::new();
        expected.extend_from_slice(b"/chatbox/input\0\0");
        expected.extend_from_slice(b",sTF\0\0\0\0");
        expected.extend_from_slice(b"hi\0\0");
        assert_eq!(&bytes[..], &expected[..]);
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn test_decode_chatbox_text() {
        let text = format!("alice:hello{}bob:yo 🐾", contracts::BLOCK_SEPARATOR);
        let bytes = OscMessage::chatbox(text.clone(), true, false).encode();
        let msg = OscMessage::decode(&bytes).unwrap();
        assert_eq!(msg.chatbox_text(), Some(text.as_str()));
        assert_eq!(msg.args[1], OscArg::Bool(true));
        assert_eq!(msg.args[2], OscArg::Bool(false));
    }

    #[test]
    fn test_numeric_args() {
        let msg = OscMessage {
            address: "/avatar/parameters/Typing".to_string(),
            args: vec![OscArg::Int(-7), OscArg::Float(0.5)],
        };
        let decoded = decode_message(&encode_message(&msg.address, &msg.args)).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.chatbox_text(), None);
    }

    #[test]
    fn test_padding_when_length_is_multiple_of_four() {
        assert_eq!(padded_len(0), 4);
        assert_eq!(padded_len(3), 4);
        assert_eq!(padded_len(4), 8);
    }

    #[test]
    fn test_truncated_packet_rejected() {
        let bytes = OscMessage::chatbox("hello", true, false).encode();
        let err = OscMessage::decode(&bytes[..bytes.len() - 4]).unwrap_err();
        assert!(matches!(err, ContractError::OscDecode { .. }));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut buf = BytesMut::new();
        put_padded_str(&mut buf, "/x");
        put_padded_str(&mut buf, ",b");
        let err = OscMessage::decode(&buf).unwrap_err();
        assert!(err.to_string().contains("unsupported type tag"), "got: {err}");
    }
}
