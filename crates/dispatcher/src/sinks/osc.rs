//! OscSink - UDP fire-and-forget chatbox client

use bytes::Bytes;
use contracts::{ContractError, TextSink, DEFAULT_OSC_ADDR};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, instrument};

use crate::codec::{OscMessage, CHATBOX_INPUT};

/// Configuration for OscSink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OscSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// OSC address pattern
    pub address: String,
    /// Bypass the in-game keyboard
    pub immediate: bool,
    /// Play the notification sound
    pub notify: bool,
}

impl Default for OscSinkConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 9000)),
            address: CHATBOX_INPUT.to_string(),
            immediate: true,
            notify: false,
        }
    }
}

impl OscSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .map(String::as_str)
            .unwrap_or(DEFAULT_OSC_ADDR);

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{}': {}", addr_str, e))?;

        let address = params
            .get("address")
            .cloned()
            .unwrap_or_else(|| CHATBOX_INPUT.to_string());
        if !address.starts_with('/') {
            return Err(format!("OSC address must start with '/', got '{}'", address));
        }

        Ok(Self {
            addr,
            address,
            immediate: parse_flag(params, "immediate", true)?,
            notify: parse_flag(params, "notify", false)?,
        })
    }
}

fn parse_flag(params: &HashMap<String, String>, key: &str, default: bool) -> Result<bool, String> {
    match params.get(key).map(String::as_str) {
        None => Ok(default),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(format!("'{}' must be true or false, got '{}'", key, other)),
    }
}

/// Sink that sends blocks to the chatbox over UDP
pub struct OscSink {
    name: String,
    config: OscSinkConfig,
    socket: Option<UdpSocket>,
}

impl OscSink {
    /// Create a new OscSink
    #[instrument(name = "osc_sink_new", skip(name, config))]
    pub async fn new(name: impl Into<String>, config: OscSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        // Bind to any available port of the matching family
        let bind_addr: SocketAddr = if config.addr.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(config.addr).await?;

        debug!(
            sink = %name,
            target = %config.addr,
            address = %config.address,
            "OscSink connected"
        );

        Ok(Self {
            name,
            config,
            socket: Some(socket),
        })
    }

    /// Create from params (for factory)
    #[instrument(name = "osc_sink_from_params", skip(name, params))]
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = OscSinkConfig::from_params(params)
            .map_err(|e| ContractError::invalid_configuration(format!("sinks[{}].params", name), e))?;

        Self::new(name.clone(), config)
            .await
            .map_err(|e| ContractError::SinkConnection {
                sink_name: name,
                message: e.to_string(),
            })
    }

    pub fn config(&self) -> &OscSinkConfig {
        &self.config
    }

    fn socket(&self) -> Result<&UdpSocket, ContractError> {
        self.socket
            .as_ref()
            .ok_or_else(|| ContractError::sink_failure(&self.name, "socket not connected"))
    }

    fn prepare_payload(&self, text: &str) -> Bytes {
        let mut message = OscMessage::chatbox(text, self.config.immediate, self.config.notify);
        message.address.clone_from(&self.config.address);
        message.encode()
    }
}

impl TextSink for OscSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "osc_sink_send",
        skip(self, text),
        fields(sink = %self.name, chars = text.chars().count())
    )]
    async fn send(&mut self, text: &str) -> Result<(), ContractError> {
        let socket = self.socket()?;
        let data = self.prepare_payload(text);
        let sent = socket
            .send(&data)
            .await
            .map_err(|e| ContractError::sink_failure(&self.name, format!("UDP send failed: {e}")))?;
        debug!(sink = %self.name, bytes = sent, "Sent");
        Ok(())
    }

    #[instrument(name = "osc_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        debug!(sink = %self.name, "OscSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_osc_sink_config_parsing() {
        let mut params = HashMap::new();
        params.insert("addr".to_string(), "127.0.0.1:9999".to_string());
        params.insert("notify".to_string(), "true".to_string());

        let config = OscSinkConfig::from_params(&params).unwrap();
        assert_eq!(config.addr.port(), 9999);
        assert_eq!(config.address, CHATBOX_INPUT);
        assert!(config.immediate);
        assert!(config.notify);
    }

    #[test]
    fn test_osc_sink_config_defaults() {
        let config = OscSinkConfig::from_params(&HashMap::new()).unwrap();
        assert_eq!(config, OscSinkConfig::default());
    }

    #[test]
    fn test_osc_sink_config_rejects_bad_values() {
        let params = HashMap::from([("addr".to_string(), "not-an-addr".to_string())]);
        assert!(OscSinkConfig::from_params(&params).is_err());

        let params = HashMap::from([("immediate".to_string(), "yes".to_string())]);
        assert!(OscSinkConfig::from_params(&params).is_err());

        let params = HashMap::from([("address".to_string(), "chatbox".to_string())]);
        assert!(OscSinkConfig::from_params(&params).is_err());
    }

    #[tokio::test]
    async fn test_osc_sink_delivers_chatbox_packet() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = OscSinkConfig {
            addr: receiver.local_addr().unwrap(),
            ..Default::default()
        };

        let mut sink = OscSink::new("test_osc", config).await.unwrap();
        sink.send("alice:hello").await.unwrap();

        let mut buf = [0u8; 1024];
        let len = tokio::time::timeout(Duration::from_secs(2), receiver.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let msg = OscMessage::decode(&buf[..len]).unwrap();
        assert_eq!(msg.chatbox_text(), Some("alice:hello"));
    }

    #[tokio::test]
    async fn test_osc_sink_send_after_close_fails() {
        let config = OscSinkConfig {
            addr: "127.0.0.1:19998".parse().unwrap(),
            ..Default::default()
        };
        let mut sink = OscSink::new("test_osc", config).await.unwrap();
        sink.close().await.unwrap();

        let err = sink.send("late").await.unwrap_err();
        assert!(matches!(err, ContractError::SinkFailure { .. }));
    }
}
