//! `listen` command implementation.
//!
//! Binds the chatbox port and prints what a relay sends, for local testing
//! without the game running.

use anyhow::Result;
use contracts::BLOCK_SEPARATOR;
use dispatcher::{OscArg, OscMessage};
use serde::Serialize;
use tokio::net::UdpSocket;
use tracing::{info, warn};

use crate::cli::ListenArgs;
use crate::error::CliError;
use crate::signal::shutdown_token;

/// Largest UDP payload
const MAX_PACKET: usize = 65_536;

#[derive(Serialize)]
struct PacketInfo<'a> {
    from: String,
    address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fragments: Option<Vec<&'a str>>,
    args: usize,
}

/// Execute the `listen` command
pub async fn run_listen(args: &ListenArgs) -> Result<()> {
    let socket = UdpSocket::bind(&args.bind)
        .await
        .map_err(|source| CliError::Bind {
            addr: args.bind.clone(),
            source,
        })?;
    info!(addr = %socket.local_addr()?, "Listening for chatbox packets");

    let cancel = shutdown_token();
    let mut buf = vec![0u8; MAX_PACKET];
    let mut received: u64 = 0;

    loop {
        let (len, from) = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = socket.recv_from(&mut buf) => result.map_err(CliError::from)?,
        };

        let message = match OscMessage::decode(&buf[..len]) {
            Ok(message) => message,
            Err(e) => {
                warn!(from = %from, bytes = len, error = %e, "Undecodable packet");
                continue;
            }
        };
        received += 1;

        if args.json {
            let info = PacketInfo {
                from: from.to_string(),
                address: &message.address,
                fragments: message
                    .chatbox_text()
                    .map(|text| text.split(BLOCK_SEPARATOR).collect()),
                args: message.args.len(),
            };
            println!("{}", serde_json::to_string(&info)?);
        } else {
            println!("{}", render(&message));
        }

        if args.max_packets > 0 && received >= args.max_packets {
            break;
        }
    }

    cancel.cancel();
    info!(packets = received, "Listener stopped");
    Ok(())
}

/// One human-readable line per packet
fn render(message: &OscMessage) -> String {
    match message.chatbox_text() {
        Some(text) => format!(
            "[{} chars] {}",
            text.chars().count(),
            text.replace(BLOCK_SEPARATOR, " | ")
        ),
        None => {
            let args: Vec<String> = message
                .args
                .iter()
                .map(|arg| match arg {
                    OscArg::Str(s) => format!("{s:?}"),
                    OscArg::Int(v) => v.to_string(),
                    OscArg::Float(v) => v.to_string(),
                    OscArg::Bool(v) => v.to_string(),
                })
                .collect();
            format!("{} {}", message.address, args.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_chatbox() {
        let text = format!("alice:hi{BLOCK_SEPARATOR}bob:yo");
        let line = render(&OscMessage::chatbox(text, true, false));
        assert_eq!(line, "[15 chars] alice:hi | bob:yo");
    }

    #[test]
    fn test_render_other_address() {
        let message = OscMessage {
            address: "/avatar/parameters/Typing".to_string(),
            args: vec![OscArg::Bool(true), OscArg::Int(3)],
        };
        assert_eq!(render(&message), "/avatar/parameters/Typing true 3");
    }
}
