//! Mock Relay Example
//!
//! Feeds synthetic chat through the batcher into an OSC sink and a log sink,
//! and prints every block as the chatbox would show it. No game client required.
//!
//! Run with: cargo run -p relay_demos --bin mock_relay [config.toml]

use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{AppBlueprint, SinkConfig, BLOCK_SEPARATOR};
use dispatcher::{create_batcher, OscMessage};
use ingestion::{ChatFormatter, MockChatConfig, MockChatSource};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

const MESSAGES: u64 = 12;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    observability::init()?;

    tracing::info!("Starting Mock Relay Demo");

    // ==== Stage 1: Use default config or load from file ====
    let mut blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        AppBlueprint::default()
    };

    // ==== Stage 2: Local listener standing in for the chatbox ====
    let listener = UdpSocket::bind("127.0.0.1:0").await?;
    let listen_addr = listener.local_addr()?.to_string();
    blueprint.sinks = vec![
        SinkConfig::osc("chatbox", listen_addr.clone()),
        SinkConfig::log("console"),
    ];
    tracing::info!(addr = %listen_addr, "Chatbox stand-in listening");

    let display = tokio::spawn(async move {
        let mut buf = vec![0u8; 4096];
        while let Ok(len) = listener.recv(&mut buf).await {
            match OscMessage::decode(&buf[..len]) {
                Ok(message) => {
                    if let Some(text) = message.chatbox_text() {
                        println!("┌─ chatbox ({} chars)", text.chars().count());
                        for line in text.split(BLOCK_SEPARATOR) {
                            println!("│ {line}");
                        }
                        println!("└─");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Bad packet"),
            }
        }
    });

    // ==== Stage 3: Batcher ====
    let batcher = create_batcher(&blueprint, CancellationToken::new()).await?;

    // ==== Stage 4: Mock chat ====
    let source = MockChatSource::new(MockChatConfig {
        rate_hz: 3.0,
        max_messages: Some(MESSAGES),
        ..Default::default()
    });
    let mut rx = source.start(32, None);
    let formatter = ChatFormatter::new(blueprint.chat.clone());

    while let Some(message) = rx.recv().await {
        if let Some(line) = formatter.format(&message) {
            let fragments = batcher.submit(&line)?;
            tracing::info!(author = %message.author, fragments, "Submitted");
        }
    }

    // ==== Stage 5: Drain and shut down ====
    while batcher.pending_len() > 0 || batcher.block_len() > 0 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let snapshot = batcher.metrics().snapshot();
    batcher.shutdown().await;
    display.abort();

    tracing::info!(
        blocks = snapshot.blocks_sent,
        chars = snapshot.chars_sent,
        big_blocks = snapshot.big_blocks,
        "Demo complete"
    );
    Ok(())
}
