//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::{AppBlueprint, Badge};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

const ALL_BADGES: [Badge; 7] = [
    Badge::Subscriber,
    Badge::GiftSub,
    Badge::Bits,
    Badge::Broadcaster,
    Badge::Moderator,
    Badge::Verified,
    Badge::Artist,
];

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    batching: BatchingInfo,
    chat: ChatInfo,
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct BatchingInfo {
    max_fragment_length: usize,
    chunk_width: usize,
    max_block_length: usize,
    msg_delay_s: f64,
    big_msg_delay_s: f64,
    big_msg_length: usize,
}

#[derive(Serialize)]
struct ChatInfo {
    print_chat_log: bool,
    badges_enabled: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    badges: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &AppBlueprint, args: &InfoArgs) -> ConfigInfo {
    let batching = &blueprint.batching;
    let badges = if args.badges {
        ALL_BADGES
            .iter()
            .map(|b| (format!("{:?}", b), blueprint.chat.badges.icon(*b).to_string()))
            .collect()
    } else {
        BTreeMap::new()
    };

    let sinks = blueprint
        .sinks
        .iter()
        .map(|s| SinkInfo {
            name: s.name.clone(),
            sink_type: format!("{:?}", s.sink_type),
            params: if args.sinks {
                s.params.clone().into_iter().collect()
            } else {
                BTreeMap::new()
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        batching: BatchingInfo {
            max_fragment_length: batching.max_fragment_length,
            chunk_width: batching.chunk_width(),
            max_block_length: batching.max_block_length,
            msg_delay_s: batching.msg_delay_s,
            big_msg_delay_s: batching.big_msg_delay_s,
            big_msg_length: batching.big_msg_length,
        },
        chat: ChatInfo {
            print_chat_log: blueprint.chat.print_chat_log,
            badges_enabled: blueprint.chat.badges.enable,
            badges,
        },
        sinks,
    }
}

fn print_config_info(blueprint: &AppBlueprint, args: &InfoArgs) {
    let batching = &blueprint.batching;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Chat Relay Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📦 Batching");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!(
        "   ├─ Fragment: {} chars (chunks of {})",
        batching.max_fragment_length,
        batching.chunk_width()
    );
    println!("   ├─ Block: {} chars", batching.max_block_length);
    println!("   ├─ Delay: {}s", batching.msg_delay_s);
    println!(
        "   └─ Big delay: {}s at >= {} chars",
        batching.big_msg_delay_s, batching.big_msg_length
    );

    println!("\n💬 Chat");
    println!("   ├─ Print chat log: {}", blueprint.chat.print_chat_log);
    if args.badges && blueprint.chat.badges.enable {
        println!("   └─ Badges:");
        for (i, badge) in ALL_BADGES.iter().enumerate() {
            let prefix = if i == ALL_BADGES.len() - 1 { "└─" } else { "├─" };
            println!(
                "         {} {:?}: {}",
                prefix,
                badge,
                blueprint.chat.badges.icon(*badge)
            );
        }
    } else {
        println!("   └─ Badges: {}", blueprint.chat.badges.enable);
    }

    println!("\n📤 Sinks ({})", blueprint.sinks.len());
    for (i, sink) in blueprint.sinks.iter().enumerate() {
        let is_last = i == blueprint.sinks.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };
        println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);

        if args.sinks {
            let params: BTreeMap<_, _> = sink.params.iter().collect();
            for (key, value) in params {
                println!("   {}  · {} = {}", child_prefix, key, value);
            }
        }
    }

    println!();
}
