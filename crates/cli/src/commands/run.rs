//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, LoadOutcome};
use contracts::AppBlueprint;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{apply_osc_override, Pipeline, PipelineConfig, SourceKind};
use crate::signal::shutdown_token;

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Load, create or upgrade the configuration file
    let outcome = ConfigLoader::load_or_init(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let mut blueprint = match outcome {
        LoadOutcome::Created { path } => {
            println!("No config file found, generated new '{}'", path.display());
            println!("Review it and run again.");
            return Ok(());
        }
        LoadOutcome::Loaded {
            blueprint,
            added_keys,
        } => {
            if !added_keys.is_empty() {
                warn!(added = ?added_keys, "Config file was missing options, defaults written");
                println!("Updated config with the new {} options!", added_keys.join(", "));
            }
            blueprint
        }
    };

    // Apply CLI overrides
    if let Some(ref addr) = args.osc_addr {
        info!(addr = %addr, "Overriding OSC address from CLI");
        apply_osc_override(&mut blueprint, addr)?;
    }

    info!(
        max_block = blueprint.batching.max_block_length,
        msg_delay_s = blueprint.batching.msg_delay_s,
        big_msg_delay_s = blueprint.batching.big_msg_delay_s,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        source: if args.mock {
            SourceKind::Mock {
                rate_hz: args.mock_rate,
            }
        } else {
            SourceKind::Stdin
        },
        max_messages: (args.max_messages > 0).then_some(args.max_messages),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        drain_timeout: Duration::from_secs(args.drain_timeout),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    };

    // Setup graceful shutdown handler
    let cancel = shutdown_token();

    info!("Starting relay...");
    let stats = Pipeline::new(pipeline_config)
        .run(cancel.clone())
        .await
        .context("Relay execution failed")?;
    cancel.cancel();

    info!(
        relayed = stats.relay.relayed,
        blocks_sent = stats.batcher.blocks_sent,
        duration_secs = stats.duration.as_secs_f64(),
        "Relay completed"
    );
    stats.print_summary();

    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &AppBlueprint) {
    let batching = &blueprint.batching;
    println!("\n=== Configuration Summary ===\n");
    println!("Batching:");
    println!(
        "  Fragment / block: {} / {} chars",
        batching.max_fragment_length, batching.max_block_length
    );
    println!(
        "  Delay: {}s, {}s at >= {} chars",
        batching.msg_delay_s, batching.big_msg_delay_s, batching.big_msg_length
    );
    println!("\nChat:");
    println!("  Print chat log: {}", blueprint.chat.print_chat_log);
    println!("  Badges: {}", blueprint.chat.badges.enable);

    println!("\nSinks ({}):", blueprint.sinks.len());
    for sink in &blueprint.sinks {
        println!("  - {} ({:?})", sink.name, sink.sink_type);
    }

    println!();
}
