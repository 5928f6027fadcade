//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{AppBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Below this the chatbox starts dropping messages
const RATE_LIMIT_DELAY_S: f64 = 1.5;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    max_fragment_length: usize,
    max_block_length: usize,
    msg_delay_s: f64,
    big_msg_delay_s: f64,
    big_msg_length: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let batching = &blueprint.batching;

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    max_fragment_length: batching.max_fragment_length,
                    max_block_length: batching.max_block_length,
                    msg_delay_s: batching.msg_delay_s,
                    big_msg_delay_s: batching.big_msg_delay_s,
                    big_msg_length: batching.big_msg_length,
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &AppBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let batching = &blueprint.batching;

    if batching.msg_delay_s < RATE_LIMIT_DELAY_S {
        warnings.push(format!(
            "batching.msg_delay_s = {} is below {}s - the chatbox may rate limit",
            batching.msg_delay_s, RATE_LIMIT_DELAY_S
        ));
    }

    if batching.big_msg_delay_s < batching.msg_delay_s {
        warnings.push("batching.big_msg_delay_s is shorter than msg_delay_s".to_string());
    }

    if !blueprint.sinks.iter().any(|s| s.sink_type == SinkType::Osc) {
        warnings.push("No OSC sink configured - nothing reaches the chatbox".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Fragment / block: {} / {} chars",
                summary.max_fragment_length, summary.max_block_length
            );
            println!(
                "  Delay: {}s ({}s at >= {} chars)",
                summary.msg_delay_s, summary.big_msg_delay_s, summary.big_msg_length
            );
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
