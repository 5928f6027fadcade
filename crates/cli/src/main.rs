//! # Chat Relay CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载、生成与验证
//! - 转发管道编排与生命周期管理
//! - 优雅关闭处理
//! - chatbox 报文监听 (调试用)

mod cli;
mod commands;
mod error;
mod pipeline;
mod signal;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_init, run_listen, run_relay, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so relayed chat lines on stdout stay clean
    observability::init_with_config(observability_config(&cli))?;

    info!(version = env!("CARGO_PKG_VERSION"), "Chat Relay starting");

    // Execute command
    let result = match &cli.command {
        Commands::Run(args) => run_relay(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Init(args) => run_init(args),
        Commands::Listen(args) => run_listen(args).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Logging setup derived from the global CLI flags
fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let log_format = match cli.log_format {
        cli::LogFormat::Json => observability::LogFormat::Json,
        cli::LogFormat::Pretty => observability::LogFormat::Pretty,
        cli::LogFormat::Compact => observability::LogFormat::Compact,
    };

    // Prometheus is started by the pipeline, only for `run --metrics-port`
    ObservabilityConfig {
        log_format,
        metrics_port: None,
        ..Default::default()
    }
    .with_verbosity(cli.verbose, cli.quiet)
}
