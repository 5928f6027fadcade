//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Chat Relay - forwards chat messages to a rate-limited chatbox
#[derive(Parser, Debug)]
#[command(
    name = "chat-relay",
    author,
    version,
    about = "Rate-limited chat relay for the VRChat chatbox",
    long_about = "Relays chat messages into a downstream chatbox that limits both the size \n\
                  of each transmission and the time between transmissions.\n\n\
                  Long messages are split into fragments, fragments are packed into \n\
                  blocks, and blocks are flushed on a size-dependent cadence."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CHAT_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CHAT_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Relay chat lines from stdin (or a mock source) to the configured sinks
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Write a default configuration file
    Init(InitArgs),

    /// Print chatbox packets received on a UDP port
    Listen(ListenArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON), created with defaults if missing
    #[arg(
        short,
        long,
        default_value = config_loader::DEFAULT_CONFIG_FILE,
        env = "CHAT_RELAY_CONFIG"
    )]
    pub config: PathBuf,

    /// Generate synthetic chat messages instead of reading stdin
    #[arg(long)]
    pub mock: bool,

    /// Mock messages per second
    #[arg(long, default_value = "2.0", env = "CHAT_RELAY_MOCK_RATE")]
    pub mock_rate: f64,

    /// Stop after relaying this many messages (0 = unlimited)
    #[arg(long, default_value = "0", env = "CHAT_RELAY_MAX_MESSAGES")]
    pub max_messages: u64,

    /// Override the address of every OSC sink (adds one if none is configured)
    #[arg(long, env = "CHAT_RELAY_OSC_ADDR")]
    pub osc_addr: Option<String>,

    /// Relay timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "CHAT_RELAY_TIMEOUT")]
    pub timeout: u64,

    /// Seconds to wait for pending text to be flushed at end of input
    #[arg(long, default_value = "30", env = "CHAT_RELAY_DRAIN_TIMEOUT")]
    pub drain_timeout: u64,

    /// Validate configuration and exit without relaying
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size between the chat source and the relay loop
    #[arg(long, default_value = "100", env = "CHAT_RELAY_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CHAT_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = config_loader::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = config_loader::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show badge icons
    #[arg(long)]
    pub badges: bool,

    /// Show sink parameters
    #[arg(long)]
    pub sinks: bool,
}

/// Arguments for the `init` command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the configuration (format from extension)
    #[arg(short, long, default_value = config_loader::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `listen` command
#[derive(Parser, Debug)]
pub struct ListenArgs {
    /// UDP address to bind
    #[arg(short, long, default_value = contracts::DEFAULT_OSC_ADDR, env = "CHAT_RELAY_LISTEN")]
    pub bind: String,

    /// Stop after this many packets (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub max_packets: u64,

    /// Output one JSON object per packet
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
