//! Clap derive structures for the `vsxmon` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use vsxmon_core::CounterWindow;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vsxmon -- statistics monitor for Sansay VSX session border controllers
#[derive(Debug, Parser)]
#[command(
    name = "vsxmon",
    version,
    about = "Monitor Sansay VSX session border controllers",
    long_about = "Polls the VSX statistics API (resource, realtime and media_server \
        reports), derives call-quality and utilization metrics, and evaluates \
        them against configurable warning and critical levels.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "VSXMON_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "VSXMON_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Device host or IP (overrides profile)
    #[arg(long, short = 'H', env = "VSXMON_HOST", global = true)]
    pub host: Option<String>,

    /// Statistics API port (overrides profile)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Protocol, https or http (overrides profile)
    #[arg(long, global = true)]
    pub proto: Option<String>,

    /// API username (overrides profile)
    #[arg(long, short = 'u', env = "VSXMON_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VSXMON_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Verify the device TLS certificate
    #[arg(long, env = "VSXMON_VERIFY_SSL", global = true)]
    pub verify_ssl: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "VSXMON_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Counter window for call statistics: 15m, 1h or 24h
    #[arg(long, short = 'w', global = true)]
    pub window: Option<CounterWindow>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one line per item (monitoring plugins, scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the device and evaluate services against their levels
    #[command(alias = "c")]
    Check(CheckArgs),

    /// Poll the device and list the services it offers
    #[command(alias = "ls")]
    Discover,

    /// Show the normalized and derived data of one poll
    Dump(DumpArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Services to evaluate, e.g. "VSX System", "VSX Trunk 10003",
    /// "VSX Media Server MST3". All discovered services when omitted.
    pub services: Vec<String>,

    /// Sample-store file for the session-drop baseline (overrides profile)
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Include per-check details in plain and table output
    #[arg(long, short = 'd')]
    pub details: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum DumpStage {
    /// Report documents as received
    Raw,
    /// Normalized and merged entities
    Snapshot,
    /// Derived metrics (default)
    #[default]
    Metrics,
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Read resource.json, realtime.json and media_server.json from a
    /// directory instead of polling a device
    #[arg(long, short = 'i', value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Pipeline stage to show
    #[arg(long, short = 's', default_value = "metrics")]
    pub stage: DumpStage,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Add a device profile to the config file
    Init {
        /// Device host or IP
        #[arg(long)]
        host: String,

        /// API username
        #[arg(long)]
        username: String,

        /// Profile name (defaults to --profile or "default")
        #[arg(long)]
        name: Option<String>,

        /// Environment variable holding the password
        #[arg(long)]
        password_env: Option<String>,

        /// Replace an existing profile of the same name
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a profile password in the system keyring (read from stdin)
    SetPassword {
        /// Profile name (defaults to --profile or the default profile)
        #[arg(long)]
        name: Option<String>,
    },
}
