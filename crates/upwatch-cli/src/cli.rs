//! Command-line argument parsing with clap.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use upwatch_core::{CheckOutcome, ProbeStatus};
use url::Url;

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.upwatch.dev";

/// upwatch - live views of your uptime probes.
#[derive(Parser, Debug, Clone)]
#[command(name = "upwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the monitoring API.
    #[arg(long, env = "UPWATCH_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: Url,

    /// API token sent as a bearer credential.
    #[arg(long, env = "UPWATCH_API_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Timeout for each API call, independent of the poll interval.
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration, global = true)]
    pub timeout: Duration,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
    /// YAML output.
    Yaml,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Live status dashboard for one or all probes.
    ///
    /// Refreshes every interval while stdout is a terminal. When piped, prints
    /// one snapshot and exits.
    Watch(WatchArgs),

    /// Stream new check results for a probe, like `tail -f`.
    ///
    /// When stdout is not a terminal, prints the requested window once and
    /// exits.
    Follow(FollowArgs),
}

/// Arguments for the watch command.
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Probe name or ID. Watches every probe when omitted.
    pub target: Option<String>,

    /// Only show probes with this status (up, down, degraded, paused, pending).
    #[arg(short, long)]
    pub status: Option<ProbeStatus>,

    /// Refresh interval (minimum 1s).
    #[arg(short, long, default_value = "5s", value_parser = humantime::parse_duration)]
    pub interval: Duration,
}

/// Arguments for the follow command.
#[derive(Args, Debug, Clone)]
pub struct FollowArgs {
    /// Probe name or ID.
    pub target: String,

    /// Start of the window: a duration ago (30m, 24h, 7d) or an RFC3339 timestamp.
    #[arg(long)]
    pub since: Option<String>,

    /// End of the window, same forms as --since. Following stops once it passes.
    #[arg(long)]
    pub until: Option<String>,

    /// Only show results with this outcome (success, failure, timeout, error).
    #[arg(short, long)]
    pub outcome: Option<CheckOutcome>,

    /// Maximum results fetched per poll.
    #[arg(short, long, default_value_t = upwatch_core::poll::DEFAULT_EVENT_LIMIT)]
    pub limit: u32,

    /// Poll interval (minimum 1s).
    #[arg(short, long, default_value = "5s", value_parser = humantime::parse_duration)]
    pub interval: Duration,
}
