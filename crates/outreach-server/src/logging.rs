//! Logging configuration and initialization.
//!
//! A preset picks the base verbosity of each `outreach::*` target, and
//! `--log` overrides adjust single targets on top. `RUST_LOG`, when set,
//! replaces both.

use clap::{Args, ValueEnum};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Prefix shared by every log target in this workspace.
const TARGET_PREFIX: &str = "outreach::";

/// Targets passed through without the prefix.
const FOREIGN_TARGETS: [&str; 2] = ["tower_http", "rusqlite"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging flags shared by the server binary.
#[derive(Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Enable verbose logging (INFO level, including HTTP requests)
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug logging (every store write and selector decision)
    #[arg(short, long)]
    pub debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    pub trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Set log level for specific targets (e.g., "store=debug" or "selector=trace").
    /// Can be repeated or comma-separated; "outreach::" is added to bare targets.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    pub overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Startup, API failures, and schema changes
    #[default]
    Production,
    /// Adds per-request HTTP traces
    Verbose,
    /// Every store write and selector decision
    Debug,
    Trace,
    /// Warnings and errors only
    Quiet,
}

impl LogPreset {
    /// The quietest flag wins: quiet, then trace, debug, verbose.
    pub fn from_flags(args: &LogArgs) -> Self {
        match (args.quiet, args.trace, args.debug, args.verbose) {
            (true, ..) => Self::Quiet,
            (_, true, ..) => Self::Trace,
            (_, _, true, _) => Self::Debug,
            (.., true) => Self::Verbose,
            _ => Self::Production,
        }
    }

    fn base_directives(self) -> &'static [&'static str] {
        match self {
            Self::Production => &[
                "outreach::startup=info",
                "outreach::api=warn",
                "outreach::store=info",
                "outreach::selector=warn",
                "tower_http=warn",
            ],
            Self::Verbose => &["outreach=info", "tower_http=info"],
            Self::Debug => &["outreach=debug", "tower_http=debug"],
            Self::Trace => &["outreach=trace", "tower_http=trace"],
            Self::Quiet => &["outreach=warn", "tower_http=error"],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Fully qualified target to level, e.g. "outreach::store" -> DEBUG.
    pub overrides: BTreeMap<String, Level>,
    pub format: LogFormat,
}

impl From<&LogArgs> for LogConfig {
    fn from(args: &LogArgs) -> Self {
        let overrides = args
            .overrides
            .iter()
            .flat_map(|arg| arg.split(','))
            .filter_map(parse_override)
            .collect();

        Self {
            preset: LogPreset::from_flags(args),
            overrides,
            format: args.format,
        }
    }
}

/// Parse one `target=level` pair. Malformed pairs are dropped.
fn parse_override(pair: &str) -> Option<(String, Level)> {
    let (target, level) = pair.split_once('=')?;
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    let level = Level::from_str(level.trim()).ok()?;

    let target = if target.starts_with(TARGET_PREFIX) || FOREIGN_TARGETS.contains(&target) {
        target.to_string()
    } else {
        format!("{}{}", TARGET_PREFIX, target)
    };
    Some((target, level))
}

impl LogConfig {
    /// Filter directives for the preset followed by overrides, ignoring `RUST_LOG`.
    pub fn directives(&self) -> Vec<String> {
        let base = self.preset.base_directives().iter().map(|d| d.to_string());
        let overrides = self
            .overrides
            .iter()
            .map(|(target, level)| format!("{}={}", target, level.as_str().to_ascii_lowercase()));
        base.chain(overrides).collect()
    }

    pub fn build_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(self.directives().join(","))
                .unwrap_or_else(|_| EnvFilter::new("info"))
        })
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(config: &LogConfig) {
    let json = config.format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(config.build_filter())
        .with((!json).then(|| fmt::layer().with_target(true)))
        .with(json.then(|| {
            fmt::layer()
                .json()
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
        }))
        .init();
}
