use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::recurrence::RecurrenceKind;

/// A `--rc key=value` settings override. A leading `rc.` on the key is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingOverride {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for SettingOverride {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected setting=value, got: {s}"))?;
        let key = key.trim();
        let key = key.strip_prefix("rc.").unwrap_or(key);
        if key.is_empty() {
            return Err(anyhow!("setting name missing in override: {s}"));
        }
        Ok(Self {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "anet-periods",
    version,
    about = "Recurring assessment periods for ANET",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Override a setting, e.g. `--rc use_iso8601=no`.
    #[arg(long = "rc", action = ArgAction::Append, global = true)]
    pub rc_overrides: Vec<SettingOverride>,

    /// Settings file (defaults to ./anet-periods.toml).
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Emit JSON instead of a table.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List consecutive periods ending at an offset.
    Periods {
        recurrence: RecurrenceKind,

        #[arg(short = 'n', long, default_value_t = 3)]
        count: usize,

        /// Positive values go back in time, negative ones forward.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,

        /// Reference instant instead of now.
        #[arg(long)]
        at: Option<String>,

        /// Mark which periods accept new assessments.
        #[arg(long)]
        assessments: bool,

        #[arg(long, requires = "assessments")]
        allow_future: bool,
    },
    /// Label a period given its start and end.
    Label { start: String, end: String },
    /// Check whether an instant belongs to a period.
    Contains {
        instant: String,
        start: String,
        end: String,
    },
    /// Report overlapping or reversed tenures from a JSON file ("-" for stdin).
    Overlaps { input: PathBuf },
    /// Number of periods that fit a display width in pixels.
    Fit {
        width: f64,

        /// Also list that many periods of this recurrence.
        #[arg(long)]
        recurrence: Option<RecurrenceKind>,
    },
}

/// Log level implied by `-q`/`-v` counts; quiet wins over verbose.
fn log_level(verbose: u8, quiet: u8) -> &'static str {
    match (quiet, verbose) {
        (q, _) if q >= 2 => "error",
        (1, _) => "warn",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    }
}

/// Logs go to stderr so period tables and JSON on stdout stay clean.
/// `RUST_LOG` takes precedence over the flags.
pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let level = log_level(verbose, quiet);
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| anyhow!("invalid log level {level}: {e}"))?,
    };

    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init()
    {
        debug!(error = %err, "tracing already initialised");
    }

    Ok(())
}
