pub mod calculator;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod overlap;
pub mod period;
pub mod recurrence;
pub mod render;
pub mod responsive;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

pub use calculator::{BIWEEKLY_ANCHOR, PeriodCalculator, WeekStart};
pub use error::PeriodError;
pub use overlap::{TenureInterval, invalid_interval_indexes, overlapping_period_indexes};
pub use period::{Period, PeriodsConfig, date_belongs_to_period, format_period_boundary, period_to_string};
pub use recurrence::RecurrenceKind;
pub use responsive::choose_responsive_period_count;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(command = ?cli.command, json = cli.json, "anet-periods invoked");

    let mut settings = config::Settings::load(cli.config.as_deref())
        .context("failed to load settings")?;
    settings.apply_overrides(
        cli.rc_overrides
            .into_iter()
            .map(|o| (o.key, o.value)),
    )?;
    debug!(?settings, "resolved settings");

    let app = commands::App::new(settings, cli.json);
    let mut out = io::stdout().lock();
    commands::dispatch(&app, &cli.command, &mut out)?;

    info!("done");
    Ok(())
}
