use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::calculator::PeriodCalculator;
use crate::cli::Command;
use crate::config::Settings;
use crate::datetime::{parse_instant, to_local};
use crate::overlap::{TenureInterval, invalid_interval_indexes, overlapping_period_indexes};
use crate::period::{Period, period_to_string};
use crate::recurrence::RecurrenceKind;
use crate::render::Renderer;
use crate::responsive::choose_responsive_period_count;

/// Everything a command needs, resolved once per invocation.
#[derive(Debug, Clone)]
pub struct App {
    pub settings: Settings,
    pub calculator: PeriodCalculator,
    pub renderer: Renderer,
    pub json: bool,
    /// Captured once so every period of one invocation shares it.
    pub now: DateTime<Utc>,
}

impl App {
    pub fn new(settings: Settings, json: bool) -> Self {
        Self {
            settings,
            calculator: PeriodCalculator::from_settings(&settings),
            renderer: Renderer::new(&settings),
            json,
            now: Utc::now(),
        }
    }

    fn instant(&self, raw: &str) -> anyhow::Result<chrono::NaiveDateTime> {
        parse_instant(raw, self.now, &self.settings.timezone)
    }
}

#[instrument(skip(app, out))]
pub fn dispatch<W: Write>(app: &App, command: &Command, out: &mut W) -> anyhow::Result<()> {
    match command {
        Command::Periods {
            recurrence,
            count,
            offset,
            at,
            assessments,
            allow_future,
        } => cmd_periods(
            app,
            out,
            *recurrence,
            *count,
            *offset,
            at.as_deref(),
            *assessments,
            *allow_future,
        ),
        Command::Label { start, end } => cmd_label(app, out, start, end),
        Command::Contains {
            instant,
            start,
            end,
        } => cmd_contains(app, out, instant, start, end),
        Command::Overlaps { input } => cmd_overlaps(app, out, input),
        Command::Fit { width, recurrence } => cmd_fit(app, out, *width, *recurrence),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_periods<W: Write>(
    app: &App,
    out: &mut W,
    recurrence: RecurrenceKind,
    count: usize,
    offset: i64,
    at: Option<&str>,
    assessments: bool,
    allow_future: bool,
) -> anyhow::Result<()> {
    let reference = match at {
        Some(raw) => app.instant(raw)?,
        None => to_local(app.now, &app.settings.timezone),
    };
    debug!(%reference, "reference instant");

    let config = app
        .calculator
        .compute_periods_config_at(recurrence, count, offset, assessments, allow_future, reference)
        .with_context(|| format!("failed to compute {recurrence} periods"))?;
    info!(%recurrence, count = config.periods.len(), "computed periods");

    if app.json {
        serde_json::to_writer_pretty(&mut *out, &config)?;
        writeln!(out)?;
        return Ok(());
    }

    app.renderer.write_periods(out, &config, offset)
}

fn cmd_label<W: Write>(app: &App, out: &mut W, start: &str, end: &str) -> anyhow::Result<()> {
    let period = parse_period(app, start, end)?;
    let label = period_to_string(&period);

    if app.json {
        writeln!(out, "{}", json!({ "label": label }))?;
    } else {
        writeln!(out, "{label}")?;
    }
    Ok(())
}

fn cmd_contains<W: Write>(
    app: &App,
    out: &mut W,
    instant: &str,
    start: &str,
    end: &str,
) -> anyhow::Result<()> {
    let period = parse_period(app, start, end)?;
    let instant = app.instant(instant)?;
    let contains = period.contains(instant);

    if app.json {
        writeln!(out, "{}", json!({ "contains": contains }))?;
    } else {
        writeln!(out, "{}", if contains { "yes" } else { "no" })?;
    }
    Ok(())
}

fn cmd_overlaps<W: Write>(app: &App, out: &mut W, input: &Path) -> anyhow::Result<()> {
    let raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read tenures from stdin")?;
        buf
    } else {
        fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?
    };

    let intervals: Vec<TenureInterval> =
        serde_json::from_str(&raw).context("failed to parse tenure intervals")?;
    let pairs = overlapping_period_indexes(&intervals);
    let invalid = invalid_interval_indexes(&intervals);

    if app.json {
        writeln!(
            out,
            "{}",
            json!({ "overlapping": pairs, "invalid": invalid })
        )?;
        return Ok(());
    }

    app.renderer.write_overlaps(out, &pairs, &invalid)
}

fn cmd_fit<W: Write>(
    app: &App,
    out: &mut W,
    width: f64,
    recurrence: Option<RecurrenceKind>,
) -> anyhow::Result<()> {
    let count = choose_responsive_period_count(width)?;

    match recurrence {
        Some(recurrence) => cmd_periods(app, out, recurrence, count, 0, None, false, false),
        None if app.json => {
            writeln!(out, "{}", json!({ "width": width, "periods": count }))?;
            Ok(())
        }
        None => {
            writeln!(out, "{count}")?;
            Ok(())
        }
    }
}

fn parse_period(app: &App, start: &str, end: &str) -> anyhow::Result<Period> {
    let start = app.instant(start)?;
    let end = app.instant(end)?;
    anyhow::ensure!(start <= end, "period start {start} is after end {end}");
    Ok(Period::new(start, end))
}
