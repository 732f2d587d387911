use std::io::{self, IsTerminal, Write};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Settings;
use crate::period::{PeriodsConfig, format_period_boundary};

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            color: settings.color && io::stdout().is_terminal(),
        }
    }

    /// Writes one row per period. `offset` is the offset of the last row.
    #[tracing::instrument(skip(self, writer, config))]
    pub fn write_periods<W: Write>(
        &self,
        writer: W,
        config: &PeriodsConfig,
        offset: i64,
    ) -> anyhow::Result<()> {
        let with_flags = config
            .periods
            .iter()
            .any(|p| p.allow_new_assessments.is_some());

        let mut headers = vec![
            "Offset".to_string(),
            "Start".to_string(),
            "End".to_string(),
            "Period".to_string(),
        ];
        if with_flags {
            headers.push("New".to_string());
        }

        let last = config.periods.len();
        let rows = config
            .periods
            .iter()
            .enumerate()
            .map(|(idx, period)| {
                let period_offset = offset.saturating_add((last - 1 - idx) as i64);
                let offset_cell = if period_offset == 0 {
                    self.paint(&period_offset.to_string(), "32")
                } else {
                    period_offset.to_string()
                };
                let mut row = vec![
                    offset_cell,
                    format_period_boundary(period.start),
                    format_period_boundary(period.end),
                    period.to_string(),
                ];
                if let Some(allowed) = period.allow_new_assessments {
                    row.push(if allowed { "yes" } else { "no" }.to_string());
                }
                row
            })
            .collect();

        write_table(writer, headers, rows)
    }

    #[tracing::instrument(skip(self, writer, pairs))]
    pub fn write_overlaps<W: Write>(
        &self,
        mut writer: W,
        pairs: &[(usize, usize)],
        invalid: &[usize],
    ) -> anyhow::Result<()> {
        if pairs.is_empty() && invalid.is_empty() {
            writeln!(writer, "no conflicts")?;
            return Ok(());
        }

        let rows = pairs
            .iter()
            .map(|(i, j)| vec![self.paint("overlap", "31"), format!("{i}, {j}")])
            .chain(
                invalid
                    .iter()
                    .map(|idx| vec![self.paint("invalid", "33"), idx.to_string()]),
            )
            .collect();

        write_table(
            writer,
            vec!["Conflict".to_string(), "Indexes".to_string()],
            rows,
        )
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(visible_width(cell));
        }
    }

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| format!("{header:width$}"))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{}", header_line.trim_end())?;

    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{rule}")?;

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let shown = visible_width(cell);
                format!("{cell}{}", " ".repeat(width.saturating_sub(shown)))
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

/// Display width of a cell, ignoring the SGR colour codes `paint` adds.
fn visible_width(cell: &str) -> usize {
    let mut in_escape = false;
    cell.chars()
        .filter(|&ch| match (in_escape, ch) {
            (false, '\x1b') => {
                in_escape = true;
                false
            }
            (true, 'm') => {
                in_escape = false;
                false
            }
            (escaped, _) => !escaped,
        })
        .filter_map(UnicodeWidthChar::width)
        .sum()
}
