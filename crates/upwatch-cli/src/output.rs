//! Output formatting for CLI commands.
//!
//! Supports table (human-readable), JSON, and YAML output. [`TerminalRenderer`]
//! plugs these formats into the poll loop.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;
use upwatch_core::{
    Batch, DisplayMode, Event, ItemStatus, ProbeStatus, Records, RenderError, Renderer,
    WatchError,
};

use crate::cli::Format;
use crate::error::CliError;

/// Clears the screen and homes the cursor.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Output formatter that handles table, JSON and YAML output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Yaml => {
                serde_yaml::to_writer(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("YAML serialization failed: {e}")))?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write one record of a stream.
    ///
    /// JSON records are compact, one per line. YAML records are separate
    /// documents. Tables use the record's table form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_record<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Yaml => {
                writeln!(writer, "---")?;
                serde_yaml::to_writer(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("YAML serialization failed: {e}")))?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Probe statuses for the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct StatusTable<'a> {
    /// Rows.
    pub items: &'a [ItemStatus],
}

impl TableDisplay for StatusTable<'_> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.items.is_empty() {
            writeln!(writer, "No probes match")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<24}  {:<9}  {:>9}  {:>8}  {:<20}  {:<36}",
            "NAME", "STATUS", "RESPONSE", "UPTIME", "LAST CHECK", "ID"
        )?;
        writeln!(writer, "{}", "─".repeat(116))?;

        for item in self.items {
            writeln!(
                writer,
                "{:<24}  {:<9}  {:>9}  {:>8}  {:<20}  {:<36}",
                truncate(&item.name, 24),
                item.status,
                item.response_time_ms.map_or_else(|| "-".into(), |ms| format!("{ms}ms")),
                item.uptime_percent.map_or_else(|| "-".into(), |p| format!("{p:.2}%")),
                item.last_checked_at.map_or_else(|| "never".into(), short_time),
                item.id,
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "{}", summary(self.items))?;
        Ok(())
    }
}

/// One check result in tail output.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct EventLine<'a> {
    /// The event.
    pub event: &'a Event,
}

impl TableDisplay for EventLine<'_> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let e = self.event;
        write!(
            writer,
            "{}  {:<8}  {:>3}  {:>7}",
            e.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            e.outcome,
            e.status_code.map_or_else(|| "-".into(), |c| c.to_string()),
            e.response_time_ms.map_or_else(|| "-".into(), |ms| format!("{ms}ms")),
        )?;
        if let Some(region) = &e.region {
            write!(writer, "  {region}")?;
        }
        if let Some(message) = &e.message {
            write!(writer, "  {message}")?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

/// "3 probes: 2 up, 1 down"
fn summary(items: &[ItemStatus]) -> String {
    let order = [
        ProbeStatus::Up,
        ProbeStatus::Down,
        ProbeStatus::Degraded,
        ProbeStatus::Paused,
        ProbeStatus::Pending,
        ProbeStatus::Unknown,
    ];
    let counts: Vec<String> = order
        .iter()
        .filter_map(|status| {
            let n = items.iter().filter(|i| i.status == *status).count();
            (n > 0).then(|| format!("{n} {status}"))
        })
        .collect();
    let noun = if items.len() == 1 { "probe" } else { "probes" };
    format!("{} {noun}: {}", items.len(), counts.join(", "))
}

fn short_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

impl From<CliError> for RenderError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Io(e) => Self::Io(e),
            other => Self::Serialize(other.to_string()),
        }
    }
}

/// Renderer writing batches to a data stream and errors to a side stream.
///
/// Screen clearing happens only for table dashboards on an interactive
/// terminal, so piped output never contains control sequences.
pub struct TerminalRenderer<W, E> {
    out: W,
    err: E,
    format: OutputFormat,
    interactive: bool,
    frames: usize,
}

impl<W: Write, E: Write> TerminalRenderer<W, E> {
    /// Creates a renderer.
    #[must_use]
    pub const fn new(out: W, err: E, format: OutputFormat, interactive: bool) -> Self {
        Self {
            out,
            err,
            format,
            interactive,
            frames: 0,
        }
    }

    fn render_dashboard(&mut self, batch: &Batch, items: &[ItemStatus]) -> Result<(), CliError> {
        let table = StatusTable { items };
        match self.format.format() {
            Format::Table => {
                if self.interactive {
                    write!(self.out, "{CLEAR_SCREEN}")?;
                    writeln!(
                        self.out,
                        "Every {}: upwatch watch{:>40}",
                        humantime::format_duration(batch.interval),
                        format!("updated {}", batch.fetched_at.format("%H:%M:%S")),
                    )?;
                    writeln!(self.out)?;
                }
                self.format.write(&mut self.out, &table)
            }
            Format::Json => self.format.write(&mut self.out, &table),
            Format::Yaml => {
                if self.frames > 0 {
                    writeln!(self.out, "---")?;
                }
                self.format.write(&mut self.out, &table)
            }
        }
    }

    fn render_tail(&mut self, events: &[Event]) -> Result<(), CliError> {
        for event in events {
            self.format.write_record(&mut self.out, &EventLine { event })?;
        }
        Ok(())
    }
}

impl<W: Write, E: Write> Renderer for TerminalRenderer<W, E> {
    fn render(&mut self, batch: &Batch) -> Result<(), RenderError> {
        match (&batch.mode, &batch.records) {
            (DisplayMode::Dashboard, Records::Statuses(items)) => self.render_dashboard(batch, items)?,
            (DisplayMode::Tail, Records::Events(events)) => self.render_tail(events)?,
            (mode, records) => {
                let kind = match records {
                    Records::Statuses(_) => "status",
                    Records::Events(_) => "event",
                };
                return Err(RenderError::Serialize(format!(
                    "mismatched batch: {mode:?} mode with {kind} records"
                )));
            }
        }
        self.frames += 1;
        self.out.flush()?;
        Ok(())
    }

    fn report(&mut self, error: &WatchError) {
        if let Err(e) = writeln!(self.err, "error: {error}").and_then(|()| self.err.flush()) {
            warn!(error = %e, "cannot write to the error stream");
        }
    }
}
