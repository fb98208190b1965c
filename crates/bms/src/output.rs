//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use bms_core::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `line_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    line_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&line_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views don't use
/// `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(plain_fn(data)),
    }
}

/// Render a raw store value. Maps become a path/value table.
pub fn render_value(format: &OutputFormat, value: &Value) -> Result<String, CliError> {
    render_single(
        format,
        value,
        |v| match v {
            Value::Map(_) => {
                let rows: Vec<LeafRow> = leaves(v)
                    .into_iter()
                    .map(|(path, value)| LeafRow { path, value })
                    .collect();
                render_table(&rows)
            }
            scalar => scalar.to_string(),
        },
        Value::to_string,
    )
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print a status line to stderr, respecting quiet mode.
pub fn print_status(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

/// `ON` / `OFF`, colored when stdout is a terminal.
pub fn on_off(on: bool) -> String {
    let color = io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err();
    match (on, color) {
        (true, true) => "ON".green().bold().to_string(),
        (false, true) => "OFF".dimmed().to_string(),
        (true, false) => "ON".into(),
        (false, false) => "OFF".into(),
    }
}

/// Horizontal gauge for a `0.0..=1.0` fill.
pub fn gauge(fill: f64) -> String {
    const WIDTH: usize = 20;
    let filled = (0..WIDTH)
        .take_while(|i| {
            #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
            let threshold = (*i as f64 + 0.5) / WIDTH as f64;
            fill.clamp(0.0, 1.0) >= threshold
        })
        .count();
    format!("{}{}", "█".repeat(filled), "░".repeat(WIDTH - filled))
}

// ── Format-specific renderers ────────────────────────────────────────

#[derive(Tabled)]
struct LeafRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Every scalar under `value`, keyed by its path relative to `value`.
fn leaves(value: &Value) -> Vec<(String, String)> {
    fn walk(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
        match value {
            Value::Map(map) => {
                for (key, child) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}/{key}")
                    };
                    walk(&path, child, out);
                }
            }
            scalar => out.push((prefix.to_owned(), scalar.to_string())),
        }
    }
    let mut out = Vec::new();
    walk("", value, &mut out);
    out
}

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
