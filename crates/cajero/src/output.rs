//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::{OwoColorize, Stream};
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Apply the `--color` choice process-wide.
pub fn init_color(mode: &ColorMode) {
    match mode {
        ColorMode::Always => owo_colors::set_override(true),
        ColorMode::Never => owo_colors::set_override(false),
        ColorMode::Auto => {
            if std::env::var_os("NO_COLOR").is_some() || !io::stdout().is_terminal() {
                owo_colors::set_override(false);
            }
        }
    }
}

pub fn success(text: &str) -> String {
    text.if_supports_color(Stream::Stderr, |t| t.green())
        .to_string()
}

pub fn emphasis(text: &str) -> String {
    text.if_supports_color(Stream::Stdout, |t| t.bold())
        .to_string()
}

pub fn warning(text: &str) -> String {
    text.if_supports_color(Stream::Stderr, |t| t.yellow())
        .to_string()
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since detail views are key/value
/// blocks rather than rows.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Aligned `key: value` block for detail views.
pub fn detail_block(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 1;
    pairs
        .iter()
        .map(|(k, v)| format!("{:<width$}  {v}", format!("{k}:")))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Format-specific renderers ────────────────────────────────────────

pub(crate) fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        name: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: String,
    }

    #[test]
    fn plain_lists_one_per_line() {
        let items = [Item { name: "a" }, Item { name: "b" }];
        let out = render_list(
            &OutputFormat::Plain,
            &items,
            |i| Row {
                name: i.name.into(),
            },
            |i| i.name.to_owned(),
        );
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn compact_json() {
        let out = render_single(
            &OutputFormat::JsonCompact,
            &Item { name: "a" },
            |_| String::new(),
            |_| String::new(),
        );
        assert_eq!(out, r#"{"name":"a"}"#);
    }

    #[test]
    fn detail_block_aligns_values() {
        let out = detail_block(&[("Name", "Ana".into()), ("Balance", "$ 1".into())]);
        assert_eq!(out, "Name:     Ana\nBalance:  $ 1");
    }
}
