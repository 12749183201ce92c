//! Output formatting: table, JSON, YAML, plain.
//!
//! UAPI `data` has no fixed shape, so rendering works on `serde_json::Value`.
//! Lists of records become a `tabled` table with one column per key; single
//! records become a two-column key/value table.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

use cpanel_api::{Message, MessageType};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render an arbitrary JSON value in the chosen format.
pub fn render_value(format: OutputFormat, data: &Value) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_table(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(render_plain(data)),
    }
}

/// Render a serializable item; table mode uses a pre-formatted detail view.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table | OutputFormat::Plain => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
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

/// Print envelope messages to stderr. Errors are always shown.
pub fn print_messages<'a>(
    messages: impl IntoIterator<Item = &'a Message>,
    prefix: &str,
    color: bool,
    quiet: bool,
) {
    let mut stderr = io::stderr().lock();
    for message in messages {
        if quiet && message.message_type != MessageType::Error {
            continue;
        }
        let label = match message.message_type {
            MessageType::Error => "error",
            MessageType::Warning => "warning",
            MessageType::Information | MessageType::Unknown => "info",
        };
        let label = if color {
            match message.message_type {
                MessageType::Error => label.red().bold().to_string(),
                MessageType::Warning => label.yellow().bold().to_string(),
                MessageType::Information | MessageType::Unknown => label.cyan().to_string(),
            }
        } else {
            label.to_owned()
        };
        let _ = writeln!(stderr, "{prefix}{label}: {}", message.message);
    }
}

/// Keep only `columns` of each record, in the order given. Scalars and
/// non-record list items pass through; no columns means no projection.
pub fn select_columns(data: Value, columns: &[String]) -> Value {
    if columns.is_empty() {
        return data;
    }
    let project = |mut record: serde_json::Map<String, Value>| {
        let kept = columns
            .iter()
            .filter_map(|column| record.remove_entry(column))
            .collect();
        Value::Object(kept)
    };
    match data {
        Value::Object(record) => project(record),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => project(record),
                other => other,
            })
            .collect(),
        other => other,
    }
}

// ── Format-specific renderers ────────────────────────────────────────

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

fn render_table(data: &Value) -> String {
    match data {
        Value::Array(items) if items.is_empty() => String::new(),
        Value::Array(items) if items.iter().all(Value::is_object) => record_table(items),
        Value::Array(items) => {
            let mut builder = Builder::default();
            builder.push_record(["value"]);
            for item in items {
                builder.push_record([cell(item)]);
            }
            styled(builder)
        }
        Value::Object(map) => {
            let mut builder = Builder::default();
            builder.push_record(["key", "value"]);
            for (key, value) in map {
                builder.push_record([key.clone(), cell(value)]);
            }
            styled(builder)
        }
        other => cell(other),
    }
}

/// One row per record, one column per key in first-seen order.
fn record_table(items: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for map in items.iter().filter_map(Value::as_object) {
        for key in map.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().copied());
    for map in items.iter().filter_map(Value::as_object) {
        builder.push_record(
            columns
                .iter()
                .map(|column| map.get(*column).map(cell).unwrap_or_default()),
        );
    }
    styled(builder)
}

fn styled(builder: Builder) -> String {
    builder.build().with(Style::rounded()).to_string()
}

fn render_plain(data: &Value) -> String {
    match data {
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join("\n"),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{key}\t{}", cell(value)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => cell(other),
    }
}

/// Scalars print bare; nested values print as compact JSON.
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn records_render_with_union_of_columns() {
        let data = json!([
            { "email": "a@example.com", "quota": 10 },
            { "email": "b@example.com", "suspended": true }
        ]);
        let out = render_value(OutputFormat::Table, &data).unwrap();
        let header = out.lines().nth(1).unwrap();
        assert!(header.contains("email"));
        assert!(header.contains("quota"));
        assert!(header.contains("suspended"));
        assert!(out.contains("b@example.com"));
    }

    #[test]
    fn plain_prints_one_value_per_line() {
        let data = json!(["one", 2, { "n": 3 }]);
        assert_eq!(
            render_value(OutputFormat::Plain, &data).unwrap(),
            "one\n2\n{\"n\":3}"
        );
        assert_eq!(
            render_value(OutputFormat::Plain, &json!({ "a": 1, "b": null })).unwrap(),
            "a\t1\nb\t"
        );
    }

    #[test]
    fn structured_formats_keep_shape() {
        let data = json!({ "quota": 10 });
        assert_eq!(
            render_value(OutputFormat::JsonCompact, &data).unwrap(),
            "{\"quota\":10}"
        );
        assert_eq!(
            render_value(OutputFormat::Yaml, &data).unwrap(),
            "quota: 10\n"
        );
    }

    #[test]
    fn select_columns_projects_records_in_order() {
        let data = json!([
            { "email": "a@example.com", "quota": 10, "suspended": false },
            { "email": "b@example.com" },
            "stray"
        ]);
        let columns = ["quota".to_owned(), "email".to_owned()];
        assert_eq!(
            render_value(OutputFormat::JsonCompact, &select_columns(data, &columns)).unwrap(),
            r#"[{"quota":10,"email":"a@example.com"},{"email":"b@example.com"},"stray"]"#
        );
        assert_eq!(
            select_columns(json!({ "a": 1, "b": 2 }), &["b".to_owned()]),
            json!({ "b": 2 })
        );
        assert_eq!(select_columns(json!(5), &columns), json!(5));
        assert_eq!(select_columns(json!({ "a": 1 }), &[]), json!({ "a": 1 }));
    }

    #[test]
    fn empty_list_renders_nothing() {
        assert_eq!(render_value(OutputFormat::Table, &json!([])).unwrap(), "");
    }
}
