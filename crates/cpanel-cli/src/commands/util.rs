//! Shared helpers for command handlers: parsing the compact flag syntax
//! into `cpanel_api` value objects, connecting, and reporting envelopes.

use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use cpanel_api::{
    EncodingRule, FilterLiteral, HttpVerb, MessageType, Pager, RequestConfig, RequestInfo,
    Response, Sort, SortDirection, SortType, UapiClient, UapiResponse, DEFAULT_PAGE_SIZE,
};

use super::Context;
use crate::cli::{GlobalOpts, OutputFormat, SendArgs, Verb};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Flag parsing ────────────────────────────────────────────────────

/// `name=value` keeps the value as a string; `name:=<json>` parses it.
pub fn parse_argument(raw: &str) -> Result<(String, Value), CliError> {
    let (name, value) = raw.split_once('=').ok_or_else(|| CliError::Validation {
        field: "argument".into(),
        reason: format!("expected NAME=VALUE, got '{raw}'"),
    })?;

    if let Some(name) = name.strip_suffix(':') {
        let value = serde_json::from_str(value).map_err(|e| CliError::Validation {
            field: format!("argument '{name}'"),
            reason: format!("invalid JSON value: {e}"),
        })?;
        return Ok((name.to_owned(), value));
    }
    Ok((name.to_owned(), Value::String(value.to_owned())))
}

/// `column[:asc|desc][:type]`, direction and type in either order.
pub fn parse_sort(raw: &str) -> Result<Sort, CliError> {
    let mut parts = raw.split(':');
    let column = parts.next().unwrap_or_default();
    let mut direction = SortDirection::default();
    let mut sort_type = SortType::default();

    for part in parts {
        match part.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => direction = SortDirection::Ascending,
            "desc" | "descending" | "reverse" => direction = SortDirection::Descending,
            other => {
                sort_type = SortType::from_str(other).map_err(|_| CliError::Validation {
                    field: "sort".into(),
                    reason: format!(
                        "unknown direction or sort type '{other}' in '{raw}' (expected asc, \
                         desc, lexicographic, numeric, ipv4 or numeric_zero_as_max)"
                    ),
                })?;
            }
        }
    }

    Ok(Sort::with(column, direction, sort_type)?)
}

/// `column:operator:value`. The value may itself contain colons. The
/// operator is resolved by the request, so unknown names surface as
/// request errors.
pub fn parse_filter(raw: &str) -> Result<FilterLiteral, CliError> {
    let mut parts = raw.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(column), Some(operator), value) => Ok(FilterLiteral {
            column: column.to_owned(),
            operator: operator.to_owned(),
            value: Value::String(value.unwrap_or_default().to_owned()),
        }),
        _ => Err(CliError::Validation {
            field: "filter".into(),
            reason: format!("expected COLUMN:OPERATOR:VALUE, got '{raw}'"),
        }),
    }
}

/// `Name: value` (the space after the colon is optional).
pub fn parse_header(raw: &str) -> Result<(String, String), CliError> {
    let (name, value) = raw.split_once(':').ok_or_else(|| CliError::Validation {
        field: "header".into(),
        reason: format!("expected 'Name: value', got '{raw}'"),
    })?;
    Ok((name.trim().to_owned(), value.trim().to_owned()))
}

/// Pagination is enabled when either `--page` or `--page-size` is present.
pub fn parse_pager(page: Option<i64>, page_size: Option<&str>) -> Result<Option<Pager>, CliError> {
    if page.is_none() && page_size.is_none() {
        return Ok(None);
    }
    let page = page.unwrap_or(1);
    let pager = match page_size {
        Some(size) if size.eq_ignore_ascii_case("all") => Pager::unbounded(page)?,
        Some(size) => {
            let size = size.parse::<i64>().map_err(|_| CliError::Validation {
                field: "page-size".into(),
                reason: format!("expected a number or 'all', got '{size}'"),
            })?;
            Pager::new(page, size)?
        }
        None => Pager::new(page, i64::try_from(DEFAULT_PAGE_SIZE).unwrap_or(20))?,
    };
    Ok(Some(pager))
}

pub fn http_verb(verb: Verb) -> HttpVerb {
    match verb {
        Verb::Get => HttpVerb::Get,
        Verb::Post => HttpVerb::Post,
        Verb::Put => HttpVerb::Put,
        Verb::Patch => HttpVerb::Patch,
        Verb::Delete => HttpVerb::Delete,
        Verb::Head => HttpVerb::Head,
    }
}

/// Request switches from flags, with `defaults.json_body` as a fallback.
pub fn request_config(send: &SendArgs, analytics: bool, ctx: &Context) -> RequestConfig {
    RequestConfig {
        analytics,
        json: send.json_body || ctx.config.defaults.json_body,
    }
}

// ── Sending ─────────────────────────────────────────────────────────

/// Build a `UapiClient` from the resolved profile and flags.
pub fn connect(global: &GlobalOpts, ctx: &Context) -> Result<UapiClient, CliError> {
    let settings = config::resolve_settings(global, &ctx.config)?;
    debug!(server = %settings.server, "connecting");
    Ok(UapiClient::new(
        settings.server.as_str(),
        &settings.credentials,
        &settings.transport,
    )?)
}

#[derive(Serialize)]
struct DryRun<'a> {
    verb: HttpVerb,
    #[serde(flatten)]
    info: &'a RequestInfo,
}

/// Print a generated request instead of sending it.
pub fn print_dry_run(
    rule: &EncodingRule,
    info: &RequestInfo,
    ctx: &Context,
) -> Result<(), CliError> {
    let dry_run = DryRun {
        verb: rule.verb,
        info,
    };
    let out = output::render_single(ctx.format, &dry_run, |d| {
        let mut text = format!("{} {}\n", d.verb, d.info.url);
        for header in &d.info.headers {
            text.push_str(&format!("{}: {}\n", header.name(), header.value()));
        }
        if !d.info.body.is_empty() {
            text.push('\n');
            text.push_str(&d.info.body);
        }
        text.trim_end().to_owned()
    })?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

// ── Reporting ───────────────────────────────────────────────────────

/// Join the envelope's error messages, or describe the bare failure.
pub fn error_summary(response: &UapiResponse<Value>) -> String {
    let errors: Vec<&str> = response
        .errors()
        .into_iter()
        .map(|m| m.message.as_str())
        .collect();
    if errors.is_empty() {
        format!("status {}", response.status)
    } else {
        errors.join("; ")
    }
}

/// Print warnings and info to stderr, then the data in the chosen format.
pub fn report(response: &UapiResponse<Value>, call: &str, ctx: &Context) -> Result<(), CliError> {
    output::print_messages(
        response
            .messages
            .iter()
            .filter(|m| m.message_type != MessageType::Error),
        "",
        ctx.color,
        ctx.quiet,
    );

    if response.failed() {
        return Err(CliError::ApiFailure {
            call: call.to_owned(),
            errors: error_summary(response),
        });
    }

    let out = output::render_value(ctx.format, &response.data)?;
    output::print_output(&out, ctx.quiet);

    if response.is_paged() && ctx.format == OutputFormat::Table && !ctx.quiet {
        let meta = &response.meta;
        eprintln!(
            "page {}/{} ({} records)",
            meta.page, meta.total_pages, meta.total_records
        );
    }
    Ok(())
}
