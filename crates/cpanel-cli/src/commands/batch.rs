//! `cpapi batch <file>`: several calls in one `Batch::strict` request.
//!
//! The file holds a list of call literals:
//!
//! ```yaml
//! - module: Email
//!   function: list_pops
//!   arguments: [{ name: domain, value: example.com }]
//!   pager: { page: 1, page_size: 50 }
//! - module: Quota
//!   function: get_quota_info
//! ```

use std::io::Read;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use cpanel_api::{
    BatchRequest, EncodingRule, MessageType, Request, RequestInit, Response, ResponseOptions,
    UapiRequest, UapiResponse,
};

use super::{Context, util};
use crate::cli::{BatchArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Read call literals from a JSON or YAML file, or stdin for `-`.
pub fn read_calls(path: &Path) -> Result<Vec<RequestInit>, CliError> {
    let contents = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        Ok(serde_yaml::from_str(&contents)?)
    } else {
        Ok(serde_json::from_str(&contents)?)
    }
}

pub fn build_batch(
    calls: Vec<RequestInit>,
    args: &BatchArgs,
    ctx: &Context,
) -> Result<BatchRequest, CliError> {
    let mut batch = calls
        .into_iter()
        .map(UapiRequest::from_init)
        .collect::<Result<BatchRequest, _>>()?;

    for raw in &args.send.headers {
        batch.add_header(util::parse_header(raw)?);
    }
    batch.set_config(util::request_config(&args.send, false, ctx));
    Ok(batch)
}

#[derive(Serialize)]
struct BatchItem<'a> {
    module: &'a str,
    function: &'a str,
    status: i64,
    data: &'a Value,
}

pub async fn handle(args: &BatchArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let calls = read_calls(&args.file)?;
    let batch = build_batch(calls, args, ctx)?;
    let rule = EncodingRule::new(util::http_verb(args.send.verb));

    if args.send.dry_run {
        let info = batch.generate(Some(rule.clone()))?;
        return util::print_dry_run(&rule, &info, ctx);
    }

    let client = util::connect(global, ctx)?;
    debug!(calls = batch.len(), "sending batch");
    let response = client.call_batch(&batch, Some(rule)).await?;
    let items = response.batch_items(ResponseOptions::default())?;

    for (call, item) in batch.calls().iter().zip(&items) {
        let prefix = format!("[{}::{}] ", call.namespace(), call.method());
        output::print_messages(
            item.messages
                .iter()
                .filter(|m| m.message_type != MessageType::Error),
            &prefix,
            ctx.color,
            ctx.quiet,
        );
    }

    if response.failed() {
        return Err(CliError::ApiFailure {
            call: "Batch::strict".into(),
            errors: failure_summary(&response, &batch, &items),
        });
    }

    render_items(&batch, &items, ctx)
}

/// Top-level errors plus the errors of the first failing command.
fn failure_summary(
    response: &UapiResponse<Value>,
    batch: &BatchRequest,
    items: &[UapiResponse<Value>],
) -> String {
    let mut summary = util::error_summary(response);
    if let Some((call, item)) = batch
        .calls()
        .iter()
        .zip(items)
        .find(|(_, item)| item.failed())
    {
        summary.push_str(&format!(
            " ({}::{}: {})",
            call.namespace(),
            call.method(),
            util::error_summary(item)
        ));
    }
    summary
}

fn render_items(
    batch: &BatchRequest,
    items: &[UapiResponse<Value>],
    ctx: &Context,
) -> Result<(), CliError> {
    match ctx.format {
        OutputFormat::Table | OutputFormat::Plain => {
            for (call, item) in batch.calls().iter().zip(items) {
                if ctx.format == OutputFormat::Table && !ctx.quiet {
                    eprintln!("── {}::{} ──", call.namespace(), call.method());
                }
                let out = output::render_value(ctx.format, &item.data)?;
                output::print_output(&out, ctx.quiet);
            }
            Ok(())
        }
        format => {
            let rows: Vec<BatchItem<'_>> = batch
                .calls()
                .iter()
                .zip(items)
                .map(|(call, item)| BatchItem {
                    module: call.namespace(),
                    function: call.method(),
                    status: item.status,
                    data: &item.data,
                })
                .collect();
            let out = output::render_single(format, &rows, |_| String::new())?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }
    }
}
