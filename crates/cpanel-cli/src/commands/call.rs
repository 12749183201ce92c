//! `cpapi call <module> <function> ...`

use serde_json::Value;
use tracing::debug;

use cpanel_api::{EncodingRule, Request, UapiRequest};

use super::{Context, util};
use crate::cli::{CallArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Turn the parsed flags into a `UapiRequest`.
pub fn build_request(args: &CallArgs, ctx: &Context) -> Result<UapiRequest, CliError> {
    let mut request = UapiRequest::new(&args.module, &args.function);

    for raw in &args.arguments {
        request.add_argument(util::parse_argument(raw)?)?;
    }
    for raw in &args.sorts {
        request.add_sort(util::parse_sort(raw)?)?;
    }
    for raw in &args.filters {
        request.add_filter(util::parse_filter(raw)?)?;
    }
    for column in &args.columns {
        request.add_column(column.clone());
    }
    if let Some(pager) = util::parse_pager(args.page, args.page_size.as_deref())? {
        request.paginate(pager)?;
    }
    for raw in &args.send.headers {
        request.add_header(util::parse_header(raw)?)?;
    }
    request.set_config(util::request_config(&args.send, args.analytics, ctx));

    Ok(request)
}

pub async fn handle(args: &CallArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let request = build_request(args, ctx)?;
    let rule = EncodingRule::new(util::http_verb(args.send.verb));

    if args.send.dry_run {
        let info = request.generate(Some(rule.clone()))?;
        return util::print_dry_run(&rule, &info, ctx);
    }

    let client = util::connect(global, ctx)?;
    let call = format!("{}::{}", args.module, args.function);
    debug!(%call, verb = %rule.verb, "calling");

    let mut response = client.call::<Value>(&request, Some(rule)).await?;
    response.data = output::select_columns(response.data, &request.parts().columns);
    util::report(&response, &call, ctx)
}
