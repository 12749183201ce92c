//! Command dispatch: bridges CLI args -> UAPI requests -> output formatting.

pub mod batch;
pub mod call;
pub mod config_cmd;
pub mod util;

use cpanel_config::Config;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Settings every request-sending command needs.
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl Context {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = config::load_config()?;
        let format = config::output_format(global, &config.defaults);
        let color = output::should_color(config::color_mode(global, &config.defaults));
        Ok(Self {
            config,
            format,
            color,
            quiet: global.quiet,
        })
    }
}

/// Dispatch a request-sending command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = Context::load(global)?;
    match cmd {
        Command::Call(args) => call::handle(&args, &ctx, global).await,
        Command::Batch(args) => batch::handle(&args, &ctx, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
