//! Clap derive structures for the `cpapi` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. This file
//! is also compiled by `build.rs` for man page generation, so it only
//! depends on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cpapi -- call cPanel UAPI functions from the command line
#[derive(Debug, Parser)]
#[command(
    name = "cpapi",
    version,
    about = "Call cPanel UAPI functions from the command line",
    long_about = "Builds typed UAPI requests (arguments, sorts, filters, pagination),\n\
        sends them to a cPanel server with an API token or session, and\n\
        renders the response envelope.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "CPAPI_PROFILE", global = true)]
    pub profile: Option<String>,

    /// cPanel server URL, e.g. https://host.example.com:2083 (overrides profile)
    #[arg(long, short = 's', env = "CPAPI_SERVER", global = true)]
    pub server: Option<String>,

    /// cPanel account the API token belongs to
    #[arg(long, short = 'u', env = "CPAPI_USER", global = true)]
    pub user: Option<String>,

    /// API token, either bare or as user:token
    #[arg(long, env = "CPAPI_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "CPAPI_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CPAPI_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: from profile, else 30]
    #[arg(long, env = "CPAPI_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// HTTP verb used to send the call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Verb {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Call one UAPI function
    #[command(alias = "c")]
    Call(CallArgs),

    /// Run several calls in one Batch::strict request
    Batch(BatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Call ─────────────────────────────────────────────────────────────

/// Arguments shared by `call` and `batch` that control how a request is sent.
#[derive(Debug, Args)]
pub struct SendArgs {
    /// HTTP verb; GET, DELETE and HEAD carry arguments in the query string
    #[arg(long, value_enum, default_value_t = Verb::Post)]
    pub verb: Verb,

    /// Encode arguments as a JSON body instead of a form
    #[arg(long)]
    pub json_body: bool,

    /// Print the generated request instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Extra request header, "Name: value" (repeatable)
    #[arg(long = "header", short = 'H', value_name = "NAME: VALUE")]
    pub headers: Vec<String>,
}

#[derive(Debug, Args)]
#[command(after_help = "\
Examples:
  cpapi call Email list_pops domain=example.com
  cpapi call Email list_pops --sort email:desc --filter email:contains:info
  cpapi call Mysql list_databases --page 2 --page-size 10 --verb get
  cpapi call DNS mass_edit_zone zone=example.com add:='{\"dname\":\"www\"}' --json-body")]
pub struct CallArgs {
    /// UAPI module, e.g. Email
    pub module: String,

    /// Function within the module, e.g. list_pops
    pub function: String,

    /// Arguments as name=value, or name:=<json> for a raw JSON value
    #[arg(value_name = "NAME=VALUE")]
    pub arguments: Vec<String>,

    /// Sort rule, column[:asc|desc][:lexicographic|numeric|ipv4|numeric_zero_as_max]
    #[arg(long = "sort", value_name = "COLUMN[:DIR][:TYPE]")]
    pub sorts: Vec<String>,

    /// Filter rule, column:operator:value (e.g. email:contains:info)
    #[arg(long = "filter", value_name = "COLUMN:OP:VALUE")]
    pub filters: Vec<String>,

    /// Keep only these record fields in the output (repeatable)
    #[arg(long = "column", value_name = "COLUMN")]
    pub columns: Vec<String>,

    /// Page to fetch (1-based); enables pagination
    #[arg(long)]
    pub page: Option<i64>,

    /// Records per page, or "all"; enables pagination
    #[arg(long, value_name = "N|all")]
    pub page_size: Option<String>,

    /// Ask the server to record analytics for this call
    #[arg(long)]
    pub analytics: bool,

    #[command(flatten)]
    pub send: SendArgs,
}

// ── Batch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// JSON or YAML file holding a list of calls ("-" reads stdin)
    pub file: PathBuf,

    #[command(flatten)]
    pub send: SendArgs,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Show the current configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,

    /// Set a value on the active profile
    Set {
        /// Profile key (server, username, token_env, security_token, session_cookie, ca_cert,
        /// insecure, timeout)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store the active profile's API token in the system keyring
    SetToken,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
