//! CLI error types with miette diagnostics.
//!
//! Maps `cpanel_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use cpanel_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: u8 = 1;
    pub const USAGE: u8 = 2;
    pub const AUTH: u8 = 3;
    pub const API_FAILURE: u8 = 4;
    pub const CONNECTION: u8 = 7;
    pub const TIMEOUT: u8 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(cpapi::connection_failed),
        help(
            "Check that cPanel is running and the port is reachable (2083 for cPanel, \
             2087 for WHM).\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(cpapi::tls_error),
        help(
            "cPanel often serves a self-signed certificate.\n\
             Use --insecure (-k) to accept it, or configure ca_cert in your profile."
        )
    )]
    TlsError { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(cpapi::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(cpapi::auth_failed),
        help(
            "Verify the API token and the account it belongs to.\n\
             Tokens are created in cPanel under Security > Manage API Tokens.\n\
             Run: cpapi config set-token"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(cpapi::no_credentials),
        help(
            "Configure credentials with: cpapi config init\n\
             Or set CPAPI_TOKEN (user:token) in the environment."
        )
    )]
    NoCredentials { profile: String },

    // ── Request / response ───────────────────────────────────────────
    #[error("Invalid request: {message}")]
    #[diagnostic(code(cpapi::invalid_request))]
    InvalidRequest { message: String },

    #[error("{call} failed: {errors}")]
    #[diagnostic(code(cpapi::api_failure))]
    ApiFailure { call: String, errors: String },

    #[error("Server returned HTTP {status}")]
    #[diagnostic(code(cpapi::http), help("Response body: {body}"))]
    Http { status: u16, body: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(cpapi::invalid_response),
        help("The server did not answer with a UAPI envelope. Check the server URL and port.")
    )]
    InvalidResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(cpapi::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(cpapi::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: cpapi config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(cpapi::no_config),
        help(
            "Create a profile with: cpapi config init\n\
             Or pass --server and --token.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(cpapi::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {message}")]
    #[diagnostic(code(cpapi::keyring))]
    Keyring { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(cpapi::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML payload: {0}")]
    #[diagnostic(code(cpapi::yaml), help("Check the YAML file contents and try again."))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to write config: {0}")]
    #[diagnostic(code(cpapi::config_write))]
    ConfigWrite(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::ApiFailure { .. } => exit_code::API_FAILURE,
            Self::InvalidRequest { .. } | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── cpanel_api::Error → CliError ─────────────────────────────────────

impl From<cpanel_api::Error> for CliError {
    fn from(err: cpanel_api::Error) -> Self {
        use cpanel_api::Error;

        if err.is_request_error() {
            return Self::InvalidRequest {
                message: err.to_string(),
            };
        }

        match err {
            Error::Authentication { message } => Self::AuthFailed { message },
            Error::Http { status, body } => Self::Http { status, body },
            Error::InvalidResponse { message } => Self::InvalidResponse { message },
            Error::Deserialization { message, body } => Self::InvalidResponse {
                message: format!("{message} (body starts with: {})", excerpt(&body)),
            },
            Error::Transport(e) if e.is_timeout() => Self::Timeout,
            Error::Transport(e) => Self::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string),
                source: Box::new(e),
            },
            Error::InvalidUrl(e) => Self::Validation {
                field: "server".into(),
                reason: e.to_string(),
            },
            Error::Tls(message) => Self::TlsError { message },
            other => Self::InvalidRequest {
                message: other.to_string(),
            },
        }
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(80).collect()
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Keyring(e) => Self::Keyring {
                message: e.to_string(),
            },
            ConfigError::Serialization(e) => Self::ConfigWrite(e.to_string()),
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}
