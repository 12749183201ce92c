//! Shared configuration for cPanel UAPI tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to the transport settings `cpanel_api::UapiClient`
//! needs. The CLI layers its flag overrides on top of this crate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cpanel_api::{Credentials, DEFAULT_TIMEOUT, TlsMode, TransportConfig};
use directories::{BaseDirs, ProjectDirs};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

/// Keyring service name for stored API tokens.
pub const KEYRING_SERVICE: &str = "cpapi";

/// Environment variable that points at an alternate config file.
pub const CONFIG_PATH_ENV: &str = "CPAPI_CONFIG";

/// Prefix for environment overrides, e.g. `CPAPI_DEFAULTS__OUTPUT=json`.
pub const ENV_PREFIX: &str = "CPAPI_";

pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' has no API token or session token")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("cannot encode config as TOML: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("cannot read config: {0}")]
    Figment(Box<figment::Error>),

    #[error("config file I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── File layout ─────────────────────────────────────────────────────

/// The whole config file.
///
/// ```toml
/// default_profile = "prod"
///
/// [defaults]
/// output = "json"
///
/// [profiles.prod]
/// server = "https://host.example.com:2083"
/// username = "bob"
/// token_env = "PROD_CPANEL_TOKEN"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_profile: Option<String>,
    pub defaults: Defaults,
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.to_owned()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, else `default_profile`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or(DEFAULT_PROFILE)
            .to_owned()
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

/// Settings that apply when neither a profile nor a flag says otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Defaults {
    /// Output format name, as accepted by `--output`.
    pub output: String,
    /// `auto`, `always` or `never`.
    pub color: String,
    pub insecure: bool,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Send arguments as a JSON body instead of a form.
    pub json_body: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: "table".to_owned(),
            color: "auto".to_owned(),
            insecure: false,
            timeout: DEFAULT_TIMEOUT.as_secs(),
            json_body: false,
        }
    }
}

/// One cPanel account on one server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// cPanel service URL, e.g. `https://host.example.com:2083`.
    pub server: String,

    /// Account the API token belongs to.
    pub username: Option<String>,

    /// Plaintext API token. The keyring or `token_env` are preferred.
    pub token: Option<String>,

    /// Name of an environment variable holding the API token.
    pub token_env: Option<String>,

    /// `cpsessNNN` of an existing session. Used instead of a token.
    pub security_token: Option<String>,

    /// Value of the `cpsession` cookie issued with `security_token`.
    pub session_cookie: Option<String>,

    /// Extra PEM bundle to trust.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    /// Seconds; overrides `defaults.timeout`.
    pub timeout: Option<u64>,
}

/// `$CPAPI_CONFIG`, else the platform config dir, else `~/.config/cpapi`.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    let dir = ProjectDirs::from("com", "cpapi", "cpapi")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .or_else(|| BaseDirs::new().map(|base| base.home_dir().join(".config").join("cpapi")))
        .unwrap_or_else(|| PathBuf::from(".cpapi"));
    dir.join("config.toml")
}

// ── Load / save ─────────────────────────────────────────────────────

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Built-in defaults, then the TOML file (if any), then `CPAPI_*` variables.
/// Nested keys use a double underscore: `CPAPI_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), exists = path.exists(), "loading config");
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    trace!(profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Like [`load_config`], but an unreadable or invalid file yields defaults.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        debug!(error = %e, "falling back to default config");
        Config::default()
    })
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, to_toml(cfg)?)?;
    Ok(())
}

/// The TOML text `save_config` writes.
pub fn to_toml(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}

// ── Credentials ─────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/api-token"),
    )?)
}

/// Save a profile's API token in the system keyring.
pub fn store_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token.expose_secret())?;
    Ok(())
}

fn token_from_env(profile: &Profile) -> Option<String> {
    let name = profile.token_env.as_deref()?;
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn token_from_keyring(profile_name: &str) -> Option<String> {
    keyring_entry(profile_name)
        .and_then(|entry| Ok(entry.get_password()?))
        .map_err(|e| trace!(profile = profile_name, error = %e, "no keyring token"))
        .ok()
}

/// API token lookup order: `token_env`, then the keyring, then the
/// plaintext `token` field.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    token_from_env(profile)
        .or_else(|| token_from_keyring(profile_name))
        .or_else(|| profile.token.clone())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.to_owned(),
        })
}

/// Pair a token with its account. A `user:token` value carries its own user.
pub fn token_credentials(
    username: Option<&str>,
    token: SecretString,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    if let Some(user) = username.filter(|u| !u.is_empty()) {
        return Ok(Credentials::ApiToken {
            user: user.to_owned(),
            token,
        });
    }
    match token.expose_secret().split_once(':') {
        Some((user, raw)) if !user.is_empty() && !raw.is_empty() => Ok(Credentials::ApiToken {
            user: user.to_owned(),
            token: SecretString::from(raw.to_owned()),
        }),
        _ => Err(ConfigError::Validation {
            field: "username".into(),
            reason: format!(
                "profile '{profile_name}' needs a username, or a token of the form user:token"
            ),
        }),
    }
}

/// Resolve `Credentials` for a profile: session token first, else API token.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    if let Some(ref security_token) = profile.security_token {
        let cookie = profile
            .session_cookie
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ConfigError::Validation {
                field: "session_cookie".into(),
                reason: format!(
                    "profile '{profile_name}' has a security_token but no cpsession cookie"
                ),
            })?;
        return Ok(Credentials::Session {
            security_token: security_token.clone(),
            session_cookie: SecretString::from(cookie.to_owned()),
        });
    }
    let token = resolve_token(profile, profile_name)?;
    token_credentials(profile.username.as_deref(), token, profile_name)
}

// ── Client settings ─────────────────────────────────────────────────

/// Everything needed to build a `UapiClient`.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub server: url::Url,
    pub credentials: Credentials,
    pub transport: TransportConfig,
}

/// TLS mode for a profile.
pub fn tls_mode(profile: &Profile, defaults: &Defaults) -> TlsMode {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::AcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CaFile(ca_path.clone())
    } else {
        TlsMode::System
    }
}

/// Validate a server URL.
pub fn parse_server(server: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = server.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {server}"),
    })?;
    if url.host_str().is_none() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("expected an http(s) URL with a host, got {server}"),
        });
    }
    Ok(url)
}

/// Build `ClientSettings` from a profile, with no CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientSettings, ConfigError> {
    let server = parse_server(&profile.server)?;
    let credentials = resolve_credentials(profile, profile_name)?;

    let transport = TransportConfig::new(
        tls_mode(profile, defaults),
        Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    );

    Ok(ClientSettings {
        server,
        credentials,
        transport,
    })
}
