//! CLI flag overrides on top of `cpanel_config`.
//!
//! The shared crate owns profiles and credential lookup; this module layers
//! `--server`, `--user`, `--token`, `--insecure` and `--timeout` over them
//! and resolves the effective output settings.

use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;

pub use cpanel_config::{
    ClientSettings, Config, Defaults, Profile, config_path, load_config, load_config_or_default,
    save_config, store_token, to_toml,
};

use cpanel_api::{TlsMode, TransportConfig};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Resolve the active profile name from `--profile` and the config file.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    cfg.active_profile_name(global.profile.as_deref())
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

// ── Client settings ──────────────────────────────────────────────────

/// Build `ClientSettings` from the config file, profile, and CLI overrides.
pub fn resolve_settings(global: &GlobalOpts, cfg: &Config) -> Result<ClientSettings, CliError> {
    let profile_name = active_profile_name(global, cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg.defaults, global);
    }

    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(cfg),
        });
    }

    // No profile: build one from flags / env alone
    let server = global.server.clone().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let profile = Profile {
        server,
        ..Profile::default()
    };
    resolve_profile(&profile, &profile_name, &cfg.defaults, global)
}

/// Translate a `Profile` plus global flags into `ClientSettings`.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ClientSettings, CliError> {
    // 1. Server URL (flag > env > profile)
    let server = cpanel_config::parse_server(global.server.as_deref().unwrap_or(&profile.server))?;

    // 2. Credentials (--token beats everything the profile knows; a
    //    user:token value keeps its own user unless --user is given)
    let credentials = if let Some(ref token) = global.token {
        let username = global
            .user
            .as_deref()
            .or_else(|| profile.username.as_deref().filter(|_| !token.contains(':')));
        cpanel_config::token_credentials(
            username,
            SecretString::from(token.clone()),
            profile_name,
        )?
    } else {
        let merged = Profile {
            username: global.user.clone().or_else(|| profile.username.clone()),
            ..profile.clone()
        };
        cpanel_config::resolve_credentials(&merged, profile_name)?
    };

    // 3. TLS
    let tls = if global.insecure {
        TlsMode::AcceptInvalid
    } else {
        cpanel_config::tls_mode(profile, defaults)
    };

    // 4. Timeout
    let timeout = global
        .timeout
        .or(profile.timeout)
        .unwrap_or(defaults.timeout);

    Ok(ClientSettings {
        server,
        credentials,
        transport: TransportConfig::new(tls, Duration::from_secs(timeout)),
    })
}

// ── Output settings ──────────────────────────────────────────────────

/// Effective output format: `--output`, else `defaults.output`, else table.
pub fn output_format(global: &GlobalOpts, defaults: &Defaults) -> OutputFormat {
    global
        .output
        .or_else(|| OutputFormat::from_str(&defaults.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}

/// Effective color mode: `--color`, else `defaults.color`, else auto.
pub fn color_mode(global: &GlobalOpts, defaults: &Defaults) -> ColorMode {
    global
        .color
        .or_else(|| ColorMode::from_str(&defaults.color, true).ok())
        .unwrap_or(ColorMode::Auto)
}
