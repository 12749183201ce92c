//! `cpapi config ...`: edit and inspect the profile file.
//!
//! None of these talk to a server, so they run before the request context
//! (and its config validation) is built.

use dialoguer::{Input, Select};
use secrecy::{ExposeSecret, SecretString};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

const PROFILE_KEYS: &str = "server, username, token, token_env, security_token, \
                            session_cookie, insecure, timeout, ca_cert";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),
        ConfigCommand::Show => show(global),
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
        ConfigCommand::Set { key, value } => set(global, &key, value),
        ConfigCommand::Profiles => {
            list_profiles(&config::load_config_or_default());
            Ok(())
        }
        ConfigCommand::Use { name } => use_profile(name),
        ConfigCommand::SetToken => set_token(global),
    }
}

// ── Show / list ──────────────────────────────────────────────────────

/// Secrets replaced by a fixed mask; everything else untouched.
fn masked(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        for secret in [
            &mut profile.token,
            &mut profile.security_token,
            &mut profile.session_cookie,
        ] {
            if secret.is_some() {
                *secret = Some(MASK.to_owned());
            }
        }
    }
    cfg
}

/// Table and plain output show the file as it would be written.
fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = masked(&config::load_config_or_default());
    let format = config::output_format(global, &cfg.defaults);
    let text = config::to_toml(&cfg)?;
    let rendered = output::render_single(format, &cfg, |_| text.trim_end().to_owned())?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn list_profiles(cfg: &Config) {
    if cfg.profiles.is_empty() {
        eprintln!("No profiles yet. Create one with: cpapi config init");
        return;
    }
    let active = cfg.active_profile_name(None);
    for name in cfg.profiles.keys() {
        if *name == active {
            println!("{name} *");
        } else {
            println!("{name}");
        }
    }
}

// ── Mutations ────────────────────────────────────────────────────────

fn invalid(field: &str, reason: impl Into<String>) -> CliError {
    CliError::Validation {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

/// Store one `config set` value, parsing booleans, numbers and URLs.
fn assign(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key.replace('-', "_").as_str() {
        "server" => {
            cpanel_config::parse_server(&value)?;
            profile.server = value;
        }
        "username" | "user" => profile.username = Some(value),
        "token" => profile.token = Some(value),
        "token_env" => profile.token_env = Some(value),
        "security_token" => profile.security_token = Some(value),
        "session_cookie" => profile.session_cookie = Some(value),
        "ca_cert" => profile.ca_cert = Some(value.into()),
        "insecure" => {
            let flag = value.parse().map_err(|_| {
                invalid("insecure", format!("expected true or false, got '{value}'"))
            })?;
            profile.insecure = Some(flag);
        }
        "timeout" => {
            let seconds = value
                .parse()
                .map_err(|_| invalid("timeout", format!("expected whole seconds, got '{value}'")))?;
            profile.timeout = Some(seconds);
        }
        _ => {
            return Err(invalid(
                key,
                format!("unknown config key '{key}' (known keys: {PROFILE_KEYS})"),
            ));
        }
    }
    Ok(())
}

fn set(global: &GlobalOpts, key: &str, value: String) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let name = config::active_profile_name(global, &cfg);
    assign(cfg.profiles.entry(name.clone()).or_default(), key, value)?;
    config::save_config(&cfg)?;
    eprintln!("✓ {name}.{key} updated");
    Ok(())
}

fn require_profile(cfg: &Config, name: &str) -> Result<(), CliError> {
    if cfg.profiles.contains_key(name) {
        Ok(())
    } else {
        Err(CliError::ProfileNotFound {
            name: name.to_owned(),
            available: config::available_profiles(cfg),
        })
    }
}

fn use_profile(name: String) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    require_profile(&cfg, &name)?;
    eprintln!("✓ Now using profile '{name}' by default");
    cfg.default_profile = Some(name);
    config::save_config(&cfg)?;
    Ok(())
}

fn set_token(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let name = config::active_profile_name(global, &cfg);
    require_profile(&cfg, &name)?;
    config::store_token(&name, &read_token()?)?;
    eprintln!("✓ API token for '{name}' saved to the system keyring");
    Ok(())
}

// ── Interactive setup ────────────────────────────────────────────────

fn prompt_failed(e: impl std::fmt::Display) -> CliError {
    invalid("interactive", format!("prompt failed: {e}"))
}

fn ask(prompt: &str, default: Option<&str>) -> Result<String, CliError> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(default) = default {
        input = input.default(default.to_owned());
    }
    input.interact_text().map_err(prompt_failed)
}

fn choose(prompt: &str, items: &[&str]) -> Result<usize, CliError> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()
        .map_err(prompt_failed)
}

fn read_token() -> Result<SecretString, CliError> {
    let token = rpassword::prompt_password("API token: ").map_err(prompt_failed)?;
    if token.trim().is_empty() {
        return Err(invalid("token", "the API token is empty"));
    }
    Ok(SecretString::from(token))
}

/// Walk through one profile and make it the default.
fn init() -> Result<(), CliError> {
    let path = config::config_path();
    eprintln!("cpapi setup (writing {})\n", path.display());

    let name = ask("Profile name", Some("default"))?;
    let server = Input::<String>::new()
        .with_prompt("cPanel URL")
        .default("https://localhost:2083".to_owned())
        .validate_with(|candidate: &String| {
            cpanel_config::parse_server(candidate)
                .map(drop)
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_failed)?;

    let mut profile = Profile {
        server,
        ..Profile::default()
    };

    let auth = choose(
        "How should cpapi authenticate?",
        &["API token", "Existing session (cpsess token)"],
    )?;
    if auth == 0 {
        profile.username = Some(ask("cPanel account", None)?);
        let token = read_token()?;
        let store = choose(
            "Keep the token in",
            &["the system keyring", "the config file (plaintext)"],
        )?;
        if store == 0 {
            config::store_token(&name, &token)?;
        } else {
            profile.token = Some(token.expose_secret().to_owned());
        }
    } else {
        profile.security_token = Some(ask("Security token (cpsessNNNNNNNNNN)", None)?);
        let cookie = rpassword::prompt_password("cpsession cookie: ").map_err(prompt_failed)?;
        if cookie.trim().is_empty() {
            return Err(invalid("session_cookie", "the cpsession cookie is empty"));
        }
        profile.session_cookie = Some(cookie.trim().to_owned());
    }

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(name.clone(), profile);
    cfg.default_profile = Some(name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Saved profile '{name}' to {}", path.display());
    eprintln!("  Try it: cpapi call Variables get_user_information");
    Ok(())
}
