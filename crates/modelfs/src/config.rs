//! CLI configuration: TOML profiles resolved through figment.
//!
//! A profile names a console server plus per-profile defaults; global
//! flags and `MODELFS_*` env vars override it. Resolution produces the
//! `ConsoleConfig` the core session consumes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use modelfs_api::transport::TlsMode;
use modelfs_core::ConsoleConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Named console profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            profiles: HashMap::new(),
        }
    }
}

/// A named console profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct Profile {
    /// Console base URL (e.g. "http://localhost:8090").
    pub server: String,

    /// Default namespace for this profile.
    pub namespace: Option<String>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout in seconds.
    pub timeout: Option<u64>,
}

// ── Loading ─────────────────────────────────────────────────────────

/// Path of the config file: `<config dir>/modelfs/config.toml`.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "modelfs")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("modelfs-config.toml"))
}

/// Load configuration, falling back to defaults if the file is missing
/// or unreadable.
pub fn load_config_or_default() -> Config {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(config_path()))
        .merge(Env::prefixed("MODELFS_CONFIG_"))
        .extract()
        .unwrap_or_default()
}

/// The profile the invocation should use: `--profile` flag, then the
/// config's `default_profile`, then "default".
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

// ── Resolution ──────────────────────────────────────────────────────

/// Build a `ConsoleConfig` from the config file, profile, and CLI flags.
pub fn resolve_console_config(global: &GlobalOpts) -> Result<ConsoleConfig, CliError> {
    let config = load_config_or_default();
    let profile_name = active_profile_name(global, &config);
    let profile = config.profiles.get(&profile_name);

    // A profile named explicitly with --profile must exist.
    if profile.is_none() && global.profile.is_some() {
        let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available.join(", "),
        });
    }

    let server = global
        .server
        .clone()
        .or_else(|| profile.map(|p| p.server.clone()))
        .ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;

    let url: url::Url = server.parse().map_err(|_| CliError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {server}"),
    })?;

    let mut console = ConsoleConfig::new(url);

    if let Some(ns) = profile.and_then(|p| p.namespace.clone()) {
        console.default_namespace = ns;
    }

    let insecure = global.insecure || profile.and_then(|p| p.insecure).unwrap_or(false);
    if insecure {
        console.tls = TlsMode::DangerAcceptInvalid;
    }

    let timeout = profile
        .and_then(|p| p.timeout)
        .filter(|_| global.timeout == 30)
        .unwrap_or(global.timeout);
    console.timeout = Duration::from_secs(timeout);

    Ok(console)
}

/// Write a starter config file with one default profile.
pub fn write_starter_config(server: &str) -> Result<PathBuf, CliError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut profiles = HashMap::new();
    profiles.insert(
        "default".to_string(),
        Profile {
            server: server.to_string(),
            namespace: None,
            insecure: None,
            timeout: None,
        },
    );
    let config = Config {
        default_profile: Some("default".into()),
        profiles,
    };

    let raw = toml::to_string_pretty(&config).map_err(|e| CliError::Validation {
        field: "config".into(),
        reason: e.to_string(),
    })?;
    std::fs::write(&path, raw)?;
    Ok(path)
}
