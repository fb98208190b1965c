//! Shared configuration for the `bms` tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `bms_core::StoreConfig`. The CLI layers its
//! flag overrides on top of [`profile_to_store_config`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bms_core::{StoreConfig, SyncOptions};

/// Keyring service name shared by every profile.
pub const KEYRING_SERVICE: &str = "bms";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String, available: Vec<String> },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named database profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: `requested`, else the configured
    /// default, else `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.into(),
                available: self.profiles.keys().cloned().collect(),
            })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Wait for the store to confirm each write.
    #[serde(default)]
    pub ack_required: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            ack_required: false,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named building database.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Database root URL (e.g., "https://my-building-default-rtdb.firebaseio.com").
    pub database_url: String,

    /// Database secret or ID token (plaintext; prefer keyring or env var).
    pub auth_token: Option<String>,

    /// Environment variable name containing the auth token.
    pub auth_token_env: Option<String>,

    /// Project web API key for email/password sign-in.
    pub api_key: Option<String>,

    /// Account email used by `login`.
    pub email: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override write acknowledgement.
    pub ack_required: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "bms", "bms").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("bms");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Nested keys come from `BMS_` variables with `__` as the separator,
/// e.g. `BMS_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BMS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Secrets a profile can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    AuthToken,
    ApiKey,
}

impl SecretKind {
    fn keyring_user(self, profile_name: &str) -> String {
        match self {
            Self::AuthToken => format!("{profile_name}/auth-token"),
            Self::ApiKey => format!("{profile_name}/api-key"),
        }
    }

    fn env_var(self) -> &'static str {
        match self {
            Self::AuthToken => "BMS_AUTH_TOKEN",
            Self::ApiKey => "BMS_API_KEY",
        }
    }
}

fn keyring_secret(kind: SecretKind, profile_name: &str) -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &kind.keyring_user(profile_name)).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

/// Save a secret to the system keyring for `profile_name`.
pub fn store_secret(kind: SecretKind, profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &kind.keyring_user(profile_name))?;
    entry.set_password(secret)?;
    Ok(())
}

/// Resolve the database auth token. `None` means the database is
/// accessed without credentials.
pub fn resolve_auth_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's auth_token_env → env var lookup
    if let Some(val) = profile
        .auth_token_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Some(SecretString::from(val));
    }

    // 2. Global env var
    if let Ok(val) = std::env::var(SecretKind::AuthToken.env_var()) {
        return Some(SecretString::from(val));
    }

    // 3. System keyring
    if let Some(secret) = keyring_secret(SecretKind::AuthToken, profile_name) {
        return Some(secret);
    }

    // 4. Plaintext in config
    profile.auth_token.clone().map(SecretString::from)
}

/// Resolve the identity API key: env → keyring → plaintext.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Ok(val) = std::env::var(SecretKind::ApiKey.env_var()) {
        return Some(SecretString::from(val));
    }
    if let Some(secret) = keyring_secret(SecretKind::ApiKey, profile_name) {
        return Some(secret);
    }
    profile.api_key.clone().map(SecretString::from)
}

/// Parse and validate a database URL.
pub fn parse_database_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "database_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "database_url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build a `StoreConfig` from a profile, with `defaults` filling the
/// gaps. No CLI flag overrides.
pub fn profile_to_store_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<StoreConfig, ConfigError> {
    let mut config = StoreConfig::new(parse_database_url(&profile.database_url)?);
    config.auth_token = resolve_auth_token(profile, profile_name);
    config.api_key = resolve_api_key(profile, profile_name);
    config.ca_cert.clone_from(&profile.ca_cert);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.sync = SyncOptions {
        ack_required: profile.ack_required.unwrap_or(defaults.ack_required),
    };
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"
default_profile = "hq"

[defaults]
timeout = 12

[profiles.hq]
database_url = "https://hq-default-rtdb.example.com"
auth_token = "plain-token"
ack_required = true

[profiles.annex]
database_url = "https://annex.example.com"
timeout = 5
"#;

    fn write_sample(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn loads_profiles_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();

        assert_eq!(cfg.active_profile_name(None), "hq");
        assert_eq!(cfg.active_profile_name(Some("annex")), "annex");
        assert_eq!(cfg.defaults.timeout, 12);
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.profiles.len(), 2);
    }

    #[test]
    fn unknown_profile_lists_available() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();
        match cfg.profile("garage") {
            Err(ConfigError::UnknownProfile { name, available }) => {
                assert_eq!(name, "garage");
                assert_eq!(available, vec!["annex".to_owned(), "hq".to_owned()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn profile_translates_to_store_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&write_sample(&dir)).unwrap();

        let annex = cfg.profile("annex").unwrap();
        let store = profile_to_store_config(annex, "annex", &cfg.defaults).unwrap();
        assert_eq!(store.database_url.as_str(), "https://annex.example.com/");
        assert_eq!(store.timeout, Duration::from_secs(5));
        assert!(!store.sync.ack_required);

        let hq = cfg.profile("hq").unwrap();
        let store = profile_to_store_config(hq, "hq", &cfg.defaults).unwrap();
        assert_eq!(store.timeout, Duration::from_secs(12));
        assert!(store.sync.ack_required);
        if std::env::var("BMS_AUTH_TOKEN").is_err() {
            assert_eq!(
                store.auth_token.as_ref().map(|s| s.expose_secret().to_owned()),
                Some("plain-token".to_owned())
            );
        }
    }

    #[test]
    fn rejects_non_http_database_url() {
        let profile = Profile {
            database_url: "ftp://example.com".into(),
            ..Profile::default()
        };
        let err = profile_to_store_config(&profile, "x", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "database_url"));

        assert!(parse_database_url("not a url").is_err());
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                database_url: "https://b.example.com".into(),
                email: Some("ops@example.com".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let profile = loaded.profile("default").unwrap();
        assert_eq!(profile.database_url, "https://b.example.com");
        assert_eq!(profile.email.as_deref(), Some("ops@example.com"));
    }
}
