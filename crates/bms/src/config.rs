//! CLI configuration: thin wrapper around `bms_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--database, --auth-token, --ack, ...).

use std::time::Duration;

use secrecy::SecretString;

use bms_core::{MemoryStore, StoreConfig, SyncOptions, Value};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use bms_config::{
    Config, Defaults, Profile, SecretKind, config_path, load_config_or_default, save_config,
    store_secret,
};

/// Where commands read and write.
pub enum Target {
    /// Process-local store, optionally seeded from a JSON file.
    Memory(MemoryStore),
    /// A realtime database.
    Remote(StoreConfig),
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Sync options: `--ack` wins, then the profile, then the defaults.
pub fn sync_options(
    global: &GlobalOpts,
    profile: Option<&Profile>,
    defaults: &Defaults,
) -> SyncOptions {
    SyncOptions {
        ack_required: global.ack
            || profile
                .and_then(|p| p.ack_required)
                .unwrap_or(defaults.ack_required),
    }
}

/// Pick the store for this invocation.
///
/// `--memory` wins; otherwise `--database` alone is enough; otherwise
/// the active profile must exist.
pub fn resolve_target(global: &GlobalOpts) -> Result<Target, CliError> {
    if global.memory {
        return memory_target(global);
    }

    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    let profile = cfg.profiles.get(&profile_name);

    let config = match (profile, global.database.as_deref()) {
        (Some(profile), _) => {
            let mut config =
                bms_config::profile_to_store_config(profile, &profile_name, &cfg.defaults)?;
            if let Some(url) = global.database.as_deref() {
                config.database_url = bms_config::parse_database_url(url)?;
            }
            config
        }
        (None, Some(url)) => {
            let mut config = StoreConfig::new(bms_config::parse_database_url(url)?);
            config.timeout = Duration::from_secs(cfg.defaults.timeout);
            config
        }
        (None, None) => {
            if global.profile.is_some() {
                cfg.profile(&profile_name)?;
            }
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    Ok(Target::Remote(apply_overrides(config, global, profile, &cfg.defaults)))
}

fn apply_overrides(
    mut config: StoreConfig,
    global: &GlobalOpts,
    profile: Option<&Profile>,
    defaults: &Defaults,
) -> StoreConfig {
    if let Some(token) = &global.auth_token {
        config.auth_token = Some(SecretString::from(token.clone()));
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    config.sync = sync_options(global, profile, defaults);
    config
}

fn memory_target(global: &GlobalOpts) -> Result<Target, CliError> {
    let Some(path) = &global.seed else {
        return Ok(Target::Memory(MemoryStore::new()));
    };
    let contents = std::fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&contents).map_err(|e| {
        CliError::Validation {
            field: "seed".into(),
            reason: format!("{}: invalid JSON: {e}", path.display()),
        }
    })?;
    Ok(Target::Memory(
        Value::from_json(json).map_or_else(MemoryStore::new, MemoryStore::with_root),
    ))
}
