// ── Runtime store configuration ──
//
// These types describe *how* to reach the realtime database and how the
// synchronizer should treat writes. They carry credential data but never
// touch disk; the CLI builds them from `bms-config` profiles.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use bms_api::{TlsMode, TransportConfig};

/// Connection settings for a remote realtime database.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database root, e.g. `https://my-building-default-rtdb.firebaseio.com`.
    pub database_url: Url,
    /// Database secret or ID token, sent as the `auth` query parameter.
    pub auth_token: Option<SecretString>,
    /// Project web API key for email/password sign-in.
    pub api_key: Option<SecretString>,
    /// Custom CA bundle for emulators behind a private CA.
    pub ca_cert: Option<std::path::PathBuf>,
    /// Per-request timeout for one-shot reads and writes.
    pub timeout: Duration,
    /// Synchronizer behavior.
    pub sync: SyncOptions,
}

impl StoreConfig {
    pub fn new(database_url: Url) -> Self {
        Self {
            database_url,
            auth_token: None,
            api_key: None,
            ca_cert: None,
            timeout: Duration::from_secs(30),
            sync: SyncOptions::default(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self
                .ca_cert
                .clone()
                .map_or(TlsMode::System, TlsMode::CustomCa),
            timeout: self.timeout,
        }
    }
}

/// How the synchronizer reports writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Await each write and report `Success`/`Failure` instead of
    /// returning `Pending` immediately.
    pub ack_required: bool,
}
