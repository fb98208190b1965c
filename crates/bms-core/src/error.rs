// ── Core error types ──
//
// Errors surfaced by the synchronizer and panels. Transport details from
// `bms_api` are folded into a handful of domain variants; only
// `AuthFailure` is ever meant to block the user.

use thiserror::Error;

use crate::model::StorePath;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Store errors ─────────────────────────────────────────────────
    /// Nothing stored at the path. Reads translate this into `None`.
    #[error("No data at '{path}'")]
    NotFound { path: String },

    /// Network or store failure. Logged, never surfaced by reads.
    #[error("Store unreachable: {message}")]
    Transport { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthFailure { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    /// A value exists but has the wrong shape for the property.
    #[error("Unexpected value at '{path}': {message}")]
    Decode { path: StorePath, message: String },

    #[error("Unknown device '{device}' in {cabin}")]
    UnknownDevice { cabin: String, device: String },

    #[error("Invalid time '{input}': expected e.g. 9:00 AM or 18:00")]
    InvalidTime { input: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn decode(path: &StorePath, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.clone(),
            message: message.into(),
        }
    }

    pub(crate) fn auth(message: impl Into<String>) -> Self {
        Self::AuthFailure {
            message: message.into(),
        }
    }

    /// Returns `true` for failures caused by credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthFailure { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<bms_api::Error> for CoreError {
    fn from(err: bms_api::Error) -> Self {
        if err.is_not_found() {
            return CoreError::NotFound {
                path: String::new(),
            };
        }
        match err {
            bms_api::Error::Authentication { message } => CoreError::AuthFailure { message },
            bms_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            bms_api::Error::InvalidBaseUrl(url) => CoreError::Config {
                message: format!("Database URL cannot be used as a base: {url}"),
            },
            bms_api::Error::Tls(msg) => CoreError::Transport {
                message: format!("TLS error: {msg}"),
            },
            bms_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            other @ (bms_api::Error::Transport(_)
            | bms_api::Error::Http { .. }
            | bms_api::Error::StreamProtocol { .. }) => CoreError::Transport {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rejection_becomes_auth_failure() {
        let err: CoreError = bms_api::Error::Authentication {
            message: "The email or password is incorrect".into(),
        }
        .into();
        assert!(err.is_auth());
        assert_eq!(
            err.to_string(),
            "Authentication failed: The email or password is incorrect"
        );
    }

    #[test]
    fn http_404_becomes_not_found() {
        let err: CoreError = bms_api::Error::Http {
            status: 404,
            message: "gone".into(),
        }
        .into();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn server_errors_are_transport() {
        let err: CoreError = bms_api::Error::Http {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Transport { .. }));
    }
}
