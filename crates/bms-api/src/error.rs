use thiserror::Error;

/// Top-level error type for the `bms-api` crate.
///
/// Covers every failure mode across both API surfaces: identity,
/// transport, database REST responses and the event stream.
/// `bms-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Sign-in or sign-up rejected by the identity provider, or the
    /// database refused the supplied auth token.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The database URL cannot carry path segments (e.g. `mailto:`).
    #[error("Database URL cannot be used as a base: {0}")]
    InvalidBaseUrl(String),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Database ────────────────────────────────────────────────────
    /// Non-success HTTP status from the database.
    #[error("Database error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    // ── Event stream ────────────────────────────────────────────────
    /// A frame on the event stream could not be understood.
    #[error("Malformed stream event '{event}': {message}")]
    StreamProtocol { event: String, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the failure came from credentials rather than
    /// the network.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }
}
