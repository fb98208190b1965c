// Email/password identity client
//
// Talks to the identity toolkit REST endpoints:
//   POST {base}/accounts:signInWithPassword?key=API_KEY
//   POST {base}/accounts:signUp?key=API_KEY

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// A signed-in user as returned by the identity provider.
#[derive(Debug, Clone)]
pub struct IdentitySession {
    pub user_id: String,
    pub email: String,
    /// Short-lived token usable as the database `auth` parameter.
    pub id_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_in_secs: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Client for email/password authentication.
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl IdentityClient {
    /// Create a client against the public identity endpoint.
    pub fn new(api_key: SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_IDENTITY_URL)?;
        Ok(Self {
            http: transport.build_client()?,
            base_url,
            api_key,
        })
    }

    /// Create a client with a custom endpoint and pre-built HTTP client
    /// (emulators, tests).
    pub fn with_client(http: reqwest::Client, base_url: Url, api_key: SecretString) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Sign in an existing account.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<IdentitySession, Error> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    /// Create a new account and sign it in.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<IdentitySession, Error> {
        self.password_call("signUp", email, password).await
    }

    fn action_url(&self, action: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/accounts:{action}"))?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }

    async fn password_call(
        &self,
        action: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<IdentitySession, Error> {
        let url = self.action_url(action)?;
        debug!(action, email, "identity request");

        let body = PasswordRequest {
            email,
            password: password.expose_secret(),
            return_secure_token: true,
        };
        let resp = self.http.post(url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text).map_or_else(
                |_| format!("HTTP {status}"),
                |env| humanize(&env.error.message),
            );
            return Err(Error::Authentication { message });
        }

        let parsed: PasswordResponse =
            serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: text.clone(),
            })?;

        Ok(IdentitySession {
            user_id: parsed.local_id,
            email: parsed.email.unwrap_or_else(|| email.to_owned()),
            id_token: SecretString::from(parsed.id_token),
            refresh_token: SecretString::from(parsed.refresh_token.unwrap_or_default()),
            expires_in_secs: parsed
                .expires_in
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
        })
    }
}

/// Turn provider codes like `EMAIL_NOT_FOUND` or
/// `WEAK_PASSWORD : Password should be at least 6 characters` into
/// something a person can read.
fn humanize(code: &str) -> String {
    let (head, detail) = code
        .split_once(" : ")
        .map_or((code, None), |(h, d)| (h, Some(d)));
    let friendly = match head {
        "EMAIL_NOT_FOUND" => "No account exists for this email address",
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => "The email or password is incorrect",
        "USER_DISABLED" => "This account has been disabled",
        "EMAIL_EXISTS" => "An account already exists for this email address",
        "INVALID_EMAIL" => "The email address is badly formatted",
        "WEAK_PASSWORD" => "The password is too weak",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts, try again later",
        _ => return code.to_owned(),
    };
    match detail {
        Some(d) => format!("{friendly}: {d}"),
        None => friendly.to_owned(),
    }
}
