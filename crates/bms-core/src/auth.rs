// ── Authentication ports ──
//
// Sign-in, sign-up and biometric unlock are external collaborators.
// `AuthSession` holds the orchestration rules; providers only talk to
// their backends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use bms_api::IdentityClient;

use crate::config::StoreConfig;
use crate::error::CoreError;

/// A signed-in account.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
    /// Token usable as the database `auth` parameter, when the provider
    /// issues one.
    pub id_token: Option<SecretString>,
}

/// Email/password account backend.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &SecretString)
    -> Result<UserIdentity, CoreError>;

    async fn sign_up(&self, email: &str, password: &SecretString)
    -> Result<UserIdentity, CoreError>;
}

/// Device-local biometric check (fingerprint, face).
#[async_trait]
pub trait BiometricProvider: Send + Sync {
    /// `Ok(())` when the user passed; `AuthFailure` otherwise.
    async fn authenticate(&self, reason: &str) -> Result<(), CoreError>;
}

// ── Session ──────────────────────────────────────────────────────────

/// Login state and the rules around it.
pub struct AuthSession {
    provider: Arc<dyn AuthProvider>,
    biometrics: Option<Arc<dyn BiometricProvider>>,
    remembered: Option<(String, SecretString)>,
    current: Option<UserIdentity>,
}

impl AuthSession {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            biometrics: None,
            remembered: None,
            current: None,
        }
    }

    pub fn with_biometrics(mut self, biometrics: Arc<dyn BiometricProvider>) -> Self {
        self.biometrics = Some(biometrics);
        self
    }

    /// Credentials used by [`login_with_biometrics`](Self::login_with_biometrics).
    pub fn remember(&mut self, email: impl Into<String>, password: SecretString) {
        self.remembered = Some((email.into(), password));
    }

    pub fn current_user(&self) -> Option<&UserIdentity> {
        self.current.as_ref()
    }

    pub fn logout(&mut self) {
        self.current = None;
    }

    pub async fn login(
        &mut self,
        email: &str,
        password: &SecretString,
    ) -> Result<&UserIdentity, CoreError> {
        check_credentials(email, password)?;
        debug!(email, "signing in");
        let user = self.provider.sign_in(email.trim(), password).await?;
        info!(user_id = %user.user_id, "signed in");
        Ok(self.current.insert(user))
    }

    /// Create an account. The confirmation must match before anything
    /// is sent to the provider.
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &SecretString,
        confirm: &SecretString,
    ) -> Result<&UserIdentity, CoreError> {
        if password.expose_secret() != confirm.expose_secret() {
            return Err(CoreError::auth("Passwords do not match"));
        }
        check_credentials(email, password)?;
        debug!(email, "creating account");
        let user = self.provider.sign_up(email.trim(), password).await?;
        info!(user_id = %user.user_id, "account created");
        Ok(self.current.insert(user))
    }

    /// Unlock with biometrics, then sign in with the remembered
    /// credentials.
    pub async fn login_with_biometrics(&mut self) -> Result<&UserIdentity, CoreError> {
        let biometrics = self
            .biometrics
            .clone()
            .ok_or_else(|| CoreError::auth("Biometric authentication is not available"))?;
        biometrics.authenticate("Log in to your building").await?;

        let (email, password) = self
            .remembered
            .clone()
            .ok_or_else(|| CoreError::auth("No saved credentials for biometric login"))?;
        self.login(&email, &password).await
    }
}

fn check_credentials(email: &str, password: &SecretString) -> Result<(), CoreError> {
    if email.trim().is_empty() || password.expose_secret().is_empty() {
        return Err(CoreError::auth("Email and password are required"));
    }
    Ok(())
}

// ── Identity toolkit provider ────────────────────────────────────────

/// Email/password provider for the project behind `config`.
pub fn identity_provider(config: &StoreConfig) -> Result<IdentityClient, CoreError> {
    let api_key = config.api_key.clone().ok_or_else(|| CoreError::Config {
        message: "no API key configured; set api_key in the profile or BMS_API_KEY".into(),
    })?;
    Ok(IdentityClient::new(api_key, &config.transport())?)
}

#[async_trait]
impl AuthProvider for IdentityClient {
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserIdentity, CoreError> {
        let session = self.sign_in_with_password(email, password).await?;
        Ok(UserIdentity {
            user_id: session.user_id,
            email: session.email,
            id_token: Some(session.id_token),
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserIdentity, CoreError> {
        let session = IdentityClient::sign_up(self, email, password).await?;
        Ok(UserIdentity {
            user_id: session.user_id,
            email: session.email,
            id_token: Some(session.id_token),
        })
    }
}

// ── In-memory provider ───────────────────────────────────────────────

/// Account table held in memory, for tests and offline runs.
#[derive(Default)]
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, String>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.accounts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(email.to_lowercase(), password.to_owned());
        self
    }
}

fn memory_user(email: &str) -> UserIdentity {
    UserIdentity {
        user_id: format!("local:{email}"),
        email: email.to_owned(),
        id_token: None,
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserIdentity, CoreError> {
        let key = email.to_lowercase();
        let accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        match accounts.get(&key) {
            Some(stored) if stored == password.expose_secret() => Ok(memory_user(&key)),
            _ => Err(CoreError::auth("The email or password is incorrect")),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserIdentity, CoreError> {
        let key = email.to_lowercase();
        let mut accounts = self.accounts.lock().unwrap_or_else(PoisonError::into_inner);
        if accounts.contains_key(&key) {
            return Err(CoreError::auth(
                "An account already exists for this email address",
            ));
        }
        accounts.insert(key.clone(), password.expose_secret().to_owned());
        Ok(memory_user(&key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct FixedBiometrics(bool);

    #[async_trait]
    impl BiometricProvider for FixedBiometrics {
        async fn authenticate(&self, _reason: &str) -> Result<(), CoreError> {
            if self.0 {
                Ok(())
            } else {
                Err(CoreError::auth("Biometric check failed"))
            }
        }
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    fn session() -> AuthSession {
        AuthSession::new(Arc::new(MemoryAuth::new().with_account("ops@example.com", "hunter22")))
    }

    #[tokio::test]
    async fn login_success_and_failure() {
        let mut s = session();
        assert!(s.login("ops@example.com", &secret("nope")).await.unwrap_err().is_auth());
        assert!(s.current_user().is_none());

        let user = s.login("OPS@example.com", &secret("hunter22")).await.unwrap();
        assert_eq!(user.email, "ops@example.com");
        assert!(s.current_user().is_some());
    }

    #[tokio::test]
    async fn empty_credentials_rejected_locally() {
        let mut s = session();
        let err = s.login("  ", &secret("x")).await.unwrap_err();
        assert_eq!(err.to_string(), "Authentication failed: Email and password are required");
    }

    #[tokio::test]
    async fn sign_up_requires_matching_confirmation() {
        let mut s = session();
        let err = s
            .sign_up("new@example.com", &secret("abc123"), &secret("abc124"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Authentication failed: Passwords do not match");

        s.sign_up("new@example.com", &secret("abc123"), &secret("abc123"))
            .await
            .unwrap();
        s.logout();
        s.login("new@example.com", &secret("abc123")).await.unwrap();
    }

    #[tokio::test]
    async fn biometric_login_uses_remembered_credentials() {
        let mut s = session().with_biometrics(Arc::new(FixedBiometrics(true)));
        assert!(s.login_with_biometrics().await.is_err());

        s.remember("ops@example.com", secret("hunter22"));
        assert!(s.login_with_biometrics().await.is_ok());
    }

    #[tokio::test]
    async fn biometric_rejection_is_auth_failure() {
        let mut s = session().with_biometrics(Arc::new(FixedBiometrics(false)));
        s.remember("ops@example.com", secret("hunter22"));
        let err = s.login_with_biometrics().await.unwrap_err();
        assert!(err.is_auth());
        assert!(s.current_user().is_none());
    }
}
