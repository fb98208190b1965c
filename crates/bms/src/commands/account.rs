//! Account handlers: email/password sign-in and sign-up.

use std::sync::Arc;

use dialoguer::Input;
use secrecy::{ExposeSecret, SecretString};

use bms_core::{AuthProvider, AuthSession, MemoryAuth, identity_provider};

use crate::cli::{GlobalOpts, LoginArgs, SignupArgs};
use crate::config::{self, SecretKind, Target};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

fn provider(ctx: &Context) -> Result<Arc<dyn AuthProvider>, CliError> {
    match &ctx.target {
        Target::Memory(_) => Ok(Arc::new(MemoryAuth::new())),
        Target::Remote(store) => Ok(Arc::new(identity_provider(store)?)),
    }
}

fn password_from(given: Option<String>, prompt: &str) -> Result<SecretString, CliError> {
    let raw = match given {
        Some(p) => p,
        None => rpassword::prompt_password(prompt).map_err(util::prompt_err)?,
    };
    Ok(SecretString::from(raw))
}

pub async fn login(ctx: &Context, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);

    let email = match args
        .email
        .or_else(|| cfg.profiles.get(&profile_name).and_then(|p| p.email.clone()))
    {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(util::prompt_err)?,
    };
    let password = password_from(args.password, "Password: ")?;

    let mut session = AuthSession::new(provider(ctx)?);
    let user = session.login(&email, &password).await?;
    output::print_status(&format!("✓ Signed in as {}", user.email), global.quiet);

    if args.save {
        let token = user.id_token.as_ref().ok_or_else(|| CliError::AuthFailed {
            message: "the provider returned no token to save".into(),
        })?;
        config::store_secret(SecretKind::AuthToken, &profile_name, token.expose_secret())?;
        output::print_status(
            &format!("✓ Token stored in system keyring for profile '{profile_name}'"),
            global.quiet,
        );
    }
    Ok(())
}

pub async fn signup(ctx: &Context, args: SignupArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let password = password_from(args.password, "Password: ")?;
    let confirm = password_from(args.confirm, "Confirm password: ")?;

    let mut session = AuthSession::new(provider(ctx)?);
    let user = session.sign_up(&args.email, &password, &confirm).await?;
    output::print_status(
        &format!("✓ Account created for {} ({})", user.email, user.user_id),
        global.quiet,
    );
    Ok(())
}
