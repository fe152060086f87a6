//! Sign-in commands.
//!
//! The session is saved to `TOOLDEPOT_SESSION_PATH` after every command, so
//! these only change the shared auth store.

use std::io::{self, BufRead};

use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use tooldepot_storefront::error::{self, AppError};

use super::Context;

pub async fn login(ctx: &Context, email: &str, password: Option<String>) -> Result<(), AppError> {
    let password = match password {
        Some(password) => SecretString::from(password),
        None => read_password()?,
    };

    let user = ctx.api.login(email, password.expose_secret()).await?;
    error::set_sentry_user(&user.id, Some(&user.email));
    info!("Signed in as {} <{}> ({})", user.name, user.email, user.role);
    Ok(())
}

pub fn logout(ctx: &Context) {
    ctx.api.logout();
    error::clear_sentry_user();
    info!("Signed out");
}

/// Show the signed-in user, asking the backend when only a token is known.
pub async fn whoami(ctx: &Context) -> Result<(), AppError> {
    if let Some(user) = ctx.auth.user() {
        info!("{} <{}> ({})", user.name, user.email, user.role);
        return Ok(());
    }
    if ctx.auth.token().is_none() {
        info!("Not signed in");
        return Ok(());
    }

    let user = ctx.api.current_user().await?;
    info!("{} <{}> ({})", user.name, user.email, user.role);
    Ok(())
}

fn read_password() -> Result<SecretString, AppError> {
    info!("Password:");
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AppError::BadRequest(format!("Could not read password: {e}")))?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }
    Ok(SecretString::from(password.to_string()))
}
