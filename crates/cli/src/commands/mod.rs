//! Subcommand implementations.
//!
//! Output goes through `tracing` at info level so it shares formatting and
//! filtering with the rest of the log.

pub mod account;
pub mod catalog;
pub mod memo;
pub mod orders;

use rust_decimal::Decimal;

use tooldepot_core::{CurrencyCode, Price};
use tooldepot_storefront::api::ApiClient;
use tooldepot_storefront::auth::{AuthStore, SessionFile};
use tooldepot_storefront::config::StorefrontConfig;
use tooldepot_storefront::error::AppError;
use tooldepot_storefront::memo::{JsonFileRepository, MemoStore, TracingNotifier};

/// Everything a command needs, built once per invocation.
pub struct Context {
    pub config: StorefrontConfig,
    pub auth: AuthStore,
    pub api: ApiClient,
    session: SessionFile,
}

impl Context {
    /// Restore the saved session and build the API client.
    ///
    /// An unreadable session file is logged and ignored.
    pub fn load(config: StorefrontConfig) -> Result<Self, AppError> {
        let auth = AuthStore::new();
        let session = SessionFile::new(&config.session_path);

        match session.load() {
            Ok(Some(stored)) => {
                tooldepot_storefront::error::set_sentry_user(&stored.user.id, Some(&stored.user.email));
                auth.restore(stored);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable session file"),
        }

        let api = ApiClient::new(&config, auth.clone())?;

        Ok(Self {
            config,
            auth,
            api,
            session,
        })
    }

    /// Open the persisted memo.
    pub fn memo(&self) -> MemoStore<JsonFileRepository, TracingNotifier> {
        MemoStore::new(JsonFileRepository::new(&self.config.memo_path), TracingNotifier)
    }

    /// Write the current auth state to the session file.
    pub fn save_session(&self) -> Result<(), AppError> {
        self.session.save(&self.auth)?;
        Ok(())
    }

    /// Format an amount in the configured currency.
    pub fn money(&self, amount: Decimal) -> String {
        format_money(amount, self.config.currency)
    }
}

/// Combine a command's outcome with the session save that follows it.
///
/// The command's own error takes precedence; a failed save is then only
/// logged.
pub fn after_session_save(
    result: Result<(), AppError>,
    saved: Result<(), AppError>,
) -> Result<(), AppError> {
    match (result, saved) {
        (Ok(()), saved) => saved,
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(save_error)) => {
            tracing::warn!(error = %save_error, "failed to save session");
            Err(e)
        }
    }
}

fn format_money(amount: Decimal, currency: CurrencyCode) -> String {
    Price::new(amount, currency).display()
}

/// Render a quantity without trailing zeros.
pub fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use std::io;

    use tooldepot_storefront::auth::SessionError;

    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(12005, 1), CurrencyCode::INR), "₹1200.50");
        assert_eq!(format_money(Decimal::from(3), CurrencyCode::USD), "$3.00");
    }

    #[test]
    fn test_command_error_survives_failed_session_save() {
        let save_failed = || {
            Err(AppError::Session(SessionError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only",
            ))))
        };

        let result = after_session_save(
            Err(AppError::BadRequest("Password is required".to_string())),
            save_failed(),
        );
        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg == "Password is required"));

        assert!(matches!(
            after_session_save(Ok(()), save_failed()),
            Err(AppError::Session(_))
        ));
        assert!(after_session_save(Ok(()), Ok(())).is_ok());
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(Decimal::new(2500, 3)), "2.5");
        assert_eq!(format_quantity(Decimal::from(10)), "10");
    }
}
