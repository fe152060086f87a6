//! Unified error handling with Sentry integration.
//!
//! Each module has its own error enum; [`AppError`] gathers them for callers
//! (the CLI, an embedding UI) that report failures to a person. Use
//! [`AppError::user_message`] for display and [`AppError::capture`] to send
//! infrastructure failures to Sentry.

use thiserror::Error;

use tooldepot_core::GstNoError;

use crate::api::ApiError;
use crate::auth::SessionError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::memo::RepositoryError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Order could not be placed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Memo file could not be read or written.
    #[error("Memo storage error: {0}")]
    Repository(#[from] RepositoryError),

    /// Saved session could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A GST number failed validation.
    #[error("Invalid GST number: {0}")]
    GstNo(#[from] GstNoError),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether this is a fault on our side or the backend's rather than the
    /// user's, and so worth reporting.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::Api(err) | Self::Checkout(CheckoutError::Api(err)) => is_internal_api(err),
            Self::Repository(_) | Self::Session(_) => true,
            Self::Checkout(_)
            | Self::Config(_)
            | Self::GstNo(_)
            | Self::BadRequest(_) => false,
        }
    }

    /// Message safe to show the user.
    ///
    /// Internal details (paths, parse errors, transport errors) are replaced
    /// with a generic message; backend validation messages pass through.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) | Self::Checkout(CheckoutError::Api(err)) => api_message(err),
            Self::Checkout(err) => capitalize(&err.to_string()),
            Self::Repository(_) => "Could not read or save the memo".to_string(),
            Self::Session(_) => "Could not read or save the sign-in session".to_string(),
            Self::Config(err) => err.to_string(),
            Self::GstNo(err) => err.to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }

    /// Report internal errors to Sentry and the log. User errors are logged
    /// at debug only.
    pub fn capture(&self) {
        if self.is_internal() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::debug!(error = %self, "user-facing error");
        }
    }
}

const fn is_internal_api(err: &ApiError) -> bool {
    matches!(
        err,
        ApiError::Http(_) | ApiError::InvalidPath(_) | ApiError::Parse(_)
    ) || matches!(err, ApiError::Api { status, .. } if *status >= 500)
}

fn api_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized => "Please sign in again".to_string(),
        ApiError::RateLimited(secs) => {
            format!("Too many requests, try again in {secs} seconds")
        }
        ApiError::NotFound(_) => "Not found".to_string(),
        ApiError::Api { status, message } if *status < 500 => message.clone(),
        ApiError::Http(_) | ApiError::InvalidPath(_) | ApiError::Parse(_) | ApiError::Api { .. } => {
            "The store is unavailable right now".to_string()
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Set the Sentry user context.
///
/// Call this after sign-in to associate errors with the user.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a user action.
///
/// Breadcrumbs appear in Sentry reports to show the trail of actions leading
/// up to an error.
///
/// ```rust,ignore
/// add_breadcrumb("memo", "Added variant", Some(&[("product_id", "hammer")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("quantity must be a number".to_string());
        assert_eq!(err.to_string(), "Bad request: quantity must be a number");

        let err = AppError::from(CheckoutError::EmptyMemo);
        assert_eq!(err.to_string(), "Checkout error: memo is empty");
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let parse = AppError::Api(ApiError::Parse("missing field `_id`".to_string()));
        assert_eq!(parse.user_message(), "The store is unavailable right now");
        assert!(parse.is_internal());

        let server = AppError::Api(ApiError::Api {
            status: 503,
            message: "db pool exhausted".to_string(),
        });
        assert!(!server.user_message().contains("pool"));
        assert!(server.is_internal());
    }

    #[test]
    fn test_backend_validation_message_passes_through() {
        let err = AppError::Checkout(CheckoutError::Api(ApiError::Api {
            status: 422,
            message: "variant discontinued".to_string(),
        }));
        assert_eq!(err.user_message(), "variant discontinued");
        assert!(!err.is_internal());
    }

    #[test]
    fn test_user_errors_are_not_internal() {
        assert_eq!(
            AppError::from(CheckoutError::MissingDetail("shipping address")).user_message(),
            "Shipping address is required"
        );
        assert!(!AppError::from(CheckoutError::EmptyMemo).is_internal());
        assert!(!AppError::from(GstNoError::ChecksumMismatch).is_internal());
        assert!(!AppError::Api(ApiError::Unauthorized).is_internal());
        assert_eq!(
            AppError::Api(ApiError::RateLimited(5)).user_message(),
            "Too many requests, try again in 5 seconds"
        );
    }
}
