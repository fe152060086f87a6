//! Sign-in endpoints.

use secrecy::SecretString;
use tracing::instrument;

use super::{ApiClient, ApiError, LoginRequest, LoginResponse};
use crate::auth::AuthUser;

impl ApiClient {
    /// Sign in with email and password (`POST /auth/login`).
    ///
    /// On success the returned token and user are recorded in the shared
    /// auth store, so subsequent requests are authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials, or another error
    /// if the request fails.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser, ApiError> {
        let response: LoginResponse = self
            .post("auth/login", &LoginRequest { email, password })
            .await?
            .json()?;

        self.inner
            .auth
            .login(response.user.clone(), SecretString::from(response.token));
        Ok(response.user)
    }

    /// Fetch the profile behind the current token (`GET /auth/me`).
    ///
    /// Useful with a pre-issued token: the returned user completes the auth
    /// store so it reports as authenticated.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token is rejected.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<AuthUser, ApiError> {
        let user: AuthUser = self.get("auth/me").await?.json()?;

        if let Some(token) = self.inner.auth.token() {
            self.inner.auth.login(user.clone(), token);
        }
        Ok(user)
    }

    /// Sign out locally. The backend keeps no session to end.
    pub fn logout(&self) {
        self.inner.auth.logout();
    }
}
