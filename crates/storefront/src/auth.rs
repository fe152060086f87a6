//! Authentication state shared by the API client and the UI.
//!
//! The store holds the signed-in user and their bearer token. The memo never
//! consults it; callers use it to decide whether memo and checkout are
//! reachable at all.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tooldepot_core::{UserId, UserRole};

use crate::files;

/// The signed-in user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

/// Errors reading or writing a saved session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Default)]
struct AuthState {
    user: Option<AuthUser>,
    token: Option<SecretString>,
}

/// Shared handle to the current authentication state.
///
/// Cheaply cloneable; clones observe the same state.
#[derive(Clone, Default)]
pub struct AuthStore {
    inner: Arc<RwLock<AuthState>>,
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("AuthStore")
            .field("user", &state.user)
            .field("token", &state.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AuthStore {
    /// An empty, signed-out store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful sign-in.
    pub fn login(&self, user: AuthUser, token: SecretString) {
        tracing::info!(user = %user.id, role = %user.role, "signed in");
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.user = Some(user);
        state.token = Some(token);
    }

    /// Use a pre-issued token without a known user.
    ///
    /// Requests carry the token, but [`is_authenticated`](Self::is_authenticated)
    /// stays false until a user is known.
    pub fn set_token(&self, token: SecretString) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .token = Some(token);
    }

    /// Forget the user and token.
    pub fn logout(&self) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if state.user.is_some() || state.token.is_some() {
            tracing::info!("signed out");
        }
        state.user = None;
        state.token = None;
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<AuthUser> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    /// The bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    /// True only when both a user and a token are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state.user.is_some() && state.token.is_some()
    }

    /// Whether the signed-in user has the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_authenticated()
            && self
                .user()
                .is_some_and(|user| user.role == UserRole::Admin)
    }

    /// Capture the session for persistence. `None` when signed out.
    #[must_use]
    pub fn to_stored(&self) -> Option<StoredSession> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        match (&state.user, &state.token) {
            (Some(user), Some(token)) => Some(StoredSession {
                user: user.clone(),
                token: token.expose_secret().to_owned(),
            }),
            _ => None,
        }
    }

    /// Restore a previously stored session.
    pub fn restore(&self, session: StoredSession) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.user = Some(session.user);
        state.token = Some(SecretString::from(session.token));
    }
}

/// A session as written to disk between runs.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: AuthUser,
    pub token: String,
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Reads and writes a [`StoredSession`] as JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the saved session, `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Save the store's session, or delete the file when signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or removed.
    pub fn save(&self, auth: &AuthStore) -> Result<(), SessionError> {
        let Some(session) = auth.to_stored() else {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        };

        files::write_atomic(&self.path, serde_json::to_string_pretty(&session)?)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn user(role: UserRole) -> AuthUser {
        AuthUser {
            id: UserId::new("u1"),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_authenticated_requires_user_and_token() {
        let auth = AuthStore::new();
        assert!(!auth.is_authenticated());

        auth.set_token(SecretString::from("tok"));
        assert!(!auth.is_authenticated());

        auth.login(user(UserRole::Customer), SecretString::from("tok"));
        assert!(auth.is_authenticated());
        assert!(!auth.is_admin());
    }

    #[test]
    fn test_admin_role() {
        let auth = AuthStore::new();
        auth.login(user(UserRole::Admin), SecretString::from("tok"));
        assert!(auth.is_admin());
    }

    #[test]
    fn test_logout_clears_shared_state() {
        let auth = AuthStore::new();
        let other = auth.clone();
        auth.login(user(UserRole::Admin), SecretString::from("tok"));

        other.logout();

        assert!(auth.user().is_none());
        assert!(auth.token().is_none());
        assert!(!auth.is_admin());
    }

    #[test]
    fn test_debug_redacts_token() {
        let auth = AuthStore::new();
        auth.login(user(UserRole::Customer), SecretString::from("very-secret-token"));

        let debug_output = format!("{auth:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("very-secret-token"));
    }

    #[test]
    fn test_session_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join("session.json"));
        let auth = AuthStore::new();
        auth.login(user(UserRole::Customer), SecretString::from("tok"));

        file.save(&auth).unwrap();
        let restored = AuthStore::new();
        restored.restore(file.load().unwrap().unwrap());

        assert_eq!(restored.user(), auth.user());
        assert_eq!(
            restored.token().map(|t| t.expose_secret().to_owned()),
            Some("tok".to_string())
        );
    }

    #[test]
    fn test_session_file_removed_on_logout() {
        let temp_dir = TempDir::new().unwrap();
        let file = SessionFile::new(temp_dir.path().join("session.json"));
        let auth = AuthStore::new();
        auth.login(user(UserRole::Customer), SecretString::from("tok"));
        file.save(&auth).unwrap();

        auth.logout();
        file.save(&auth).unwrap();

        assert!(file.load().unwrap().is_none());
        // Saving a signed-out store with no file is fine too
        file.save(&auth).unwrap();
    }

    #[test]
    fn test_session_save_replaces_whole_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/session.json");
        let file = SessionFile::new(&path);

        let auth = AuthStore::new();
        auth.login(user(UserRole::Customer), SecretString::from("first"));
        file.save(&auth).unwrap();
        auth.login(user(UserRole::Admin), SecretString::from("second"));
        file.save(&auth).unwrap();

        let stored = file.load().unwrap().unwrap();
        assert_eq!(stored.user.role, UserRole::Admin);
        assert!(!files::temp_path(&path).exists());
    }
}
