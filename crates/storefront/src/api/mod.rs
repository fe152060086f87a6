//! REST API client for the Tool Depot backend.
//!
//! # Behavior
//!
//! - Every request carries `Authorization: Bearer <token>` when the shared
//!   [`AuthStore`] holds a token
//! - HTTP 401 signs the auth store out and surfaces [`ApiError::Unauthorized`];
//!   nothing else (in particular the memo) is touched
//! - Catalog reads are cached in memory via `moka` for the configured TTL
//!
//! # Example
//!
//! ```rust,ignore
//! use tooldepot_storefront::api::ApiClient;
//! use tooldepot_storefront::auth::AuthStore;
//!
//! let client = ApiClient::new(&config, AuthStore::new())?;
//! let products = client.products().await?;
//! let response = client.get("categories").await?;
//! assert!(response.status.is_success());
//! ```

mod account;
mod catalog;
mod orders;
mod types;

pub use types::*;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::auth::AuthStore;
use crate::config::StorefrontConfig;

use catalog::CacheValue;

/// How much of an unexpected response body to keep for diagnostics.
const BODY_PREVIEW_CHARS: usize = 200;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request path could not be joined onto the base URL.
    #[error("Invalid request path: {0}")]
    InvalidPath(#[from] url::ParseError),

    /// The backend rejected our credentials. The session has been cleared.
    #[error("Unauthorized: please sign in again")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Whether the error means the user must sign in again.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// A successful backend response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Parsed JSON body; `Null` when the body was empty, the raw text as a
    /// string when it was not JSON.
    pub data: serde_json::Value,
}

impl ApiResponse {
    /// Deserialize the body, unwrapping a `{ "data": ... }` envelope if present.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let payload = match self.data {
            serde_json::Value::Object(mut map) if map.contains_key("data") => {
                map.remove("data").unwrap_or_default()
            }
            other => other,
        };
        serde_json::from_value(payload)
            .map_err(|e| ApiError::Parse(format!("unexpected response shape: {e}")))
    }
}

/// Client for the backend REST API.
///
/// Cheaply cloneable; clones share the HTTP connection pool, the auth store,
/// and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    auth: AuthStore,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig, auth: AuthStore) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("tooldepot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_ttl)
            .build();

        if let Some(token) = &config.api_token
            && auth.token().is_none()
        {
            auth.set_token(token.clone());
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                auth,
                cache,
            }),
        })
    }

    /// The auth store this client reads tokens from.
    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Execute a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request::<()>(Method::GET, path, None).await
    }

    /// Execute a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn post<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Execute a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn put<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// Execute a PATCH request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn patch<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    /// Execute a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request::<()>(Method::DELETE, path, None).await
    }

    /// Send a request and classify the response.
    #[instrument(skip(self, method, body), fields(method = %method))]
    async fn request<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url(path)?;

        let mut request = self.inner.client.request(method, url);
        if let Some(token) = self.inner.auth.token() {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path, "backend returned 401, clearing session");
            self.inner.auth.logout();
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let message = error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            tracing::debug!(status = %status, %message, "backend returned non-success status");

            if status == StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound(message));
            }
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::debug!(
                    error = %e,
                    body = %preview(&text),
                    "backend response is not JSON"
                );
                serde_json::Value::String(text)
            })
        };

        Ok(ApiResponse { status, data })
    }

    /// Resolve `path` under the base URL.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        // A leading slash would replace the base path instead of extending it
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["message", "error", "detail"] {
            if let Some(serde_json::Value::String(message)) = map.get(key) {
                return Some(message.clone());
            }
        }
    }

    Some(preview(trimmed))
}

fn preview(text: &str) -> String {
    text.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Json;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{get, post};
    use secrecy::SecretString;
    use tooldepot_core::{UserId, UserRole};

    use super::*;
    use crate::auth::AuthUser;
    use crate::testing::spawn_backend;

    fn signed_in(auth: &AuthStore) {
        auth.login(
            AuthUser {
                id: UserId::new("u1"),
                name: "Ravi".to_string(),
                email: "ravi@example.com".to_string(),
                role: UserRole::Customer,
            },
            SecretString::from("tok-123"),
        );
    }

    #[test]
    fn test_error_message_prefers_json_fields() {
        assert_eq!(
            error_message(r#"{"message":"Out of stock"}"#),
            Some("Out of stock".to_string())
        );
        assert_eq!(
            error_message(r#"{"error":"bad gst"}"#),
            Some("bad gst".to_string())
        );
        assert_eq!(error_message("plain text"), Some("plain text".to_string()));
        assert_eq!(error_message("   "), None);
    }

    #[test]
    fn test_json_unwraps_data_envelope() {
        let response = ApiResponse {
            status: StatusCode::OK,
            data: serde_json::json!({ "data": [1, 2, 3] }),
        };
        assert_eq!(response.json::<Vec<u8>>().unwrap(), vec![1, 2, 3]);

        let bare = ApiResponse {
            status: StatusCode::OK,
            data: serde_json::json!([4]),
        };
        assert_eq!(bare.json::<Vec<u8>>().unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn test_bearer_token_is_injected() {
        let router = Router::new().route(
            "/api/echo",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(serde_json::json!({ "authorization": auth }))
            }),
        );
        let (client, auth) = spawn_backend(router).await;

        let anonymous = client.get("echo").await.unwrap();
        assert_eq!(anonymous.data["authorization"], "");

        signed_in(&auth);
        let response = client.get("/echo").await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.data["authorization"], "Bearer tok-123");
    }

    #[tokio::test]
    async fn test_unauthorized_logs_out() {
        let router = Router::new().route(
            "/api/orders",
            post(|| async { (AxumStatus::UNAUTHORIZED, Json(serde_json::json!({ "message": "expired" }))) }),
        );
        let (client, auth) = spawn_backend(router).await;
        signed_in(&auth);

        let err = client
            .post("orders", &serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert!(!auth.is_authenticated());
        assert!(auth.token().is_none());
    }

    #[tokio::test]
    async fn test_error_statuses_are_classified() {
        let router = Router::new()
            .route(
                "/api/bad",
                post(|| async { (AxumStatus::UNPROCESSABLE_ENTITY, Json(serde_json::json!({ "message": "Invalid GST number" }))) }),
            )
            .route(
                "/api/busy",
                get(|| async { (AxumStatus::TOO_MANY_REQUESTS, [("retry-after", "7")], "slow down") }),
            );
        let (client, _auth) = spawn_backend(router).await;

        let err = client
            .post("bad", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Api { status: 422, ref message } if message == "Invalid GST number"
        ));

        let err = client.get("busy").await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited(7)));

        let err = client.get("missing").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        let router = Router::new().route(
            "/api/things/{id}",
            axum::routing::delete(|| async { AxumStatus::NO_CONTENT }),
        );
        let (client, _auth) = spawn_backend(router).await;

        let response = client.delete("things/42").await.unwrap();
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(response.data.is_null());
    }

    #[tokio::test]
    async fn test_plain_text_success_is_kept_as_string() {
        let router = Router::new().route("/api/ping", get(|| async { "pong" }));
        let (client, _auth) = spawn_backend(router).await;

        let response = client.get("ping").await.unwrap();
        assert_eq!(response.data, serde_json::json!("pong"));

        let err = response.json::<Vec<u8>>().unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }
}
