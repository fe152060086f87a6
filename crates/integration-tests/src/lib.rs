//! Integration tests for Tool Depot.
//!
//! Tests run the storefront client against [`MockBackend`], an in-process
//! axum server that speaks the backend's REST contract, with memo and session
//! files in a temporary directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tooldepot-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

use tooldepot_storefront::api::ApiClient;
use tooldepot_storefront::auth::{AuthStore, SessionFile};
use tooldepot_storefront::config::StorefrontConfig;
use tooldepot_storefront::memo::{JsonFileRepository, MemoStore, NoticeQueue};

/// Password the mock backend accepts for every account.
pub const PASSWORD: &str = "correct horse";

/// The catalog served by the mock backend.
#[must_use]
pub fn catalog() -> Vec<Value> {
    vec![
        json!({
            "_id": "hammer",
            "name": "Claw Hammer",
            "brand": "Stanley",
            "category": "hand-tools",
            "createdAt": "2024-03-01T00:00:00Z",
            "variants": [
                { "_id": "16oz", "name": "16 oz", "price": "450", "stock": "25", "sku": "ST-CH16" },
                { "_id": "20oz", "name": "20 oz", "price": "520", "stock": "0", "sku": "ST-CH20" }
            ]
        }),
        json!({
            "_id": "bolt",
            "name": "Hex Bolt",
            "category": "fasteners",
            "createdAt": "2024-04-01T00:00:00Z",
            "variants": [
                { "_id": "m8", "name": "M8 x 40", "price": "12.50", "unit": "pcs" },
                { "_id": "m10", "name": "M10 x 50", "price": "18", "unit": "pcs" }
            ]
        }),
        json!({
            "_id": "cable",
            "name": "Copper Cable 2.5 sq mm",
            "brand": "Polycab",
            "category": "electrical",
            "variants": [
                { "_id": "per-m", "name": "Per metre", "price": "42", "unit": "m" }
            ]
        }),
    ]
}

/// Mutable state behind the mock backend.
#[derive(Clone, Default)]
pub struct BackendState {
    orders: Arc<Mutex<Vec<Value>>>,
    reject_orders: Arc<AtomicBool>,
    expire_tokens: Arc<AtomicBool>,
}

impl BackendState {
    /// Orders received so far, as the backend stored them.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make `POST /orders` answer 422.
    pub fn reject_orders(&self, reject: bool) {
        self.reject_orders.store(reject, Ordering::SeqCst);
    }

    /// Make every authenticated route answer 401.
    pub fn expire_tokens(&self, expire: bool) {
        self.expire_tokens.store(expire, Ordering::SeqCst);
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        !self.expire_tokens.load(Ordering::SeqCst)
            && headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value.starts_with("Bearer token-"))
    }
}

/// A running mock backend.
pub struct MockBackend {
    pub state: BackendState,
    /// Base URL including the `/api/` prefix.
    pub api_url: String,
}

impl MockBackend {
    /// Start the backend on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn() -> Self {
        let state = BackendState::default();
        let router = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/products", get(products))
            .route("/api/products/{id}", get(product))
            .route("/api/categories", get(categories))
            .route("/api/orders", post(create_order))
            .route("/api/orders/my", get(my_orders))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Failed to read local address");
        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Mock backend failed");
        });

        Self {
            state,
            api_url: format!("http://{addr}/api/"),
        }
    }
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != PASSWORD || email.is_empty() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
            .into_response();
    }

    Json(json!({
        "token": format!("token-{email}"),
        "user": {
            "_id": format!("user-{email}"),
            "name": "Test Buyer",
            "email": email,
            "role": "customer"
        }
    }))
    .into_response()
}

async fn products() -> Json<Vec<Value>> {
    Json(catalog())
}

async fn product(Path(id): Path<String>) -> Response {
    catalog()
        .into_iter()
        .find(|product| product["_id"] == id.as_str())
        .map_or_else(
            || {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "message": "Product not found" })),
                )
                    .into_response()
            },
            |product| Json(json!({ "data": product })).into_response(),
        )
}

async fn categories() -> Json<Value> {
    Json(json!([
        { "_id": "hand-tools", "name": "Hand Tools" },
        { "_id": "fasteners", "name": "Fasteners" },
        { "_id": "electrical", "name": "Electrical" }
    ]))
}

async fn create_order(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if !state.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.reject_orders.load(Ordering::SeqCst) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Stock changed, please review your memo" })),
        )
            .into_response();
    }

    let total: Decimal = body["items"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|item| decimal(&item["price"]) * decimal(&item["quantity"]))
        .sum();

    let mut orders = state.orders.lock().unwrap_or_else(PoisonError::into_inner);
    body["_id"] = json!(format!("ord-{}", orders.len() + 1));
    body["totalAmount"] = json!(total.to_string());
    body["status"] = json!("pending");
    orders.push(body.clone());

    (StatusCode::CREATED, Json(body)).into_response()
}

async fn my_orders(State(state): State<BackendState>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(state.orders()).into_response()
}

fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

/// A client wired to a fresh [`MockBackend`] with files in a temp directory.
pub struct TestContext {
    pub backend: BackendState,
    pub config: StorefrontConfig,
    pub auth: AuthStore,
    pub api: ApiClient,
    pub notices: NoticeQueue,
    _dir: TempDir,
}

impl TestContext {
    /// # Panics
    ///
    /// Panics if the backend, temp directory, or client cannot be set up.
    pub async fn new() -> Self {
        let backend = MockBackend::spawn().await;
        let dir = TempDir::new().expect("Failed to create temp dir");

        let memo_path = dir.path().join("memo.json");
        let session_path = dir.path().join("session.json");
        let api_url = backend.api_url.clone();
        let config = StorefrontConfig::from_lookup(|key| match key {
            "TOOLDEPOT_API_URL" => Some(api_url.clone()),
            "TOOLDEPOT_MEMO_PATH" => Some(memo_path.display().to_string()),
            "TOOLDEPOT_SESSION_PATH" => Some(session_path.display().to_string()),
            _ => None,
        })
        .expect("Failed to build config");

        let auth = AuthStore::new();
        let api = ApiClient::new(&config, auth.clone()).expect("Failed to build client");

        Self {
            backend: backend.state,
            config,
            auth,
            api,
            notices: NoticeQueue::new(),
            _dir: dir,
        }
    }

    /// Open the memo file, as a fresh process would.
    #[must_use]
    pub fn memo(&self) -> MemoStore<JsonFileRepository, NoticeQueue> {
        MemoStore::new(
            JsonFileRepository::new(&self.config.memo_path),
            self.notices.clone(),
        )
    }

    #[must_use]
    pub fn memo_path(&self) -> PathBuf {
        self.config.memo_path.clone()
    }

    #[must_use]
    pub fn session_file(&self) -> SessionFile {
        SessionFile::new(&self.config.session_path)
    }

    /// Sign in as `email`.
    ///
    /// # Panics
    ///
    /// Panics if the backend rejects the login.
    pub async fn sign_in(&self, email: &str) {
        self.api
            .login(email, PASSWORD)
            .await
            .expect("Failed to sign in");
    }
}
