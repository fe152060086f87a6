//! Shared helpers for tests that need a backend.

#![allow(clippy::unwrap_used)]

use axum::Router;
use tokio::net::TcpListener;

use crate::api::ApiClient;
use crate::auth::AuthStore;
use crate::config::StorefrontConfig;

/// Serve `router` on an ephemeral local port and return a client pointed at
/// its `/api/` prefix, plus the client's auth store.
pub async fn spawn_backend(router: Router) -> (ApiClient, AuthStore) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let config = StorefrontConfig::for_api(&format!("http://{addr}/api/")).unwrap();
    let auth = AuthStore::new();
    let client = ApiClient::new(&config, auth.clone()).unwrap();
    (client, auth)
}

/// Two products in the backend's wire shape.
pub fn sample_products() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "_id": "drill",
            "name": "Cordless Drill",
            "brand": "Bosch",
            "category": "power",
            "createdAt": "2024-05-01T10:00:00Z",
            "variants": [
                { "_id": "12v", "name": "12V", "price": "4500", "stock": "3", "sku": "BO-D12" },
                { "_id": "18v", "name": "18V", "price": "6200", "stock": "0", "sku": "BO-D18" }
            ]
        }),
        serde_json::json!({
            "_id": "bolt",
            "name": "Hex Bolt",
            "category": "fasteners",
            "variants": [
                { "_id": "m8", "name": "M8 x 40", "price": "12.50", "unit": "pcs" }
            ]
        }),
    ]
}
