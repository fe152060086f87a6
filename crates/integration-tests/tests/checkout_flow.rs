//! Sign in, build a memo, and place an order against the mock backend.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;

use tooldepot_core::{OrderStatus, PaymentMethod, ProductId, VariantId};
use tooldepot_integration_tests::TestContext;
use tooldepot_storefront::api::ApiError;
use tooldepot_storefront::checkout::{CheckoutDetails, CheckoutError, checkout};
use tooldepot_storefront::memo::{JsonFileRepository, MemoStore, Notice, NoticeQueue};

fn details() -> CheckoutDetails {
    CheckoutDetails::new("Asha Traders", "Plot 4, MIDC, Pune")
        .with_gst_no("27AAPFU0939F1ZV".parse().unwrap())
        .with_payment_method(PaymentMethod::BankTransfer)
}

async fn filled_memo(ctx: &TestContext) -> MemoStore<JsonFileRepository, NoticeQueue> {
    let hammer = ctx.api.product(&ProductId::new("hammer")).await.unwrap();
    let bolt = ctx.api.product(&ProductId::new("bolt")).await.unwrap();

    let mut memo = ctx.memo();
    memo.add_single(&hammer, hammer.variant(&VariantId::new("16oz")), Decimal::TWO);
    memo.add_single(&bolt, bolt.variant(&VariantId::new("m8")), Decimal::from(40));
    let _ = ctx.notices.drain();
    memo
}

#[tokio::test]
async fn test_order_is_placed_and_memo_cleared() {
    let ctx = TestContext::new().await;
    ctx.sign_in("asha@example.com").await;
    let mut memo = filled_memo(&ctx).await;
    let local_total = memo.total_value();

    let order = checkout(&mut memo, &ctx.api, &details())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(order.id.as_str(), "ord-1");
    assert_eq!(order.total_amount, Some(local_total));
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(memo.is_empty());
    assert!(ctx.memo().is_empty());
    assert_eq!(
        ctx.notices.drain(),
        vec![Notice::OrderPlaced {
            order_id: Some(order.id.clone())
        }]
    );

    let received = ctx.backend.orders();
    assert_eq!(received.len(), 1);
    let body = received.first().unwrap();
    assert_eq!(body["customerName"], "Asha Traders");
    assert_eq!(body["gstNo"], "27AAPFU0939F1ZV");
    assert_eq!(body["paymentMethod"], "bank_transfer");
    assert_eq!(body["paymentStatus"], "pending");
    assert_eq!(body["items"].as_array().map(Vec::len), Some(2));

    let history = ctx.api.my_orders().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history.first().map(|o| o.items.len()), Some(2));
}

#[tokio::test]
async fn test_rejected_order_keeps_memo_on_disk() {
    let ctx = TestContext::new().await;
    ctx.sign_in("asha@example.com").await;
    ctx.backend.reject_orders(true);
    let mut memo = filled_memo(&ctx).await;

    let err = checkout(&mut memo, &ctx.api, &details()).await.unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Api(ApiError::Api { status: 422, .. })
    ));
    assert_eq!(memo.lines().len(), 2);
    assert_eq!(ctx.memo().lines(), memo.lines());
    assert!(ctx.notices.drain().iter().all(Notice::is_error));
    assert!(ctx.backend.orders().is_empty());

    // Retrying after the backend recovers succeeds with the same memo
    ctx.backend.reject_orders(false);
    checkout(&mut memo, &ctx.api, &details()).await.unwrap();
    assert!(ctx.memo().is_empty());
}

#[tokio::test]
async fn test_expired_session_signs_out_and_keeps_memo() {
    let ctx = TestContext::new().await;
    ctx.sign_in("asha@example.com").await;
    ctx.session_file().save(&ctx.auth).unwrap();
    ctx.backend.expire_tokens(true);
    let mut memo = filled_memo(&ctx).await;

    let err = checkout(&mut memo, &ctx.api, &details()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Api(ApiError::Unauthorized)));
    assert!(!ctx.auth.is_authenticated());
    assert_eq!(ctx.memo().lines().len(), 2);

    ctx.session_file().save(&ctx.auth).unwrap();
    assert!(ctx.session_file().load().unwrap().is_none());
}

#[tokio::test]
async fn test_signed_out_checkout_is_unauthorized() {
    let ctx = TestContext::new().await;
    let mut memo = filled_memo(&ctx).await;

    let err = checkout(&mut memo, &ctx.api, &details()).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Api(ApiError::Unauthorized)));
    assert_eq!(memo.lines().len(), 2);
}

#[tokio::test]
async fn test_session_round_trip() {
    let ctx = TestContext::new().await;
    ctx.sign_in("asha@example.com").await;
    ctx.session_file().save(&ctx.auth).unwrap();

    let stored = ctx.session_file().load().unwrap().unwrap();
    assert_eq!(stored.user.email, "asha@example.com");

    ctx.auth.logout();
    ctx.auth.restore(stored);
    assert!(ctx.auth.is_authenticated());
    assert!(ctx.api.my_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_password() {
    let ctx = TestContext::new().await;

    let err = ctx.api.login("asha@example.com", "hunter2").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!ctx.auth.is_authenticated());
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::new().await;

    let err = ctx.api.product(&ProductId::new("chainsaw")).await.unwrap_err();

    assert!(matches!(err, ApiError::NotFound(message) if message == "Product not found"));
}
