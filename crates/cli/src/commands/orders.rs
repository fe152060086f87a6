//! Checkout and order history commands.

use tracing::info;

use tooldepot_storefront::checkout::{self, CheckoutDetails};
use tooldepot_storefront::error::AppError;

use super::{Context, format_quantity};

pub async fn checkout(ctx: &Context, details: &CheckoutDetails) -> Result<(), AppError> {
    let mut memo = ctx.memo();
    let order = checkout::checkout(&mut memo, &ctx.api, details).await?;

    if let Some(total) = order.and_then(|order| order.total_amount) {
        info!("Order total {}", ctx.money(total));
    }
    Ok(())
}

pub async fn history(ctx: &Context) -> Result<(), AppError> {
    let orders = ctx.api.my_orders().await?;

    if orders.is_empty() {
        info!("No orders yet");
        return Ok(());
    }

    for order in &orders {
        let placed = order
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let items: rust_decimal::Decimal = order.items.iter().map(|item| item.quantity).sum();
        let total = order
            .total_amount
            .map(|total| ctx.money(total))
            .unwrap_or_default();
        info!(
            "{:<26} {:<10} {:<10} {:>8} item(s) {:>12}  payment {}",
            order.id,
            placed,
            order.status,
            format_quantity(items),
            total,
            order.payment_status
        );
    }
    Ok(())
}
