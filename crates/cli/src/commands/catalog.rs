//! Catalog browsing commands.

use tracing::info;

use tooldepot_core::ProductId;
use tooldepot_storefront::catalog::ProductQuery;
use tooldepot_storefront::error::AppError;

use super::{Context, format_quantity};

pub async fn list(ctx: &Context, query: &ProductQuery) -> Result<(), AppError> {
    let products = ctx.api.products().await?;
    let page = query.apply(&products);

    if page.items.is_empty() {
        info!("No products found");
        return Ok(());
    }

    for product in &page.items {
        let from = product
            .lowest_price()
            .map_or_else(|| "-".to_string(), |price| format!("from {}", ctx.money(price)));
        info!(
            "{:<16} {:<32} {:<12} {}",
            product.id,
            product.name,
            product.brand.as_deref().unwrap_or(""),
            from
        );
    }
    info!(
        "Page {} of {} ({} products)",
        page.page,
        page.total_pages.max(1),
        page.total
    );
    Ok(())
}

pub async fn show(ctx: &Context, id: &ProductId) -> Result<(), AppError> {
    let product = ctx.api.product(id).await?;
    let memo = ctx.memo();

    info!("{} ({})", product.name, product.id);
    if let Some(brand) = &product.brand {
        info!("Brand: {brand}");
    }
    if !product.description.is_empty() {
        info!("{}", product.description);
    }

    for variant in &product.variants {
        let stock = match variant.stock {
            Some(stock) if stock.is_zero() => "out of stock".to_string(),
            Some(stock) => format!("{} in stock", format_quantity(stock)),
            None => String::new(),
        };
        let held = memo.quantity_of(&product.id, &variant.id);
        let in_memo = if held.is_zero() {
            String::new()
        } else {
            format!(" ({} in memo)", format_quantity(held))
        };
        info!(
            "  {:<12} {:<20} {:>12} {}{}",
            variant.id,
            variant.name,
            ctx.money(variant.price),
            stock,
            in_memo
        );
    }
    Ok(())
}

pub async fn categories(ctx: &Context) -> Result<(), AppError> {
    let categories = ctx.api.categories().await?;

    for category in categories.iter() {
        info!("{:<16} {}", category.id, category.name);
    }
    Ok(())
}
