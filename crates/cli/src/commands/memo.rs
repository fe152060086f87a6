//! Memo commands.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::info;

use tooldepot_core::{ProductId, VariantId};
use tooldepot_storefront::error::AppError;
use tooldepot_storefront::memo::{AddOutcome, LineKey, SkipReason};

use super::{Context, format_quantity};

/// Print every line and the totals.
pub fn list(ctx: &Context) {
    let memo = ctx.memo();

    if memo.is_empty() {
        info!("Memo is empty");
        return;
    }

    for line in memo.lines() {
        info!(
            "{:<24} {:<16} {:>8} x {:>12} = {:>12}   [{} {}]",
            line.product.name,
            line.variant.name,
            format_quantity(line.quantity),
            ctx.money(line.unit_price()),
            ctx.money(line.subtotal()),
            line.key.product_id,
            line.key.variant_id,
        );
    }
    info!(
        "{} line(s), {} item(s), total {}",
        memo.lines().len(),
        format_quantity(memo.total_item_count()),
        ctx.money(memo.total_value())
    );
}

/// Add one variant, looking the product up in the catalog.
pub async fn add(
    ctx: &Context,
    product_id: &ProductId,
    variant_id: &VariantId,
    quantity: Decimal,
) -> Result<(), AppError> {
    let product = ctx.api.product(product_id).await?;
    let mut memo = ctx.memo();

    match memo.add_single(&product, product.variant(variant_id), quantity) {
        AddOutcome::Added | AddOutcome::Merged => {
            info!(
                "{} of {} now in memo",
                format_quantity(memo.quantity_of(product_id, variant_id)),
                product.name
            );
            Ok(())
        }
        AddOutcome::Skipped(reason) => Err(AppError::BadRequest(skip_message(reason, variant_id))),
    }
}

/// Add several variants of one product. Entries are `VARIANT` or `VARIANT=QTY`.
pub async fn add_many(
    ctx: &Context,
    product_id: &ProductId,
    entries: &[String],
) -> Result<(), AppError> {
    let (variant_ids, quantities) = parse_entries(entries)?;
    let product = ctx.api.product(product_id).await?;
    let mut memo = ctx.memo();

    let applied = memo.add_multiple(&product, &variant_ids, &quantities);
    info!(
        "Added {applied} of {} variant(s) of {}",
        variant_ids.len(),
        product.name
    );
    Ok(())
}

pub fn update(ctx: &Context, product_id: ProductId, variant_id: VariantId, quantity: Decimal) {
    let mut memo = ctx.memo();
    let key = LineKey::new(product_id, variant_id);

    if memo.line(&key).is_none() {
        info!("{key} is not in the memo");
        return;
    }

    memo.update_quantity(&key, quantity);
    match memo.line(&key) {
        Some(line) => info!("{key} set to {}", format_quantity(line.quantity)),
        None => info!("{key} removed"),
    }
}

pub fn remove(ctx: &Context, product_id: ProductId, variant_id: VariantId) {
    let mut memo = ctx.memo();
    let key = LineKey::new(product_id, variant_id);

    if memo.line(&key).is_none() {
        info!("{key} is not in the memo");
        return;
    }
    memo.remove(&key);
    info!("{key} removed");
}

pub fn clear(ctx: &Context) {
    ctx.memo().clear();
}

fn skip_message(reason: SkipReason, variant_id: &VariantId) -> String {
    match reason {
        SkipReason::MissingVariant => format!("Product has no variant {variant_id}"),
        SkipReason::OutOfStock => format!("Variant {variant_id} is out of stock"),
        SkipReason::NonPositiveQuantity => "Quantity must be greater than zero".to_string(),
    }
}

/// Split `VARIANT[=QTY]` entries into IDs (in order) and explicit quantities.
fn parse_entries(entries: &[String]) -> Result<(Vec<VariantId>, HashMap<VariantId, Decimal>), AppError> {
    let mut ids = Vec::with_capacity(entries.len());
    let mut quantities = HashMap::new();

    for entry in entries {
        let (id, quantity) = match entry.split_once('=') {
            Some((id, quantity)) => {
                let quantity = quantity.trim().parse::<Decimal>().map_err(|_| {
                    AppError::BadRequest(format!("Invalid quantity in '{entry}'"))
                })?;
                (id.trim(), Some(quantity))
            }
            None => (entry.trim(), None),
        };
        if id.is_empty() {
            return Err(AppError::BadRequest(format!("Missing variant in '{entry}'")));
        }

        let id = VariantId::new(id);
        if let Some(quantity) = quantity {
            quantities.insert(id.clone(), quantity);
        }
        ids.push(id);
    }

    Ok((ids, quantities))
}
