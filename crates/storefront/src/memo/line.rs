//! Memo line items and their identity.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tooldepot_core::{Product, ProductId, ProductSnapshot, Variant, VariantId};

/// Identity of a memo line: one product variant.
///
/// Compared structurally, so IDs that themselves contain `-` never collide.
/// The `Display` form (`"{product}-{variant}"`) is for humans only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineKey {
    pub product_id: ProductId,
    pub variant_id: VariantId,
}

impl LineKey {
    #[must_use]
    pub const fn new(product_id: ProductId, variant_id: VariantId) -> Self {
        Self {
            product_id,
            variant_id,
        }
    }

    /// Key for a variant of the given product.
    #[must_use]
    pub fn of(product: &Product, variant: &Variant) -> Self {
        Self::new(product.id.clone(), variant.id.clone())
    }

    /// Whether this key addresses the given product and variant.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, variant_id: &VariantId) -> bool {
        &self.product_id == product_id && &self.variant_id == variant_id
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.product_id, self.variant_id)
    }
}

/// One entry in the memo.
///
/// `product` and `variant` are copies taken when the line was first added;
/// later backend price or stock changes are not observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoLine {
    pub key: LineKey,
    pub product: ProductSnapshot,
    pub variant: Variant,
    /// Always strictly positive while the line is stored.
    pub quantity: Decimal,
}

impl MemoLine {
    pub(crate) fn new(product: &Product, variant: &Variant, quantity: Decimal) -> Self {
        Self {
            key: LineKey::of(product, variant),
            product: product.snapshot(),
            variant: variant.clone(),
            quantity,
        }
    }

    /// Unit price captured at add-time.
    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.variant.price
    }

    /// `unit_price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.variant.price * self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = LineKey::new(ProductId::new("p1"), VariantId::new("v2"));
        assert_eq!(key.to_string(), "p1-v2");
    }

    #[test]
    fn test_hyphenated_ids_do_not_collide() {
        // Both render as "a-b-c" but address different variants
        let left = LineKey::new(ProductId::new("a-b"), VariantId::new("c"));
        let right = LineKey::new(ProductId::new("a"), VariantId::new("b-c"));

        assert_eq!(left.to_string(), right.to_string());
        assert_ne!(left, right);
    }

    #[test]
    fn test_key_wire_format() {
        let key = LineKey::new(ProductId::new("p1"), VariantId::new("v2"));
        let json = serde_json::to_value(&key).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({ "productId": "p1", "variantId": "v2" })
        );
    }
}
