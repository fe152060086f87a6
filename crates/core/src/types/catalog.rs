//! Catalog records as served by the backend.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId, VariantId};

/// A sellable variant of a product (size, finish, pack quantity, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(alias = "_id")]
    pub id: VariantId,
    /// Display name, e.g. "10 mm" or "Box of 100".
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Unit price in the store currency.
    pub price: Decimal,
    /// Units on hand. `None` when the backend does not track stock.
    #[serde(default)]
    pub stock: Option<Decimal>,
    /// Unit of measure, e.g. "pcs", "kg", "m".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Variant {
    /// Whether the variant is known to have no stock.
    ///
    /// Only an explicit zero counts; untracked stock is never out of stock.
    #[must_use]
    pub fn is_out_of_stock(&self) -> bool {
        self.stock.is_some_and(|stock| stock.is_zero())
    }
}

/// A catalog product with its variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Look up a variant by ID.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|variant| &variant.id == id)
    }

    /// Lowest variant price, used for sorting and "from" labels.
    #[must_use]
    pub fn lowest_price(&self) -> Option<Decimal> {
        self.variants.iter().map(|variant| variant.price).min()
    }

    /// The fields of this product worth keeping alongside a memo line.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
        }
    }
}

/// A point-in-time copy of the product fields a memo line needs.
///
/// Snapshots are not refreshed; they may go stale relative to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}
