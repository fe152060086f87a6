//! The memo: the customer's working list of variants to order.
//!
//! # Model
//!
//! A [`MemoStore`] owns an ordered list of [`MemoLine`]s, at most one per
//! product variant ([`LineKey`]). Adding a variant that is already present
//! increases its quantity instead of inserting a second line. Quantities are
//! strictly positive; reducing a line to zero removes it.
//!
//! Every change is written through the injected [`MemoRepository`] before
//! the operation returns, and user-visible confirmations go to the injected
//! [`Notifier`].
//!
//! # Example
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use tooldepot_storefront::memo::{InMemoryRepository, MemoStore, NoticeQueue};
//! # use tooldepot_core::Product;
//! # let product: Product = serde_json::from_value(serde_json::json!({
//! #     "id": "p1", "name": "Claw Hammer",
//! #     "variants": [{ "id": "16oz", "name": "16 oz", "price": "450", "stock": "10" }]
//! # })).unwrap();
//!
//! let mut memo = MemoStore::new(InMemoryRepository::new(), NoticeQueue::new());
//! memo.add_single(&product, product.variants.first(), Decimal::ONE);
//! memo.add_single(&product, product.variants.first(), Decimal::TWO);
//!
//! assert_eq!(memo.lines().len(), 1);
//! assert_eq!(memo.total_item_count(), Decimal::from(3));
//! assert_eq!(memo.total_value(), Decimal::from(1350));
//! ```

mod line;
mod notice;
mod repository;

pub use line::{LineKey, MemoLine};
pub use notice::{Notice, NoticeQueue, Notifier, TracingNotifier};
pub use repository::{InMemoryRepository, JsonFileRepository, MemoRepository, RepositoryError};

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::instrument;

use tooldepot_core::{Product, ProductId, Variant, VariantId};

/// Whether the memo holds anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    Empty,
    Populated,
}

/// Why an add request changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No variant was supplied, or the ID did not resolve on the product.
    MissingVariant,
    /// The variant's stock is exactly zero.
    OutOfStock,
    /// The requested quantity was zero or negative.
    NonPositiveQuantity,
}

/// Result of an add request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was appended.
    Added,
    /// An existing line's quantity was increased.
    Merged,
    /// Nothing changed.
    Skipped(SkipReason),
}

impl AddOutcome {
    /// Whether the memo changed.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Client-side memo of selected variants and quantities.
pub struct MemoStore<R, N = TracingNotifier> {
    lines: Vec<MemoLine>,
    is_open: bool,
    repository: R,
    notifier: N,
}

impl<R: MemoRepository, N: Notifier> MemoStore<R, N> {
    /// Create a store hydrated from `repository`.
    ///
    /// Unreadable persisted state is logged and treated as an empty memo, as
    /// are persisted lines that violate the positive-quantity or unique-key
    /// invariants.
    pub fn new(repository: R, notifier: N) -> Self {
        let lines = match repository.load() {
            Ok(lines) => sanitize(lines),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable memo state");
                Vec::new()
            }
        };

        tracing::debug!(lines = lines.len(), "memo hydrated");

        Self {
            lines,
            is_open: false,
            repository,
            notifier,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of `variant` to the memo.
    ///
    /// Skips silently when the variant is missing, out of stock, or the
    /// quantity is not positive. Otherwise merges into an existing line for
    /// the same variant or appends a new one, emits [`Notice::Added`], and
    /// persists.
    #[instrument(skip_all, fields(product = %product.id))]
    pub fn add_single(
        &mut self,
        product: &Product,
        variant: Option<&Variant>,
        quantity: Decimal,
    ) -> AddOutcome {
        let Some(variant) = variant else {
            return AddOutcome::Skipped(SkipReason::MissingVariant);
        };

        let outcome = self.merge(product, variant, quantity);
        if outcome.is_applied() {
            self.notifier.notify(Notice::Added {
                product_name: product.name.clone(),
                quantity,
            });
            self.persist();
        }
        outcome
    }

    /// Add several variants of one product at once.
    ///
    /// Each ID is resolved against `product`; IDs that do not resolve, are out
    /// of stock, or map to a non-positive quantity are skipped without
    /// affecting the rest. Missing quantities default to one. No per-line
    /// notices are emitted. Persists once at the end if anything changed and
    /// returns the number of applied IDs.
    #[instrument(skip_all, fields(product = %product.id, requested = variant_ids.len()))]
    pub fn add_multiple(
        &mut self,
        product: &Product,
        variant_ids: &[VariantId],
        quantities: &HashMap<VariantId, Decimal>,
    ) -> usize {
        let mut applied = 0;

        for variant_id in variant_ids {
            let Some(variant) = product.variant(variant_id) else {
                tracing::debug!(variant = %variant_id, "skipping unknown variant");
                continue;
            };

            let quantity = quantities.get(variant_id).copied().unwrap_or(Decimal::ONE);
            let outcome = self.merge(product, variant, quantity);
            if outcome.is_applied() {
                applied += 1;
            } else {
                tracing::debug!(variant = %variant_id, ?outcome, "skipping variant");
            }
        }

        if applied > 0 {
            self.persist();
        }
        applied
    }

    /// Set the quantity of a line. Zero or negative removes it.
    ///
    /// Unknown keys are ignored.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: Decimal) {
        if quantity <= Decimal::ZERO {
            self.remove(key);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|line| &line.key == key) {
            line.quantity = quantity;
            self.persist();
        }
    }

    /// Delete a line. Unknown keys are ignored.
    pub fn remove(&mut self, key: &LineKey) {
        let before = self.lines.len();
        self.lines.retain(|line| &line.key != key);
        if self.lines.len() != before {
            self.persist();
        }
    }

    /// Empty the memo, emit [`Notice::Cleared`], and persist.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.notifier.notify(Notice::Cleared);
        self.persist();
    }

    /// Empty the memo after an accepted order. The caller reports the order.
    pub(crate) fn settle(&mut self) {
        self.lines.clear();
        self.persist();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[MemoLine] {
        &self.lines
    }

    /// Look up a line by key.
    #[must_use]
    pub fn line(&self, key: &LineKey) -> Option<&MemoLine> {
        self.lines.iter().find(|line| &line.key == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> MemoState {
        if self.lines.is_empty() {
            MemoState::Empty
        } else {
            MemoState::Populated
        }
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_item_count(&self) -> Decimal {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of `unit price * quantity`, using the prices captured at add-time.
    #[must_use]
    pub fn total_value(&self) -> Decimal {
        self.lines.iter().map(MemoLine::subtotal).sum()
    }

    /// Whether the memo holds the given variant.
    #[must_use]
    pub fn contains_variant(&self, product_id: &ProductId, variant_id: &VariantId) -> bool {
        self.lines
            .iter()
            .any(|line| line.key.matches(product_id, variant_id))
    }

    /// Quantity held for the given variant, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId, variant_id: &VariantId) -> Decimal {
        self.lines
            .iter()
            .find(|line| line.key.matches(product_id, variant_id))
            .map_or(Decimal::ZERO, |line| line.quantity)
    }

    // =========================================================================
    // Drawer visibility
    // =========================================================================

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    pub const fn open(&mut self) {
        self.is_open = true;
    }

    pub const fn close(&mut self) {
        self.is_open = false;
    }

    pub const fn toggle(&mut self) {
        self.is_open = !self.is_open;
    }

    // =========================================================================
    // Collaborators
    // =========================================================================

    /// The notifier this store reports to.
    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// The repository this store persists through.
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Apply the add rules to the in-memory list without persisting.
    fn merge(&mut self, product: &Product, variant: &Variant, quantity: Decimal) -> AddOutcome {
        if variant.is_out_of_stock() {
            return AddOutcome::Skipped(SkipReason::OutOfStock);
        }
        if quantity <= Decimal::ZERO {
            return AddOutcome::Skipped(SkipReason::NonPositiveQuantity);
        }

        let key = LineKey::of(product, variant);
        if let Some(line) = self.lines.iter_mut().find(|line| line.key == key) {
            line.quantity += quantity;
            AddOutcome::Merged
        } else {
            self.lines.push(MemoLine::new(product, variant, quantity));
            AddOutcome::Added
        }
    }

    /// Write the current lines through the repository.
    ///
    /// The in-memory list stays authoritative if the write fails.
    fn persist(&self) {
        if let Err(e) = self.repository.save(&self.lines) {
            tracing::error!(error = %e, "failed to persist memo");
        }
    }
}

/// Drop persisted lines that break the store's invariants.
///
/// Non-positive quantities are removed and duplicate keys are merged into the
/// first occurrence.
fn sanitize(lines: Vec<MemoLine>) -> Vec<MemoLine> {
    let mut clean: Vec<MemoLine> = Vec::with_capacity(lines.len());

    for line in lines {
        if line.quantity <= Decimal::ZERO {
            tracing::warn!(key = %line.key, "dropping persisted line with non-positive quantity");
            continue;
        }
        if let Some(existing) = clean.iter_mut().find(|existing| existing.key == line.key) {
            existing.quantity += line.quantity;
        } else {
            clean.push(line);
        }
    }

    clean
}
