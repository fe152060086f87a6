//! User-facing notices emitted by the memo and checkout.
//!
//! A notice is the transient message a UI shows as a snackbar. The store only
//! emits them; rendering belongs to whoever implements [`Notifier`].

use core::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use rust_decimal::Decimal;

use tooldepot_core::OrderId;

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A product was added (or its quantity increased).
    Added {
        product_name: String,
        quantity: Decimal,
    },
    /// The memo was emptied by the user.
    Cleared,
    /// An order was accepted by the backend.
    OrderPlaced { order_id: Option<OrderId> },
    /// An order submission failed; the memo is unchanged.
    CheckoutFailed { message: String },
}

impl Notice {
    /// Whether the notice reports a failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::CheckoutFailed { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added {
                product_name,
                quantity,
            } => write!(f, "Added {} x {product_name} to memo", quantity.normalize()),
            Self::Cleared => f.write_str("Memo cleared"),
            Self::OrderPlaced {
                order_id: Some(order_id),
            } => write!(f, "Order {order_id} placed"),
            Self::OrderPlaced { order_id: None } => f.write_str("Order placed"),
            Self::CheckoutFailed { message } => write!(f, "Checkout failed: {message}"),
        }
    }
}

/// Receives notices as they are emitted.
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Writes every notice to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            tracing::warn!(%notice, "notice");
        } else {
            tracing::info!(%notice, "notice");
        }
    }
}

/// Collects notices until a UI drains them.
///
/// Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    pending: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending notice, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<Notice> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *pending)
    }

    /// Number of notices waiting to be shown.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for NoticeQueue {
    fn notify(&self, notice: Notice) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
