//! Turning the memo into a submitted order.
//!
//! [`checkout`] is the one-call path: build the request, submit it, and clear
//! the memo once the backend accepts. The individual steps
//! ([`OrderRequest::from_memo`], [`ApiClient::submit_order`]) are public for
//! callers that need to keep the memo editable while a submission is pending.

use thiserror::Error;
use tracing::instrument;

use tooldepot_core::{GstNo, PaymentMethod, PaymentStatus};

use crate::api::{ApiClient, ApiError, Order, OrderItem, OrderRequest};
use crate::memo::{MemoLine, MemoRepository, MemoStore, Notice, Notifier};

/// Errors that stop an order from being placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// There is nothing to order.
    #[error("memo is empty")]
    EmptyMemo,

    /// A required customer detail is missing.
    #[error("{0} is required")]
    MissingDetail(&'static str),

    /// The backend rejected the order or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Customer-supplied fields of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDetails {
    pub customer_name: String,
    pub gst_no: Option<GstNo>,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
}

impl CheckoutDetails {
    /// Details with no GST number and the default payment method.
    #[must_use]
    pub fn new(customer_name: impl Into<String>, shipping_address: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            gst_no: None,
            shipping_address: shipping_address.into(),
            payment_method: PaymentMethod::default(),
        }
    }

    #[must_use]
    pub fn with_gst_no(mut self, gst_no: GstNo) -> Self {
        self.gst_no = Some(gst_no);
        self
    }

    #[must_use]
    pub const fn with_payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    /// Check that the name and address are present.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingDetail`] naming the first blank field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.customer_name.trim().is_empty() {
            return Err(CheckoutError::MissingDetail("customer name"));
        }
        if self.shipping_address.trim().is_empty() {
            return Err(CheckoutError::MissingDetail("shipping address"));
        }
        Ok(())
    }
}

impl From<&MemoLine> for OrderItem {
    fn from(line: &MemoLine) -> Self {
        Self {
            product_id: line.key.product_id.clone(),
            variant_id: line.key.variant_id.clone(),
            quantity: line.quantity,
            price: line.unit_price(),
        }
    }
}

impl<R: MemoRepository, N: Notifier> MemoStore<R, N> {
    /// The memo's lines as order items, in memo order.
    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.lines().iter().map(OrderItem::from).collect()
    }
}

impl OrderRequest {
    /// Build a submission from the memo's current contents.
    ///
    /// `total_amount` is the memo's total at this moment. Payment is always
    /// recorded as pending; settlement happens outside this client.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyMemo`] for an empty memo, or
    /// [`CheckoutError::MissingDetail`] if the details are incomplete.
    pub fn from_memo<R: MemoRepository, N: Notifier>(
        memo: &MemoStore<R, N>,
        details: &CheckoutDetails,
    ) -> Result<Self, CheckoutError> {
        if memo.is_empty() {
            return Err(CheckoutError::EmptyMemo);
        }
        details.validate()?;

        Ok(Self {
            customer_name: details.customer_name.trim().to_string(),
            gst_no: details.gst_no.clone(),
            items: memo.order_items(),
            total_amount: memo.total_value(),
            shipping_address: details.shipping_address.trim().to_string(),
            payment_method: details.payment_method,
            payment_status: PaymentStatus::Pending,
        })
    }
}

/// Submit the memo as an order.
///
/// Acceptance is decided by the HTTP status alone. On acceptance the memo is
/// emptied, [`Notice::OrderPlaced`] is emitted, and the backend's order is
/// returned when its acknowledgement could be read. On any submission failure
/// the memo is left exactly as it was, [`Notice::CheckoutFailed`] is emitted,
/// and the error is returned. Nothing is retried.
///
/// Validation failures (`EmptyMemo`, `MissingDetail`) are returned without a
/// notice since nothing was sent.
///
/// # Errors
///
/// Returns a [`CheckoutError`] if the request cannot be built or the backend
/// does not accept it.
#[instrument(skip_all, fields(lines = memo.lines().len()))]
pub async fn checkout<R: MemoRepository, N: Notifier>(
    memo: &mut MemoStore<R, N>,
    api: &ApiClient,
    details: &CheckoutDetails,
) -> Result<Option<Order>, CheckoutError> {
    let request = OrderRequest::from_memo(memo, details)?;

    match api.submit_order(&request).await {
        Ok(order) => {
            if let Some(server_total) = order.as_ref().and_then(|o| o.total_amount)
                && server_total != request.total_amount
            {
                tracing::warn!(
                    local = %request.total_amount,
                    server = %server_total,
                    "order total differs from memo total"
                );
            }

            let order_id = order.as_ref().map(|o| o.id.clone());
            memo.settle();
            memo.notifier().notify(Notice::OrderPlaced {
                order_id: order_id.clone(),
            });
            tracing::info!(order_id = ?order_id, "order placed");
            Ok(order)
        }
        Err(e) => {
            tracing::warn!(error = %e, "order submission failed");
            memo.notifier().notify(Notice::CheckoutFailed {
                message: e.to_string(),
            });
            Err(e.into())
        }
    }
}
