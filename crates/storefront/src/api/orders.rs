//! Order endpoints.

use tracing::instrument;

use super::{ApiClient, ApiError, Order, OrderRequest};

impl ApiClient {
    /// Submit an order (`POST /orders`).
    ///
    /// Any 2xx status means the order was accepted; the backend documents
    /// `201 Created`. The acknowledgement body is read best-effort and is
    /// `None` when it is empty or not an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects the order.
    #[instrument(skip_all, fields(items = request.items.len(), total = %request.total_amount))]
    pub async fn submit_order(&self, request: &OrderRequest) -> Result<Option<Order>, ApiError> {
        let response = self.post("orders", request).await?;
        let status = response.status;

        match response.json::<Order>() {
            Ok(order) => {
                tracing::info!(%status, order_id = %order.id, "order accepted");
                Ok(Some(order))
            }
            Err(e) => {
                tracing::warn!(%status, error = %e, "order accepted without a readable acknowledgement");
                Ok(None)
            }
        }
    }

    /// The signed-in customer's order history (`GET /orders/my`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get("orders/my").await?.json()
    }
}
