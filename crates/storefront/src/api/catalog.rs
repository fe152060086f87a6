//! Catalog endpoints (products and categories).
//!
//! Responses are cached; the catalog changes rarely compared to how often a
//! browsing session re-reads it.

use std::sync::Arc;

use tracing::{debug, instrument};

use tooldepot_core::{Category, Product, ProductId};

use super::{ApiClient, ApiError};

const PRODUCTS_KEY: &str = "products";
const CATEGORIES_KEY: &str = "categories";

/// Cached value types.
#[derive(Debug, Clone)]
pub(super) enum CacheValue {
    Product(Arc<Product>),
    Products(Arc<Vec<Product>>),
    Categories(Arc<Vec<Category>>),
}

fn product_key(id: &ProductId) -> String {
    format!("product:{id}")
}

impl ApiClient {
    /// Get every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(PRODUCTS_KEY).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Arc<Vec<Product>> = Arc::new(self.get("products").await?.json()?);

        self.inner
            .cache
            .insert(
                PRODUCTS_KEY.to_string(),
                CacheValue::Products(Arc::clone(&products)),
            )
            .await;

        Ok(products)
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Arc<Product>, ApiError> {
        let cache_key = product_key(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let product: Arc<Product> = Arc::new(self.get(&format!("products/{id}")).await?.json()?);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Arc::clone(&product)))
            .await;

        Ok(product)
    }

    /// Get every product category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(CATEGORIES_KEY).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Arc<Vec<Category>> = Arc::new(self.get("categories").await?.json()?);

        self.inner
            .cache
            .insert(
                CATEGORIES_KEY.to_string(),
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;

        Ok(categories)
    }

    /// Drop every cached catalog response.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }
}
