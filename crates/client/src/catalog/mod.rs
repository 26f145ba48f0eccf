//! Catalog service client.
//!
//! Covers `api/authors`, `api/genres`, `api/publishers` and `api/products`.
//! Authors, genres and publishers go through the generic [`CatalogClient::list`]
//! family keyed on [`CatalogEntry`]; products have their own methods since
//! they also support `PATCH`.
//!
//! # Example
//!
//! ```rust,ignore
//! let catalog = CatalogClient::new(&config, session.token())?;
//! let authors = catalog.list::<Author>().await?;
//! let product = catalog.product(ProductId::new(3)).await?;
//! ```

mod types;

use std::sync::Arc;

use bookshop_core::ProductId;
use reqwest::Method;
use secrecy::SecretString;
use tracing::instrument;

pub use types::{
    Author, CatalogEntry, CatalogRequest, Genre, Product, ProductImage, ProductRequest, Publisher,
};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::HttpClient;

const PRODUCTS: &str = "api/products";

/// Client for the catalog/product service.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<HttpClient>,
}

impl CatalogClient {
    /// Create a client for the configured catalog URL.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, token: Option<SecretString>) -> Result<Self> {
        let http = HttpClient::new(config.catalog_url.clone(), config.http_timeout, token)?;
        Ok(Self {
            inner: Arc::new(http),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &url::Url {
        self.inner.base_url()
    }

    // =========================================================================
    // Authors, genres, publishers
    // =========================================================================

    /// List every record of one kind.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body does not decode.
    #[instrument(skip(self), fields(collection = E::COLLECTION))]
    pub async fn list<E: CatalogEntry>(&self) -> Result<Vec<E>> {
        self.inner.get(&format!("api/{}", E::COLLECTION)).await
    }

    /// Fetch one record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::NotFound`] if the id does not exist.
    #[instrument(skip(self), fields(collection = E::COLLECTION, id = %id))]
    pub async fn get<E: CatalogEntry>(&self, id: E::Id) -> Result<E> {
        self.inner.get(&entry_path::<E>(id)).await
    }

    /// Create a record and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(collection = E::COLLECTION))]
    pub async fn create<E: CatalogEntry>(&self, request: &CatalogRequest) -> Result<E> {
        let created = self
            .inner
            .send(Method::POST, &format!("api/{}", E::COLLECTION), request)
            .await?;
        tracing::info!(collection = E::COLLECTION, "Record created");
        Ok(created)
    }

    /// Rename a record.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(collection = E::COLLECTION, id = %id))]
    pub async fn update<E: CatalogEntry>(&self, id: E::Id, request: &CatalogRequest) -> Result<E> {
        self.inner
            .send(Method::PUT, &entry_path::<E>(id), request)
            .await
    }

    /// Delete a record.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(collection = E::COLLECTION, id = %id))]
    pub async fn delete<E: CatalogEntry>(&self, id: E::Id) -> Result<()> {
        self.inner.delete(&entry_path::<E>(id)).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>> {
        self.inner.get(PRODUCTS).await
    }

    /// Fetch one product with its relations.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::NotFound`] if the id does not exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        self.inner.get(&product_path(id)).await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Validation`] before sending if the request
    /// is invalid, or the server's error otherwise.
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create_product(&self, request: &ProductRequest) -> Result<Product> {
        request.validate()?;
        self.inner.send(Method::POST, PRODUCTS, request).await
    }

    /// Replace a product (`PUT`).
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Validation`] before sending if the request
    /// is invalid, or the server's error otherwise.
    #[instrument(skip(self, request), fields(id = %id))]
    pub async fn replace_product(&self, id: ProductId, request: &ProductRequest) -> Result<Product> {
        request.validate()?;
        self.inner
            .send(Method::PUT, &product_path(id), request)
            .await
    }

    /// Partially update a product (`PATCH`).
    ///
    /// # Errors
    ///
    /// Returns [`crate::ApiError::Validation`] before sending if the request
    /// is invalid, or the server's error otherwise.
    #[instrument(skip(self, request), fields(id = %id))]
    pub async fn patch_product(&self, id: ProductId, request: &ProductRequest) -> Result<Product> {
        request.validate()?;
        self.inner
            .send(Method::PATCH, &product_path(id), request)
            .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        self.inner.delete(&product_path(id)).await
    }
}

fn entry_path<E: CatalogEntry>(id: E::Id) -> String {
    format!("api/{}/{id}", E::COLLECTION)
}

fn product_path(id: ProductId) -> String {
    format!("{PRODUCTS}/{id}")
}

#[cfg(test)]
mod tests {
    use bookshop_core::{AuthorId, GenreId};

    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(entry_path::<Author>(AuthorId::new(7)), "api/authors/7");
        assert_eq!(entry_path::<Genre>(GenreId::new(2)), "api/genres/2");
        assert_eq!(product_path(ProductId::new(11)), "api/products/11");
    }
}
