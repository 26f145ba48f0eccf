//! Product commands.

use bookshop_client::catalog::{Product, ProductImage, ProductRequest};
use bookshop_core::{AuthorId, GenreId, Price, ProductId, PublisherId, Route};

use super::Context;
use crate::error::CliError;

/// Fields to change on `products patch`; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub publisher_id: Option<PublisherId>,
    pub stock: Option<i32>,
    pub price: Option<Price>,
    pub supplier_price: Option<Price>,
    pub author_ids: Option<Vec<AuthorId>>,
    pub genre_ids: Option<Vec<GenreId>>,
    pub images: Option<Vec<ProductImage>>,
}

impl ProductPatch {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.publisher_id.is_none()
            && self.stock.is_none()
            && self.price.is_none()
            && self.supplier_price.is_none()
            && self.author_ids.is_none()
            && self.genre_ids.is_none()
            && self.images.is_none()
    }

    /// Overlay the changed fields on a request built from the current product.
    fn apply(self, mut request: ProductRequest) -> ProductRequest {
        if let Some(title) = self.title {
            request.title = title.trim().to_string();
        }
        if let Some(publisher_id) = self.publisher_id {
            request.publisher_id = publisher_id;
        }
        if let Some(stock) = self.stock {
            request.stock = stock;
        }
        if let Some(price) = self.price {
            request.price = price;
        }
        if self.supplier_price.is_some() {
            request.supplier_price = self.supplier_price;
        }
        if let Some(author_ids) = self.author_ids {
            request.author_ids = author_ids;
        }
        if let Some(genre_ids) = self.genre_ids {
            request.genre_ids = genre_ids;
        }
        if let Some(images) = self.images {
            request.images = images;
        }
        request
    }
}

pub async fn list(ctx: &Context) -> Result<(), CliError> {
    let session = ctx.require(Route::Products)?;
    let products = ctx.catalog(&session)?.products().await?;

    if products.is_empty() {
        tracing::info!("No products found");
        return Ok(());
    }
    for product in &products {
        tracing::info!(
            "{:>5}  {:<40} {:>12}  stock {}",
            product.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            product.title,
            product.price.to_string(),
            product.stock
        );
    }
    Ok(())
}

pub async fn show(ctx: &Context, id: ProductId) -> Result<(), CliError> {
    let session = ctx.require(Route::Products)?;
    let product = ctx.catalog(&session)?.product(id).await?;
    print_product(&product);
    Ok(())
}

pub async fn create(ctx: &Context, request: ProductRequest) -> Result<(), CliError> {
    let session = ctx.require_editor(Route::Products)?;
    let product = ctx.catalog(&session)?.create_product(&request).await?;
    tracing::info!("Product created");
    print_product(&product);
    Ok(())
}

pub async fn replace(ctx: &Context, id: ProductId, request: ProductRequest) -> Result<(), CliError> {
    let session = ctx.require_editor(Route::Products)?;
    let product = ctx.catalog(&session)?.replace_product(id, &request).await?;
    tracing::info!("Product updated");
    print_product(&product);
    Ok(())
}

pub async fn patch(ctx: &Context, id: ProductId, patch: ProductPatch) -> Result<(), CliError> {
    if patch.is_empty() {
        return Err(CliError::InvalidInput("Nothing to change".to_string()));
    }

    let session = ctx.require_editor(Route::Products)?;
    let catalog = ctx.catalog(&session)?;
    let current = catalog.product(id).await?;
    let base = ProductRequest::from_product(&current)
        .or_else(|| {
            patch
                .publisher_id
                .and_then(|publisher_id| request_with_publisher(&current, publisher_id))
        })
        .ok_or_else(|| {
            CliError::InvalidInput(format!(
                "Product {id} has no publisher; pass --publisher to set one"
            ))
        })?;

    let product = catalog.patch_product(id, &patch.apply(base)).await?;
    tracing::info!("Product updated");
    print_product(&product);
    Ok(())
}

pub async fn delete(ctx: &Context, id: ProductId) -> Result<(), CliError> {
    let session = ctx.require_editor(Route::Products)?;
    ctx.catalog(&session)?.delete_product(id).await?;
    tracing::info!("Product {id} deleted");
    Ok(())
}

fn request_with_publisher(product: &Product, publisher_id: PublisherId) -> Option<ProductRequest> {
    let mut product = product.clone();
    product.publisher_id = Some(publisher_id);
    ProductRequest::from_product(&product)
}

fn print_product(product: &Product) {
    let id = product
        .id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    tracing::info!("#{id} {}", product.title);
    tracing::info!("  Price:     {}", product.price);
    if let Some(supplier) = product.supplier_price {
        tracing::info!("  Supplier:  {supplier}");
    }
    tracing::info!("  Stock:     {}", product.stock);
    if let Some(publisher) = product.publisher_id {
        tracing::info!("  Publisher: {publisher}");
    }
    if !product.authors.is_empty() {
        let names: Vec<&str> = product.authors.iter().map(|a| a.name.as_str()).collect();
        tracing::info!("  Authors:   {}", names.join(", "));
    }
    if !product.genres.is_empty() {
        let names: Vec<&str> = product.genres.iter().map(|g| g.name.as_str()).collect();
        tracing::info!("  Genres:    {}", names.join(", "));
    }
    for image in &product.images {
        tracing::info!("  Image:     {}", image.url);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> ProductRequest {
        ProductRequest {
            title: "Aura".to_string(),
            publisher_id: PublisherId::new(1),
            stock: 3,
            price: Price::from_cents(9_900),
            supplier_price: None,
            author_ids: vec![AuthorId::new(2)],
            genre_ids: vec![],
            images: vec![],
        }
    }

    #[test]
    fn test_patch_overlays_only_given_fields() {
        let patch = ProductPatch {
            stock: Some(10),
            price: Some(Price::from_cents(12_000)),
            ..ProductPatch::default()
        };
        let patched = patch.apply(request());
        assert_eq!(patched.stock, 10);
        assert_eq!(patched.price, Price::from_cents(12_000));
        assert_eq!(patched.title, "Aura");
        assert_eq!(patched.author_ids, vec![AuthorId::new(2)]);
    }

    #[test]
    fn test_empty_patch_detected() {
        assert!(ProductPatch::default().is_empty());
        let patch = ProductPatch {
            title: Some("x".to_string()),
            ..ProductPatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_request_with_publisher_fills_missing_publisher() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 1, "title": "Aura", "stock": 2, "price": 10
        }))
        .unwrap();
        let request = request_with_publisher(&product, PublisherId::new(5)).unwrap();
        assert_eq!(request.publisher_id, PublisherId::new(5));
        assert_eq!(request.title, "Aura");
        assert_eq!(request.stock, 2);
    }
}
