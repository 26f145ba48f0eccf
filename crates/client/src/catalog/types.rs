//! Catalog service records and request bodies.

use bookshop_core::{AuthorId, GenreId, Price, ProductId, PublisherId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A simple named catalog record reachable under `api/<collection>`.
///
/// Authors, genres and publishers share one wire shape (`{id, name}`) and
/// the same five operations; this trait lets the client and front ends
/// handle them generically while keeping their ids distinct.
pub trait CatalogEntry: DeserializeOwned + Send + Sync + 'static {
    /// Id type of this record.
    type Id: Copy + std::fmt::Debug + std::fmt::Display + Send + Sync;

    /// Collection segment, e.g. `"authors"`.
    const COLLECTION: &'static str;

    /// Singular name for messages, e.g. `"author"`.
    const NOUN: &'static str;

    /// Record id, if the server returned one.
    fn id(&self) -> Option<Self::Id>;

    /// Display name.
    fn name(&self) -> &str;
}

macro_rules! catalog_entry {
    ($(#[$meta:meta])* $name:ident, $id:ty, $collection:literal, $noun:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(default, skip_serializing_if = "Option::is_none")]
            pub id: Option<$id>,
            #[serde(default, deserialize_with = "crate::wire::null_as_default")]
            pub name: String,
        }

        impl CatalogEntry for $name {
            type Id = $id;
            const COLLECTION: &'static str = $collection;
            const NOUN: &'static str = $noun;

            fn id(&self) -> Option<Self::Id> {
                self.id
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

catalog_entry!(
    /// A book author.
    Author,
    AuthorId,
    "authors",
    "author"
);
catalog_entry!(
    /// A literary genre.
    Genre,
    GenreId,
    "genres",
    "genre"
);
catalog_entry!(
    /// A publishing house.
    Publisher,
    PublisherId,
    "publishers",
    "publisher"
);

/// Body for creating or renaming an author, genre or publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRequest {
    pub name: String,
}

impl CatalogRequest {
    /// Build a request, trimming the name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the name is blank.
    pub fn new(name: &str) -> Result<Self, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Name cannot be empty".to_string()));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }
}

/// A product image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub url: String,
}

/// A product as returned by the catalog service.
///
/// Relation fields are optional on the wire; listings usually omit them and
/// detail responses include them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: Option<ProductId>,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub title: String,
    #[serde(default)]
    pub publisher_id: Option<PublisherId>,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub stock: i32,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub price: Price,
    #[serde(default)]
    pub supplier_price: Option<Price>,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub authors: Vec<Author>,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub images: Vec<ProductImage>,
}

/// Body for creating (POST), replacing (PUT) or patching (PATCH) a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRequest {
    pub title: String,
    pub publisher_id: PublisherId,
    pub stock: i32,
    pub price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_price: Option<Price>,
    pub author_ids: Vec<AuthorId>,
    pub genre_ids: Vec<GenreId>,
    pub images: Vec<ProductImage>,
}

impl ProductRequest {
    /// Check the request the way the product form does before submitting.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation("Title cannot be empty".to_string()));
        }
        if self.stock < 0 {
            return Err(ApiError::Validation("Stock cannot be negative".to_string()));
        }
        self.price
            .validate_selling()
            .map_err(|e| ApiError::Validation(format!("Invalid price: {e}")))?;
        if let Some(supplier) = self.supplier_price {
            supplier
                .validate_supplier()
                .map_err(|e| ApiError::Validation(format!("Invalid supplier price: {e}")))?;
        }
        Ok(())
    }

    /// Start a request from an existing product, for edits.
    ///
    /// Returns `None` if the product has no publisher, which the catalog
    /// requires.
    #[must_use]
    pub fn from_product(product: &Product) -> Option<Self> {
        Some(Self {
            title: product.title.clone(),
            publisher_id: product.publisher_id?,
            stock: product.stock,
            price: product.price,
            supplier_price: product.supplier_price,
            author_ids: product.authors.iter().filter_map(|a| a.id).collect(),
            genre_ids: product.genres.iter().filter_map(|g| g.id).collect(),
            images: product.images.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> ProductRequest {
        ProductRequest {
            title: "Pedro Paramo".to_string(),
            publisher_id: PublisherId::new(2),
            stock: 10,
            price: Price::from_cents(24_900),
            supplier_price: Some(Price::from_cents(15_000)),
            author_ids: vec![AuthorId::new(1)],
            genre_ids: vec![GenreId::new(4)],
            images: vec![],
        }
    }

    #[test]
    fn test_product_decodes_sparse_listing() {
        let product: Product =
            serde_json::from_str(r#"{"id": 3, "title": "Aura", "stock": 5, "price": 120.5}"#)
                .unwrap();
        assert_eq!(product.id, Some(ProductId::new(3)));
        assert_eq!(product.price, Price::from_cents(12_050));
        assert!(product.publisher_id.is_none());
        assert!(product.authors.is_empty());
    }

    #[test]
    fn test_product_decodes_nulls_and_string_prices() {
        let product: Product = serde_json::from_str(
            r#"{"id": 4, "title": "Ficciones", "publisher_id": 1, "stock": 2,
                "price": "199.00", "supplier_price": null,
                "authors": [{"id": 7, "name": "Borges"}], "genres": [],
                "images": [{"url": "https://img/1.jpg"}]}"#,
        )
        .unwrap();
        assert_eq!(product.price, Price::from_cents(19_900));
        assert!(product.supplier_price.is_none());
        assert_eq!(product.authors[0].name, "Borges");
        assert_eq!(product.images.len(), 1);
    }

    #[test]
    fn test_explicit_nulls_fall_back_to_defaults() {
        let product: Product = serde_json::from_str(
            r#"{"id": 5, "title": null, "publisher_id": null, "stock": null,
                "price": null, "authors": null, "genres": null, "images": null}"#,
        )
        .unwrap();
        assert_eq!(product.title, "");
        assert_eq!(product.stock, 0);
        assert_eq!(product.price, Price::ZERO);
        assert!(product.authors.is_empty());
        assert!(product.genres.is_empty());
        assert!(product.images.is_empty());

        let author: Author = serde_json::from_str(r#"{"id": 1, "name": null}"#).unwrap();
        assert_eq!(author.name, "");
    }

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_value(request()).unwrap();
        assert_eq!(json["publisher_id"], 2);
        assert_eq!(json["author_ids"], serde_json::json!([1]));
        assert_eq!(json["genre_ids"], serde_json::json!([4]));
        assert!(json["price"].is_number());
    }

    #[test]
    fn test_request_omits_missing_supplier_price() {
        let mut req = request();
        req.supplier_price = None;
        let json = serde_json::to_value(req).unwrap();
        assert!(json.get("supplier_price").is_none());
    }

    #[test]
    fn test_validate() {
        assert!(request().validate().is_ok());

        let mut req = request();
        req.title = "  ".to_string();
        assert!(req.validate().is_err());

        let mut req = request();
        req.price = Price::from_cents(100_000_000);
        assert!(req.validate().is_err());

        let mut req = request();
        req.stock = -1;
        assert!(req.validate().is_err());

        let mut req = request();
        req.supplier_price = Some(Price::from_cents(100_000_000));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_from_product_requires_publisher() {
        let mut product: Product =
            serde_json::from_str(r#"{"id": 1, "title": "Aura", "stock": 1, "price": 10}"#).unwrap();
        assert!(ProductRequest::from_product(&product).is_none());

        product.publisher_id = Some(PublisherId::new(9));
        product.authors = vec![Author {
            id: Some(AuthorId::new(5)),
            name: "Fuentes".to_string(),
        }];
        let req = ProductRequest::from_product(&product).unwrap();
        assert_eq!(req.author_ids, vec![AuthorId::new(5)]);
    }

    #[test]
    fn test_catalog_request_trims() {
        assert_eq!(CatalogRequest::new("  Anagrama ").unwrap().name, "Anagrama");
        assert!(CatalogRequest::new(" ").is_err());
    }

    #[test]
    fn test_catalog_entry_constants() {
        assert_eq!(Author::COLLECTION, "authors");
        assert_eq!(Genre::NOUN, "genre");
        assert_eq!(Publisher::COLLECTION, "publishers");
    }
}
