//! In-memory cart for an in-progress sale.
//!
//! Lines are unique by product: adding a product that is already in the cart
//! adds to its quantity. Each addition is checked against the stock the
//! client knows about; the server stays authoritative. There is no way to
//! take a line back out short of discarding the whole cart.

use bookshop_core::{Price, ProductId, UserId};
use thiserror::Error;

use crate::catalog::Product;
use crate::sales::{SaleItem, SaleRequest};

/// Why an addition was refused. The cart is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("quantity must be greater than 0, got {0}")]
    InvalidQuantity(i64),

    #[error("only {stock} of product {product} in stock, requested {requested}")]
    InsufficientStock {
        product: ProductId,
        requested: i64,
        stock: i32,
    },

    #[error("product has no id")]
    MissingProductId,
}

/// One aggregated product line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Lines of a sale being built, in the order products were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of `product`.
    ///
    /// # Errors
    ///
    /// Rejects a quantity that is not positive or exceeds `product.stock`,
    /// and products without an id. The cart is unchanged on error.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> Result<(), CartError> {
        let product_id = product.id.ok_or(CartError::MissingProductId)?;
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        if quantity > i64::from(product.stock) {
            return Err(CartError::InsufficientStock {
                product: product_id,
                requested: quantity,
                stock: product.stock,
            });
        }
        let quantity = u32::try_from(quantity).map_err(|_| CartError::InsufficientStock {
            product: product_id,
            requested: quantity,
            stock: product.stock,
        })?;

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
        Ok(())
    }

    /// Sum of `price * quantity` over all lines; unknown products count as 0.
    pub fn total(&self, price_lookup: impl Fn(ProductId) -> Option<Price>) -> Price {
        self.lines
            .iter()
            .map(|line| {
                price_lookup(line.product_id)
                    .unwrap_or(Price::ZERO)
                    .times(line.quantity)
            })
            .sum()
    }

    /// [`Cart::total`] with prices taken from a product listing.
    #[must_use]
    pub fn total_from(&self, products: &[Product]) -> Price {
        self.total(|id| {
            products
                .iter()
                .find(|p| p.id == Some(id))
                .map(|p| p.price)
        })
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of `product_id` currently in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Turn the cart into a sale for `customer`, consuming it.
    #[must_use]
    pub fn into_sale_request(self, customer: UserId) -> SaleRequest {
        SaleRequest {
            user_id: customer,
            details: self
                .lines
                .into_iter()
                .map(|line| SaleItem {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32, stock: i32, cents: i64) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Book {id}"),
            "stock": stock,
            "price": Price::from_cents(cents),
        }))
        .unwrap()
    }

    #[test]
    fn test_same_product_twice_merges() {
        let book = product(1, 10, 1_000);
        let mut cart = Cart::new();
        cart.add_product(&book, 2).unwrap();
        cart.add_product(&book, 3).unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 5);
    }

    #[test]
    fn test_over_stock_rejected_and_cart_unchanged() {
        let book = product(1, 4, 1_000);
        let mut cart = Cart::new();
        cart.add_product(&book, 1).unwrap();
        let before = cart.clone();

        let err = cart.add_product(&book, 5).unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { stock: 4, .. }));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let book = product(1, 4, 1_000);
        let mut cart = Cart::new();
        assert_eq!(
            cart.add_product(&book, 0),
            Err(CartError::InvalidQuantity(0))
        );
        assert_eq!(
            cart.add_product(&book, -2),
            Err(CartError::InvalidQuantity(-2))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_product_without_id_rejected() {
        let mut book = product(1, 4, 1_000);
        book.id = None;
        let mut cart = Cart::new();
        assert_eq!(cart.add_product(&book, 1), Err(CartError::MissingProductId));
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        assert_eq!(Cart::new().total(|_| Some(Price::from_cents(500))), Price::ZERO);
    }

    #[test]
    fn test_total_uses_lookup_and_zero_for_unknown() {
        let a = product(1, 10, 1_250);
        let b = product(2, 10, 300);
        let mut cart = Cart::new();
        cart.add_product(&a, 2).unwrap();
        cart.add_product(&b, 1).unwrap();

        assert_eq!(cart.total_from(&[a.clone(), b]), Price::from_cents(2_800));
        assert_eq!(cart.total_from(&[a]), Price::from_cents(2_500));
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = Cart::new();
        cart.add_product(&product(7, 5, 100), 1).unwrap();
        cart.add_product(&product(3, 5, 100), 1).unwrap();
        cart.add_product(&product(7, 5, 100), 1).unwrap();

        let ids: Vec<_> = cart.lines().iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![ProductId::new(7), ProductId::new(3)]);
    }

    #[test]
    fn test_into_sale_request() {
        let mut cart = Cart::new();
        cart.add_product(&product(4, 9, 100), 3).unwrap();
        let request = cart.into_sale_request(UserId::new("u1"));

        assert_eq!(request.user_id, UserId::new("u1"));
        assert_eq!(
            request.details,
            vec![SaleItem {
                product_id: ProductId::new(4),
                quantity: 3
            }]
        );
        assert!(request.validate().is_ok());
    }
}
