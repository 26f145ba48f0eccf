//! Sales commands.

use std::str::FromStr;

use bookshop_client::Cart;
use bookshop_client::catalog::Product;
use bookshop_client::sales::Sale;
use bookshop_core::{ProductId, Route, UserId};

use super::Context;
use crate::error::CliError;

/// A `PRODUCT:QUANTITY` pair from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemArg {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl FromStr for ItemArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (product, quantity) = s
            .split_once(':')
            .ok_or_else(|| format!("expected PRODUCT:QUANTITY, got '{s}'"))?;
        let product_id = product
            .parse::<ProductId>()
            .map_err(|e| format!("invalid product id '{product}': {e}"))?;
        let quantity = quantity
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid quantity '{quantity}': {e}"))?;
        Ok(Self {
            product_id,
            quantity,
        })
    }
}

pub async fn list(ctx: &Context) -> Result<(), CliError> {
    let session = ctx.require(Route::Sales)?;
    let sales = ctx.sales(Some(&session))?.sales().await?;

    if sales.is_empty() {
        tracing::info!("No sales recorded");
        return Ok(());
    }
    for sale in &sales {
        print_sale(sale);
    }
    Ok(())
}

/// Build a cart from `items`, checked against current stock, and submit it.
///
/// Items the cart refuses are reported and left out; the sale goes ahead
/// with whatever was accepted.
pub async fn create(ctx: &Context, customer: UserId, items: &[ItemArg]) -> Result<(), CliError> {
    let session = ctx.require_editor(Route::Sales)?;
    if customer.as_str().trim().is_empty() {
        return Err(CliError::InvalidInput(
            "Please select a customer".to_string(),
        ));
    }
    if items.is_empty() {
        return Err(CliError::InvalidInput(
            "Add at least one product to the sale".to_string(),
        ));
    }

    let products = ctx.catalog(&session)?.products().await?;
    let cart = build_cart(&products, items);
    if cart.is_empty() {
        return Err(CliError::InvalidInput(
            "Add at least one product to the sale".to_string(),
        ));
    }

    let total = cart.total_from(&products);
    let created = ctx
        .sales(Some(&session))?
        .create_sale(&cart.into_sale_request(customer))
        .await?;

    if created.message.is_empty() {
        tracing::info!("Sale created");
    } else {
        tracing::info!("{}", created.message);
    }
    match created.sale {
        Some(sale) => print_sale(&sale),
        None => tracing::info!("Estimated total: {total}"),
    }
    Ok(())
}

fn build_cart(products: &[Product], items: &[ItemArg]) -> Cart {
    let mut cart = Cart::new();
    for item in items {
        let Some(product) = products.iter().find(|p| p.id == Some(item.product_id)) else {
            tracing::warn!("Product {} not found, skipped", item.product_id);
            continue;
        };
        match cart.add_product(product, item.quantity) {
            Ok(()) => tracing::info!(
                "Added {} x {} (running total {})",
                item.quantity,
                product.title,
                cart.total_from(products)
            ),
            Err(e) => tracing::warn!("Skipped {}: {e}", product.title),
        }
    }
    cart
}

fn print_sale(sale: &Sale) {
    let id = sale.id.as_ref().map_or("-", |id| id.as_str());
    let customer = sale.user_id.as_ref().map_or("-", |c| c.label());
    let date = sale
        .date
        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());
    tracing::info!("Sale {id}  {date}  customer {customer}  total {}", sale.total);
    for detail in &sale.details {
        tracing::info!(
            "    product {:>5}  x{:<4} @ {:>10}  = {}",
            detail.product_id,
            detail.quantity,
            detail.unit_price.to_string(),
            detail.subtotal()
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_item_arg_parses() {
        let item: ItemArg = "4:2".parse().unwrap();
        assert_eq!(item.product_id, ProductId::new(4));
        assert_eq!(item.quantity, 2);
    }

    fn product(id: i32, stock: i32, cents: i64) -> Product {
        Product {
            id: Some(ProductId::new(id)),
            title: format!("Book {id}"),
            stock,
            price: bookshop_core::Price::from_cents(cents),
            ..Product::default()
        }
    }

    #[test]
    fn test_refused_items_are_skipped() {
        let products = vec![product(1, 5, 1_000), product(2, 1, 2_000)];
        let items: Vec<ItemArg> = ["1:2", "2:3", "9:1", "1:0", "1:1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();

        let cart = build_cart(&products, &items);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 3);
        assert_eq!(cart.quantity_of(ProductId::new(2)), 0);
    }

    #[test]
    fn test_item_arg_rejects_garbage() {
        assert!("4".parse::<ItemArg>().is_err());
        assert!("x:2".parse::<ItemArg>().is_err());
        assert!("4:many".parse::<ItemArg>().is_err());
    }
}
