//! Purchases, purchase history, wishlists and recommendations.
//! Approved customers only.

use crate::commands::{require_customer, Login};
use crate::format::Formatter;
use crate::models::{Product, SaleItem};
use crate::shop::Shop;
use anyhow::{anyhow, Context, Result};
use tracing::info;

/// Parses `ID` or `ID:QTY` into a sale line.
pub fn parse_item(text: &str) -> Result<SaleItem> {
    let (id, quantity) = match text.split_once(':') {
        Some((id, quantity)) => (id, quantity),
        None => (text, "1"),
    };
    let product_id = id
        .trim()
        .parse()
        .with_context(|| format!("Invalid product id in '{}'", text))?;
    let quantity = quantity
        .trim()
        .parse()
        .with_context(|| format!("Invalid quantity in '{}'", text))?;
    Ok(SaleItem::new(product_id, quantity))
}

pub struct ShoppingCommand<'a> {
    shop: &'a mut Shop,
    formatter: Formatter,
}

impl<'a> ShoppingCommand<'a> {
    pub fn new(shop: &'a mut Shop, formatter: Formatter) -> Self {
        Self { shop, formatter }
    }

    pub fn buy(&mut self, login: &Login, items: &[String]) -> Result<String> {
        let session = require_customer(self.shop, login)?;
        if items.is_empty() {
            anyhow::bail!("Nothing to buy: give at least one ID or ID:QTY");
        }
        let items = items
            .iter()
            .map(|item| parse_item(item))
            .collect::<Result<Vec<_>>>()?;

        let sale = self
            .shop
            .purchase(session.user_id, &items)
            .context("Purchase failed")?;
        info!("Sale {} completed for {}", sale.sale_id, session.username);

        let store = self.shop.store();
        Ok(self
            .formatter
            .format_sales(&[&sale], |id| store.product(id).map(|p| p.title.clone())))
    }

    pub fn history(&self, login: &Login) -> Result<String> {
        let session = require_customer(self.shop, login)?;
        let store = self.shop.store();
        let sales = store.sales_for_customer(session.user_id);
        Ok(self
            .formatter
            .format_sales(&sales, |id| store.product(id).map(|p| p.title.clone())))
    }

    pub fn wishlist(&self, login: &Login) -> Result<String> {
        let session = require_customer(self.shop, login)?;
        let products = self.shop.wishlist_products(session.user_id);
        Ok(self.formatter.format_products(&products, self.shop.store()))
    }

    pub fn wishlist_add(&mut self, login: &Login, product_id: i32) -> Result<String> {
        let session = require_customer(self.shop, login)?;
        if !self.shop.add_to_wishlist(session.user_id, product_id)? {
            return Ok(format!("Product {} is already on your wishlist.", product_id));
        }
        Ok(format!("Product {} added to your wishlist.", product_id))
    }

    pub fn wishlist_remove(&mut self, login: &Login, product_id: i32) -> Result<String> {
        let session = require_customer(self.shop, login)?;
        if !self.shop.wishlist_mut().remove(session.user_id, product_id)? {
            anyhow::bail!("Product {} is not on your wishlist", product_id);
        }
        Ok(format!("Product {} removed from your wishlist.", product_id))
    }

    pub fn wishlist_clear(&mut self, login: &Login) -> Result<String> {
        let session = require_customer(self.shop, login)?;
        let removed = self.shop.wishlist_mut().clear_for_customer(session.user_id)?;
        Ok(format!("Removed {} item(s) from your wishlist.", removed))
    }

    /// Games like the last purchase, or the best current deals when there
    /// is nothing to go on.
    pub fn recommend(&self, login: &Login) -> Result<String> {
        let session = require_customer(self.shop, login)?;
        let customer = self
            .shop
            .users()
            .get(session.user_id)
            .ok_or_else(|| anyhow!("User not found: ID {}", session.user_id))?;

        let recommender = self.shop.recommender();
        let mut products: Vec<&Product> = recommender.similar_games(customer);
        if products.is_empty() {
            products = recommender.popular_products();
        }
        Ok(self.formatter.format_products(&products, self.shop.store()))
    }
}
