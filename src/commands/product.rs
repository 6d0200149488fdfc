//! Catalog maintenance. Administrators only.

use crate::commands::{require_admin, Login};
use crate::format::Formatter;
use crate::models::ProductDraft;
use crate::shop::Shop;
use anyhow::{anyhow, Context, Result};
use tracing::info;

/// Fields to change on an existing product. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub age_rating: Option<i32>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ProductChanges {
    fn apply(self, draft: &mut ProductDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(price) = self.price {
            draft.base_price = price;
        }
        if let Some(developer) = self.developer {
            draft.developer = developer;
        }
        if let Some(publisher) = self.publisher {
            draft.publisher = publisher;
        }
        if let Some(genre) = self.genre {
            draft.genre = genre;
        }
        if let Some(age) = self.age_rating {
            draft.age_rating = age;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(tags) = self.tags {
            draft.tags = tags;
        }
    }
}

pub struct ProductCommand<'a> {
    shop: &'a mut Shop,
    formatter: Formatter,
}

impl<'a> ProductCommand<'a> {
    pub fn new(shop: &'a mut Shop, formatter: Formatter) -> Self {
        Self { shop, formatter }
    }

    fn validate(draft: &ProductDraft) -> Result<()> {
        if draft.title.trim().is_empty() {
            anyhow::bail!("Title must not be empty");
        }
        if !draft.base_price.is_finite() || draft.base_price < 0.0 {
            anyhow::bail!("Invalid price: {}", draft.base_price);
        }
        if !(0..=21).contains(&draft.age_rating) {
            anyhow::bail!("Age rating must be between 0 and 21, got {}", draft.age_rating);
        }
        Ok(())
    }

    /// Adds the genre and tags to the shared name pools.
    fn remember_names(&self, draft: &ProductDraft) {
        let vocabulary = self.shop.vocabulary();
        vocabulary.add_genre(&draft.genre);
        for tag in &draft.tags {
            vocabulary.add_tag(tag);
        }
    }

    pub fn add(&mut self, login: &Login, mut draft: ProductDraft) -> Result<String> {
        require_admin(self.shop, login)?;
        Self::validate(&draft)?;
        if draft.release_date.is_empty() {
            draft.release_date = self.shop.clock().now_string();
        }

        let id = self.shop.store_mut().add_product(&draft)?;
        self.remember_names(&draft);
        info!("Added product {} ({})", id, draft.title);

        let store = self.shop.store();
        let product = store
            .product(id)
            .ok_or_else(|| anyhow!("Product not found after insert: ID {}", id))?;
        Ok(self.formatter.format_product(product, store))
    }

    pub fn update(&mut self, login: &Login, id: i32, changes: ProductChanges) -> Result<String> {
        require_admin(self.shop, login)?;
        let mut draft = self
            .shop
            .store()
            .product(id)
            .map(|p| p.to_draft())
            .ok_or_else(|| anyhow!("Product not found: ID {}", id))?;
        changes.apply(&mut draft);
        Self::validate(&draft)?;

        self.shop.store_mut().update_product(id, &draft)?;
        self.remember_names(&draft);

        let store = self.shop.store();
        let product = store
            .product(id)
            .ok_or_else(|| anyhow!("Product not found: ID {}", id))?;
        Ok(self.formatter.format_product(product, store))
    }

    pub fn delete(&mut self, login: &Login, id: i32) -> Result<String> {
        require_admin(self.shop, login)?;
        if !self.shop.delete_product(id)? {
            anyhow::bail!("Product not found: ID {}", id);
        }
        Ok(format!("Product {} deleted.", id))
    }

    pub fn restock(&mut self, login: &Login, id: i32, count: i32) -> Result<String> {
        require_admin(self.shop, login)?;
        let restock = self
            .shop
            .restock(id, count)
            .with_context(|| format!("Failed to add keys to product {}", id))?;

        let mut message = format!(
            "{}: {} -> {} keys",
            restock.title, restock.previous, restock.current
        );
        if restock.current < self.shop.low_stock_threshold() {
            message.push_str(" (low stock)");
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{admin, customer, TestShop};
    use crate::config::OutputFormat;

    fn draft(title: &str) -> ProductDraft {
        ProductDraft {
            title: title.to_string(),
            base_price: 30.0,
            genre: "Strategy".to_string(),
            tags: vec!["Turn-based".to_string()],
            activation_keys: 4,
            ..ProductDraft::default()
        }
    }

    #[test]
    fn test_add_requires_admin() {
        let mut t = TestShop::new();
        let mut cmd = ProductCommand::new(&mut t.shop, Formatter::new(OutputFormat::Table));

        assert!(cmd.add(&customer(), draft("XCOM")).is_err());
        let output = cmd.add(&admin(), draft("XCOM")).unwrap();
        assert!(output.contains("Title:     XCOM"));
        assert!(output.contains("Released:  15.06.2024 12:00:00"));

        assert_eq!(t.shop.vocabulary().genres(), vec!["Strategy"]);
        assert_eq!(t.shop.vocabulary().tags(), vec!["Turn-based"]);
    }

    #[test]
    fn test_add_validates() {
        let mut t = TestShop::new();
        let mut cmd = ProductCommand::new(&mut t.shop, Formatter::new(OutputFormat::Table));

        assert!(cmd.add(&admin(), draft("  ")).is_err());
        let mut bad = draft("XCOM");
        bad.age_rating = 30;
        assert!(cmd.add(&admin(), bad).is_err());
        assert!(t.shop.store().products().is_empty());
    }

    #[test]
    fn test_update_keeps_unchanged_fields() {
        let mut t = TestShop::new();
        let id = t.add_game("XCOM", 30.0, "Strategy", 4);
        let mut cmd = ProductCommand::new(&mut t.shop, Formatter::new(OutputFormat::Table));

        let changes = ProductChanges { price: Some(12.5), ..ProductChanges::default() };
        cmd.update(&admin(), id, changes).unwrap();
        assert!(cmd.update(&admin(), 99, ProductChanges::default()).is_err());

        let product = t.shop.store().product(id).unwrap();
        assert_eq!(product.base_price, 12.5);
        assert_eq!(product.title, "XCOM");
        assert_eq!(product.activation_keys(), 4);
    }

    #[test]
    fn test_delete_and_restock() {
        let mut t = TestShop::new();
        let id = t.add_game("XCOM", 30.0, "Strategy", 0);
        let mut cmd = ProductCommand::new(&mut t.shop, Formatter::new(OutputFormat::Table));

        assert_eq!(cmd.restock(&admin(), id, 3).unwrap(), "XCOM: 0 -> 3 keys (low stock)");
        assert_eq!(cmd.restock(&admin(), id, 10).unwrap(), "XCOM: 3 -> 13 keys");
        let err = cmd.restock(&admin(), id, -1).unwrap_err();
        assert!(format!("{:#}", err).contains("must not be negative"));

        assert_eq!(cmd.delete(&admin(), id).unwrap(), format!("Product {} deleted.", id));
        assert!(cmd.delete(&admin(), id).is_err());
    }
}
