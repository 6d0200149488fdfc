//! Discount management. Administrators only.

use crate::clock::parse_date_time;
use crate::commands::{require_admin, Login};
use crate::format::Formatter;
use crate::models::{Discount, DiscountType};
use crate::shop::Shop;
use anyhow::{anyhow, Result};

/// Discount fields as typed on the command line.
#[derive(Debug, Clone)]
pub struct DiscountInput {
    pub kind: String,
    pub targets: Vec<String>,
    pub percentage: f64,
    pub start: String,
    pub end: String,
}

impl DiscountInput {
    fn into_discount(self) -> Result<Discount> {
        let kind: DiscountType = self.kind.parse().map_err(|e: String| anyhow!(e))?;
        if self.targets.is_empty() {
            anyhow::bail!("A discount needs at least one target");
        }
        for date in [&self.start, &self.end] {
            if parse_date_time(date).is_none() {
                anyhow::bail!("Invalid date: {} (expected DD.MM.YYYY [HH:MM:SS])", date);
            }
        }
        Ok(Discount::new(kind, self.targets, self.percentage, self.start, self.end))
    }
}

pub struct DiscountCommand<'a> {
    shop: &'a mut Shop,
    formatter: Formatter,
}

impl<'a> DiscountCommand<'a> {
    pub fn new(shop: &'a mut Shop, formatter: Formatter) -> Self {
        Self { shop, formatter }
    }

    pub fn list(&self, login: &Login, active_only: bool) -> Result<String> {
        require_admin(self.shop, login)?;
        let store = self.shop.store();
        if active_only {
            let active: Vec<Discount> = store.active_discounts().into_iter().cloned().collect();
            return Ok(self.formatter.format_discounts(&active));
        }
        Ok(self.formatter.format_discounts(store.discounts()))
    }

    pub fn add(&mut self, login: &Login, input: DiscountInput) -> Result<String> {
        require_admin(self.shop, login)?;
        let discount = input.into_discount()?;
        let percentage = discount.percentage;
        let notified = self.shop.add_discount(discount)?;
        Ok(format!(
            "Discount of {}% added; {} wishlist notification(s) sent.",
            percentage, notified
        ))
    }

    pub fn update(&mut self, login: &Login, index: usize, input: DiscountInput) -> Result<String> {
        require_admin(self.shop, login)?;
        let discount = input.into_discount()?;
        self.shop.store_mut().update_discount(index, discount)?;
        Ok(format!("Discount {} updated.", index))
    }

    pub fn delete(&mut self, login: &Login, index: usize) -> Result<String> {
        require_admin(self.shop, login)?;
        let removed = self.shop.store_mut().delete_discount(index)?;
        Ok(format!(
            "Discount {} deleted ({} {}%).",
            index, removed.kind, removed.percentage
        ))
    }
}
