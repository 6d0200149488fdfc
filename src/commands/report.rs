//! Sales, financial and inventory reports. Administrators only.

use crate::commands::{require_admin, Login};
use crate::format::Formatter;
use crate::reports::{read_report, write_financial_report, write_sales_report};
use crate::shop::Shop;
use anyhow::Result;
use std::path::Path;

pub struct ReportCommand<'a> {
    shop: &'a Shop,
    formatter: Formatter,
}

impl<'a> ReportCommand<'a> {
    pub fn new(shop: &'a Shop, formatter: Formatter) -> Self {
        Self { shop, formatter }
    }

    /// Sales in `[start, end]`; also written under `save_dir` when given.
    pub fn sales(&self, login: &Login, start: &str, end: &str, save_dir: Option<&Path>) -> Result<String> {
        require_admin(self.shop, login)?;
        let report = self.shop.reports().sales_report(start, end);

        let mut output = self.formatter.format_sales_report(&report);
        if let Some(dir) = save_dir {
            let path = write_sales_report(dir, &report, self.shop.clock(), self.shop.log())?;
            output.push_str(&format!("\n\nSaved to {}", path.display()));
        }
        Ok(output)
    }

    pub fn financial(&self, login: &Login, start: &str, end: &str, save_dir: Option<&Path>) -> Result<String> {
        require_admin(self.shop, login)?;
        let report = self.shop.reports().financial_report(start, end);

        let mut output = self.formatter.format_financial_report(&report);
        if let Some(dir) = save_dir {
            let path = write_financial_report(dir, &report, self.shop.clock(), self.shop.log())?;
            output.push_str(&format!("\n\nSaved to {}", path.display()));
        }
        Ok(output)
    }

    pub fn inventory(&self, login: &Login, threshold: Option<u32>) -> Result<String> {
        require_admin(self.shop, login)?;
        let threshold = threshold.unwrap_or_else(|| self.shop.low_stock_threshold());
        let report = self.shop.reports().inventory_report(threshold);
        Ok(self.formatter.format_inventory_report(&report))
    }

    /// Prints a previously saved report.
    pub fn show(&self, login: &Login, path: &Path) -> Result<String> {
        require_admin(self.shop, login)?;
        read_report(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{admin, customer, TestShop};
    use crate::config::OutputFormat;
    use crate::models::SaleItem;

    fn with_sales() -> TestShop {
        let mut t = TestShop::new();
        let hades = t.add_game("Hades", 25.0, "Roguelike", 10);
        let celeste = t.add_game("Celeste", 10.0, "Platformer", 10);
        t.shop
            .purchase(t.customer_id, &[SaleItem::new(hades, 1), SaleItem::new(celeste, 3)])
            .unwrap();
        t.shop.purchase(t.customer_id, &[SaleItem::new(hades, 1)]).unwrap();
        t
    }

    #[test]
    fn test_sales_report() {
        let t = with_sales();
        let cmd = ReportCommand::new(&t.shop, Formatter::new(OutputFormat::Table));

        assert!(cmd.sales(&customer(), "01.06.2024", "30.06.2024", None).is_err());
        let output = cmd.sales(&admin(), "01.06.2024", "30.06.2024", None).unwrap();
        assert!(output.contains("Total revenue: 80.00"));
        assert!(output.contains("Number of sales: 2"));
        assert!(output.contains("1. Celeste - 3 pcs."));
        assert!(output.contains("2. Hades - 2 pcs."));

        let empty = cmd.sales(&admin(), "01.01.2023", "31.01.2023", None).unwrap();
        assert!(empty.contains("Number of sales: 0"));
    }

    #[test]
    fn test_financial_report_json() {
        let t = with_sales();
        let cmd = ReportCommand::new(&t.shop, Formatter::new(OutputFormat::Json));

        let output = cmd.financial(&admin(), "01.06.2024", "30.06.2024", None).unwrap();
        assert!(output.contains("\"total_transactions\": 2"));
        assert!(output.contains("\"average_transaction_value\": 40.0"));
    }

    #[test]
    fn test_save_and_show() {
        let t = with_sales();
        let dir = t.dir.path().join("reports");
        std::fs::create_dir_all(&dir).unwrap();
        let cmd = ReportCommand::new(&t.shop, Formatter::new(OutputFormat::Table));

        let output = cmd
            .financial(&admin(), "01.06.2024", "30.06.2024", Some(&dir))
            .unwrap();
        let saved = dir.join("financial_report_15.06.2024 12-00-00.txt");
        assert!(output.contains("Saved to"));
        assert!(saved.exists());

        let text = cmd.show(&admin(), &saved).unwrap();
        assert!(text.starts_with("FINANCIAL REPORT"));
        assert!(cmd.show(&admin(), &dir.join("missing.txt")).is_err());
    }

    #[test]
    fn test_inventory_threshold() {
        let t = with_sales();
        let cmd = ReportCommand::new(&t.shop, Formatter::new(OutputFormat::Table));

        let output = cmd.inventory(&admin(), None).unwrap();
        assert!(output.contains("Low stock threshold: 5"));
        assert!(output.contains("Products with low stock: 0"));

        let output = cmd.inventory(&admin(), Some(9)).unwrap();
        assert!(output.contains("Products with low stock: 2"));
    }
}
