//! Sales, financial and inventory reports.

use crate::activity_log::ActivityLog;
use crate::clock::{Clock, DateWindow};
use crate::models::Sale;
use crate::store::Store;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Default number of best sellers in a sales report.
pub const DEFAULT_TOP_PRODUCTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub product_id: i32,
    /// Empty if the product has since been deleted
    pub title: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub period: String,
    /// Sum of final amounts
    pub total_revenue: f64,
    pub total_sales: usize,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialReport {
    pub period: String,
    /// Sum of sale totals before the extra discount
    pub gross_revenue: f64,
    /// Sum of final amounts
    pub total_revenue: f64,
    pub total_discounts: f64,
    pub total_transactions: usize,
    pub average_transaction_value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryLine {
    pub product_id: i32,
    pub title: String,
    pub keys: u32,
    pub low_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryReport {
    pub threshold: u32,
    pub lines: Vec<InventoryLine>,
    pub low_stock_count: usize,
}

impl InventoryReport {
    pub fn low_stock(&self) -> impl Iterator<Item = &InventoryLine> {
        self.lines.iter().filter(|line| line.low_stock)
    }
}

/// Read-side aggregations over the store's sales and catalog.
pub struct ReportGenerator<'a> {
    store: &'a Store,
    top_limit: usize,
    log: ActivityLog,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(store: &'a Store, log: ActivityLog) -> Self {
        Self { store, top_limit: DEFAULT_TOP_PRODUCTS, log }
    }

    pub fn with_top_limit(mut self, limit: usize) -> Self {
        self.top_limit = limit;
        self
    }

    fn sales_in<'w>(&self, window: &'w DateWindow) -> impl Iterator<Item = &'a Sale> + 'w
    where
        'a: 'w,
    {
        let sales: &'a [Sale] = self.store.sales();
        sales.iter().filter(move |s| window.contains(&s.sale_date_time))
    }

    /// Revenue, sale count and best sellers for sales within `[start, end]`.
    pub fn sales_report(&self, start: &str, end: &str) -> SalesReport {
        let window = DateWindow::new(start, end);
        let mut total_revenue = 0.0;
        let mut total_sales = 0;
        let mut tally: Vec<(i32, i64)> = Vec::new();

        for sale in self.sales_in(&window) {
            total_revenue += sale.final_amount();
            total_sales += 1;
            for item in &sale.items {
                match tally.iter_mut().find(|(id, _)| *id == item.product_id) {
                    Some((_, quantity)) => *quantity += i64::from(item.quantity),
                    None => tally.push((item.product_id, i64::from(item.quantity))),
                }
            }
        }

        tally.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        tally.truncate(self.top_limit);

        let top_products = tally
            .into_iter()
            .map(|(product_id, quantity)| TopProduct {
                product_id,
                title: self
                    .store
                    .product(product_id)
                    .map(|p| p.title.clone())
                    .unwrap_or_default(),
                quantity,
            })
            .collect();

        let report = SalesReport { period: window.label(), total_revenue, total_sales, top_products };
        self.log.info(&format!(
            "Sales report generated: {}, revenue: {:.2}",
            report.period, report.total_revenue
        ));
        report
    }

    /// Revenue and discount totals for sales within `[start, end]`.
    pub fn financial_report(&self, start: &str, end: &str) -> FinancialReport {
        let window = DateWindow::new(start, end);
        let mut gross_revenue = 0.0;
        let mut total_revenue = 0.0;
        let mut total_discounts = 0.0;
        let mut total_transactions = 0;

        for sale in self.sales_in(&window) {
            gross_revenue += sale.total_amount;
            total_revenue += sale.final_amount();
            total_discounts += sale.discount_amount;
            total_transactions += 1;
        }

        let average_transaction_value = if total_transactions > 0 {
            total_revenue / total_transactions as f64
        } else {
            0.0
        };

        let report = FinancialReport {
            period: window.label(),
            gross_revenue,
            total_revenue,
            total_discounts,
            total_transactions,
            average_transaction_value,
        };
        self.log.info(&format!(
            "Financial report generated: {}, revenue: {:.2}",
            report.period, report.total_revenue
        ));
        report
    }

    /// Key counts for every product, flagging those below `threshold`.
    pub fn inventory_report(&self, threshold: u32) -> InventoryReport {
        let lines: Vec<InventoryLine> = self
            .store
            .products()
            .iter()
            .map(|p| InventoryLine {
                product_id: p.id,
                title: p.title.clone(),
                keys: p.activation_keys(),
                low_stock: p.activation_keys() < threshold,
            })
            .collect();
        let low_stock_count = lines.iter().filter(|l| l.low_stock).count();

        InventoryReport { threshold, lines, low_stock_count }
    }
}

/// Plain-text rendering of a sales report, as saved to disk.
pub fn render_sales_report(report: &SalesReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SALES REPORT");
    let _ = writeln!(out, "Period: {}", report.period);
    let _ = writeln!(out, "Total revenue: {:.2}", report.total_revenue);
    let _ = writeln!(out, "Number of sales: {}", report.total_sales);
    let _ = writeln!(out);
    let _ = writeln!(out, "TOP PRODUCTS:");
    for (rank, top) in report.top_products.iter().enumerate() {
        let title = if top.title.is_empty() {
            format!("Product #{}", top.product_id)
        } else {
            top.title.clone()
        };
        let _ = writeln!(out, "{}. {} - {} pcs.", rank + 1, title, top.quantity);
    }
    out
}

/// Plain-text rendering of a financial report, as saved to disk.
pub fn render_financial_report(report: &FinancialReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "FINANCIAL REPORT");
    let _ = writeln!(out, "Period: {}", report.period);
    let _ = writeln!(out, "Gross revenue: {:.2}", report.gross_revenue);
    let _ = writeln!(out, "Total revenue: {:.2}", report.total_revenue);
    let _ = writeln!(out, "Total discounts: {:.2}", report.total_discounts);
    let _ = writeln!(out, "Number of transactions: {}", report.total_transactions);
    let _ = writeln!(out, "Average transaction: {:.2}", report.average_transaction_value);
    out
}

/// `<prefix>_<timestamp>.txt` with `:` replaced so the name is portable.
pub fn report_file_name(prefix: &str, clock: &dyn Clock) -> String {
    format!("{}_{}.txt", prefix, clock.now_string().replace(':', "-"))
}

fn write_report(dir: &Path, name: String, content: &str, log: &ActivityLog) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    log.info(&format!("Report saved to: {}", path.display()));
    Ok(path)
}

/// Saves a sales report under `dir` and returns its path.
pub fn write_sales_report(
    dir: &Path,
    report: &SalesReport,
    clock: &dyn Clock,
    log: &ActivityLog,
) -> Result<PathBuf> {
    let name = report_file_name("sales_report", clock);
    write_report(dir, name, &render_sales_report(report), log)
}

/// Saves a financial report under `dir` and returns its path.
pub fn write_financial_report(
    dir: &Path,
    report: &FinancialReport,
    clock: &dyn Clock,
    log: &ActivityLog,
) -> Result<PathBuf> {
    let name = report_file_name("financial_report", clock);
    write_report(dir, name, &render_financial_report(report), log)
}

/// Reads a saved report back.
pub fn read_report(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report: {}", path.display()))
}
