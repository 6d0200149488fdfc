//! Output formatting (table, JSON, markdown, CSV).
//!
//! Products support every format. Sales, discounts, users, notifications
//! and reports render as JSON or as a table; markdown and CSV fall back to
//! the table layout for them.

use crate::config::OutputFormat;
use crate::models::{Discount, Notification, Product, Sale, User};
use crate::reports::{
    render_financial_report, render_sales_report, FinancialReport, InventoryReport, SalesReport,
};
use crate::store::Pricing;
use serde::Serialize;

/// A product with its current price, as shown to shoppers.
#[derive(Serialize)]
struct PricedProduct<'a> {
    #[serde(flatten)]
    product: &'a Product,
    final_price: f64,
    discount_percent: f64,
}

impl<'a> PricedProduct<'a> {
    fn new(product: &'a Product, pricing: &dyn Pricing) -> Self {
        Self {
            product,
            final_price: pricing.discounted_price(product),
            discount_percent: pricing.best_discount_percent(product),
        }
    }
}

#[derive(Serialize)]
struct IndexedDiscount<'a> {
    index: usize,
    #[serde(flatten)]
    discount: &'a Discount,
}

#[derive(Serialize)]
struct SaleView<'a> {
    #[serde(flatten)]
    sale: &'a Sale,
    final_amount: f64,
}

/// Formats store data for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Formats a single product.
    pub fn format_product(&self, product: &Product, pricing: &dyn Pricing) -> String {
        match self.format {
            OutputFormat::Json => to_json(&PricedProduct::new(product, pricing), "{}"),
            OutputFormat::Table => self.table_single(product, pricing),
            OutputFormat::Markdown => self.markdown_single(product, pricing),
            OutputFormat::Csv => self.csv_products(&[product], pricing),
        }
    }

    /// Formats multiple products.
    pub fn format_products(&self, products: &[&Product], pricing: &dyn Pricing) -> String {
        if products.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                _ => "No products found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                let priced: Vec<PricedProduct> =
                    products.iter().map(|p| PricedProduct::new(p, pricing)).collect();
                to_json(&priced, "[]")
            }
            OutputFormat::Table => self.table_products(products, pricing),
            OutputFormat::Markdown => self.markdown_products(products, pricing),
            OutputFormat::Csv => self.csv_products(products, pricing),
        }
    }

    // Product tables

    fn table_single(&self, product: &Product, pricing: &dyn Pricing) -> String {
        let mut lines = Vec::new();

        lines.push(format!("ID:        {}", product.id));
        lines.push(format!("Title:     {}", product.title));
        lines.push(format!("Price:     {}", price_label(product, pricing)));
        lines.push(format!("Developer: {}", product.developer));
        lines.push(format!("Publisher: {}", product.publisher));
        lines.push(format!("Genre:     {}", product.genre));
        lines.push(format!("Age:       {}+", product.age_rating));
        lines.push(format!("Released:  {}", product.release_date));
        lines.push(format!("Rating:    {:.1}/5", product.average_rating));
        if !product.tags.is_empty() {
            lines.push(format!("Tags:      {}", product.tags.join(", ")));
        }
        lines.push(format!("Keys:      {}", stock_label(product)));
        if !product.description.is_empty() {
            lines.push(String::new());
            lines.push(product.description.clone());
        }

        lines.join("\n")
    }

    fn table_products(&self, products: &[&Product], pricing: &dyn Pricing) -> String {
        let id_width = 5;
        let price_width = 10;
        let keys_width = 6;
        let rating_width = 6;
        let genre_width = 14;
        let title_width = 40;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<id_width$}  {:<price_width$}  {:<keys_width$}  {:<rating_width$}  {:<genre_width$}  {}",
            "ID", "Price", "Keys", "Rating", "Genre", "Title"
        ));
        lines.push(format!(
            "{:-<id_width$}  {:-<price_width$}  {:-<keys_width$}  {:-<rating_width$}  {:-<genre_width$}  {:-<title_width$}",
            "", "", "", "", "", ""
        ));

        for product in products {
            let final_price = pricing.discounted_price(product);
            let price_str = if final_price < product.base_price {
                format!("{:.2}*", final_price)
            } else {
                format!("{:.2}", final_price)
            };

            lines.push(format!(
                "{:<id_width$}  {:>price_width$}  {:>keys_width$}  {:>rating_width$.1}  {:<genre_width$}  {}",
                product.id,
                price_str,
                product.activation_keys(),
                product.average_rating,
                truncate(&product.genre, genre_width),
                truncate(&product.title, title_width)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} products (* discounted)", products.len()));

        lines.join("\n")
    }

    // Markdown

    fn markdown_single(&self, product: &Product, pricing: &dyn Pricing) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", product.title));
        lines.push(String::new());
        lines.push(format!("- **ID:** {}", product.id));

        let final_price = pricing.discounted_price(product);
        if final_price < product.base_price {
            lines.push(format!("- **Price:** {:.2} ~~{:.2}~~", final_price, product.base_price));
        } else {
            lines.push(format!("- **Price:** {:.2}", product.base_price));
        }
        lines.push(format!("- **Developer:** {}", product.developer));
        lines.push(format!("- **Genre:** {}", product.genre));
        lines.push(format!("- **Rating:** {:.1}/5", product.average_rating));
        if !product.tags.is_empty() {
            lines.push(format!("- **Tags:** {}", product.tags.join(", ")));
        }
        lines.push(format!("- **Keys:** {}", stock_label(product)));

        lines.join("\n")
    }

    fn markdown_products(&self, products: &[&Product], pricing: &dyn Pricing) -> String {
        let mut lines = Vec::new();

        lines.push("| ID | Price | Keys | Rating | Genre | Title |".to_string());
        lines.push("|----|-------|------|--------|-------|-------|".to_string());

        for product in products {
            let final_price = pricing.discounted_price(product);
            let price_str = if final_price < product.base_price {
                format!("{:.2} ~~{:.2}~~", final_price, product.base_price)
            } else {
                format!("{:.2}", final_price)
            };

            lines.push(format!(
                "| {} | {} | {} | {:.1} | {} | {} |",
                product.id,
                price_str,
                product.activation_keys(),
                product.average_rating,
                product.genre,
                truncate(&product.title, 40)
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} products found*", products.len()));

        lines.join("\n")
    }

    // CSV

    fn csv_header(&self) -> String {
        "id,title,genre,developer,publisher,base_price,final_price,discount_percent,keys,rating,age_rating,release_date,tags"
            .to_string()
    }

    fn csv_products(&self, products: &[&Product], pricing: &dyn Pricing) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for product in products {
            lines.push(format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{}",
                product.id,
                Self::csv_escape(&product.title),
                Self::csv_escape(&product.genre),
                Self::csv_escape(&product.developer),
                Self::csv_escape(&product.publisher),
                product.base_price,
                pricing.discounted_price(product),
                pricing.best_discount_percent(product),
                product.activation_keys(),
                product.average_rating,
                product.age_rating,
                product.release_date,
                Self::csv_escape(&product.tags.join(";"))
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }

    // Other entities

    /// Formats sales with their line items.
    pub fn format_sales(&self, sales: &[&Sale], titles: impl Fn(i32) -> Option<String>) -> String {
        if self.format == OutputFormat::Json {
            let views: Vec<SaleView> = sales
                .iter()
                .map(|s| SaleView { sale: s, final_amount: s.final_amount() })
                .collect();
            return to_json(&views, "[]");
        }
        if sales.is_empty() {
            return "No purchases found.".to_string();
        }

        let mut lines = Vec::new();
        for sale in sales {
            lines.push(format!(
                "Sale #{}  {}  {:.2} (discount {:.2})  {}",
                sale.sale_id,
                sale.sale_date_time,
                sale.final_amount(),
                sale.discount_amount,
                sale.status
            ));
            for item in &sale.items {
                let title = titles(item.product_id)
                    .unwrap_or_else(|| format!("Product #{}", item.product_id));
                lines.push(format!("  {} x{}", title, item.quantity));
            }
        }
        lines.push(String::new());
        lines.push(format!("Total: {} sales", sales.len()));

        lines.join("\n")
    }

    /// Formats discounts with the positions used to update or delete them.
    pub fn format_discounts(&self, discounts: &[Discount]) -> String {
        if self.format == OutputFormat::Json {
            let indexed: Vec<IndexedDiscount> = discounts
                .iter()
                .enumerate()
                .map(|(index, discount)| IndexedDiscount { index, discount })
                .collect();
            return to_json(&indexed, "[]");
        }
        if discounts.is_empty() {
            return "No discounts.".to_string();
        }

        let mut lines = Vec::new();
        lines.push(format!(
            "{:<4}  {:<10}  {:>5}  {:<21}  {:<21}  {}",
            "#", "Type", "%", "Start", "End", "Targets"
        ));
        lines.push(format!(
            "{:-<4}  {:-<10}  {:-<5}  {:-<21}  {:-<21}  {:-<20}",
            "", "", "", "", "", ""
        ));
        for (index, discount) in discounts.iter().enumerate() {
            lines.push(format!(
                "{:<4}  {:<10}  {:>5}  {:<21}  {:<21}  {}",
                index,
                discount.kind.as_str(),
                discount.percentage,
                discount.start_date,
                discount.end_date,
                discount.targets.join(", ")
            ));
        }

        lines.join("\n")
    }

    /// Formats user accounts. Credentials are never shown.
    pub fn format_users(&self, users: &[&User], now: &str) -> String {
        if self.format == OutputFormat::Json {
            return to_json(&users, "[]");
        }
        if users.is_empty() {
            return "No users found.".to_string();
        }

        let mut lines = Vec::new();
        lines.push(format!(
            "{:<5}  {:<16}  {:<8}  {:<8}  {:<8}  {}",
            "ID", "Username", "Role", "Approved", "Blocked", "Email"
        ));
        lines.push(format!(
            "{:-<5}  {:-<16}  {:-<8}  {:-<8}  {:-<8}  {:-<20}",
            "", "", "", "", "", ""
        ));
        for user in users {
            lines.push(format!(
                "{:<5}  {:<16}  {:<8}  {:<8}  {:<8}  {}",
                user.id,
                truncate(&user.username, 16),
                user.role(),
                yes_no(user.is_approved),
                yes_no(user.is_blocked_at(now)),
                user.email
            ));
        }

        lines.join("\n")
    }

    /// Formats one account in detail.
    pub fn format_user(&self, user: &User, now: &str) -> String {
        if self.format == OutputFormat::Json {
            return to_json(user, "{}");
        }

        let mut lines = Vec::new();
        lines.push(format!("ID:         {}", user.id));
        lines.push(format!("Username:   {}", user.username));
        lines.push(format!("Role:       {}", user.role()));
        lines.push(format!("Email:      {}", user.email));
        lines.push(format!("Phone:      {}", user.phone));
        lines.push(format!("Registered: {}", user.registration_date));
        lines.push(format!("Approved:   {}", yes_no(user.is_approved)));
        if user.is_blocked_at(now) {
            lines.push(format!("Blocked:    until {}", user.unlock_date));
        }
        if let Some(profile) = user.profile() {
            lines.push(format!("Birthday:   {}", profile.birthday));
            lines.push(format!("Spent:      {:.2}", profile.total_spent));
        }

        lines.join("\n")
    }

    pub fn format_notifications(&self, notifications: &[Notification]) -> String {
        if self.format == OutputFormat::Json {
            return to_json(&notifications, "[]");
        }
        if notifications.is_empty() {
            return "No notifications.".to_string();
        }

        notifications
            .iter()
            .map(|n| {
                let marker = if n.is_read { " " } else { "*" };
                format!("{} [{}] [{}] {}", marker, n.timestamp, n.kind, n.message)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Activity log lines as read, newest first.
    pub fn format_log_lines(&self, lines: &[String]) -> String {
        if self.format == OutputFormat::Json {
            return to_json(&lines, "[]");
        }
        if lines.is_empty() {
            return "No log entries.".to_string();
        }
        lines.join("\n")
    }

    /// Formats a plain list of names, one per line.
    pub fn format_names(&self, heading: &str, names: &[String]) -> String {
        if self.format == OutputFormat::Json {
            return to_json(&names, "[]");
        }
        if names.is_empty() {
            return format!("No {}.", heading.to_lowercase());
        }

        let mut lines = vec![format!("{}:", heading)];
        lines.extend(names.iter().map(|n| format!("  {}", n)));
        lines.join("\n")
    }

    pub fn format_sales_report(&self, report: &SalesReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(report, "{}"),
            _ => render_sales_report(report).trim_end().to_string(),
        }
    }

    pub fn format_financial_report(&self, report: &FinancialReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(report, "{}"),
            _ => render_financial_report(report).trim_end().to_string(),
        }
    }

    pub fn format_inventory_report(&self, report: &InventoryReport) -> String {
        if self.format == OutputFormat::Json {
            return to_json(report, "{}");
        }

        let mut lines = Vec::new();
        lines.push("INVENTORY REPORT".to_string());
        lines.push(format!("Low stock threshold: {}", report.threshold));
        lines.push(String::new());
        for line in &report.lines {
            let flag = if line.low_stock { "  LOW" } else { "" };
            lines.push(format!(
                "{:<5}  {:>6}  {}{}",
                line.product_id,
                line.keys,
                truncate(&line.title, 40),
                flag
            ));
        }
        lines.push(String::new());
        lines.push(format!("Products with low stock: {}", report.low_stock_count));

        lines.join("\n")
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

fn price_label(product: &Product, pricing: &dyn Pricing) -> String {
    let final_price = pricing.discounted_price(product);
    if final_price < product.base_price {
        format!(
            "{:.2} (was {:.2}, -{}%)",
            final_price,
            product.base_price,
            pricing.best_discount_percent(product)
        )
    } else {
        format!("{:.2}", product.base_price)
    }
}

fn stock_label(product: &Product) -> String {
    if product.has_keys() {
        product.activation_keys().to_string()
    } else {
        "Out of stock".to_string()
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
