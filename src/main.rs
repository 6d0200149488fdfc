//! gamehub - digital game key store CLI

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gamehub::activity_log::ActivityLog;
use gamehub::clock::{Clock, SystemClock};
use gamehub::commands::account::Contact;
use gamehub::commands::catalog::CatalogQuery;
use gamehub::commands::discount::DiscountInput;
use gamehub::commands::logs::DEFAULT_LOG_LINES;
use gamehub::commands::product::ProductChanges;
use gamehub::commands::user::UserListArgs;
use gamehub::commands::vocab::Pool;
use gamehub::commands::{
    split_list, AccountCommand, CatalogCommand, DiscountCommand, Login, LogsCommand,
    NotificationsCommand, ProductCommand, ReportCommand, ShoppingCommand, UserCommand, VocabCommand,
};
use gamehub::config::{Config, OutputFormat};
use gamehub::format::Formatter;
use gamehub::models::ProductDraft;
use gamehub::shop::Shop;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gamehub",
    version,
    about = "Digital game key store",
    long_about = "Catalog, discounts, key sales, wishlists and reports for a digital game store, kept in local data files."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the data files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Username to act as
    #[arg(short, long, global = true, env = "GAMEHUB_USER")]
    user: Option<String>,

    /// Password for --user
    #[arg(short, long, global = true, env = "GAMEHUB_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the first administrator from --user and --password
    InitAdmin {
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
    },

    /// Register a customer account from --user and --password
    Register {
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        /// DD.MM.YYYY
        #[arg(long, default_value = "")]
        birthday: String,
    },

    /// Get a temporary password
    RecoverPassword {
        username: String,
        #[arg(long)]
        email: String,
    },

    /// Browse the catalog
    #[command(alias = "c")]
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Manage products (admin)
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// Manage discounts (admin)
    Discount {
        #[command(subcommand)]
        action: DiscountAction,
    },

    /// Manage the genre and tag lists
    Vocab {
        #[command(subcommand)]
        action: VocabAction,
    },

    /// Buy games: ID or ID:QTY
    Buy {
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Show your purchases
    History,

    /// Manage your wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },

    /// Games picked for you
    Recommend,

    /// Manage accounts (admin)
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Sales, financial and inventory reports (admin)
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },

    /// Recent activity log entries, newest first (admin)
    Logs {
        /// How many lines to show
        #[arg(long, short = 'n', default_value_t = DEFAULT_LOG_LINES)]
        lines: usize,
        /// Only entries of this level: info, warning, err, critical
        #[arg(long)]
        level: Option<String>,
    },

    /// Your notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },

    /// Your account
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List every product
    List,
    /// Search titles
    Search { query: String },
    /// Filter by one criterion: genre, developer, tag, has-discount, in-stock, out-of-stock
    Filter { kind: String, value: Option<String> },
    /// Filter by several criteria at once
    Find {
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        developer: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long)]
        min_rating: Option<f64>,
        /// Required title keywords (comma-separated)
        #[arg(long, value_delimiter = ',')]
        keywords: Option<Vec<String>>,
        #[arg(long)]
        in_stock: bool,
        #[arg(long)]
        discounted: bool,
    },
    /// Show one product
    Show { id: i32 },
    /// Genres in the catalog
    Genres,
    /// Developers in the catalog
    Developers,
    /// Discounted products, best deal first
    Discounted,
}

#[derive(Args)]
struct ProductFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    developer: Option<String>,
    #[arg(long)]
    publisher: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    age_rating: Option<i32>,
    #[arg(long)]
    description: Option<String>,
    /// Comma-separated
    #[arg(long, value_delimiter = ',')]
    tags: Option<Vec<String>>,
}

impl ProductFields {
    fn into_changes(self) -> ProductChanges {
        ProductChanges {
            title: self.title,
            price: self.price,
            developer: self.developer,
            publisher: self.publisher,
            genre: self.genre,
            age_rating: self.age_rating,
            description: self.description,
            tags: self.tags,
        }
    }
}

#[derive(Subcommand)]
enum ProductAction {
    /// Add a product
    Add {
        title: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "")]
        developer: String,
        #[arg(long, default_value = "")]
        publisher: String,
        #[arg(long, default_value = "")]
        genre: String,
        #[arg(long, default_value = "0")]
        age_rating: i32,
        #[arg(long, default_value = "")]
        description: String,
        /// DD.MM.YYYY HH:MM:SS; defaults to now
        #[arg(long, default_value = "")]
        release_date: String,
        /// Comma-separated
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long, default_value = "0")]
        keys: u32,
    },
    /// Change product fields
    Update {
        id: i32,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product
    Delete { id: i32 },
    /// Add activation keys
    Restock {
        id: i32,
        #[arg(allow_hyphen_values = true)]
        count: i32,
    },
}

#[derive(Args)]
struct DiscountFields {
    /// product, genre, tag or developer
    kind: String,
    /// Comma-separated product ids, genres, tags or developers
    targets: String,
    #[arg(long)]
    percent: f64,
    /// DD.MM.YYYY [HH:MM:SS]
    #[arg(long)]
    start: String,
    /// DD.MM.YYYY [HH:MM:SS]
    #[arg(long)]
    end: String,
}

impl DiscountFields {
    fn into_input(self) -> DiscountInput {
        DiscountInput {
            kind: self.kind,
            targets: split_list(&self.targets),
            percentage: self.percent,
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Subcommand)]
enum DiscountAction {
    /// List discounts with their positions
    List {
        #[arg(long)]
        active: bool,
    },
    /// Add a discount
    Add(DiscountFields),
    /// Replace the discount at a position
    Update {
        index: usize,
        #[command(flatten)]
        fields: DiscountFields,
    },
    /// Delete the discount at a position
    Delete { index: usize },
}

#[derive(Subcommand)]
enum VocabAction {
    /// Show the genre or tag list
    List { pool: Pool },
    /// Add a name (admin)
    Add { pool: Pool, name: String },
    /// Remove a name (admin)
    Remove { pool: Pool, name: String },
}

#[derive(Subcommand)]
enum WishlistAction {
    List,
    Add { id: i32 },
    Remove { id: i32 },
    Clear,
}

#[derive(Subcommand)]
enum UserAction {
    /// List accounts
    List {
        /// Only accounts awaiting approval
        #[arg(long)]
        pending: bool,
        /// Text to find in username, email or phone
        #[arg(long, short)]
        search: Option<String>,
        /// admin or customer
        #[arg(long)]
        role: Option<String>,
        /// pending, approved or blocked
        #[arg(long)]
        status: Option<String>,
    },
    Approve { id: i32 },
    Block {
        id: i32,
        #[arg(long, default_value = "7")]
        days: i64,
    },
    Unblock { id: i32 },
    /// Set the role: admin or customer
    Role { id: i32, role: String },
    /// Delete every unapproved customer
    ClearUnapproved,
    /// Change a user's login name
    Rename { id: i32, new_username: String },
}

#[derive(Subcommand)]
enum ReportAction {
    Sales {
        start: String,
        end: String,
        /// Also write the report to the report directory
        #[arg(long)]
        save: bool,
    },
    Financial {
        start: String,
        end: String,
        #[arg(long)]
        save: bool,
    },
    Inventory {
        #[arg(long)]
        threshold: Option<u32>,
    },
    /// Print a saved report
    Show { path: PathBuf },
}

#[derive(Subcommand)]
enum NotificationAction {
    List {
        #[arg(long)]
        unread: bool,
    },
    /// Mark everything as read
    Read,
    Clear,
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    Contact {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    Password { new_password: String },
    /// Change your login name
    Rename { new_username: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    config.ensure_dirs()?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let log_path = config.paths().log;
    let log = ActivityLog::open(&log_path, clock.clone())
        .with_context(|| format!("Failed to open activity log: {}", log_path.display()))?;
    debug!("Using data directory {}", config.data_dir.display());

    let mut shop = Shop::open(&config, clock, log);
    let login = Login::new(cli.user, cli.password);

    let output = run(cli.command, &mut shop, &login, &config)?;
    println!("{}", output);

    Ok(())
}

fn run(command: Commands, shop: &mut Shop, login: &Login, config: &Config) -> Result<String> {
    let formatter = Formatter::new(config.format);

    match command {
        Commands::InitAdmin { email, phone } => {
            AccountCommand::new(shop, formatter).init_admin(login, &Contact { email, phone })
        }

        Commands::Register { email, phone, birthday } => {
            AccountCommand::new(shop, formatter).register(login, &Contact { email, phone }, &birthday)
        }

        Commands::RecoverPassword { username, email } => {
            AccountCommand::new(shop, formatter).recover_password(&username, &email)
        }

        Commands::Catalog { action } => {
            let cmd = CatalogCommand::new(shop, formatter);
            match action {
                CatalogAction::List => cmd.list(),
                CatalogAction::Search { query } => cmd.search(&query),
                CatalogAction::Filter { kind, value } => cmd.filter_by(&kind, value.as_deref()),
                CatalogAction::Find {
                    genre,
                    developer,
                    tag,
                    min_price,
                    max_price,
                    min_rating,
                    keywords,
                    in_stock,
                    discounted,
                } => cmd.filter(&CatalogQuery {
                    genre,
                    developer,
                    tag,
                    min_price,
                    max_price,
                    min_rating,
                    keywords: keywords.unwrap_or_default(),
                    in_stock,
                    discounted,
                }),
                CatalogAction::Show { id } => cmd.show(id),
                CatalogAction::Genres => cmd.genres(),
                CatalogAction::Developers => cmd.developers(),
                CatalogAction::Discounted => cmd.discounted(),
            }
        }

        Commands::Product { action } => {
            let mut cmd = ProductCommand::new(shop, formatter);
            match action {
                ProductAction::Add {
                    title,
                    price,
                    developer,
                    publisher,
                    genre,
                    age_rating,
                    description,
                    release_date,
                    tags,
                    keys,
                } => cmd.add(
                    login,
                    ProductDraft {
                        title,
                        base_price: price,
                        developer,
                        publisher,
                        genre,
                        age_rating,
                        description,
                        release_date,
                        tags: tags.unwrap_or_default(),
                        activation_keys: keys,
                    },
                ),
                ProductAction::Update { id, fields } => cmd.update(login, id, fields.into_changes()),
                ProductAction::Delete { id } => cmd.delete(login, id),
                ProductAction::Restock { id, count } => cmd.restock(login, id, count),
            }
        }

        Commands::Discount { action } => {
            let mut cmd = DiscountCommand::new(shop, formatter);
            match action {
                DiscountAction::List { active } => cmd.list(login, active),
                DiscountAction::Add(fields) => cmd.add(login, fields.into_input()),
                DiscountAction::Update { index, fields } => {
                    cmd.update(login, index, fields.into_input())
                }
                DiscountAction::Delete { index } => cmd.delete(login, index),
            }
        }

        Commands::Vocab { action } => {
            let cmd = VocabCommand::new(shop, formatter);
            match action {
                VocabAction::List { pool } => cmd.list(pool),
                VocabAction::Add { pool, name } => cmd.add(login, pool, &name),
                VocabAction::Remove { pool, name } => cmd.remove(login, pool, &name),
            }
        }

        Commands::Buy { items } => ShoppingCommand::new(shop, formatter).buy(login, &items),

        Commands::History => ShoppingCommand::new(shop, formatter).history(login),

        Commands::Wishlist { action } => {
            let mut cmd = ShoppingCommand::new(shop, formatter);
            match action {
                WishlistAction::List => cmd.wishlist(login),
                WishlistAction::Add { id } => cmd.wishlist_add(login, id),
                WishlistAction::Remove { id } => cmd.wishlist_remove(login, id),
                WishlistAction::Clear => cmd.wishlist_clear(login),
            }
        }

        Commands::Recommend => ShoppingCommand::new(shop, formatter).recommend(login),

        Commands::User { action } => {
            let mut cmd = UserCommand::new(shop, formatter);
            match action {
                UserAction::List { pending, search, role, status } => {
                    cmd.list(login, &UserListArgs { pending, search, role, status })
                }
                UserAction::Approve { id } => cmd.approve(login, id),
                UserAction::Block { id, days } => cmd.block(login, id, days),
                UserAction::Unblock { id } => cmd.unblock(login, id),
                UserAction::Role { id, role } => cmd.set_role(login, id, &role),
                UserAction::ClearUnapproved => cmd.clear_unapproved(login),
                UserAction::Rename { id, new_username } => cmd.rename(login, id, &new_username),
            }
        }

        Commands::Report { action } => {
            let cmd = ReportCommand::new(shop, formatter);
            let report_dir = config.report_dir();
            match action {
                ReportAction::Sales { start, end, save } => {
                    cmd.sales(login, &start, &end, save.then_some(report_dir.as_path()))
                }
                ReportAction::Financial { start, end, save } => {
                    cmd.financial(login, &start, &end, save.then_some(report_dir.as_path()))
                }
                ReportAction::Inventory { threshold } => cmd.inventory(login, threshold),
                ReportAction::Show { path } => cmd.show(login, &path),
            }
        }

        Commands::Logs { lines, level } => {
            LogsCommand::new(shop, formatter).show(login, &config.paths().log, lines, level.as_deref())
        }

        Commands::Notifications { action } => {
            let mut cmd = NotificationsCommand::new(shop, formatter);
            match action {
                NotificationAction::List { unread } => cmd.list(login, unread),
                NotificationAction::Read => cmd.mark_read(login),
                NotificationAction::Clear => cmd.clear(login),
            }
        }

        Commands::Profile { action } => {
            let mut cmd = AccountCommand::new(shop, formatter);
            match action {
                ProfileAction::Show => cmd.show(login),
                ProfileAction::Contact { email, phone } => {
                    cmd.update_contact(login, email.as_deref(), phone.as_deref())
                }
                ProfileAction::Password { new_password } => cmd.change_password(login, &new_password),
                ProfileAction::Rename { new_username } => cmd.rename(login, &new_username),
            }
        }
    }
}
