//! The shop: every store component wired together, plus the flows that
//! span more than one of them (purchases, restocks, discounts, sign-up).

use crate::activity_log::ActivityLog;
use crate::clock::Clock;
use crate::config::Config;
use crate::credentials::{generate_password, CredentialVerifier, SaltedSha256};
use crate::error::{AuthError, BusinessError};
use crate::models::{Discount, Product, Role, Sale, SaleItem, User};
use crate::notifications::NotificationCenter;
use crate::recommend::RecommendationSystem;
use crate::reports::ReportGenerator;
use crate::store::{KeyRestock, Pricing, Store};
use crate::users::UserRegistry;
use crate::vocabulary::Vocabulary;
use crate::wishlist::Wishlist;
use std::sync::Arc;
use tracing::debug;

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl Session {
    fn of(user: &User) -> Self {
        Self { user_id: user.id, username: user.username.clone(), role: user.role() }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub struct Shop {
    store: Store,
    users: UserRegistry,
    wishlist: Wishlist,
    notifications: NotificationCenter,
    vocabulary: Vocabulary,
    verifier: Box<dyn CredentialVerifier>,
    clock: Arc<dyn Clock>,
    log: ActivityLog,
    low_stock_threshold: u32,
    recommendation_limit: usize,
    top_products_limit: usize,
}

impl Shop {
    /// Opens every data file under the configured data directory.
    pub fn open(config: &Config, clock: Arc<dyn Clock>, log: ActivityLog) -> Self {
        let paths = config.paths();
        debug!("Opening shop data in {}", config.data_dir.display());

        Self {
            store: Store::open(&paths, clock.clone(), log.clone())
                .with_low_stock_threshold(config.low_stock_threshold),
            users: UserRegistry::open(&paths, clock.clone(), log.clone()),
            wishlist: Wishlist::open(&paths.wishlists, clock.clone(), log.clone()),
            notifications: NotificationCenter::open(&paths.notifications, clock.clone(), log.clone()),
            vocabulary: Vocabulary::open(&paths.genres, &paths.tags, log.clone()),
            verifier: Box::new(SaltedSha256::new()),
            clock,
            log,
            low_stock_threshold: config.low_stock_threshold,
            recommendation_limit: config.recommendation_limit,
            top_products_limit: config.top_products_limit,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    pub fn users_mut(&mut self) -> &mut UserRegistry {
        &mut self.users
    }

    pub fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    pub fn wishlist_mut(&mut self) -> &mut Wishlist {
        &mut self.wishlist
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn low_stock_threshold(&self) -> u32 {
        self.low_stock_threshold
    }

    pub fn recommender(&self) -> RecommendationSystem<'_> {
        RecommendationSystem::new(&self.store, self.log.clone()).with_limit(self.recommendation_limit)
    }

    pub fn reports(&self) -> ReportGenerator<'_> {
        ReportGenerator::new(&self.store, self.log.clone()).with_top_limit(self.top_products_limit)
    }

    // ---- Accounts ----

    /// Creates the first administrator.
    pub fn bootstrap_admin(
        &mut self,
        username: &str,
        password: &str,
        email: &str,
        phone: &str,
    ) -> Result<i32, BusinessError> {
        let credential = self.verifier.hash(password);
        self.users.bootstrap_admin(username, &credential, email, phone)
    }

    /// Registers a customer and tells the administrators.
    pub fn register_customer(
        &mut self,
        username: &str,
        password: &str,
        email: &str,
        phone: &str,
        birthday: &str,
    ) -> Result<i32, BusinessError> {
        let credential = self.verifier.hash(password);
        let id = self
            .users
            .register_customer(username, &credential, email, phone, birthday)?;
        self.notifications.notify_new_registration(username);
        Ok(id)
    }

    /// Authenticates any user.
    pub fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let user = self.users.authenticate(username, password, self.verifier.as_ref())?;
        Ok(Session::of(user))
    }

    /// Authenticates an administrator.
    pub fn login_admin(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.login(username, password)?;
        if !session.is_admin() {
            return Err(AuthError::Forbidden("admin"));
        }
        Ok(session)
    }

    /// Authenticates an approved customer.
    pub fn login_customer(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.login(username, password)?;
        let approved = self.users.get(session.user_id).is_some_and(|u| u.is_approved);
        if session.is_admin() {
            return Err(AuthError::Forbidden("customer"));
        }
        if !approved {
            return Err(AuthError::NotApproved);
        }
        Ok(session)
    }

    /// Verifies the old password and stores the new one.
    pub fn change_password(
        &mut self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let session = self.login(username, old_password)?;
        let credential = self.verifier.hash(new_password);
        self.users.set_credential(session.user_id, &credential)?;
        Ok(())
    }

    /// Issues a temporary password when `email` matches the account.
    pub fn recover_password(&mut self, username: &str, email: &str) -> Result<String, AuthError> {
        let user = self
            .users
            .find_by_username(username)
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;
        if !user.email.eq_ignore_ascii_case(email) {
            self.log
                .warning(&format!("Password recovery failed for user: {}", username));
            return Err(AuthError::UnknownUser(username.to_string()));
        }

        let id = user.id;
        let password = generate_password(10);
        let credential = self.verifier.hash(&password);
        self.users.set_credential(id, &credential)?;
        Ok(password)
    }

    // ---- Catalog ----

    /// Deletes a product and drops it from every wishlist.
    pub fn delete_product(&mut self, id: i32) -> Result<bool, BusinessError> {
        if !self.store.delete_product(id)? {
            return Ok(false);
        }
        self.wishlist.remove_product(id)?;
        Ok(true)
    }

    /// Adds keys, then warns on low stock and tells wishlisting customers
    /// when the product comes back into stock.
    pub fn restock(&mut self, product_id: i32, count: i32) -> Result<KeyRestock, BusinessError> {
        let restock = self.store.add_keys(product_id, count)?;

        if restock.current < self.low_stock_threshold {
            self.notifications.notify_low_stock(&restock.title, restock.current);
        }
        if restock.back_in_stock() {
            for customer_id in self.wishlist.customers_for(product_id) {
                self.notifications
                    .notify_wishlist_back_in_stock(customer_id, &restock.title);
            }
        }
        Ok(restock)
    }

    /// Stores a discount and tells customers whose wishlist it now covers.
    /// Returns the number of customers notified.
    pub fn add_discount(&mut self, discount: Discount) -> Result<usize, BusinessError> {
        let now = self.clock.now_string();
        let active = discount.is_valid_at(&now);
        let covered: Vec<i32> = self
            .store
            .products()
            .iter()
            .filter(|p| discount.applies_to(p))
            .map(|p| p.id)
            .collect();

        self.store.add_discount(discount)?;
        if !active {
            return Ok(0);
        }

        let mut notified = 0;
        for item in self.wishlist.all() {
            if !covered.contains(&item.product_id) {
                continue;
            }
            let Some(product) = self.store.product(item.product_id) else {
                continue;
            };
            let percent = self.store.best_discount_percent(product);
            self.notifications
                .notify_wishlist_discount(item.customer_id, &product.title, percent);
            notified += 1;
        }
        Ok(notified)
    }

    // ---- Purchases ----

    /// Runs a sale for a customer, then updates their spending, sends the
    /// purchase notifications and warns administrators about low stock.
    pub fn purchase(&mut self, customer_id: i32, items: &[SaleItem]) -> Result<Sale, BusinessError> {
        let sale = self.store.process_sale(customer_id, items, 0.0)?;

        if let Some(last) = sale.items.last() {
            // The sale itself is already on disk
            if let Err(e) = self
                .users
                .record_purchase(customer_id, sale.final_amount(), last.product_id)
            {
                self.log
                    .error(&format!("Spending not recorded for customer {}: {}", customer_id, e));
            }
        }

        for item in &sale.items {
            let Some(product) = self.store.product(item.product_id) else {
                continue;
            };
            self.notifications
                .notify_purchase_complete(customer_id, &product.title, item.quantity);
        }

        let mut warned: Vec<i32> = Vec::new();
        for item in &sale.items {
            if warned.contains(&item.product_id) {
                continue;
            }
            let Some(product) = self.store.product(item.product_id) else {
                continue;
            };
            if product.activation_keys() < self.low_stock_threshold {
                self.notifications
                    .notify_low_stock(&product.title, product.activation_keys());
                warned.push(item.product_id);
            }
        }

        Ok(sale)
    }

    /// Wishlist products that still exist, in wishlist order.
    pub fn wishlist_products(&self, customer_id: i32) -> Vec<&Product> {
        self.wishlist
            .products_for(customer_id)
            .into_iter()
            .filter_map(|id| self.store.product(id))
            .collect()
    }

    /// Adds a product to a wishlist. Unknown products are rejected.
    pub fn add_to_wishlist(&mut self, customer_id: i32, product_id: i32) -> Result<bool, BusinessError> {
        if self.store.product(product_id).is_none() {
            return Err(BusinessError::ProductNotFound(product_id));
        }
        self.wishlist.add(customer_id, product_id)
    }
}
