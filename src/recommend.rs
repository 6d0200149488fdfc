//! Game recommendations drawn from a customer's last purchase.

use crate::activity_log::ActivityLog;
use crate::models::{Product, User};
use crate::store::{Pricing, Store};

/// Default number of recommended games.
pub const DEFAULT_LIMIT: usize = 5;

pub struct RecommendationSystem<'a> {
    store: &'a Store,
    limit: usize,
    log: ActivityLog,
}

impl<'a> RecommendationSystem<'a> {
    pub fn new(store: &'a Store, log: ActivityLog) -> Self {
        Self { store, limit: DEFAULT_LIMIT, log }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Games sharing the genre or a tag with the customer's last purchase,
    /// best discount first.
    pub fn similar_games(&self, customer: &User) -> Vec<&'a Product> {
        let Some(last_id) = customer.profile().and_then(|p| p.last_purchased_product_id) else {
            return Vec::new();
        };
        let Some(last) = self.store.product(last_id) else {
            self.log.warning(&format!(
                "Last purchased product not found for recommendations: ID {}",
                last_id
            ));
            return Vec::new();
        };

        let mut similar: Vec<&Product> = self
            .store
            .products()
            .iter()
            .filter(|p| p.id != last.id)
            .filter(|p| p.genre == last.genre || p.tags.iter().any(|t| last.has_tag(t)))
            .collect();
        self.sort_by_discount(&mut similar);
        similar.truncate(self.limit);
        similar
    }

    /// Every product currently cheaper than its base price, best discount first.
    pub fn discounted_products(&self) -> Vec<&'a Product> {
        let mut discounted: Vec<&Product> = self
            .store
            .products()
            .iter()
            .filter(|p| self.store.discounted_price(p) < p.base_price)
            .collect();
        self.sort_by_discount(&mut discounted);
        discounted
    }

    /// Same ranking as [`Self::discounted_products`].
    pub fn popular_products(&self) -> Vec<&'a Product> {
        self.discounted_products()
    }

    fn sort_by_discount(&self, products: &mut [&Product]) {
        products.sort_by(|a, b| {
            self.store
                .discount_fraction(b)
                .total_cmp(&self.store.discount_fraction(a))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::DataPaths;
    use crate::models::{Discount, DiscountType, ProductDraft};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn draft(title: &str, genre: &str, tags: &[&str]) -> ProductDraft {
        ProductDraft {
            title: title.to_string(),
            base_price: 100.0,
            genre: genre.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            activation_keys: 10,
            ..ProductDraft::default()
        }
    }

    fn product_discount(id: i32, percentage: f64) -> Discount {
        Discount::new(
            DiscountType::Product,
            vec![id.to_string()],
            percentage,
            "01.01.2024",
            "31.12.2024",
        )
    }

    fn open_store(dir: &TempDir) -> Store {
        let clock = Arc::new(FixedClock::at("01.07.2024 12:00:00").unwrap());
        Store::open(&DataPaths::in_dir(dir.path()), clock, ActivityLog::silent())
    }

    fn customer(last: Option<i32>) -> User {
        let mut user = User::customer("ann", "", "", "", "", "");
        if let Some(profile) = user.profile_mut() {
            profile.last_purchased_product_id = last;
        }
        user
    }

    #[test]
    fn test_no_purchase_no_recommendations() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.add_product(&draft("A", "RPG", &[])).unwrap();

        let recommender = RecommendationSystem::new(&store, ActivityLog::silent());
        assert!(recommender.similar_games(&customer(None)).is_empty());
        assert!(recommender.similar_games(&customer(Some(99))).is_empty());
    }

    #[test]
    fn test_similar_by_genre_or_tag_sorted_by_discount() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let seed = store.add_product(&draft("Seed", "RPG", &["Fantasy"])).unwrap();
        let same_genre = store.add_product(&draft("Same genre", "RPG", &[])).unwrap();
        let shared_tag = store.add_product(&draft("Shared tag", "Strategy", &["Fantasy"])).unwrap();
        store.add_product(&draft("Unrelated", "Racing", &["Cars"])).unwrap();
        store.add_discount(product_discount(shared_tag, 30.0)).unwrap();
        store.add_discount(product_discount(same_genre, 10.0)).unwrap();

        let recommender = RecommendationSystem::new(&store, ActivityLog::silent());
        let titles: Vec<&str> = recommender
            .similar_games(&customer(Some(seed)))
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Shared tag", "Same genre"]);
    }

    #[test]
    fn test_similar_truncated_to_limit() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let seed = store.add_product(&draft("Seed", "RPG", &[])).unwrap();
        for i in 0..8 {
            store.add_product(&draft(&format!("RPG {}", i), "RPG", &[])).unwrap();
        }

        let recommender = RecommendationSystem::new(&store, ActivityLog::silent());
        assert_eq!(recommender.similar_games(&customer(Some(seed))).len(), 5);
        let recommender = recommender.with_limit(2);
        assert_eq!(recommender.similar_games(&customer(Some(seed))).len(), 2);
    }

    #[test]
    fn test_discounted_products() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let a = store.add_product(&draft("A", "RPG", &[])).unwrap();
        store.add_product(&draft("B", "RPG", &[])).unwrap();
        let c = store.add_product(&draft("C", "RPG", &[])).unwrap();
        store.add_discount(product_discount(a, 15.0)).unwrap();
        store.add_discount(product_discount(c, 40.0)).unwrap();

        let recommender = RecommendationSystem::new(&store, ActivityLog::silent());
        let titles: Vec<&str> = recommender
            .discounted_products()
            .iter()
            .map(|p| p.title.as_str())
            .collect();
        assert_eq!(titles, vec!["C", "A"]);
        assert_eq!(recommender.popular_products().len(), 2);
    }
}
