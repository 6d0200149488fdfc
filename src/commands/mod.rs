//! CLI command implementations.

pub mod account;
pub mod catalog;
pub mod discount;
pub mod logs;
pub mod notifications;
pub mod product;
pub mod report;
pub mod shopping;
pub mod user;
pub mod vocab;

pub use account::AccountCommand;
pub use catalog::CatalogCommand;
pub use discount::DiscountCommand;
pub use logs::LogsCommand;
pub use notifications::NotificationsCommand;
pub use product::ProductCommand;
pub use report::ReportCommand;
pub use shopping::ShoppingCommand;
pub use user::UserCommand;
pub use vocab::VocabCommand;

use crate::shop::{Session, Shop};
use anyhow::{anyhow, Context, Result};

/// Username and password given on the command line or in the environment.
#[derive(Debug, Clone, Default)]
pub struct Login {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Login {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    /// Both parts, or an error naming the missing flag.
    pub fn parts(&self) -> Result<(&str, &str)> {
        let username = self
            .username
            .as_deref()
            .ok_or_else(|| anyhow!("Missing --user (or GAMEHUB_USER)"))?;
        let password = self
            .password
            .as_deref()
            .ok_or_else(|| anyhow!("Missing --password (or GAMEHUB_PASSWORD)"))?;
        Ok((username, password))
    }
}

/// Any signed-in user.
pub fn require_user(shop: &Shop, login: &Login) -> Result<Session> {
    let (username, password) = login.parts()?;
    shop.login(username, password).context("Authentication failed")
}

/// A signed-in administrator.
pub fn require_admin(shop: &Shop, login: &Login) -> Result<Session> {
    let (username, password) = login.parts()?;
    shop.login_admin(username, password).context("Authentication failed")
}

/// A signed-in, approved customer.
pub fn require_customer(shop: &Shop, login: &Login) -> Result<Session> {
    let (username, password) = login.parts()?;
    shop.login_customer(username, password).context("Authentication failed")
}

/// Splits a comma-separated argument, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testing::{admin, customer, TestShop};
    use super::*;

    #[test]
    fn test_login_parts_missing() {
        let err = Login::new(None, Some("pw".into())).parts().unwrap_err();
        assert!(err.to_string().contains("--user"));
        let err = Login::new(Some("ann".into()), None).parts().unwrap_err();
        assert!(err.to_string().contains("--password"));
    }

    #[test]
    fn test_role_guards() {
        let t = TestShop::new();
        assert!(require_admin(&t.shop, &admin()).is_ok());
        assert!(require_admin(&t.shop, &customer()).is_err());
        assert!(require_customer(&t.shop, &customer()).is_ok());
        assert!(require_customer(&t.shop, &admin()).is_err());
        assert!(require_user(&t.shop, &admin()).is_ok());

        let wrong = Login::new(Some("ann".into()), Some("nope".into()));
        let err = require_user(&t.shop, &wrong).unwrap_err();
        assert_eq!(format!("{:#}", err), "Authentication failed: Wrong password");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("RPG, Indie,,  "), vec!["RPG", "Indie"]);
        assert!(split_list("").is_empty());
    }
}
