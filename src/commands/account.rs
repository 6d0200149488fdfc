//! Sign-up, password recovery and the signed-in user's own profile.

use crate::clock::parse_date_time;
use crate::commands::{require_user, Login};
use crate::format::Formatter;
use crate::shop::Shop;
use anyhow::{anyhow, Context, Result};

/// Contact details for a new account.
#[derive(Debug, Clone, Default)]
pub struct Contact {
    pub email: String,
    pub phone: String,
}

pub struct AccountCommand<'a> {
    shop: &'a mut Shop,
    formatter: Formatter,
}

impl<'a> AccountCommand<'a> {
    pub fn new(shop: &'a mut Shop, formatter: Formatter) -> Self {
        Self { shop, formatter }
    }

    /// Creates the first administrator from the `--user`/`--password` pair.
    pub fn init_admin(&mut self, login: &Login, contact: &Contact) -> Result<String> {
        let (username, password) = login.parts()?;
        let id = self
            .shop
            .bootstrap_admin(username, password, &contact.email, &contact.phone)
            .context("Failed to create administrator")?;
        Ok(format!("Administrator {} created with ID {}.", username, id))
    }

    /// Registers a customer from the `--user`/`--password` pair. The account
    /// stays locked until an administrator approves it.
    pub fn register(&mut self, login: &Login, contact: &Contact, birthday: &str) -> Result<String> {
        let (username, password) = login.parts()?;
        if username.trim().is_empty() || password.is_empty() {
            anyhow::bail!("Username and password must not be empty");
        }
        if !birthday.is_empty() && parse_date_time(birthday).is_none() {
            anyhow::bail!("Invalid birthday: {} (expected DD.MM.YYYY)", birthday);
        }

        let id = self
            .shop
            .register_customer(username, password, &contact.email, &contact.phone, birthday)
            .context("Registration failed")?;
        Ok(format!(
            "Customer {} registered with ID {}. An administrator must approve the account.",
            username, id
        ))
    }

    /// Issues a temporary password when the e-mail matches the account.
    pub fn recover_password(&mut self, username: &str, email: &str) -> Result<String> {
        let password = self
            .shop
            .recover_password(username, email)
            .context("Password recovery failed")?;
        Ok(format!("Temporary password for {}: {}", username, password))
    }

    pub fn show(&self, login: &Login) -> Result<String> {
        let session = require_user(self.shop, login)?;
        let user = self
            .shop
            .users()
            .get(session.user_id)
            .ok_or_else(|| anyhow!("User not found: ID {}", session.user_id))?;
        Ok(self.formatter.format_user(user, &self.shop.clock().now_string()))
    }

    pub fn update_contact(&mut self, login: &Login, email: Option<&str>, phone: Option<&str>) -> Result<String> {
        let session = require_user(self.shop, login)?;
        let user = self
            .shop
            .users()
            .get(session.user_id)
            .ok_or_else(|| anyhow!("User not found: ID {}", session.user_id))?;
        let email = email.unwrap_or(&user.email).to_string();
        let phone = phone.unwrap_or(&user.phone).to_string();

        self.shop.users_mut().update_contact(session.user_id, &email, &phone)?;
        Ok("Contact details updated.".to_string())
    }

    /// Changes the signed-in user's own login name.
    pub fn rename(&mut self, login: &Login, new_username: &str) -> Result<String> {
        let session = require_user(self.shop, login)?;
        self.shop
            .users_mut()
            .rename(session.user_id, new_username)
            .context("Rename failed")?;
        Ok(format!("Username changed to {}. Sign in with the new name from now on.", new_username))
    }

    pub fn change_password(&mut self, login: &Login, new_password: &str) -> Result<String> {
        let (username, password) = login.parts()?;
        if new_password.is_empty() {
            anyhow::bail!("New password must not be empty");
        }
        self.shop
            .change_password(username, password, new_password)
            .context("Password change failed")?;
        Ok("Password changed.".to_string())
    }
}
