//! Account administration. Administrators only.

use crate::commands::{require_admin, Login};
use crate::format::Formatter;
use crate::models::{Role, User};
use crate::shop::Shop;
use crate::users::{UserQuery, UserStatus};
use anyhow::{anyhow, Context, Result};

/// Raw `user list` criteria as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct UserListArgs {
    pub pending: bool,
    pub search: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

impl UserListArgs {
    /// `--pending` is shorthand for `--status pending`.
    pub fn to_query(&self) -> Result<UserQuery> {
        let mut query = UserQuery::new().text(self.search.clone().unwrap_or_default());
        if let Some(role) = &self.role {
            query = query.role(role.parse().map_err(|e: String| anyhow!(e))?);
        }
        if let Some(status) = &self.status {
            query = query.status(status.parse().map_err(|e: String| anyhow!(e))?);
        } else if self.pending {
            query = query.status(UserStatus::Pending);
        }
        Ok(query)
    }
}

pub struct UserCommand<'a> {
    shop: &'a mut Shop,
    formatter: Formatter,
}

impl<'a> UserCommand<'a> {
    pub fn new(shop: &'a mut Shop, formatter: Formatter) -> Self {
        Self { shop, formatter }
    }

    /// Lists accounts matching the search text, role and status.
    pub fn list(&self, login: &Login, args: &UserListArgs) -> Result<String> {
        require_admin(self.shop, login)?;
        let query = args.to_query()?;
        let users: Vec<&User> = self.shop.users().search(&query);
        Ok(self
            .formatter
            .format_users(&users, &self.shop.clock().now_string()))
    }

    pub fn approve(&mut self, login: &Login, id: i32) -> Result<String> {
        require_admin(self.shop, login)?;
        if !self.shop.users_mut().approve(id)? {
            anyhow::bail!("No customer with ID {}", id);
        }
        Ok(format!("User {} approved.", id))
    }

    pub fn block(&mut self, login: &Login, id: i32, days: i64) -> Result<String> {
        require_admin(self.shop, login)?;
        if days <= 0 {
            anyhow::bail!("Block duration must be at least one day");
        }
        if !self.shop.users_mut().block(id, days)? {
            anyhow::bail!("User not found: ID {}", id);
        }
        let until = self
            .shop
            .users()
            .get(id)
            .map(|u| u.unlock_date.clone())
            .unwrap_or_default();
        Ok(format!("User {} blocked until {}.", id, until))
    }

    pub fn unblock(&mut self, login: &Login, id: i32) -> Result<String> {
        require_admin(self.shop, login)?;
        if !self.shop.users_mut().unblock(id)? {
            anyhow::bail!("User {} is not blocked", id);
        }
        Ok(format!("User {} unblocked.", id))
    }

    pub fn set_role(&mut self, login: &Login, id: i32, role: &str) -> Result<String> {
        require_admin(self.shop, login)?;
        let role: Role = role.parse().map_err(|e: String| anyhow!(e))?;
        if !self.shop.users_mut().change_role(id, role)? {
            anyhow::bail!("User not found: ID {}", id);
        }
        Ok(format!("User {} is now {}.", id, role))
    }

    pub fn clear_unapproved(&mut self, login: &Login) -> Result<String> {
        require_admin(self.shop, login)?;
        let removed = self.shop.users_mut().clear_unapproved()?;
        Ok(format!("Removed {} unapproved user(s).", removed))
    }

    pub fn rename(&mut self, login: &Login, id: i32, new_username: &str) -> Result<String> {
        require_admin(self.shop, login)?;
        if !self
            .shop
            .users_mut()
            .rename(id, new_username)
            .context("Rename failed")?
        {
            anyhow::bail!("User not found: ID {}", id);
        }
        Ok(format!("User {} is now called {}.", id, new_username))
    }
}
