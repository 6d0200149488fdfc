//! Notification inbox. Administrators see the shared admin queue, customers
//! their own.

use crate::commands::{require_user, Login};
use crate::format::Formatter;
use crate::models::Recipient;
use crate::shop::{Session, Shop};
use anyhow::Result;

fn recipient(session: &Session) -> Recipient {
    if session.is_admin() {
        Recipient::Admins
    } else {
        Recipient::Customer(session.user_id)
    }
}

pub struct NotificationsCommand<'a> {
    shop: &'a mut Shop,
    formatter: Formatter,
}

impl<'a> NotificationsCommand<'a> {
    pub fn new(shop: &'a mut Shop, formatter: Formatter) -> Self {
        Self { shop, formatter }
    }

    pub fn list(&self, login: &Login, unread_only: bool) -> Result<String> {
        let session = require_user(self.shop, login)?;
        let notifications = self.shop.notifications().notifications_for(recipient(&session));
        if unread_only {
            let unread: Vec<_> = notifications.iter().filter(|n| !n.is_read).cloned().collect();
            return Ok(self.formatter.format_notifications(&unread));
        }
        Ok(self.formatter.format_notifications(notifications))
    }

    pub fn mark_read(&mut self, login: &Login) -> Result<String> {
        let session = require_user(self.shop, login)?;
        let changed = self.shop.notifications_mut().mark_read(recipient(&session))?;
        Ok(format!("Marked {} notification(s) as read.", changed))
    }

    pub fn clear(&mut self, login: &Login) -> Result<String> {
        let session = require_user(self.shop, login)?;
        let removed = self.shop.notifications_mut().clear(recipient(&session))?;
        Ok(format!("Cleared {} notification(s).", removed))
    }
}
