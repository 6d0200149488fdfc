//! Notification queues: one shared by administrators, one per customer.

use crate::activity_log::ActivityLog;
use crate::clock::Clock;
use crate::codec::DataFile;
use crate::error::BusinessError;
use crate::models::{Notification, NotificationKind, Recipient};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

type Queues = (Vec<Notification>, BTreeMap<i32, Vec<Notification>>);

pub struct NotificationCenter {
    admin: Vec<Notification>,
    customers: BTreeMap<i32, Vec<Notification>>,
    file: Option<DataFile<Notification>>,
    clock: Arc<dyn Clock>,
}

impl NotificationCenter {
    /// Queues backed by a data file, so they survive between runs.
    pub fn open(path: impl Into<PathBuf>, clock: Arc<dyn Clock>, log: ActivityLog) -> Self {
        let file: DataFile<Notification> = DataFile::new(path, log);
        let mut center = Self::in_memory(clock);
        for notification in file.load() {
            center.queue_mut(notification.recipient).push(notification);
        }
        center.file = Some(file);
        center
    }

    /// Queues that live only as long as the process.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self { admin: Vec::new(), customers: BTreeMap::new(), file: None, clock }
    }

    fn save(&self) -> Result<(), BusinessError> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let all: Vec<Notification> = self
            .admin
            .iter()
            .chain(self.customers.values().flatten())
            .cloned()
            .collect();
        file.try_save(&all)
    }

    fn snapshot(&self) -> Queues {
        (self.admin.clone(), self.customers.clone())
    }

    /// Saves both queues, or puts `before` back if the write fails.
    fn commit(&mut self, before: Queues) -> Result<(), BusinessError> {
        if let Err(e) = self.save() {
            (self.admin, self.customers) = before;
            return Err(e);
        }
        Ok(())
    }

    fn queue_mut(&mut self, recipient: Recipient) -> &mut Vec<Notification> {
        match recipient {
            Recipient::Admins => &mut self.admin,
            Recipient::Customer(id) => self.customers.entry(id).or_default(),
        }
    }

    fn push(&mut self, recipient: Recipient, message: String, kind: NotificationKind) {
        let notification = Notification::new(recipient, message, kind, self.clock.now_string());
        self.queue_mut(recipient).push(notification);
        // Still shown for this session
        if let Err(e) = self.save() {
            warn!("Notification not persisted: {}", e);
        }
    }

    pub fn notify_admin(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.push(Recipient::Admins, message.into(), kind);
    }

    pub fn notify_customer(&mut self, customer_id: i32, message: impl Into<String>, kind: NotificationKind) {
        self.push(Recipient::Customer(customer_id), message.into(), kind);
    }

    pub fn notify_low_stock(&mut self, title: &str, keys: u32) {
        self.notify_admin(
            format!("Low stock: {} has only {} keys left", title, keys),
            NotificationKind::Warning,
        );
    }

    pub fn notify_new_registration(&mut self, username: &str) {
        self.notify_admin(
            format!("New user registration: {} awaits approval", username),
            NotificationKind::Info,
        );
    }

    pub fn notify_purchase_complete(&mut self, customer_id: i32, title: &str, quantity: i32) {
        self.notify_customer(
            customer_id,
            format!("Purchase complete: {} x{}", title, quantity),
            NotificationKind::Success,
        );
    }

    pub fn notify_wishlist_back_in_stock(&mut self, customer_id: i32, title: &str) {
        self.notify_customer(
            customer_id,
            format!("Back in stock: {} from your wishlist is available again", title),
            NotificationKind::Info,
        );
    }

    pub fn notify_wishlist_discount(&mut self, customer_id: i32, title: &str, percent: f64) {
        self.notify_customer(
            customer_id,
            format!("Discount: {} from your wishlist is now {}% off", title, percent),
            NotificationKind::Success,
        );
    }

    pub fn admin_notifications(&self) -> &[Notification] {
        &self.admin
    }

    pub fn customer_notifications(&self, customer_id: i32) -> &[Notification] {
        self.customers.get(&customer_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn notifications_for(&self, recipient: Recipient) -> &[Notification] {
        match recipient {
            Recipient::Admins => self.admin_notifications(),
            Recipient::Customer(id) => self.customer_notifications(id),
        }
    }

    pub fn unread_count(&self, recipient: Recipient) -> usize {
        self.notifications_for(recipient).iter().filter(|n| !n.is_read).count()
    }

    /// Marks a queue as read and returns how many were unread.
    pub fn mark_read(&mut self, recipient: Recipient) -> Result<usize, BusinessError> {
        let before = self.snapshot();
        let mut changed = 0;
        for notification in self.queue_mut(recipient).iter_mut().filter(|n| !n.is_read) {
            notification.is_read = true;
            changed += 1;
        }
        if changed > 0 {
            self.commit(before)?;
        }
        Ok(changed)
    }

    pub fn mark_admin_read(&mut self) -> Result<usize, BusinessError> {
        self.mark_read(Recipient::Admins)
    }

    pub fn mark_customer_read(&mut self, customer_id: i32) -> Result<usize, BusinessError> {
        self.mark_read(Recipient::Customer(customer_id))
    }

    /// Empties a queue and returns how many were dropped.
    pub fn clear(&mut self, recipient: Recipient) -> Result<usize, BusinessError> {
        let before = self.snapshot();
        let removed = match recipient {
            Recipient::Admins => std::mem::take(&mut self.admin).len(),
            Recipient::Customer(id) => self.customers.remove(&id).map_or(0, |q| q.len()),
        };
        if removed > 0 {
            self.commit(before)?;
        }
        Ok(removed)
    }

    pub fn clear_admin(&mut self) -> Result<usize, BusinessError> {
        self.clear(Recipient::Admins)
    }

    pub fn clear_customer(&mut self, customer_id: i32) -> Result<usize, BusinessError> {
        self.clear(Recipient::Customer(customer_id))
    }

    pub fn clear_all(&mut self) -> Result<(), BusinessError> {
        let before = self.snapshot();
        self.admin.clear();
        self.customers.clear();
        self.commit(before)
    }
}
