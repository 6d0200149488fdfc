//! User registry: registration, login, approval, blocking and roles.

use crate::activity_log::ActivityLog;
use crate::clock::{format_date_time, Clock};
use crate::codec::DataFile;
use crate::config::DataPaths;
use crate::credentials::CredentialVerifier;
use crate::error::{AuthError, BusinessError};
use crate::models::{CustomerProfile, Role, User, UserKind};
use crate::sequence::{self, IdSequence};
use chrono::{Datelike, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Account state as shown to administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Customer waiting for approval
    Pending,
    Approved,
    /// Unlock date still in the future
    Blocked,
}

impl UserStatus {
    /// Status of `user` at `now`. A block outranks approval.
    pub fn of(user: &User, now: &str) -> Self {
        if user.is_blocked_at(now) {
            UserStatus::Blocked
        } else if user.is_approved {
            UserStatus::Approved
        } else {
            UserStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Approved => "approved",
            UserStatus::Blocked => "blocked",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(UserStatus::Pending),
            "approved" => Ok(UserStatus::Approved),
            "blocked" => Ok(UserStatus::Blocked),
            _ => Err(format!("Unknown status: {}. Use: pending, approved or blocked", s)),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Admin user search. Empty criteria match everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    /// Case-insensitive substring of username, email or phone
    pub text: String,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

impl UserQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn status(mut self, status: UserStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, user: &User, now: &str) -> bool {
        if self.role.is_some_and(|role| user.role() != role) {
            return false;
        }
        if self.status.is_some_and(|status| UserStatus::of(user, now) != status) {
            return false;
        }
        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        [&user.username, &user.email, &user.phone]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Every user account, persisted as one data file.
///
/// At least one administrator must exist once the registry has been
/// bootstrapped; role changes and blocks that would leave none are refused.
/// A change that cannot be written to disk is undone in memory as well.
pub struct UserRegistry {
    users: Vec<User>,
    file: DataFile<User>,
    ids: IdSequence,
    clock: Arc<dyn Clock>,
    log: ActivityLog,
}

impl UserRegistry {
    pub fn open(paths: &DataPaths, clock: Arc<dyn Clock>, log: ActivityLog) -> Self {
        let mut registry = Self {
            users: Vec::new(),
            file: DataFile::new(&paths.users, log.clone()),
            ids: IdSequence::open(&paths.sequences, log.clone()),
            clock,
            log,
        };
        registry.reload();
        registry
    }

    /// Re-reads the users file.
    pub fn reload(&mut self) {
        self.users = self.file.load();
    }

    /// Writes every user, or puts `before` back if the write fails.
    fn commit(&mut self, before: Vec<User>) -> Result<(), BusinessError> {
        if let Err(e) = self.file.try_save(&self.users) {
            self.users = before;
            return Err(e);
        }
        Ok(())
    }

    /// Applies `change` to one user and saves. `Ok(None)` if not found.
    fn modify<R>(&mut self, id: i32, change: impl FnOnce(&mut User) -> R) -> Result<Option<R>, BusinessError> {
        let before = self.users.clone();
        let Some(user) = self.get_mut(id) else {
            return Ok(None);
        };
        let outcome = change(user);
        self.commit(before)?;
        Ok(Some(outcome))
    }

    pub fn all(&self) -> &[User] {
        &self.users
    }

    pub fn get(&self, id: i32) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn get_mut(&mut self, id: i32) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn admin_count(&self) -> usize {
        self.users.iter().filter(|u| u.is_admin()).count()
    }

    /// Current status of a user.
    pub fn status(&self, user: &User) -> UserStatus {
        UserStatus::of(user, &self.clock.now_string())
    }

    /// Users matching `query`, in registration order.
    pub fn search(&self, query: &UserQuery) -> Vec<&User> {
        let now = self.clock.now_string();
        self.users.iter().filter(|u| query.matches(u, &now)).collect()
    }

    fn validate_username(username: &str) -> Result<(), BusinessError> {
        if username.trim().is_empty() || username.chars().any(char::is_whitespace) {
            return Err(BusinessError::InvalidUsername(username.to_string()));
        }
        Ok(())
    }

    fn insert(&mut self, mut user: User) -> Result<i32, BusinessError> {
        if self.find_by_username(&user.username).is_some() {
            return Err(BusinessError::UsernameTaken(user.username));
        }
        let existing: Vec<i32> = self.users.iter().map(|u| u.id).collect();
        user.id = self.ids.next(sequence::USERS, existing.into_iter())?;
        let id = user.id;

        let before = self.users.clone();
        self.users.push(user);
        self.commit(before)?;
        Ok(id)
    }

    /// Creates the first administrator. Fails once any admin exists.
    pub fn bootstrap_admin(
        &mut self,
        username: &str,
        credential: &str,
        email: &str,
        phone: &str,
    ) -> Result<i32, BusinessError> {
        if self.admin_count() > 0 {
            return Err(BusinessError::AdminExists);
        }
        let user = User::admin(username, credential, email, phone, self.clock.now_string());
        let id = self.insert(user)?;

        self.log.info(&format!("Administrator created: {}", username));
        Ok(id)
    }

    /// Registers an unapproved customer.
    pub fn register_customer(
        &mut self,
        username: &str,
        credential: &str,
        email: &str,
        phone: &str,
        birthday: &str,
    ) -> Result<i32, BusinessError> {
        let user = User::customer(
            username,
            credential,
            email,
            phone,
            self.clock.now_string(),
            birthday,
        );
        let id = self.insert(user)?;

        self.log.info(&format!("New user registered: {}", username));
        Ok(id)
    }

    /// Checks a login. Approval is left to the caller.
    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
        verifier: &dyn CredentialVerifier,
    ) -> Result<&User, AuthError> {
        let user = self
            .find_by_username(username)
            .ok_or_else(|| AuthError::UnknownUser(username.to_string()))?;

        if user.is_blocked_at(&self.clock.now_string()) {
            self.log.warning(&format!("Login attempt by blocked user: {}", username));
            return Err(AuthError::Blocked(user.unlock_date.clone()));
        }

        if !verifier.verify(password, &user.credential)? {
            self.log.warning(&format!("Failed login attempt for user: {}", username));
            return Err(AuthError::WrongPassword);
        }

        self.log.info(&format!("User logged in: {}", username));
        Ok(user)
    }

    /// Approves a customer. `Ok(false)` for unknown ids and administrators.
    pub fn approve(&mut self, id: i32) -> Result<bool, BusinessError> {
        if !self.get(id).is_some_and(|u| u.is_customer()) {
            return Ok(false);
        }
        let username = self.modify(id, |user| {
            user.is_approved = true;
            user.username.clone()
        })?;
        let Some(username) = username else {
            return Ok(false);
        };

        self.log.info(&format!("User approved: {}", username));
        Ok(true)
    }

    /// Unlock time `days` days from now, if it is a representable date.
    fn unlock_after(&self, days: i64) -> Option<String> {
        let unlock = TimeDelta::try_days(days).and_then(|delta| self.clock.now().checked_add_signed(delta))?;
        // Stored dates have a four-digit year
        (1..=9999).contains(&unlock.year()).then(|| format_date_time(unlock))
    }

    /// Blocks a user for `days` days. Returns `Ok(false)` if not found.
    pub fn block(&mut self, id: i32, days: i64) -> Result<bool, BusinessError> {
        let Some(user) = self.get(id) else {
            return Ok(false);
        };
        if user.is_admin() && self.admin_count() <= 1 {
            return Err(BusinessError::LastAdmin);
        }

        let unlock = self.unlock_after(days).ok_or(BusinessError::InvalidBlockDuration(days))?;
        let username = self.modify(id, |user| {
            user.unlock_date = unlock.clone();
            user.username.clone()
        })?;
        let Some(username) = username else {
            return Ok(false);
        };

        self.log.warning(&format!("User blocked: {} until {}", username, unlock));
        Ok(true)
    }

    /// Lifts a block. `Ok(false)` if the user is unknown or not blocked.
    pub fn unblock(&mut self, id: i32) -> Result<bool, BusinessError> {
        let now = self.clock.now_string();
        if !self.get(id).is_some_and(|u| u.is_blocked_at(&now)) {
            return Ok(false);
        }
        let username = self.modify(id, |user| {
            user.unlock_date.clear();
            user.username.clone()
        })?;
        let Some(username) = username else {
            return Ok(false);
        };

        self.log.info(&format!("User unblocked: {}", username));
        Ok(true)
    }

    /// Changes a user's role. Returns `Ok(false)` if not found.
    pub fn change_role(&mut self, id: i32, role: Role) -> Result<bool, BusinessError> {
        let Some(user) = self.get(id) else {
            return Ok(false);
        };
        if user.role() == role {
            return Ok(true);
        }
        if user.is_admin() && self.admin_count() <= 1 {
            return Err(BusinessError::LastAdmin);
        }

        let username = self.modify(id, |user| {
            match role {
                Role::Admin => {
                    user.kind = UserKind::Admin;
                    user.is_approved = true;
                }
                Role::Customer => user.kind = UserKind::Customer(CustomerProfile::default()),
            }
            user.username.clone()
        })?;
        let Some(username) = username else {
            return Ok(false);
        };

        self.log.info(&format!("Role changed for user {}: {}", username, role));
        Ok(true)
    }

    /// Gives a user a new login name. `Ok(false)` if not found.
    ///
    /// Names are case-sensitive, must not be empty or contain whitespace,
    /// and must not belong to anyone else.
    pub fn rename(&mut self, id: i32, new_username: &str) -> Result<bool, BusinessError> {
        Self::validate_username(new_username)?;
        let Some(user) = self.get(id) else {
            return Ok(false);
        };
        if user.username == new_username {
            return Ok(true);
        }
        if self.find_by_username(new_username).is_some() {
            return Err(BusinessError::UsernameTaken(new_username.to_string()));
        }

        let old = self.modify(id, |user| std::mem::replace(&mut user.username, new_username.to_string()))?;
        let Some(old) = old else {
            return Ok(false);
        };

        self.log.info(&format!("Username changed: {} -> {}", old, new_username));
        Ok(true)
    }

    pub fn update_contact(&mut self, id: i32, email: &str, phone: &str) -> Result<bool, BusinessError> {
        let updated = self.modify(id, |user| {
            user.email = email.to_string();
            user.phone = phone.to_string();
        })?;
        Ok(updated.is_some())
    }

    /// Replaces the stored credential (password change or recovery).
    pub fn set_credential(&mut self, id: i32, stored: &str) -> Result<bool, BusinessError> {
        let username = self.modify(id, |user| {
            user.credential = stored.to_string();
            user.username.clone()
        })?;
        let Some(username) = username else {
            return Ok(false);
        };

        self.log.info(&format!("Password changed for user: {}", username));
        Ok(true)
    }

    /// Adds to a customer's total spent and records the last product bought.
    pub fn record_purchase(&mut self, id: i32, amount: f64, product_id: i32) -> Result<bool, BusinessError> {
        if !self.get(id).is_some_and(|u| u.is_customer()) {
            return Ok(false);
        }
        let recorded = self.modify(id, |user| {
            if let Some(profile) = user.profile_mut() {
                profile.add_purchase(amount);
                profile.last_purchased_product_id = Some(product_id);
            }
        })?;
        Ok(recorded.is_some())
    }

    /// Deletes every unapproved customer and returns how many went.
    pub fn clear_unapproved(&mut self) -> Result<usize, BusinessError> {
        let before = self.users.clone();
        self.users.retain(|u| !(u.is_customer() && !u.is_approved));
        let removed = before.len() - self.users.len();
        if removed > 0 {
            self.commit(before)?;
            self.log.info(&format!("Removed {} unapproved users", removed));
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::credentials::SaltedSha256;
    use chrono::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        clock: Arc<FixedClock>,
        registry: UserRegistry,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(FixedClock::at("10.06.2024 12:00:00").unwrap());
        let registry =
            UserRegistry::open(&DataPaths::in_dir(dir.path()), clock.clone(), ActivityLog::silent());
        Fixture { _dir: dir, clock, registry }
    }

    #[test]
    fn test_bootstrap_admin_once() {
        let mut f = fixture();
        let id = f.registry.bootstrap_admin("root", "s:h", "root@x.com", "+1").unwrap();
        assert_eq!(id, 1);

        let admin = f.registry.get(id).unwrap();
        assert!(admin.is_admin());
        assert!(admin.is_approved);
        assert_eq!(admin.registration_date, "10.06.2024 12:00:00");

        assert_eq!(
            f.registry.bootstrap_admin("root2", "s:h", "", ""),
            Err(BusinessError::AdminExists)
        );
    }

    #[test]
    fn test_register_customer() {
        let mut f = fixture();
        let id = f.registry.register_customer("ann", "s:h", "ann@x.com", "+2", "01.01.2000").unwrap();

        let user = f.registry.get(id).unwrap();
        assert!(user.is_customer());
        assert!(!user.is_approved);
        assert_eq!(
            f.registry.register_customer("ann", "s:h", "", "", ""),
            Err(BusinessError::UsernameTaken("ann".to_string()))
        );
    }

    #[test]
    fn test_authenticate() {
        let mut f = fixture();
        let verifier = SaltedSha256::new();
        let stored = verifier.hash("secret");
        f.registry.register_customer("ann", &stored, "", "", "").unwrap();

        assert_eq!(f.registry.authenticate("ann", "secret", &verifier).unwrap().username, "ann");
        assert_eq!(
            f.registry.authenticate("ann", "nope", &verifier).unwrap_err(),
            AuthError::WrongPassword
        );
        assert_eq!(
            f.registry.authenticate("bob", "secret", &verifier).unwrap_err(),
            AuthError::UnknownUser("bob".to_string())
        );
    }

    #[test]
    fn test_authenticate_malformed_credential() {
        let mut f = fixture();
        f.registry.register_customer("ann", "plaintext", "", "", "").unwrap();
        assert_eq!(
            f.registry.authenticate("ann", "plaintext", &SaltedSha256::new()).unwrap_err(),
            AuthError::MalformedCredential
        );
    }

    #[test]
    fn test_block_and_unblock() {
        let mut f = fixture();
        let verifier = SaltedSha256::new();
        f.registry.bootstrap_admin("root", &verifier.hash("x"), "", "").unwrap();
        let id = f.registry.register_customer("ann", &verifier.hash("pw"), "", "", "").unwrap();

        assert_eq!(f.registry.block(id, 3), Ok(true));
        assert_eq!(f.registry.get(id).unwrap().unlock_date, "13.06.2024 12:00:00");
        assert_eq!(
            f.registry.authenticate("ann", "pw", &verifier).unwrap_err(),
            AuthError::Blocked("13.06.2024 12:00:00".to_string())
        );

        assert_eq!(f.registry.unblock(id), Ok(true));
        assert_eq!(f.registry.unblock(id), Ok(false));
        assert!(f.registry.authenticate("ann", "pw", &verifier).is_ok());
        assert_eq!(f.registry.block(99, 1), Ok(false));
    }

    #[test]
    fn test_block_expires() {
        let mut f = fixture();
        f.registry.bootstrap_admin("root", "s:h", "", "").unwrap();
        let id = f.registry.register_customer("ann", "s:h", "", "", "").unwrap();
        f.registry.block(id, 1).unwrap();

        f.clock.advance(Duration::days(2));
        assert!(!f.registry.get(id).unwrap().is_blocked_at(&f.clock.now_string()));
        assert_eq!(f.registry.unblock(id), Ok(false));
    }

    #[test]
    fn test_block_rejects_out_of_range_duration() {
        let mut f = fixture();
        f.registry.bootstrap_admin("root", "s:h", "", "").unwrap();
        let ann = f.registry.register_customer("ann", "s:h", "", "", "").unwrap();

        assert_eq!(
            f.registry.block(ann, 1_000_000_000),
            Err(BusinessError::InvalidBlockDuration(1_000_000_000))
        );
        assert_eq!(f.registry.block(ann, i64::MAX), Err(BusinessError::InvalidBlockDuration(i64::MAX)));
        // Past year 9999
        assert_eq!(f.registry.block(ann, 3_000_000), Err(BusinessError::InvalidBlockDuration(3_000_000)));
        assert!(f.registry.get(ann).unwrap().unlock_date.is_empty());

        assert_eq!(f.registry.block(ann, 365 * 100), Ok(true));
        assert!(f.registry.get(ann).unwrap().unlock_date.ends_with("2124 12:00:00"));
    }

    #[test]
    fn test_last_admin_protected() {
        let mut f = fixture();
        let root = f.registry.bootstrap_admin("root", "s:h", "", "").unwrap();

        assert_eq!(f.registry.block(root, 1), Err(BusinessError::LastAdmin));
        assert_eq!(f.registry.change_role(root, Role::Customer), Err(BusinessError::LastAdmin));
        assert!(f.registry.get(root).unwrap().is_admin());

        let ann = f.registry.register_customer("ann", "s:h", "", "", "").unwrap();
        assert_eq!(f.registry.change_role(ann, Role::Admin), Ok(true));
        assert_eq!(f.registry.admin_count(), 2);

        assert_eq!(f.registry.block(root, 1), Ok(true));
        assert_eq!(f.registry.change_role(root, Role::Customer), Ok(true));
        assert_eq!(f.registry.admin_count(), 1);
        assert_eq!(f.registry.change_role(ann, Role::Customer), Err(BusinessError::LastAdmin));
    }

    #[test]
    fn test_promotion_approves_and_demotion_resets_profile() {
        let mut f = fixture();
        f.registry.bootstrap_admin("root", "s:h", "", "").unwrap();
        let ann = f.registry.register_customer("ann", "s:h", "", "", "01.01.2000").unwrap();

        f.registry.change_role(ann, Role::Admin).unwrap();
        let user = f.registry.get(ann).unwrap();
        assert!(user.is_approved);
        assert!(user.profile().is_none());

        f.registry.change_role(ann, Role::Customer).unwrap();
        let profile = f.registry.get(ann).unwrap().profile().unwrap();
        assert_eq!(profile.total_spent, 0.0);
        assert_eq!(profile.last_purchased_product_id, None);
    }

    #[test]
    fn test_approve_customers_only() {
        let mut f = fixture();
        let root = f.registry.bootstrap_admin("root", "s:h", "", "").unwrap();
        let ann = f.registry.register_customer("ann", "s:h", "", "", "").unwrap();

        assert_eq!(f.registry.approve(ann), Ok(true));
        assert!(f.registry.get(ann).unwrap().is_approved);
        assert_eq!(f.registry.approve(root), Ok(false));
        assert_eq!(f.registry.approve(42), Ok(false));
    }

    #[test]
    fn test_record_purchase() {
        let mut f = fixture();
        let root = f.registry.bootstrap_admin("root", "s:h", "", "").unwrap();
        let ann = f.registry.register_customer("ann", "s:h", "", "", "").unwrap();

        assert_eq!(f.registry.record_purchase(ann, 40.0, 3), Ok(true));
        assert_eq!(f.registry.record_purchase(ann, 10.0, 5), Ok(true));
        assert_eq!(f.registry.record_purchase(root, 10.0, 5), Ok(false));

        let profile = f.registry.get(ann).unwrap().profile().unwrap();
        assert_eq!(profile.total_spent, 50.0);
        assert_eq!(profile.last_purchased_product_id, Some(5));
    }

    #[test]
    fn test_contact_and_credential() {
        let mut f = fixture();
        let ann = f.registry.register_customer("ann", "old:cred", "", "", "").unwrap();

        assert_eq!(f.registry.update_contact(ann, "ann@x.com", "+3"), Ok(true));
        assert_eq!(f.registry.set_credential(ann, "new:cred"), Ok(true));
        assert_eq!(f.registry.set_credential(9, "x:y"), Ok(false));

        let user = f.registry.get(ann).unwrap();
        assert_eq!(user.email, "ann@x.com");
        assert_eq!(user.phone, "+3");
        assert_eq!(user.credential, "new:cred");
    }

    #[test]
    fn test_clear_unapproved() {
        let mut f = fixture();
        f.registry.bootstrap_admin("root", "s:h", "", "").unwrap();
        let ann = f.registry.register_customer("ann", "s:h", "", "", "").unwrap();
        f.registry.register_customer("bob", "s:h", "", "", "").unwrap();
        f.registry.register_customer("cid", "s:h", "", "", "").unwrap();
        f.registry.approve(ann).unwrap();

        assert_eq!(f.registry.clear_unapproved(), Ok(2));
        let names: Vec<&str> = f.registry.all().iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["root", "ann"]);

        // Ids of removed users are not handed out again
        let dan = f.registry.register_customer("dan", "s:h", "", "", "").unwrap();
        assert_eq!(dan, 5);
    }

    #[test]
    fn test_users_persist() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(FixedClock::at("10.06.2024 12:00:00").unwrap());
        let paths = DataPaths::in_dir(dir.path());
        {
            let mut registry = UserRegistry::open(&paths, clock.clone(), ActivityLog::silent());
            registry.bootstrap_admin("root", "s:h", "", "").unwrap();
            let ann = registry.register_customer("ann", "s:h", "", "", "01.01.2000").unwrap();
            registry.record_purchase(ann, 12.5, 2).unwrap();
        }
        let registry = UserRegistry::open(&paths, clock, ActivityLog::silent());
        assert_eq!(registry.all().len(), 2);
        let ann = registry.find_by_username("ann").unwrap();
        assert_eq!(ann.profile().unwrap().total_spent, 12.5);
        assert_eq!(ann.profile().unwrap().birthday, "01.01.2000");
    }

    #[test]
    fn test_removed_user_id_not_reused_after_reopen() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(FixedClock::at("10.06.2024 12:00:00").unwrap());
        let paths = DataPaths::in_dir(dir.path());
        {
            let mut registry = UserRegistry::open(&paths, clock.clone(), ActivityLog::silent());
            registry.bootstrap_admin("root", "s:h", "", "").unwrap();
            registry.register_customer("ann", "s:h", "", "", "").unwrap();
            assert_eq!(registry.clear_unapproved(), Ok(1));
        }

        let mut registry = UserRegistry::open(&paths, clock, ActivityLog::silent());
        let bob = registry.register_customer("bob", "s:h", "", "", "").unwrap();
        assert_eq!(bob, 3);
    }

    #[test]
    fn test_unsaved_changes_are_rolled_back() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir(&data_dir).unwrap();
        let clock = Arc::new(FixedClock::at("10.06.2024 12:00:00").unwrap());
        let mut registry = UserRegistry::open(&DataPaths::in_dir(&data_dir), clock, ActivityLog::silent());
        registry.bootstrap_admin("root", "s:h", "", "").unwrap();
        let ann = registry.register_customer("ann", "s:h", "", "", "").unwrap();

        std::fs::remove_dir_all(&data_dir).unwrap();

        assert!(matches!(registry.approve(ann), Err(BusinessError::PersistFailed(_))));
        assert!(!registry.get(ann).unwrap().is_approved);
        assert!(registry.block(ann, 3).is_err());
        assert!(registry.get(ann).unwrap().unlock_date.is_empty());
        assert!(registry.rename(ann, "anna").is_err());
        assert!(registry.find_by_username("ann").is_some());
        assert!(registry.clear_unapproved().is_err());
        assert_eq!(registry.all().len(), 2);
        assert!(registry.register_customer("bob", "s:h", "", "", "").is_err());
        assert!(registry.find_by_username("bob").is_none());
    }

    #[test]
    fn test_search_by_text_role_and_status() {
        let mut f = fixture();
        f.registry.bootstrap_admin("root", "s:h", "root@shop.com", "").unwrap();
        let ann = f.registry.register_customer("ann", "s:h", "ann@mail.com", "+100", "").unwrap();
        let bob = f.registry.register_customer("bob", "s:h", "bob@shop.com", "+200", "").unwrap();
        f.registry.register_customer("cid", "s:h", "", "", "").unwrap();
        f.registry.approve(ann).unwrap();
        f.registry.approve(bob).unwrap();
        f.registry.block(bob, 2).unwrap();

        let names = |query: UserQuery| -> Vec<String> {
            f.registry.search(&query).iter().map(|u| u.username.clone()).collect()
        };

        assert_eq!(names(UserQuery::new()).len(), 4);
        assert_eq!(names(UserQuery::new().text("SHOP.com")), vec!["root", "bob"]);
        assert_eq!(names(UserQuery::new().text("+1")), vec!["ann"]);
        assert_eq!(names(UserQuery::new().role(Role::Admin)), vec!["root"]);
        assert_eq!(names(UserQuery::new().status(UserStatus::Pending)), vec!["cid"]);
        assert_eq!(names(UserQuery::new().status(UserStatus::Blocked)), vec!["bob"]);
        assert_eq!(
            names(UserQuery::new().role(Role::Customer).status(UserStatus::Approved)),
            vec!["ann"]
        );
        assert!(names(UserQuery::new().text("shop").role(Role::Customer).status(UserStatus::Approved)).is_empty());
    }

    #[test]
    fn test_status_after_block_expires() {
        let mut f = fixture();
        f.registry.bootstrap_admin("root", "s:h", "", "").unwrap();
        let ann = f.registry.register_customer("ann", "s:h", "", "", "").unwrap();
        f.registry.block(ann, 1).unwrap();
        assert_eq!(f.registry.status(f.registry.get(ann).unwrap()), UserStatus::Blocked);

        f.clock.advance(Duration::days(2));
        assert_eq!(f.registry.status(f.registry.get(ann).unwrap()), UserStatus::Pending);
        assert_eq!("Blocked".parse::<UserStatus>(), Ok(UserStatus::Blocked));
        assert!("gone".parse::<UserStatus>().is_err());
    }

    #[test]
    fn test_rename() {
        let mut f = fixture();
        let verifier = SaltedSha256::new();
        f.registry.bootstrap_admin("root", "s:h", "", "").unwrap();
        let ann = f.registry.register_customer("ann", &verifier.hash("pw"), "", "", "").unwrap();

        assert_eq!(f.registry.rename(ann, "anna"), Ok(true));
        assert!(f.registry.find_by_username("ann").is_none());
        assert_eq!(f.registry.authenticate("anna", "pw", &verifier).unwrap().id, ann);

        assert_eq!(f.registry.rename(ann, "anna"), Ok(true));
        assert_eq!(f.registry.rename(ann, "root"), Err(BusinessError::UsernameTaken("root".to_string())));
        assert_eq!(f.registry.rename(ann, ""), Err(BusinessError::InvalidUsername(String::new())));
        assert_eq!(
            f.registry.rename(ann, "an na"),
            Err(BusinessError::InvalidUsername("an na".to_string()))
        );
        assert_eq!(f.registry.rename(77, "zed"), Ok(false));
        assert_eq!(f.registry.get(ann).unwrap().username, "anna");
    }
}
