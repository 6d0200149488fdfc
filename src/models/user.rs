//! User accounts: administrators and customers.

use crate::clock::compare_date_times;
use crate::codec::{wire, CodecError, Record};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// Account role. Its string form doubles as the record tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "customer" => Ok(Role::Customer),
            _ => Err(format!("Unknown role: {}. Use: admin or customer", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Customer-only account data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    /// Running sum, only ever increased
    pub total_spent: f64,
    pub birthday: String,
    /// Recommendation seed; `None` until the first purchase
    pub last_purchased_product_id: Option<i32>,
}

impl CustomerProfile {
    pub fn new(birthday: impl Into<String>) -> Self {
        Self { birthday: birthday.into(), ..Self::default() }
    }

    pub fn add_purchase(&mut self, amount: f64) {
        if amount > 0.0 {
            self.total_spent += amount;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum UserKind {
    Admin,
    Customer(CustomerProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Opaque `salt:hash` string, never rendered
    #[serde(skip)]
    pub credential: String,
    pub email: String,
    pub phone: String,
    pub is_approved: bool,
    pub registration_date: String,
    /// Empty when not blocked
    pub unlock_date: String,
    #[serde(flatten)]
    pub kind: UserKind,
}

impl User {
    /// New administrator; administrators are always approved.
    pub fn admin(
        username: impl Into<String>,
        credential: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        registration_date: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            username: username.into(),
            credential: credential.into(),
            email: email.into(),
            phone: phone.into(),
            is_approved: true,
            registration_date: registration_date.into(),
            unlock_date: String::new(),
            kind: UserKind::Admin,
        }
    }

    /// New customer awaiting approval.
    pub fn customer(
        username: impl Into<String>,
        credential: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        registration_date: impl Into<String>,
        birthday: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            username: username.into(),
            credential: credential.into(),
            email: email.into(),
            phone: phone.into(),
            is_approved: false,
            registration_date: registration_date.into(),
            unlock_date: String::new(),
            kind: UserKind::Customer(CustomerProfile::new(birthday)),
        }
    }

    pub fn role(&self) -> Role {
        match self.kind {
            UserKind::Admin => Role::Admin,
            UserKind::Customer(_) => Role::Customer,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    pub fn is_customer(&self) -> bool {
        self.role() == Role::Customer
    }

    pub fn profile(&self) -> Option<&CustomerProfile> {
        match &self.kind {
            UserKind::Customer(profile) => Some(profile),
            UserKind::Admin => None,
        }
    }

    pub fn profile_mut(&mut self) -> Option<&mut CustomerProfile> {
        match &mut self.kind {
            UserKind::Customer(profile) => Some(profile),
            UserKind::Admin => None,
        }
    }

    /// True while `now < unlock_date`.
    pub fn is_blocked_at(&self, now: &str) -> bool {
        !self.unlock_date.is_empty()
            && compare_date_times(now, &self.unlock_date) == Ordering::Less
    }
}

/// Tagged record: `[role tag][common fields][customer fields]`.
impl Record for User {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        let role = self.role().as_str();
        wire::write_str(w, role)?;
        wire::write_i32(w, self.id)?;
        wire::write_str(w, &self.username)?;
        wire::write_str(w, &self.credential)?;
        wire::write_str(w, &self.email)?;
        wire::write_str(w, &self.phone)?;
        wire::write_str(w, role)?;
        wire::write_bool(w, self.is_approved)?;
        wire::write_str(w, &self.registration_date)?;
        wire::write_str(w, &self.unlock_date)?;

        if let UserKind::Customer(profile) = &self.kind {
            wire::write_f64(w, profile.total_spent)?;
            wire::write_str(w, &profile.birthday)?;
            wire::write_i32(w, profile.last_purchased_product_id.unwrap_or(-1))?;
        }
        Ok(())
    }

    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let tag = wire::read_str(r)?;
        let role = Role::from_str(&tag).map_err(|_| CodecError::UnknownTag { kind: "user", tag })?;

        let id = wire::read_i32(r)?;
        let username = wire::read_str(r)?;
        let credential = wire::read_str(r)?;
        let email = wire::read_str(r)?;
        let phone = wire::read_str(r)?;
        // Role field duplicates the tag
        let _ = wire::read_str(r)?;
        let is_approved = wire::read_bool(r)?;
        let registration_date = wire::read_str(r)?;
        let unlock_date = wire::read_str(r)?;

        let kind = match role {
            Role::Admin => UserKind::Admin,
            Role::Customer => {
                let total_spent = wire::read_f64(r)?;
                let birthday = wire::read_str(r)?;
                let last = wire::read_i32(r)?;
                UserKind::Customer(CustomerProfile {
                    total_spent,
                    birthday,
                    last_purchased_product_id: (last >= 0).then_some(last),
                })
            }
        };

        Ok(Self {
            id,
            username,
            credential,
            email,
            phone,
            is_approved,
            registration_date,
            unlock_date,
            kind,
        })
    }
}
