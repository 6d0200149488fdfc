//! In-app notifications.

use crate::codec::{wire, CodecError, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Error,
    Success,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::Success => "success",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(NotificationKind::Info),
            "warning" => Ok(NotificationKind::Warning),
            "error" => Ok(NotificationKind::Error),
            "success" => Ok(NotificationKind::Success),
            _ => Err(format!("Unknown notification type: {}", s)),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recipient {
    Admins,
    Customer(i32),
}

impl Recipient {
    /// On disk the admin queue is recipient id 0; customer ids start at 1.
    fn to_wire(self) -> i32 {
        match self {
            Recipient::Admins => 0,
            Recipient::Customer(id) => id,
        }
    }

    fn from_wire(id: i32) -> Self {
        if id <= 0 {
            Recipient::Admins
        } else {
            Recipient::Customer(id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub timestamp: String,
    pub is_read: bool,
}

impl Notification {
    pub fn new(
        recipient: Recipient,
        message: impl Into<String>,
        kind: NotificationKind,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            recipient,
            message: message.into(),
            kind,
            timestamp: timestamp.into(),
            is_read: false,
        }
    }
}

impl Record for Notification {
    fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        wire::write_i32(w, self.recipient.to_wire())?;
        wire::write_str(w, &self.message)?;
        wire::write_str(w, self.kind.as_str())?;
        wire::write_str(w, &self.timestamp)?;
        wire::write_bool(w, self.is_read)
    }

    fn decode<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let recipient = Recipient::from_wire(wire::read_i32(r)?);
        let message = wire::read_str(r)?;
        let tag = wire::read_str(r)?;
        let kind = NotificationKind::from_str(&tag)
            .map_err(|_| CodecError::UnknownTag { kind: "notification", tag })?;

        Ok(Self {
            recipient,
            message,
            kind,
            timestamp: wire::read_str(r)?,
            is_read: wire::read_bool(r)?,
        })
    }
}
