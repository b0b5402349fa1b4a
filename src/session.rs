//! Who is acting.
//!
//! The active role is an explicit value handed to the operations that care
//! about it. Recipient matching is a staff tool: only `staff` and `admin`
//! may request it.

use crate::error::{PantryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Staff,
    Donor,
    Recipient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Donor => "donor",
            Role::Recipient => "recipient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PantryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "donor" => Ok(Role::Donor),
            "recipient" => Ok(Role::Recipient),
            other => Err(PantryError::validation("role", format!("unknown role '{}'", other))),
        }
    }
}

/// The acting user's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session {
    role: Role,
}

impl Session {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Switch the acting role, as the role picker does.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn can_match(&self) -> bool {
        matches!(self.role, Role::Staff | Role::Admin)
    }

    /// Fail with [`PantryError::PermissionDenied`] unless matching is allowed.
    pub fn require_matching(&self) -> Result<()> {
        if self.can_match() {
            Ok(())
        } else {
            Err(PantryError::PermissionDenied {
                role: self.role.to_string(),
                action: "request recipient matches".into(),
            })
        }
    }
}
