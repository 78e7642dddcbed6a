//! Closed role set and the capabilities each role grants.
//!
//! Role strings are resolved once at the boundary into a [`Role`]; everything
//! past that point asks for a [`Capability`] instead of comparing roles.

use crate::error::AttendanceError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Facilitator,
    Attendee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Start and stop sessions, display tokens, plan groups.
    ManageSession,
    /// Submit a captured token.
    Scan,
}

impl Role {
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Admin => &[Capability::ManageSession, Capability::Scan],
            Role::Facilitator => &[Capability::ManageSession],
            Role::Attendee => &[Capability::Scan],
        }
    }

    pub fn can(self, cap: Capability) -> bool {
        self.capabilities().contains(&cap)
    }
}

/// An already-authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn authorize(&self, cap: Capability) -> Result<(), AttendanceError> {
        if self.role.can(cap) {
            Ok(())
        } else {
            Err(AttendanceError::Forbidden(cap))
        }
    }
}
