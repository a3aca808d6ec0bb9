//! Commune role scale and role resolution
//!
//! Roles are totally ordered: `guest < member < moderator < admin`.
//! Absence of information always resolves to `guest`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::membership::{CacheEntry, FetchStatus};
use crate::session::Session;

/// Role of a user within a single commune
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Role {
    /// Not joined, or not signed in
    #[default]
    Guest = 0,
    /// Joined member
    Member = 1,
    /// Can manage events and moderate content
    Moderator = 2,
    /// Full control over the commune
    Admin = 3,
}

impl Role {
    /// All roles, least privileged first
    pub const ALL: [Role; 4] = [Role::Guest, Role::Member, Role::Moderator, Role::Admin];

    /// Parse from the data API's string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "guest" => Some(Self::Guest),
            "member" => Some(Self::Member),
            "moderator" => Some(Self::Moderator),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rank of a role in the scale (guest = 0 ... admin = 3)
pub fn rank_of(role: Role) -> u8 {
    role as u8
}

/// Check if `role` meets or exceeds `minimum`
pub fn satisfies(role: Role, minimum: Role) -> bool {
    rank_of(role) >= rank_of(minimum)
}

/// Resolve the effective role for a commune.
///
/// Returns `Guest` when there is no session, no entry, or the entry is not
/// `Loaded`. Never fails.
pub fn resolve_role(session: Option<&Session>, entry: Option<&CacheEntry>) -> Role {
    if session.is_none() {
        return Role::Guest;
    }
    match entry {
        Some(entry) if entry.status == FetchStatus::Loaded => entry.role,
        _ => Role::Guest,
    }
}
