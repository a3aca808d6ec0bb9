//! Membership records and cache entry state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::role::Role;

/// A user's membership in a commune
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: String,
    pub commune_id: String,
    pub role: Role,
}

/// Lifecycle of a cached membership lookup
///
/// `Unfetched -> Loading -> {Loaded, Failed}`; only invalidation returns
/// an entry to `Unfetched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    #[default]
    Unfetched,
    Loading,
    Loaded,
    Failed,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStatus::Unfetched => write!(f, "unfetched"),
            FetchStatus::Loading => write!(f, "loading"),
            FetchStatus::Loaded => write!(f, "loaded"),
            FetchStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot of one commune's cached membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub status: FetchStatus,
    /// Role from the data API; `Guest` until loaded or when not joined
    pub role: Role,
    /// When the lookup settled
    pub fetched_at: Option<DateTime<Utc>>,
    /// Failure reason for `Failed` entries
    pub error: Option<String>,
    /// Generation of the fetch that owns this entry
    pub generation: u64,
}

impl CacheEntry {
    pub(crate) fn loading(generation: u64) -> Self {
        Self {
            status: FetchStatus::Loading,
            role: Role::Guest,
            fetched_at: None,
            error: None,
            generation,
        }
    }
}
