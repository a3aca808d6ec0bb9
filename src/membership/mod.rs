//! Per-session membership cache
//!
//! Resolves a user's role per commune lazily, with at most one lookup in
//! flight per commune. Settled entries stay until invalidated by a join or a
//! session change.

mod cache;
mod types;

pub use cache::MembershipCache;
pub use types::{CacheEntry, FetchStatus, Membership};
