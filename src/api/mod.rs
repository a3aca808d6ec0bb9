//! Commune data API
//!
//! The data API owns communes, memberships and lists. This crate reads
//! memberships and lists through [`CommuneApi`] and triggers joins.

mod http;

pub use http::{ApiConfig, HttpCommuneApi};

use async_trait::async_trait;

use crate::error::Result;
use crate::list::List;
use crate::membership::Membership;
use crate::session::Session;

/// Operations consumed from the data API
#[async_trait]
pub trait CommuneApi: Send + Sync {
    /// Membership of the session's user in a commune.
    ///
    /// `Ok(None)` when the user has not joined.
    async fn fetch_membership(
        &self,
        commune_id: &str,
        session: &Session,
    ) -> Result<Option<Membership>>;

    /// All lists posted to a commune, authorized by `session` when present
    async fn fetch_lists(&self, commune_id: &str, session: Option<&Session>) -> Result<Vec<List>>;

    /// A single list by its post id
    async fn fetch_list(&self, list_id: &str, session: Option<&Session>) -> Result<List>;

    /// Join a commune. The caller must invalidate the cached membership.
    async fn join_commune(&self, commune_id: &str, session: &Session) -> Result<Membership>;
}
