//! Commune Access
//!
//! Membership-based access control and list presentation for commune apps.
//!
//! ## Pieces
//!
//! - [`role`]: the guest < member < moderator < admin hierarchy
//! - [`membership`]: per-commune role cache shared by every view of a session
//! - [`gate`]: session, inverse-session and role gates around protected views
//! - [`list`]: column-oriented list payloads transposed into display rows
//! - [`api`]: the commune data API the cache and lists read from
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use commune_access::api::{ApiConfig, HttpCommuneApi};
//! use commune_access::gate::{GateContext, GateRoutes, Guarded, Route};
//! use commune_access::membership::MembershipCache;
//! use commune_access::session::Session;
//!
//! # async fn example() -> commune_access::Result<()> {
//! let api = Arc::new(HttpCommuneApi::new(ApiConfig::default())?);
//! let cache = Arc::new(MembershipCache::new(api));
//! cache.init_session(Session::new("42", "token"));
//!
//! let routes = GateRoutes::default();
//! let route = Route::CreateEvent { commune_id: "7".into() };
//! let ctx = GateContext::for_route(&cache, &routes, &route);
//! let page = Guarded::for_route(&route, |_: &GateContext<'_>| "create event form");
//! let rendered = page.resolve(&ctx).await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod gate;
pub mod list;
pub mod logging;
pub mod membership;
pub mod role;
pub mod session;

#[cfg(test)]
mod test_utils;

pub use error::{AccessError, Result};
pub use membership::MembershipCache;
pub use role::{rank_of, resolve_role, satisfies, Role};
pub use session::Session;
