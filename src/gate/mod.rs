//! Access gates for protected views
//!
//! A gate looks at the session and, for role gates, the cached membership
//! of the ambient commune, and either lets the child render or says what to
//! show instead. Gates stack: the outermost gate is checked first and the
//! child renders only when every gate allows.

mod guard;
mod policy;

pub use guard::{Guarded, Rendered, View};
pub use policy::Route;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::membership::{FetchStatus, MembershipCache};
use crate::role::{satisfies, Role};

/// Where gates send users they turn away
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRoutes {
    /// Sign-in entry point
    pub sign_in: String,
    /// Default landing location for signed-in users
    pub landing: String,
}

impl Default for GateRoutes {
    fn default() -> Self {
        Self {
            sign_in: "/login".to_string(),
            landing: "/".to_string(),
        }
    }
}

/// Everything a gate may consult
pub struct GateContext<'a> {
    pub cache: &'a Arc<MembershipCache>,
    pub routes: &'a GateRoutes,
    /// Ambient commune, if the view is inside one
    pub commune_id: Option<String>,
    /// Location the user asked for
    pub location: String,
}

impl<'a> GateContext<'a> {
    pub fn new(
        cache: &'a Arc<MembershipCache>,
        routes: &'a GateRoutes,
        location: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            routes,
            commune_id: None,
            location: location.into(),
        }
    }

    pub fn in_commune(mut self, commune_id: impl Into<String>) -> Self {
        self.commune_id = Some(commune_id.into());
        self
    }

    /// Context for navigating to `route`
    pub fn for_route(
        cache: &'a Arc<MembershipCache>,
        routes: &'a GateRoutes,
        route: &Route,
    ) -> Self {
        Self {
            cache,
            routes,
            commune_id: route.commune_id().map(str::to_string),
            location: route.path(),
        }
    }
}

/// Navigation instruction issued by a gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub to: String,
    /// Location to come back to after signing in
    pub return_to: Option<String>,
}

/// Why a role gate refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    InsufficientRole { required: Role, actual: Role },
    /// Membership could not be looked up ("unable to verify access")
    VerificationFailed(String),
    /// Role gate used outside a commune
    NoCommune,
}

/// Outcome of evaluating a gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(Redirect),
    /// Membership lookup still pending
    Loading,
    Denied(Denial),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }
}

/// Guard variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    /// Requires a session; otherwise redirects to sign-in
    Session,
    /// Requires no session; otherwise redirects to the landing location
    InverseSession,
    /// Requires at least this role in the ambient commune
    Role(Role),
}

impl Gate {
    /// Synchronous check against the current session and cache state
    pub fn evaluate(&self, ctx: &GateContext<'_>) -> GateDecision {
        let signed_in = ctx.cache.has_session();

        match self {
            Gate::Session | Gate::Role(_) if !signed_in => GateDecision::Redirect(Redirect {
                to: ctx.routes.sign_in.clone(),
                return_to: Some(ctx.location.clone()),
            }),
            Gate::Session => GateDecision::Allow,
            Gate::InverseSession if signed_in => GateDecision::Redirect(Redirect {
                to: ctx.routes.landing.clone(),
                return_to: None,
            }),
            Gate::InverseSession => GateDecision::Allow,
            Gate::Role(minimum) => {
                let Some(commune_id) = ctx.commune_id.as_deref() else {
                    return GateDecision::Denied(Denial::NoCommune);
                };
                match ctx.cache.status(commune_id) {
                    FetchStatus::Unfetched | FetchStatus::Loading => GateDecision::Loading,
                    FetchStatus::Failed => GateDecision::Denied(Denial::VerificationFailed(
                        ctx.cache.failure(commune_id).unwrap_or_default(),
                    )),
                    FetchStatus::Loaded => {
                        let actual = ctx.cache.get_role(commune_id);
                        if satisfies(actual, *minimum) {
                            GateDecision::Allow
                        } else {
                            GateDecision::Denied(Denial::InsufficientRole {
                                required: *minimum,
                                actual,
                            })
                        }
                    }
                }
            }
        }
    }

    /// Start whatever lookups the gate depends on and wait for them
    pub async fn prepare(&self, ctx: &GateContext<'_>) {
        if let (Gate::Role(_), Some(commune_id)) = (self, ctx.commune_id.as_deref()) {
            ctx.cache.ensure(commune_id).await;
        }
    }
}
