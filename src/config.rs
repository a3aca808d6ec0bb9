//! Configuration for commune access
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::api::ApiConfig;
use crate::error::{AccessError, Result};
use crate::gate::{GateRoutes, Route};
use crate::session::Session;

/// Commune probe - resolve a user's access to one commune
#[derive(Parser, Debug, Clone)]
#[command(name = "commune-probe")]
#[command(about = "Resolve commune membership, evaluate route gates and print lists")]
pub struct Args {
    /// Commune to inspect
    pub commune_id: String,

    /// Route whose gates are evaluated
    #[arg(long, value_enum, default_value_t = ProbeRoute::CreateEvent)]
    pub route: ProbeRoute,

    /// Base URL of the commune data API
    #[arg(long, env = "COMMUNE_API_URL", default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Data API request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Where session gates send signed-out users
    #[arg(long, env = "SIGN_IN_PATH", default_value = "/login")]
    pub sign_in_path: String,

    /// Where inverse session gates send signed-in users
    #[arg(long, env = "LANDING_PATH", default_value = "/")]
    pub landing_path: String,

    /// Bearer token of the session to probe with (omit to probe as a guest)
    #[arg(long, env = "SESSION_TOKEN")]
    pub session_token: Option<String>,

    /// User id the session token belongs to
    #[arg(long, env = "USER_ID")]
    pub user_id: Option<String>,
}

/// Commune-scoped routes the probe can evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProbeRoute {
    ViewCommune,
    Lists,
    CreatePost,
    CreateList,
    CreateEvent,
    EditCommune,
}

impl ProbeRoute {
    pub fn route(self, commune_id: &str) -> Route {
        let commune_id = commune_id.to_string();
        match self {
            ProbeRoute::ViewCommune => Route::ViewCommune { commune_id },
            ProbeRoute::Lists => Route::CommuneLists { commune_id },
            ProbeRoute::CreatePost => Route::CreatePost { commune_id },
            ProbeRoute::CreateList => Route::CreateList { commune_id },
            ProbeRoute::CreateEvent => Route::CreateEvent { commune_id },
            ProbeRoute::EditCommune => Route::EditCommune { commune_id },
        }
    }
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(AccessError::Config(format!(
                "COMMUNE_API_URL must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }

        if self.request_timeout_ms == 0 {
            return Err(AccessError::Config(
                "REQUEST_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        let unpaired = match (&self.session_token, &self.user_id) {
            (Some(_), None) => "SESSION_TOKEN requires USER_ID",
            (None, Some(_)) => "USER_ID requires SESSION_TOKEN",
            _ => return Ok(()),
        };
        Err(AccessError::Config(unpaired.to_string()))
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn gate_routes(&self) -> GateRoutes {
        GateRoutes {
            sign_in: self.sign_in_path.clone(),
            landing: self.landing_path.clone(),
        }
    }

    /// Session described by the credentials, if any were given
    pub fn session(&self) -> Option<Session> {
        match (&self.user_id, &self.session_token) {
            (Some(user_id), Some(token)) => Some(Session::new(user_id.clone(), token.clone())),
            _ => None,
        }
    }

    pub fn target_route(&self) -> Route {
        self.route.route(&self.commune_id)
    }
}
