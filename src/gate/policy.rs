//! Gate policy per application route
//!
//! Unknown routes are not representable; every route states its gates here.

use serde::{Deserialize, Serialize};

use super::Gate;
use crate::role::Role;

/// Application routes that views are mounted on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    // Public
    Home,
    Profile { username: String },
    AllCommunes,
    ViewCommune { commune_id: String },
    CommunePosts { commune_id: String },
    CommuneLists { commune_id: String },
    CommuneEvents { commune_id: String },
    ViewPost { commune_id: String, post_id: String },
    ViewList { commune_id: String, list_id: String },

    // Sign-in views, only for visitors
    Login,
    Register,

    // Signed-in users
    UserCommunes,
    EditProfile,
    CreateCommune,
    EditCommune { commune_id: String },
    CreatePost { commune_id: String },
    CreateList { commune_id: String },
    EditPost { commune_id: String, post_id: String },
    EditEvent { commune_id: String, event_id: String },

    // Moderators and admins
    CreateEvent { commune_id: String },
}

impl Route {
    /// Gates guarding this route, outermost first
    pub fn gates(&self) -> Vec<Gate> {
        match self {
            Route::Home
            | Route::Profile { .. }
            | Route::AllCommunes
            | Route::ViewCommune { .. }
            | Route::CommunePosts { .. }
            | Route::CommuneLists { .. }
            | Route::CommuneEvents { .. }
            | Route::ViewPost { .. }
            | Route::ViewList { .. } => vec![],

            Route::Login | Route::Register => vec![Gate::InverseSession],

            Route::UserCommunes
            | Route::EditProfile
            | Route::CreateCommune
            | Route::EditCommune { .. }
            | Route::CreatePost { .. }
            | Route::CreateList { .. }
            | Route::EditPost { .. }
            | Route::EditEvent { .. } => vec![Gate::Session],

            Route::CreateEvent { .. } => vec![Gate::Session, Gate::Role(Role::Moderator)],
        }
    }

    /// Minimum commune role, if the route has a role gate
    pub fn required_role(&self) -> Option<Role> {
        self.gates().into_iter().find_map(|gate| match gate {
            Gate::Role(role) => Some(role),
            _ => None,
        })
    }

    /// Commune the route is scoped to
    pub fn commune_id(&self) -> Option<&str> {
        match self {
            Route::ViewCommune { commune_id }
            | Route::CommunePosts { commune_id }
            | Route::CommuneLists { commune_id }
            | Route::CommuneEvents { commune_id }
            | Route::ViewPost { commune_id, .. }
            | Route::ViewList { commune_id, .. }
            | Route::EditCommune { commune_id }
            | Route::CreatePost { commune_id }
            | Route::CreateList { commune_id }
            | Route::EditPost { commune_id, .. }
            | Route::EditEvent { commune_id, .. }
            | Route::CreateEvent { commune_id } => Some(commune_id),
            _ => None,
        }
    }

    /// Location string for redirects
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Profile { username } => format!("/profile/{}", username),
            Route::AllCommunes => "/commune".to_string(),
            Route::ViewCommune { commune_id } => format!("/commune/{}", commune_id),
            Route::CommunePosts { commune_id } => format!("/commune/{}/posts", commune_id),
            Route::CommuneLists { commune_id } => format!("/commune/{}/lists", commune_id),
            Route::CommuneEvents { commune_id } => format!("/commune/{}/events", commune_id),
            Route::ViewPost {
                commune_id,
                post_id,
            } => format!("/commune/{}/post/{}", commune_id, post_id),
            Route::ViewList {
                commune_id,
                list_id,
            } => format!("/commune/{}/list/{}", commune_id, list_id),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::UserCommunes => "/usercommunes".to_string(),
            Route::EditProfile => "/editprofile".to_string(),
            Route::CreateCommune => "/createcommune".to_string(),
            Route::EditCommune { commune_id } => format!("/editcommune/{}", commune_id),
            Route::CreatePost { commune_id } => format!("/commune/create/{}/post", commune_id),
            Route::CreateList { commune_id } => format!("/commune/create/{}/list", commune_id),
            Route::EditPost {
                commune_id,
                post_id,
            } => format!("/commune/edit/{}/{}/post", commune_id, post_id),
            Route::EditEvent {
                commune_id,
                event_id,
            } => format!("/commune/edit/{}/{}/event", commune_id, event_id),
            Route::CreateEvent { commune_id } => format!("/commune/create/{}/event", commune_id),
        }
    }
}
