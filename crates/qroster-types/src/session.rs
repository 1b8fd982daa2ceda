//! Signed-in administrator and remote reachability state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::school::School;

/// User id given to sessions synthesized by the offline fallback.
pub const LOCAL_SESSION_ID: &str = "local-session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(rename = "superadmin")]
    SuperAdmin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Admin => "admin",
            Self::SuperAdmin => "superadmin",
        })
    }
}

/// Which part of the roster a session may read and edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "area", rename_all = "snake_case")]
pub enum Scope {
    AllRegions,
    Region(String),
    /// The email is not in the admin lookup; nothing is visible.
    Unassigned,
}

impl Scope {
    pub fn admits(&self, school: &School) -> bool {
        match self {
            Self::AllRegions => true,
            Self::Region(area) => school.area_id == *area,
            Self::Unassigned => false,
        }
    }

    pub fn area_id(&self) -> Option<&str> {
        match self {
            Self::Region(area) => Some(area),
            Self::AllRegions | Self::Unassigned => None,
        }
    }
}

/// An authenticated (or locally synthesized) administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub scope: Scope,
    /// Established without the identity provider; remote writes are skipped.
    #[serde(default)]
    pub local_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Session {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn can_access(&self, school: &School) -> bool {
        self.scope.admits(school)
    }
}

/// Remote reachability as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Connecting,
    Connected,
    Offline,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Offline => "offline",
        })
    }
}
