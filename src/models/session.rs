use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::AppError;

/// The default route for participants and anonymous visitors.
pub const DEFAULT_PROFILE_ROUTE: &str = "/profile";

/// The kind of account a session belongs to.
///
/// Serialized with the names the marketplace API and the persisted
/// `userType` entry use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserType {
    #[serde(rename = "Participant")]
    Participant,
    #[serde(rename = "Service Provider")]
    ServiceProvider,
    #[serde(rename = "College")]
    College,
    #[serde(rename = "admin")]
    Admin,
}

impl UserType {
    /// The name persisted and shown to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Participant => "Participant",
            UserType::ServiceProvider => "Service Provider",
            UserType::College => "College",
            UserType::Admin => "admin",
        }
    }

    /// The API path segment owning this account type's endpoints.
    pub fn endpoint_segment(&self) -> &'static str {
        match self {
            UserType::Participant => "participants",
            UserType::ServiceProvider => "serviceProviders",
            UserType::College => "college",
            UserType::Admin => "admin",
        }
    }

    /// The key under which the login response nests the account profile.
    pub fn entity_key(&self) -> Option<&'static str> {
        match self {
            UserType::Participant => Some("participant"),
            UserType::ServiceProvider => Some("serviceProvider"),
            UserType::College => Some("college"),
            UserType::Admin => None,
        }
    }

    /// Whether the API exposes `GET /{segment}/authenticate` for this type.
    pub fn has_authenticate_endpoint(&self) -> bool {
        !matches!(self, UserType::College)
    }
}

impl FromStr for UserType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Participant" => Ok(UserType::Participant),
            "Service Provider" | "ServiceProvider" => Ok(UserType::ServiceProvider),
            "College" => Ok(UserType::College),
            "admin" | "Admin" => Ok(UserType::Admin),
            other => Err(AppError::Authentication(format!("Invalid user type: {}", other))),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Maps a user type to the route its profile lives at.
pub fn profile_route(user_type: Option<UserType>) -> &'static str {
    match user_type {
        Some(UserType::ServiceProvider) => "/dashboard/service_provider",
        Some(UserType::Admin) => "/dashboard/admin",
        Some(UserType::College) => "/dashboard/college",
        Some(UserType::Participant) | None => DEFAULT_PROFILE_ROUTE,
    }
}

/// The in-memory authentication state.
///
/// Only replaced as a whole, so token, user type, profile and route never
/// disagree. The route is derived from the user type.
#[derive(Clone, Default)]
pub struct Session {
    token: Option<Zeroizing<String>>,
    user_type: Option<UserType>,
    user: Option<sonic_rs::Value>,
}

impl Session {
    /// An unauthenticated session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session for a logged-in account.
    pub fn authenticated(token: String, user_type: UserType, user: Option<sonic_rs::Value>) -> Self {
        Self {
            token: Some(Zeroizing::new(token)),
            user_type: Some(user_type),
            user,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.as_str())
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.user_type
    }

    pub fn user(&self) -> Option<&sonic_rs::Value> {
        self.user.as_ref()
    }

    pub fn profile_route(&self) -> &'static str {
        profile_route(self.user_type)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_type", &self.user_type)
            .field("profile_route", &self.profile_route())
            .finish()
    }
}
