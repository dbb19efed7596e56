//! Backend endpoint paths and request/response types.

use serde::{Deserialize, Serialize};

use crate::auth::User;

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Exchange identifier and password for a credential pair.
pub const LOGIN: &str = "/api/auth/login/";

/// Exchange a refresh token for a new access token.
pub const REFRESH: &str = "/api/auth/refresh/";

/// Invalidate a refresh token server-side.
pub const LOGOUT: &str = "/api/auth/logout/";

/// Resolve the current identity from the access token.
pub const ME: &str = "/api/auth/me/";

/// Create an account.
pub const REGISTER: &str = "/api/auth/register/";

/// Partially update the current user's profile.
pub const PROFILE: &str = "/api/auth/profile/";

/// Change the current user's password.
pub const CHANGE_PASSWORD: &str = "/api/auth/change-password/";

/// Endpoint paths the client depends on. Defaults match the backend's routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub refresh: String,
    pub logout: String,
    pub me: String,
    pub register: String,
    pub profile: String,
    pub change_password: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: LOGIN.to_string(),
            refresh: REFRESH.to_string(),
            logout: LOGOUT.to_string(),
            me: ME.to_string(),
            register: REGISTER.to_string(),
            profile: PROFILE.to_string(),
            change_password: CHANGE_PASSWORD.to_string(),
        }
    }
}

impl Endpoints {
    /// Whether a 401 from this endpoint must never start a refresh.
    pub fn is_refresh_exempt(&self, endpoint: &str) -> bool {
        endpoint == self.login || endpoint == self.refresh
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for login.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response from login.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

/// Request body for refresh.
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response from refresh. `refresh` is present only when the backend rotates it.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Request body for logout.
#[derive(Debug, Serialize)]
pub struct LogoutRequest<'a> {
    pub refresh: &'a str,
}

/// Request body for register.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// Response from register.
#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    pub user: User,
}

/// Request body for change-password.
#[derive(Debug, Serialize)]
pub struct ChangePasswordRequest<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
    pub confirm_new_password: &'a str,
}
