//! Session management for authenticated chat operations.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::client::ApiClient;
use crate::client::endpoints::{
    ChangePasswordRequest, LoginRequest, LoginResponse, LogoutRequest, RegisterRequest,
    RegisterResponse,
};
use crate::error::Error;

use super::credentials::LoginCredentials;
use super::tokens::{AccessToken, CredentialPair, RefreshToken};

/// An account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Whether the user has chosen a display name yet.
    #[serde(default)]
    pub name_set: bool,
}

/// A partial profile update. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.name.is_none()
    }
}

/// The signed-in user's session.
///
/// Wraps an [`ApiClient`] and keeps the current [`User`] alongside the
/// credentials held by the client's store.
///
/// # Example
///
/// ```no_run
/// use palaver::{ApiClient, BaseUrl, ClientConfig, LoginCredentials, Session};
///
/// # async fn example() -> Result<(), palaver::Error> {
/// let config = ClientConfig::new(BaseUrl::new("https://chat.example.com")?);
/// let session = Session::new(ApiClient::builder(config).build()?);
///
/// let user = session.login(LoginCredentials::new("alice", "hunter22")).await?;
/// println!("Logged in as: {}", user.username);
/// # Ok(())
/// # }
/// ```
pub struct Session {
    client: ApiClient,
    user: RwLock<Option<User>>,
}

impl Session {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            user: RwLock::new(None),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// The cached user, if signed in.
    pub async fn user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    /// Authenticate and persist the issued credential pair.
    ///
    /// # Errors
    ///
    /// Rejected credentials come back as [`Error::Api`] with field errors
    /// (`identifier`, `password`, `general`) for form display.
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    pub async fn login(&self, credentials: LoginCredentials) -> Result<User, Error> {
        info!("Logging in");

        let request = LoginRequest {
            username: credentials.identifier(),
            password: credentials.password(),
        };
        let endpoint = &self.client.config().endpoints.login;
        let response: LoginResponse = self.client.post(endpoint, &request).await?;

        self.client.store_credentials(&CredentialPair::new(
            AccessToken::new(response.access),
            RefreshToken::new(response.refresh),
        ))?;

        debug!(user_id = response.user.id, "Logged in");
        *self.user.write().await = Some(response.user.clone());
        Ok(response.user)
    }

    /// Create an account. The new account is not signed in.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User, Error> {
        info!("Registering account");

        let request = RegisterRequest {
            username,
            email,
            password,
            confirm_password: password,
        };
        let endpoint = &self.client.config().endpoints.register;
        let response: RegisterResponse = self.client.post(endpoint, &request).await?;
        Ok(response.user)
    }

    /// Resolve the stored session into a user, as done once at start-up.
    ///
    /// Returns `Ok(None)` for an anonymous session, and clears the stored
    /// credentials when the backend no longer accepts them.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<User>, Error> {
        if self.client.store().load()?.is_none() {
            debug!("No stored session");
            return Ok(None);
        }

        let endpoint = &self.client.config().endpoints.me;
        match self.client.get::<User>(endpoint).await {
            Ok(user) => {
                debug!(user_id = user.id, "Session restored");
                *self.user.write().await = Some(user.clone());
                Ok(Some(user))
            }
            Err(e) if e.is_auth_failure() => {
                info!(error = %e, "Stored session rejected");
                self.client.clear_credentials()?;
                *self.user.write().await = None;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Sign out. The server-side invalidation is best-effort; local
    /// credentials are always cleared. Safe to call when already signed out.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), Error> {
        info!("Logging out");

        if let Some(pair) = self.client.store().load()? {
            let request = LogoutRequest {
                refresh: pair.refresh.as_str(),
            };
            let endpoint = &self.client.config().endpoints.logout;
            if let Err(e) = self
                .client
                .post::<_, serde_json::Value>(endpoint, &request)
                .await
            {
                warn!(error = %e, "Server-side logout failed");
            }
        }

        *self.user.write().await = None;
        self.client.clear_credentials()
    }

    /// Update the signed-in user's profile.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, Error> {
        let endpoint = &self.client.config().endpoints.profile;
        let user: User = self.client.patch(endpoint, update).await?;
        *self.user.write().await = Some(user.clone());
        Ok(user)
    }

    /// Change the signed-in user's password.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
        confirm_new_password: &str,
    ) -> Result<(), Error> {
        let request = ChangePasswordRequest {
            old_password,
            new_password,
            confirm_new_password,
        };
        let endpoint = &self.client.config().endpoints.change_password;
        self.client
            .post::<_, serde_json::Value>(endpoint, &request)
            .await?;
        info!("Password changed");
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
