//! Authenticated HTTP client.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::{AccessToken, CredentialPair, RefreshToken};
use crate::error::{AuthError, Error, TransportError};
use crate::navigation::{self, Navigator, NoopNavigator};
use crate::store::{CredentialStore, MemoryStore};

use super::config::ClientConfig;
use super::coordinator::{RefreshCoordinator, RefreshOutcome};
use super::endpoints::{RefreshRequest, RefreshResponse};
use super::request::ApiRequest;
use super::response::{self, ApiResponse};

/// HTTP client that attaches the stored bearer credential to every request
/// and transparently refreshes it when the backend rejects it.
///
/// Cheap to clone; clones share the credential store and the refresh
/// coordinator, so concurrent requests from any clone trigger at most one
/// refresh call.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use palaver::{ApiClient, BaseUrl, ClientConfig, MemoryStore};
///
/// # async fn example() -> Result<(), palaver::Error> {
/// let config = ClientConfig::new(BaseUrl::new("https://chat.example.com")?);
/// let client = ApiClient::builder(config)
///     .store(Arc::new(MemoryStore::new()))
///     .build()?;
///
/// let me: serde_json::Value = client.get("/api/auth/me/").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    coordinator: RefreshCoordinator,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn CredentialStore>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ApiClientBuilder {
    /// Credential store to read and write the session from. Defaults to a [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Routing hook used when a session is terminated. Defaults to [`NoopNavigator`].
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn build(self) -> Result<ApiClient, Error> {
        let http = reqwest::Client::builder()
            .user_agent(self.config.user_agent.clone())
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| TransportError::Setup {
                message: e.to_string(),
            })?;

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http,
                config: self.config,
                store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
                navigator: self.navigator.unwrap_or_else(|| Arc::new(NoopNavigator)),
                coordinator: RefreshCoordinator::new(),
            }),
        })
    }
}

impl ApiClient {
    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            store: None,
            navigator: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    /// Perform one logical call, refreshing the credential once if it was rejected.
    ///
    /// A 401 from the login or refresh endpoint is returned as an API error
    /// without attempting a refresh.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] when no response was obtained
    /// - [`Error::Auth`] when the credential could not be refreshed; the
    ///   session has been terminated by the time this is returned
    /// - [`Error::Api`] for any other non-2xx response
    #[instrument(skip(self, request), fields(method = %request.method(), endpoint = request.endpoint()))]
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        let sent_with = self.inner.store.load()?.map(|pair| pair.access);
        if sent_with.is_none() {
            debug!("No stored credential; sending unauthenticated");
        }

        let response = self.send(request, sent_with.as_ref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED
            || self.inner.config.endpoints.is_refresh_exempt(request.endpoint())
        {
            return response::decode(response).await;
        }

        debug!("Access credential rejected");
        let token = self
            .inner
            .coordinator
            .refresh(
                || self.fresher_access(sent_with.as_ref()),
                || self.refresh_access(),
            )
            .await?;

        debug!("Replaying request with refreshed credential");
        let replay = self.send(request, Some(&token)).await?;
        response::decode(replay).await
    }

    /// GET `endpoint` and decode the body.
    pub async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R, Error> {
        self.execute(&ApiRequest::get(endpoint)).await?.json()
    }

    /// POST a JSON body and decode the response body.
    pub async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.execute(&ApiRequest::post(endpoint).json(body)?)
            .await?
            .json()
    }

    /// PATCH a JSON body and decode the response body.
    pub async fn patch<B, R>(&self, endpoint: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.execute(&ApiRequest::patch(endpoint).json(body)?)
            .await?
            .json()
    }

    /// DELETE `endpoint`, discarding any body.
    pub async fn delete(&self, endpoint: &str) -> Result<(), Error> {
        self.execute(&ApiRequest::delete(endpoint)).await?;
        Ok(())
    }

    /// Store a freshly issued pair, dropping any legacy keys first.
    pub fn store_credentials(&self, pair: &CredentialPair) -> Result<(), Error> {
        self.inner.store.clear()?;
        self.inner.store.save(pair)?;
        Ok(())
    }

    /// Clear both credentials and legacy keys without navigating.
    pub fn clear_credentials(&self) -> Result<(), Error> {
        self.inner.store.clear()?;
        Ok(())
    }

    /// Clear the session and route the caller to the login surface.
    ///
    /// Navigation is skipped while the caller is on a public route.
    pub fn terminate_session(&self) {
        if let Err(e) = self.inner.store.clear() {
            error!(error = %e, "Failed to clear credentials");
        }
        if navigation::redirect_to_login(self.inner.navigator.as_ref()) {
            info!("Session terminated; redirected to login");
        } else {
            info!("Session terminated");
        }
    }

    async fn send(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.inner.config.base_url.endpoint_url(request.endpoint());
        let response = request.build(&self.inner.http, &url, token)?.send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// A stored access token newer than the one a rejected request carried.
    fn fresher_access(&self, sent_with: Option<&AccessToken>) -> Option<AccessToken> {
        let current = match self.inner.store.load() {
            Ok(pair) => pair?.access,
            Err(e) => {
                warn!(error = %e, "Failed to read credentials");
                return None;
            }
        };
        (Some(&current) != sent_with).then_some(current)
    }

    /// Run one refresh against the backend, escalating on any failure.
    async fn refresh_access(&self) -> RefreshOutcome {
        let outcome = self.try_refresh().await;
        match &outcome {
            Ok(_) => info!("Access credential refreshed"),
            Err(e) => {
                warn!(error = %e, "Refresh failed; terminating session");
                self.terminate_session();
            }
        }
        outcome
    }

    #[instrument(skip(self))]
    async fn try_refresh(&self) -> RefreshOutcome {
        let pair = match self.inner.store.load() {
            Ok(Some(pair)) => pair,
            Ok(None) => return Err(AuthError::Unauthorized),
            Err(e) => {
                warn!(error = %e, "Failed to read credentials");
                return Err(AuthError::Unauthorized);
            }
        };

        let url = self
            .inner
            .config
            .base_url
            .endpoint_url(&self.inner.config.endpoints.refresh);
        let body = RefreshRequest {
            refresh: pair.refresh.as_str(),
        };

        let response = self
            .inner
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed {
                message: TransportError::from(e).to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::RefreshRejected {
                status: status.as_u16(),
                body: response.json::<Value>().await.ok(),
            });
        }

        let refreshed: RefreshResponse =
            response.json().await.map_err(|e| AuthError::RefreshFailed {
                message: e.to_string(),
            })?;

        let access = AccessToken::new(refreshed.access);
        let next = match refreshed.refresh {
            Some(refresh) => CredentialPair::new(access.clone(), RefreshToken::new(refresh)),
            None => pair.with_access(access.clone()),
        };

        let stored = self
            .inner
            .store
            .replace_if(&pair.refresh, &next)
            .map_err(|e| AuthError::RefreshFailed {
                message: e.to_string(),
            })?;
        if stored {
            return Ok(access);
        }

        // The session changed while the refresh was in flight; it wins.
        match self.inner.store.load() {
            Ok(Some(current)) => {
                debug!("Session replaced during refresh; using its credential");
                Ok(current.access)
            }
            Ok(None) => {
                info!("Session cleared during refresh; discarding refreshed credential");
                Err(AuthError::Unauthorized)
            }
            Err(e) => Err(AuthError::RefreshFailed {
                message: e.to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url)
            .field("refreshing", &self.inner.coordinator.is_refreshing())
            .finish()
    }
}
