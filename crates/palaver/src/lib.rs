//! palaver - Authenticated API client for the palaver chat backend.
//!
//! Every request goes through an [`ApiClient`], which attaches the stored
//! bearer credential, refreshes it at most once when many requests find it
//! expired at the same time, replays the requests that were waiting, and
//! terminates the session when the refresh itself fails.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use palaver::{ApiClient, BaseUrl, ClientConfig, LoginCredentials, MemoryStore, Session};
//!
//! # async fn example() -> Result<(), palaver::Error> {
//! let config = ClientConfig::new(BaseUrl::new("https://chat.example.com")?);
//! let client = ApiClient::builder(config)
//!     .store(Arc::new(MemoryStore::new()))
//!     .build()?;
//!
//! let session = Session::new(client);
//! session.login(LoginCredentials::new("alice", "hunter22")).await?;
//!
//! if let Some(user) = session.restore().await? {
//!     println!("{} ({})", user.username, user.email);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod navigation;
pub mod store;
pub mod types;

// Re-export primary types at crate root for convenience
pub use auth::{
    AccessToken, CredentialPair, LoginCredentials, ProfileUpdate, RefreshToken, Session, User,
};
pub use client::{
    ApiClient, ApiRequest, ApiResponse, ClientConfig, Endpoints, FieldErrors, MultipartBody,
};
pub use error::Error;
pub use navigation::{Navigator, NoopNavigator};
pub use store::{CredentialStore, MemoryStore};
pub use types::BaseUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
