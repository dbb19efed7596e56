//! Authentication types and session management.
//!
//! Credentials flow through a [`Session`], which keeps the cached user in
//! step with the credential store behind its [`ApiClient`](crate::ApiClient).

mod credentials;
mod session;
mod tokens;

pub use credentials::LoginCredentials;
pub use session::{ProfileUpdate, Session, User};
pub use tokens::{AccessToken, CredentialPair, RefreshToken};
