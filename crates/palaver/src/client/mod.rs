//! Authenticated request client.
//!
//! This module provides the HTTP client that injects bearer credentials,
//! refreshes them single-flight on a 401, and normalizes error responses.

#[allow(clippy::module_inception)]
mod client;
mod config;
mod coordinator;
pub mod endpoints;
mod request;
pub(crate) mod response;

pub use reqwest::Method;
pub use reqwest::header::{HeaderName, HeaderValue};

pub use client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use coordinator::{RefreshCoordinator, RefreshOutcome};
pub use endpoints::Endpoints;
pub use request::{ApiRequest, MultipartBody, RequestBody};
pub use response::{ApiResponse, FieldErrors, UNEXPECTED_ERROR, error_message, field_errors};
