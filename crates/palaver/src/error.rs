//! Error types for the palaver client.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, API, storage and input validation errors.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::client::response::{self, FieldErrors};

/// Message surfaced when no response was obtained at all.
pub const CONNECTIVITY_MESSAGE: &str = "Unable to reach the server. Check your connection.";

/// The unified error type for palaver operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout). No response was obtained.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Unrecoverable authorization failures. The session has been terminated.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-2xx responses from the backend.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Input validation errors (base URL, header values, multipart parts).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Credential store failures.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// Request or response payloads that could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(err) => Some(err.status),
            Error::Auth(AuthError::RefreshRejected { status, .. }) => Some(*status),
            Error::Auth(_) => Some(401),
            _ => None,
        }
    }

    /// Human-readable message suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            Error::Transport(_) => CONNECTIVITY_MESSAGE.to_string(),
            Error::Api(err) => err.message.clone(),
            Error::Auth(AuthError::RefreshRejected {
                body: Some(body), ..
            }) => response::error_message(body),
            Error::Auth(err) => err.to_string(),
            other => other.to_string(),
        }
    }

    /// Field-keyed validation errors, when the backend returned any.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Error::Api(err) => err.field_errors(),
            _ => None,
        }
    }

    /// Whether this error means the caller is (no longer) authenticated.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Error::Auth(_) => true,
            Error::Api(err) => err.status == 401,
            _ => false,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {message}")]
    Setup { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::from(err))
    }
}

/// Authorization failures that could not be recovered by a refresh.
///
/// Cloneable so one refresh outcome can be fanned out to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// A 401 was received and there was no refresh credential to use.
    #[error("Unauthorized")]
    Unauthorized,

    /// The backend rejected the refresh credential.
    #[error("Refresh failed (HTTP {status})")]
    RefreshRejected {
        status: u16,
        /// Decoded error body of the refresh response, if it carried JSON.
        body: Option<Value>,
    },

    /// The refresh call could not be completed.
    #[error("Refresh failed: {message}")]
    RefreshFailed { message: String },

    /// The request driving the refresh was dropped before it finished.
    #[error("Refresh abandoned")]
    RefreshAbandoned,
}

/// A non-2xx response from the backend.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Decoded error body, if the response carried JSON.
    pub body: Option<Value>,
    /// Normalized human-readable message.
    pub message: String,
}

impl ApiError {
    /// Build an error from a status and an optional decoded body.
    pub fn new(status: u16, body: Option<Value>) -> Self {
        let message = match &body {
            Some(value) => response::error_message(value),
            None => response::UNEXPECTED_ERROR.to_string(),
        };
        Self {
            status,
            body,
            message,
        }
    }

    /// Field-keyed errors from the body, if it was a field map.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        self.body
            .as_ref()
            .map(response::field_errors)
            .filter(|errors| !errors.is_empty())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid backend base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// Header name or value that cannot be sent.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Multipart part that cannot be built.
    #[error("invalid multipart part '{name}': {reason}")]
    Multipart { name: String, reason: String },
}

/// Credential store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data could not be parsed or written.
    #[error("corrupt credential data: {0}")]
    Corrupt(String),
}
