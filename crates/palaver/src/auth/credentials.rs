//! Login credentials type.

use std::fmt;

/// Login credentials for the chat backend.
///
/// The identifier may be a username or an email address; the backend
/// resolves either.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use palaver::LoginCredentials;
///
/// let creds = LoginCredentials::new("alice", "hunter22");
/// assert_eq!(creds.identifier(), "alice");
/// ```
#[derive(Clone)]
pub struct LoginCredentials {
    identifier: String,
    password: String,
}

impl LoginCredentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// Returns the identifier (username or email).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the password. Never log or display this value.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
