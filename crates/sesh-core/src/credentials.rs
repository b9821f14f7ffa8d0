//! Login credentials type.

use std::fmt;

/// Login credentials for the session endpoint.
///
/// Holds the login (an e-mail address for the news API) and the password.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use sesh_core::Credentials;
///
/// let creds = Credentials::new("alice@example.com", "hunter2");
/// assert_eq!(creds.login(), "alice@example.com");
/// ```
#[derive(Clone)]
pub struct Credentials {
    login: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Returns the login.
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Returns the password.
    ///
    /// Use this only when constructing the authenticate request.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The display name derived from the login: everything before the `@`.
    pub fn display_name(&self) -> &str {
        self.login
            .split_once('@')
            .map(|(name, _)| name)
            .unwrap_or(&self.login)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
