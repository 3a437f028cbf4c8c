//! The single shared admin credential.

use std::fmt;

use crate::error::AuthError;

/// Initial admin password when none is configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Holds the admin credential and validates login / password-change
/// requests against it.
///
/// Not internally synchronized; it sits next to the registry inside
/// [`crate::service::HubState`] under the hub's lock.
pub struct AuthGate {
    credential: String,
}

impl AuthGate {
    /// Creates a gate holding `credential`.
    #[must_use]
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
        }
    }

    /// Returns `true` if `provided` equals the current credential.
    #[must_use]
    pub fn login(&self, provided: &str) -> bool {
        provided == self.credential
    }

    /// Replaces the credential if `old_password` matches the current one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WrongPassword`] on mismatch; the credential is
    /// left unchanged.
    pub fn change_password(
        &mut self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if !self.login(old_password) {
            return Err(AuthError::WrongPassword);
        }
        self.credential = new_password.to_string();
        Ok(())
    }

    /// Returns `true` while the credential is still the built-in default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.credential == DEFAULT_ADMIN_PASSWORD
    }
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_PASSWORD)
    }
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("credential", &"<redacted>")
            .finish()
    }
}
