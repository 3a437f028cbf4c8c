//! Type-safe connection identifier.
//!
//! [`ConnectionId`] is a newtype wrapper around [`uuid::Uuid`] (v4). Every
//! accepted socket gets one, independent of the endpoint id the peer later
//! claims, so registry entries can tell which live socket owns them.

use std::fmt;

/// Length of the hex prefix used in placeholder endpoint ids.
const PLACEHOLDER_HEX_LEN: usize = 8;

/// Unique identifier for one accepted socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Endpoint id used before the peer registers or logs in
    /// (`tmp_` + the first eight hex digits).
    #[must_use]
    pub fn placeholder(&self) -> String {
        let simple = self.0.simple().to_string();
        let prefix = simple.get(..PLACEHOLDER_HEX_LEN).unwrap_or(&simple);
        format!("tmp_{prefix}")
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
