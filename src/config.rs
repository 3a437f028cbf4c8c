//! Hub configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).
//!
//! | Variable              | Default        |
//! |-----------------------|----------------|
//! | `HUB_LISTEN_ADDR`     | `0.0.0.0:6666` |
//! | `HUB_ADMIN_ADDR`      | unset (admin API disabled) |
//! | `HUB_MAX_CONNECTIONS` | `10`           |
//! | `HUB_ADMIN_PASSWORD`  | `admin`        |
//! | `HUB_SESSION_TOKEN`   | `token123`     |
//! | `HUB_MAX_FRAME_BYTES` | `4096`         |
//! | `HUB_OUTBOUND_QUEUE`  | `256`          |
//! | `HUB_SERVER_ID`       | `server`       |

use std::fmt;
use std::net::SocketAddr;

use crate::domain::credential::DEFAULT_ADMIN_PASSWORD;
use crate::error::HubError;

/// Default envelope listener address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:6666";

/// Default registry capacity.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// Default maximum envelope line length in bytes.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4096;

/// Default per-connection outbound queue depth.
pub const DEFAULT_OUTBOUND_QUEUE: usize = 256;

const DEFAULT_SESSION_TOKEN: &str = "token123";
const DEFAULT_SERVER_ID: &str = "server";

/// Top-level hub configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Clone)]
pub struct HubConfig {
    /// Socket address of the envelope listener.
    pub listen_addr: SocketAddr,

    /// Socket address of the admin HTTP API, if enabled.
    pub admin_addr: Option<SocketAddr>,

    /// Registry capacity.
    pub max_connections: usize,

    /// Initial admin credential.
    pub admin_password: String,

    /// Opaque token returned on successful login.
    pub session_token: String,

    /// Maximum envelope line length in bytes.
    pub max_frame_bytes: usize,

    /// Per-connection outbound queue depth.
    pub outbound_queue: usize,

    /// `from` of server-originated envelopes.
    pub server_id: String,
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Config`] if `HUB_LISTEN_ADDR` or
    /// `HUB_ADMIN_ADDR` is set but cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, HubError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup. Missing or
    /// unparsable numeric values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Config`] if a listen address is set but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HubError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = parse_addr(
            "HUB_LISTEN_ADDR",
            &lookup("HUB_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
        )?;

        let admin_addr = match lookup("HUB_ADMIN_ADDR") {
            Some(raw) if !raw.trim().is_empty() => Some(parse_addr("HUB_ADMIN_ADDR", &raw)?),
            _ => None,
        };

        Ok(Self {
            listen_addr,
            admin_addr,
            max_connections: parse_or(&lookup, "HUB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            admin_password: lookup("HUB_ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            session_token: lookup("HUB_SESSION_TOKEN")
                .unwrap_or_else(|| DEFAULT_SESSION_TOKEN.to_string()),
            max_frame_bytes: parse_or(&lookup, "HUB_MAX_FRAME_BYTES", DEFAULT_MAX_FRAME_BYTES),
            outbound_queue: parse_or(&lookup, "HUB_OUTBOUND_QUEUE", DEFAULT_OUTBOUND_QUEUE),
            server_id: lookup("HUB_SERVER_ID").unwrap_or_else(|| DEFAULT_SERVER_ID.to_string()),
        })
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 6666)),
            admin_addr: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            session_token: DEFAULT_SESSION_TOKEN.to_string(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
            server_id: DEFAULT_SERVER_ID.to_string(),
        }
    }
}

impl fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubConfig")
            .field("listen_addr", &self.listen_addr)
            .field("admin_addr", &self.admin_addr)
            .field("max_connections", &self.max_connections)
            .field("admin_password", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("max_frame_bytes", &self.max_frame_bytes)
            .field("outbound_queue", &self.outbound_queue)
            .field("server_id", &self.server_id)
            .finish()
    }
}

fn parse_addr(key: &str, raw: &str) -> Result<SocketAddr, HubError> {
    raw.trim()
        .parse()
        .map_err(|e| HubError::Config(format!("{key}={raw:?}: {e}")))
}

/// Parses a value as `T`, returning `default` on missing or invalid input.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<HubConfig, HubError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        HubConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_legacy_values() {
        let Ok(config) = load(&[]) else {
            panic!("empty environment should load");
        };
        assert_eq!(config.listen_addr.port(), 6666);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.admin_password, "admin");
        assert_eq!(config.session_token, "token123");
        assert_eq!(config.max_frame_bytes, 4096);
        assert_eq!(config.server_id, "server");
        assert!(config.admin_addr.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let Ok(config) = load(&[
            ("HUB_LISTEN_ADDR", "127.0.0.1:7000"),
            ("HUB_ADMIN_ADDR", "127.0.0.1:7001"),
            ("HUB_MAX_CONNECTIONS", "50"),
            ("HUB_ADMIN_PASSWORD", "hunter2"),
        ]) else {
            panic!("valid environment should load");
        };
        assert_eq!(config.listen_addr.port(), 7000);
        assert_eq!(config.admin_addr.map(|a| a.port()), Some(7001));
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.admin_password, "hunter2");
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let Ok(config) = load(&[("HUB_MAX_CONNECTIONS", "lots"), ("HUB_OUTBOUND_QUEUE", "-1")])
        else {
            panic!("numeric fallbacks should not fail");
        };
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.outbound_queue, 256);
    }

    #[test]
    fn invalid_listen_addr_is_an_error() {
        assert!(matches!(
            load(&[("HUB_LISTEN_ADDR", "not-an-addr")]),
            Err(HubError::Config(_))
        ));
    }

    #[test]
    fn blank_admin_addr_disables_admin_api() {
        let Ok(config) = load(&[("HUB_ADMIN_ADDR", "  ")]) else {
            panic!("blank admin addr should load");
        };
        assert!(config.admin_addr.is_none());
    }

    #[test]
    fn debug_redacts_secrets() {
        let Ok(config) = load(&[("HUB_ADMIN_PASSWORD", "hunter2")]) else {
            panic!("config should load");
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
