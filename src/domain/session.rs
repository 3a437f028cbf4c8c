//! Per-connection session state.
//!
//! ```text
//! Connected --register/login ok--> Identified{logged_in: true}
//! Identified --change_password ok--> Identified{logged_in: false}
//! any --socket closed / error / shutdown--> Closed
//! ```
//!
//! A [`Session`] is owned by exactly one connection worker. The registry
//! only ever holds [`ConnectionEntry`] snapshots built from it.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};

use super::ConnectionId;
use super::connection::{ConnectionEntry, Outbound};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted, not yet registered or logged in.
    Connected,
    /// Registered as a device or logged in as an operator.
    Identified {
        /// Registered device (`true`) or operator (`false`).
        is_device: bool,
        /// Cleared by a successful password change.
        logged_in: bool,
    },
    /// Socket closed; terminal.
    Closed,
}

/// State of one accepted socket.
#[derive(Debug)]
pub struct Session {
    conn: ConnectionId,
    id: String,
    address: SocketAddr,
    device_type: String,
    connected_at: DateTime<Utc>,
    outbound: Outbound,
    state: SessionState,
}

impl Session {
    /// Creates a session for a freshly accepted socket, identified by a
    /// placeholder endpoint id.
    #[must_use]
    pub fn new(address: SocketAddr, outbound: Outbound) -> Self {
        let conn = ConnectionId::new();
        Self {
            conn,
            id: conn.placeholder(),
            address,
            device_type: String::new(),
            connected_at: Utc::now(),
            outbound,
            state: SessionState::Connected,
        }
    }

    /// Socket identity.
    #[must_use]
    pub const fn conn(&self) -> ConnectionId {
        self.conn
    }

    /// Current endpoint id (placeholder until identified).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Peer transport address.
    #[must_use]
    pub const fn address(&self) -> SocketAddr {
        self.address
    }

    /// Device category, empty for operators.
    #[must_use]
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Handle to this socket's outbound queue.
    #[must_use]
    pub const fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    /// `true` after a successful register/login not yet revoked by a
    /// password change.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::Identified { logged_in: true, .. })
    }

    /// `true` after a successful register.
    #[must_use]
    pub const fn is_device(&self) -> bool {
        matches!(self.state, SessionState::Identified { is_device: true, .. })
    }

    /// Builds the registry entry this session would have once identified
    /// as `id`.
    #[must_use]
    pub fn candidate_entry(&self, id: &str, is_device: bool, device_type: &str) -> ConnectionEntry {
        ConnectionEntry {
            id: id.to_string(),
            owner: self.conn,
            address: self.address,
            is_device,
            device_type: device_type.to_string(),
            logged_in: true,
            online: true,
            connected_at: self.connected_at,
            last_seen: Utc::now(),
            outbound: Some(self.outbound.clone()),
        }
    }

    /// Moves to `Identified` under `id` with a fresh login.
    pub fn identify(&mut self, id: &str, is_device: bool, device_type: &str) {
        self.id = id.to_string();
        self.device_type = device_type.to_string();
        self.state = SessionState::Identified {
            is_device,
            logged_in: true,
        };
    }

    /// Clears the login flag, keeping the session identified.
    pub fn require_login(&mut self) {
        if let SessionState::Identified { is_device, .. } = self.state {
            self.state = SessionState::Identified {
                is_device,
                logged_in: false,
            };
        }
    }

    /// Moves to the terminal `Closed` state.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}
