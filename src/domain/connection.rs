//! Registry entry for one identified endpoint, plus the summaries the hub
//! hands out for device listings and the admin API.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use super::ConnectionId;

/// Handle to a connection's outbound queue.
///
/// The connection's writer task drains the queue onto the socket. Pushing
/// never blocks: a full queue drops the line.
#[derive(Debug, Clone)]
pub struct Outbound(mpsc::Sender<String>);

/// Result of pushing one line onto an [`Outbound`] queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the writer task.
    Queued,
    /// The queue is full; the line was dropped.
    Full,
    /// The writer task is gone; the line was dropped.
    Closed,
}

impl Outbound {
    /// Creates a bounded queue and returns the handle with its receiving end.
    #[must_use]
    pub fn channel(depth: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(depth.max(1));
        (Self(tx), rx)
    }

    /// Queues one encoded envelope (without its trailing newline).
    pub fn push(&self, line: String) -> Delivery {
        match self.0.try_send(line) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Full,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// One known endpoint.
///
/// Entries are snapshots written by the owning connection's worker on
/// register/login; the registry never mutates the worker's own session.
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    /// Endpoint id claimed by the peer.
    pub id: String,
    /// Socket that wrote this entry.
    pub owner: ConnectionId,
    /// Peer transport address.
    pub address: SocketAddr,
    /// `true` for registered devices, `false` for logged-in operators.
    pub is_device: bool,
    /// Free-text device category (empty for operators).
    pub device_type: String,
    /// Authentication flag as of the last update.
    pub logged_in: bool,
    /// `true` while the owning worker is alive.
    pub online: bool,
    /// When the owning socket was accepted.
    pub connected_at: DateTime<Utc>,
    /// Last register/login/heartbeat seen from this endpoint.
    pub last_seen: DateTime<Utc>,
    /// Outbound queue of the owning socket; `None` once offline.
    pub outbound: Option<Outbound>,
}

/// Device listing item, as sent in `list_devices` replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    /// Device endpoint id.
    pub id: String,
    /// Device category.
    #[serde(rename = "type")]
    pub device_type: String,
    /// Device IP address.
    pub ip: String,
}

impl From<&ConnectionEntry> for DeviceSummary {
    fn from(entry: &ConnectionEntry) -> Self {
        Self {
            id: entry.id.clone(),
            device_type: entry.device_type.clone(),
            ip: entry.address.ip().to_string(),
        }
    }
}

/// Full entry view for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionSummary {
    /// Endpoint id.
    pub id: String,
    /// Peer IP address.
    pub address: String,
    /// Peer port.
    pub port: u16,
    /// Registered device or operator.
    pub is_device: bool,
    /// Device category.
    pub device_type: String,
    /// Authentication flag.
    pub logged_in: bool,
    /// Liveness flag.
    pub online: bool,
    /// Accept time.
    pub connected_at: DateTime<Utc>,
    /// Last activity.
    pub last_seen: DateTime<Utc>,
}

impl From<&ConnectionEntry> for ConnectionSummary {
    fn from(entry: &ConnectionEntry) -> Self {
        Self {
            id: entry.id.clone(),
            address: entry.address.ip().to_string(),
            port: entry.address.port(),
            is_device: entry.is_device,
            device_type: entry.device_type.clone(),
            logged_in: entry.logged_in,
            online: entry.online,
            connected_at: entry.connected_at,
            last_seen: entry.last_seen,
        }
    }
}
