//! Data Transfer Objects for admin API responses and query parameters.

use serde::{Deserialize, Serialize};

use crate::domain::ConnectionSummary;
use crate::service::HubStats;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the server answers.
    pub status: String,
    /// RFC 3339 server time.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
    /// Online registry entries.
    pub online: usize,
}

/// Query filter for `GET /api/v1/connections`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ConnectionFilter {
    /// Keep only online entries.
    #[serde(default)]
    pub online: bool,
    /// Keep only registered devices.
    #[serde(default)]
    pub devices: bool,
}

impl ConnectionFilter {
    /// Returns `true` if `summary` passes the filter.
    #[must_use]
    pub const fn matches(&self, summary: &ConnectionSummary) -> bool {
        (!self.online || summary.online) && (!self.devices || summary.is_device)
    }
}

/// Response body for `GET /api/v1/connections`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionListResponse {
    /// Matching registry entries, in registry order.
    pub connections: Vec<ConnectionSummary>,
    /// Registry occupancy.
    pub stats: HubStats,
}
