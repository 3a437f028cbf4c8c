//! Bounded table of known endpoints, keyed by endpoint id.
//!
//! [`ConnectionRegistry`] is a plain ordered collection with no lock of its
//! own. It lives inside [`crate::service::HubState`], behind the hub's
//! single mutex, so every operation here runs under that lock for its full
//! duration.
//!
//! # Invariants
//!
//! - At most one entry per endpoint id; upsert replaces in place.
//! - Online entries are never evicted. Offline entries keep their slot and
//!   order, and a new id may reclaim the first offline slot when the table
//!   is at capacity.

use chrono::Utc;

use super::ConnectionId;
use super::connection::{ConnectionEntry, ConnectionSummary, DeviceSummary};
use crate::error::HubError;

/// Outcome of a successful [`ConnectionRegistry::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// An entry with the same id was replaced in place.
    Replaced,
    /// A new entry was appended.
    Appended,
    /// A new entry took over an offline slot.
    Reclaimed,
}

/// Ordered, capacity-bounded endpoint table.
#[derive(Debug)]
pub struct ConnectionRegistry {
    entries: Vec<ConnectionEntry>,
    capacity: usize,
}

impl ConnectionRegistry {
    /// Creates an empty registry holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Inserts `entry`, replacing any entry with the same id.
    ///
    /// A new id is appended while there is room. At capacity it takes over
    /// the first offline slot; this reclaim is a protocol change from the
    /// legacy table, which failed as soon as every slot had ever been used.
    ///
    /// On success, any other entry owned by the same socket (a connection
    /// that re-identified under a new id) is marked offline.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::CapacityExceeded`] if the id is new and every
    /// slot is held by an online entry. The table is left untouched.
    pub fn upsert(&mut self, entry: ConnectionEntry) -> Result<Admission, HubError> {
        let owner = entry.owner;
        let id = entry.id.clone();

        let admission = if let Some(slot) = self.entries.iter_mut().find(|e| e.id == entry.id) {
            *slot = entry;
            Admission::Replaced
        } else if self.entries.len() < self.capacity {
            self.entries.push(entry);
            Admission::Appended
        } else if let Some(slot) = self.entries.iter_mut().find(|e| !e.online) {
            *slot = entry;
            Admission::Reclaimed
        } else {
            return Err(HubError::CapacityExceeded {
                capacity: self.capacity,
            });
        };

        for stale in self
            .entries
            .iter_mut()
            .filter(|e| e.owner == owner && e.id != id)
        {
            stale.online = false;
            stale.outbound = None;
        }

        Ok(admission)
    }

    /// Marks the entry for `id` offline if it is still owned by `owner`.
    ///
    /// Returns `true` if an entry was marked. Storage order is unchanged.
    pub fn remove(&mut self, id: &str, owner: ConnectionId) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|e| e.id == id && e.owner == owner)
        {
            Some(entry) if entry.online => {
                entry.online = false;
                entry.outbound = None;
                true
            }
            _ => false,
        }
    }

    /// Returns the first online entry with the given id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ConnectionEntry> {
        self.entries.iter().find(|e| e.online && e.id == id)
    }

    /// Returns the online entry for `id` if it belongs to `owner`.
    pub fn find_owned_mut(
        &mut self,
        id: &str,
        owner: ConnectionId,
    ) -> Option<&mut ConnectionEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.online && e.id == id && e.owner == owner)
    }

    /// Refreshes `last_seen` on the entry for `id` owned by `owner`.
    ///
    /// Returns `true` if the entry exists.
    pub fn touch(&mut self, id: &str, owner: ConnectionId) -> bool {
        match self.find_owned_mut(id, owner) {
            Some(entry) => {
                entry.last_seen = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Returns every online device, in registry order.
    #[must_use]
    pub fn snapshot_devices(&self) -> Vec<DeviceSummary> {
        self.entries
            .iter()
            .filter(|e| e.is_device && e.online)
            .map(DeviceSummary::from)
            .collect()
    }

    /// Returns every entry, online or not, in registry order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ConnectionSummary> {
        self.entries.iter().map(ConnectionSummary::from).collect()
    }

    /// Number of slots in use (online or offline).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no slot is in use.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of online entries.
    #[must_use]
    pub fn online_count(&self) -> usize {
        self.entries.iter().filter(|e| e.online).count()
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashSet;
    use std::net::SocketAddr;

    use super::*;

    fn entry(id: &str, owner: ConnectionId, is_device: bool) -> ConnectionEntry {
        let address: SocketAddr = "192.168.1.20:40000"
            .parse()
            .unwrap_or_else(|_| panic!("valid socket address"));
        let now = Utc::now();
        ConnectionEntry {
            id: id.to_string(),
            owner,
            address,
            is_device,
            device_type: if is_device { "light".to_string() } else { String::new() },
            logged_in: true,
            online: true,
            connected_at: now,
            last_seen: now,
            outbound: None,
        }
    }

    fn device(id: &str) -> ConnectionEntry {
        entry(id, ConnectionId::new(), true)
    }

    #[test]
    fn upsert_appends_new_ids() {
        let mut registry = ConnectionRegistry::new(4);
        assert!(matches!(registry.upsert(device("a")), Ok(Admission::Appended)));
        assert!(matches!(registry.upsert(device("b")), Ok(Admission::Appended)));
        assert_eq!(registry.len(), 2);
        assert!(registry.find("a").is_some());
    }

    #[test]
    fn upsert_same_id_replaces_in_place() {
        let mut registry = ConnectionRegistry::new(4);
        let _ = registry.upsert(device("a"));
        let _ = registry.upsert(device("b"));

        let newer = ConnectionId::new();
        let result = registry.upsert(entry("a", newer, true));
        assert!(matches!(result, Ok(Admission::Replaced)));
        assert_eq!(registry.len(), 2);

        let online_a = registry
            .snapshot()
            .iter()
            .filter(|s| s.id == "a" && s.online)
            .count();
        assert_eq!(online_a, 1);
        let Some(found) = registry.find("a") else {
            panic!("a should be online");
        };
        assert_eq!(found.owner, newer);
    }

    #[test]
    fn capacity_rejects_without_evicting() {
        let mut registry = ConnectionRegistry::new(3);
        for id in ["a", "b", "c"] {
            assert!(registry.upsert(device(id)).is_ok());
        }

        let result = registry.upsert(device("d"));
        assert!(matches!(
            result,
            Err(HubError::CapacityExceeded { capacity: 3 })
        ));
        assert_eq!(registry.len(), 3);
        for id in ["a", "b", "c"] {
            assert!(registry.find(id).is_some(), "{id} was evicted");
        }
        assert!(registry.find("d").is_none());
    }

    #[test]
    fn full_registry_still_accepts_known_ids() {
        let mut registry = ConnectionRegistry::new(1);
        let _ = registry.upsert(device("a"));
        assert!(matches!(registry.upsert(device("a")), Ok(Admission::Replaced)));
    }

    #[test]
    fn offline_slot_is_reclaimed_at_capacity() {
        let mut registry = ConnectionRegistry::new(2);
        let owner_a = ConnectionId::new();
        let _ = registry.upsert(entry("a", owner_a, true));
        let _ = registry.upsert(device("b"));
        assert!(registry.remove("a", owner_a));

        assert!(matches!(registry.upsert(device("c")), Ok(Admission::Reclaimed)));
        assert_eq!(registry.len(), 2);
        let ids: Vec<String> = registry.snapshot().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["c".to_string(), "b".to_string()]);
    }

    #[test]
    fn remove_marks_offline_without_compacting() {
        let mut registry = ConnectionRegistry::new(4);
        let owner = ConnectionId::new();
        let _ = registry.upsert(entry("a", owner, true));
        let _ = registry.upsert(device("b"));

        assert!(registry.remove("a", owner));
        assert!(registry.find("a").is_none());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.online_count(), 1);
        assert!(!registry.remove("a", owner));
    }

    #[test]
    fn remove_ignores_entries_taken_over_by_another_socket() {
        let mut registry = ConnectionRegistry::new(4);
        let old = ConnectionId::new();
        let new = ConnectionId::new();
        let _ = registry.upsert(entry("lamp", old, true));
        let _ = registry.upsert(entry("lamp", new, true));

        assert!(!registry.remove("lamp", old));
        assert!(registry.find("lamp").is_some());
    }

    #[test]
    fn reidentifying_retires_previous_id() {
        let mut registry = ConnectionRegistry::new(4);
        let owner = ConnectionId::new();
        let _ = registry.upsert(entry("first", owner, false));
        let _ = registry.upsert(entry("second", owner, true));

        assert!(registry.find("first").is_none());
        assert!(registry.find("second").is_some());
    }

    #[test]
    fn snapshot_devices_lists_online_devices_only() {
        let mut registry = ConnectionRegistry::new(8);
        let gone = ConnectionId::new();
        let _ = registry.upsert(device("lamp"));
        let _ = registry.upsert(device("fan"));
        let _ = registry.upsert(entry("operator", ConnectionId::new(), false));
        let _ = registry.upsert(entry("old_sensor", gone, true));
        registry.remove("old_sensor", gone);

        let ids: HashSet<String> = registry
            .snapshot_devices()
            .into_iter()
            .map(|d| d.id)
            .collect();
        let expected: HashSet<String> = ["lamp", "fan"].iter().map(|s| (*s).to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn touch_requires_owner() {
        let mut registry = ConnectionRegistry::new(2);
        let owner = ConnectionId::new();
        let _ = registry.upsert(entry("a", owner, true));
        assert!(registry.touch("a", owner));
        assert!(!registry.touch("a", ConnectionId::new()));
        assert!(!registry.touch("missing", owner));
    }

    #[test]
    fn empty_registry() {
        let registry = ConnectionRegistry::new(10);
        assert!(registry.is_empty());
        assert_eq!(registry.capacity(), 10);
        assert!(registry.snapshot_devices().is_empty());
    }
}
