//! Hub service: the shared server context.
//!
//! [`Hub`] owns the connection registry and the admin credential together
//! behind a single [`tokio::sync::Mutex`]. Every method takes that lock
//! once and holds it for the whole operation, so a credential rotation,
//! a registry upsert and a routing lookup can never interleave.

use tokio::sync::Mutex;

use super::router;
use crate::domain::{
    Admission, AuthGate, ConnectionEntry, ConnectionId, ConnectionRegistry, ConnectionSummary,
    DeviceSummary, Session,
};
use crate::error::{AuthError, HubError};
use crate::protocol::Message;

/// Everything guarded by the hub lock.
#[derive(Debug)]
pub struct HubState {
    /// Known endpoints.
    pub registry: ConnectionRegistry,
    /// Admin credential.
    pub gate: AuthGate,
}

/// Registry occupancy, for the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct HubStats {
    /// Configured registry capacity.
    pub capacity: usize,
    /// Slots in use, online or offline.
    pub slots_used: usize,
    /// Online entries.
    pub online: usize,
}

/// Shared server context passed to every connection worker.
#[derive(Debug)]
pub struct Hub {
    state: Mutex<HubState>,
}

impl Hub {
    /// Creates a hub with an empty registry of `capacity` slots and the
    /// given initial admin credential.
    #[must_use]
    pub fn new(capacity: usize, admin_password: &str) -> Self {
        Self {
            state: Mutex::new(HubState {
                registry: ConnectionRegistry::new(capacity),
                gate: AuthGate::new(admin_password),
            }),
        }
    }

    /// Upserts a device entry.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::CapacityExceeded`] if the registry is full.
    pub async fn register(&self, entry: ConnectionEntry) -> Result<Admission, HubError> {
        let mut state = self.state.lock().await;
        state.registry.upsert(entry)
    }

    /// Checks `password` against the admin credential and, on a match,
    /// upserts the operator entry, all in one critical section.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Auth`] with [`AuthError::WrongPassword`] if the
    /// password is missing or wrong (nothing is upserted), or
    /// [`HubError::CapacityExceeded`] if the registry is full.
    pub async fn login(
        &self,
        password: Option<&str>,
        entry: ConnectionEntry,
    ) -> Result<Admission, HubError> {
        let mut state = self.state.lock().await;
        match password {
            Some(p) if state.gate.login(p) => state.registry.upsert(entry),
            _ => Err(AuthError::WrongPassword.into()),
        }
    }

    /// Rotates the admin credential and, on success, revokes the login of
    /// `session` (and of its registry entry) before the lock is released.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WrongPassword`] if `old_password` does not
    /// match; neither the credential nor the session changes.
    pub async fn change_password(
        &self,
        session: &mut Session,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let mut state = self.state.lock().await;
        state.gate.change_password(old_password, new_password)?;
        if let Some(entry) = state.registry.find_owned_mut(session.id(), session.conn()) {
            entry.logged_in = false;
        }
        session.require_login();
        Ok(())
    }

    /// Returns every online device.
    pub async fn list_devices(&self) -> Vec<DeviceSummary> {
        self.state.lock().await.registry.snapshot_devices()
    }

    /// Forwards `message` to its destination. See [`router::deliver`].
    pub async fn deliver(&self, message: &Message) -> bool {
        let state = self.state.lock().await;
        router::deliver(&state.registry, message)
    }

    /// Refreshes the sender's `last_seen`. Returns `false` if the sender
    /// has no registry entry.
    pub async fn touch(&self, id: &str, owner: ConnectionId) -> bool {
        self.state.lock().await.registry.touch(id, owner)
    }

    /// Marks the entry for `id` offline if `owner` still owns it.
    pub async fn disconnect(&self, id: &str, owner: ConnectionId) -> bool {
        self.state.lock().await.registry.remove(id, owner)
    }

    /// Returns a snapshot of every registry entry.
    pub async fn connections(&self) -> Vec<ConnectionSummary> {
        self.state.lock().await.registry.snapshot()
    }

    /// Returns registry occupancy.
    pub async fn stats(&self) -> HubStats {
        let state = self.state.lock().await;
        HubStats {
            capacity: state.registry.capacity(),
            slots_used: state.registry.len(),
            online: state.registry.online_count(),
        }
    }

    /// Returns `true` while the admin credential is the built-in default.
    pub async fn credential_is_default(&self) -> bool {
        self.state.lock().await.gate.is_default()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use super::*;
    use crate::domain::Outbound;

    fn session() -> Session {
        let address: SocketAddr = "192.168.0.9:41000"
            .parse()
            .unwrap_or_else(|_| panic!("valid socket address"));
        let (outbound, _rx) = Outbound::channel(8);
        Session::new(address, outbound)
    }

    #[tokio::test]
    async fn login_with_wrong_password_upserts_nothing() {
        let hub = Hub::new(4, "admin");
        let s = session();
        let result = hub
            .login(Some("nope"), s.candidate_entry("op", false, ""))
            .await;
        assert!(matches!(result, Err(HubError::Auth(AuthError::WrongPassword))));
        assert!(hub.connections().await.is_empty());
    }

    #[tokio::test]
    async fn login_without_password_is_wrong_password() {
        let hub = Hub::new(4, "admin");
        let s = session();
        let result = hub.login(None, s.candidate_entry("op", false, "")).await;
        assert!(matches!(result, Err(HubError::Auth(AuthError::WrongPassword))));
    }

    #[tokio::test]
    async fn change_password_revokes_session_and_entry() {
        let hub = Hub::new(4, "admin");
        let mut s = session();
        let Ok(_) = hub
            .login(Some("admin"), s.candidate_entry("op", false, ""))
            .await
        else {
            panic!("login should succeed");
        };
        s.identify("op", false, "");

        assert_eq!(hub.change_password(&mut s, "admin", "next").await, Ok(()));
        assert!(!s.is_logged_in());
        let connections = hub.connections().await;
        let Some(entry) = connections.iter().find(|c| c.id == "op") else {
            panic!("entry should remain");
        };
        assert!(!entry.logged_in);
        assert!(!hub.credential_is_default().await);
    }

    #[tokio::test]
    async fn wrong_old_password_keeps_session() {
        let hub = Hub::new(4, "admin");
        let mut s = session();
        s.identify("op", false, "");
        assert_eq!(
            hub.change_password(&mut s, "bad", "next").await,
            Err(AuthError::WrongPassword)
        );
        assert!(s.is_logged_in());
        assert!(hub.credential_is_default().await);
    }

    #[tokio::test]
    async fn concurrent_rotations_succeed_exactly_once() {
        let hub = Arc::new(Hub::new(4, "admin"));
        let mut handles = Vec::new();
        for i in 0..8 {
            let hub = Arc::clone(&hub);
            handles.push(tokio::spawn(async move {
                let mut s = session();
                s.identify(&format!("op{i}"), false, "");
                hub.change_password(&mut s, "admin", &format!("pw{i}"))
                    .await
                    .is_ok()
            }));
        }
        let mut successes = 0;
        for handle in handles {
            if matches!(handle.await, Ok(true)) {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn disconnect_and_stats() {
        let hub = Hub::new(2, "admin");
        let s = session();
        let _ = hub.register(s.candidate_entry("lamp", true, "light")).await;
        assert_eq!(
            hub.stats().await,
            HubStats {
                capacity: 2,
                slots_used: 1,
                online: 1
            }
        );
        assert!(hub.touch("lamp", s.conn()).await);
        assert!(hub.disconnect("lamp", s.conn()).await);
        assert_eq!(hub.stats().await.online, 0);
        assert!(hub.list_devices().await.is_empty());
    }
}
