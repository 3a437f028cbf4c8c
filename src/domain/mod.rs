//! Domain layer: connection identity, per-socket sessions, registry
//! entries, the endpoint registry and the admin credential.
//!
//! Nothing here locks on its own. The hub service owns a registry and an
//! auth gate together behind one mutex.

pub mod connection;
pub mod connection_id;
pub mod credential;
pub mod registry;
pub mod session;

pub use connection::{ConnectionEntry, ConnectionSummary, Delivery, DeviceSummary, Outbound};
pub use connection_id::ConnectionId;
pub use credential::AuthGate;
pub use registry::{Admission, ConnectionRegistry};
pub use session::{Session, SessionState};
