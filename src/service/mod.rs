//! Service layer: the shared hub context and the message router.

pub mod hub;
pub mod router;

pub use hub::{Hub, HubState, HubStats};
