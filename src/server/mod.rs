//! Envelope server: accept loop, per-connection workers, framing and the
//! action dispatcher.

pub mod connection;
pub mod dispatch;
pub mod framing;
pub mod listener;

pub use dispatch::Dispatcher;
pub use listener::HubServer;
