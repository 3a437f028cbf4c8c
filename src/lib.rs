//! # homehub
//!
//! Connection and routing hub for a small home-automation control plane.
//!
//! Devices register, operators log in, and both exchange JSON envelopes
//! over TCP. The hub authenticates operators against a single shared
//! admin credential, answers device listings, and forwards everything
//! else to the addressed endpoint without looking at the payload.
//!
//! ## Architecture
//!
//! ```text
//! Peers (devices, operators)        Admin (HTTP)
//!     │                                 │
//!     ├── HubServer (server/)           ├── api/
//!     ├── connection worker + framing   │
//!     ├── Dispatcher (action table)     │
//!     │                                 │
//!     ├── Hub (service/) ◄──────────────┘
//!     │     one mutex: ConnectionRegistry + AuthGate (domain/)
//!     │
//!     └── Envelope codec (protocol/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod protocol;
pub mod server;
pub mod service;
