//! Wire protocol: the JSON envelope and its codec.
//!
//! ```text
//! { "type": "request|response|notify",
//!   "from": "<id>", "to": "<id>",
//!   "action": "register|login|control|status|heartbeat|list_devices|change_password",
//!   "timestamp": <int64>,
//!   "data": { ... } }
//! ```
//!
//! Revision 2 of the protocol frames each envelope as one `\n`-terminated
//! line of UTF-8 text.

pub mod codec;
pub mod envelope;

pub use codec::{decode, decode_bytes, encode};
pub use envelope::{Action, Kind, Message, Payload};
