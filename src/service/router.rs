//! Forwards an envelope to the live connection it is addressed to.

use crate::domain::{ConnectionRegistry, Delivery};
use crate::protocol::{Message, encode};

/// Looks up `message.to` among online entries and queues the re-encoded
/// envelope on that connection.
///
/// Returns `true` only if the envelope was queued. A miss (unknown or
/// offline id, full or closed queue) is logged and reported as `false`;
/// the sender is never told.
///
/// Must be called with the hub lock held so the lookup and the enqueue
/// see the same registry membership.
pub fn deliver(registry: &ConnectionRegistry, message: &Message) -> bool {
    let Some(target) = registry.find(&message.to) else {
        tracing::info!(from = %message.from, to = %message.to, "destination not found");
        return false;
    };
    let Some(outbound) = target.outbound.as_ref() else {
        tracing::info!(from = %message.from, to = %message.to, "destination has no live socket");
        return false;
    };

    match outbound.push(encode(message)) {
        Delivery::Queued => {
            tracing::info!(
                from = %message.from,
                to = %message.to,
                action = message.action.as_str(),
                "routed"
            );
            true
        }
        Delivery::Full => {
            tracing::warn!(to = %message.to, "outbound queue full, message dropped");
            false
        }
        Delivery::Closed => {
            tracing::debug!(to = %message.to, "outbound queue closed, message dropped");
            false
        }
    }
}
