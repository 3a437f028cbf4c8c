//! Envelope codec: wire JSON text ↔ [`Message`].
//!
//! Pure and stateless. Framing (one envelope per `\n`-terminated line) is
//! handled by the connection worker; this module only sees one line.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::envelope::{Action, Kind, Message, Payload, unix_now};
use crate::error::ParseError;

/// Inbound wire shape. Every field is optional here so that a missing
/// required field is reported by name instead of as a generic serde error.
#[derive(Debug, Deserialize)]
struct InboundEnvelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    from: Option<String>,
    to: Option<String>,
    action: Option<String>,
    timestamp: Option<Value>,
    data: Option<Value>,
}

/// Outbound wire shape, in canonical field order.
#[derive(Debug, Serialize)]
struct OutboundEnvelope<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    from: &'a str,
    to: &'a str,
    action: &'a str,
    timestamp: i64,
    data: &'a Map<String, Value>,
}

/// Decodes one envelope.
///
/// `type`, `from`, `to` and `action` are required strings. A missing or
/// non-integer `timestamp` defaults to the current time; a missing or
/// `null` `data` decodes to an empty payload.
///
/// # Errors
///
/// Returns [`ParseError`] if the text is not a JSON object, a required
/// field is missing or has the wrong type, or `data` is not an object.
pub fn decode(text: &str) -> Result<Message, ParseError> {
    decode_bytes(text.as_bytes())
}

/// Decodes one envelope from raw line bytes. Invalid UTF-8 is reported as
/// [`ParseError::Malformed`], like any other unparsable input.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_bytes(bytes: &[u8]) -> Result<Message, ParseError> {
    let wire: InboundEnvelope = serde_json::from_slice(bytes)?;

    let kind = wire.kind.ok_or(ParseError::MissingField("type"))?;
    let from = wire.from.ok_or(ParseError::MissingField("from"))?;
    let to = wire.to.ok_or(ParseError::MissingField("to"))?;
    let action = wire.action.ok_or(ParseError::MissingField("action"))?;

    let timestamp = wire
        .timestamp
        .as_ref()
        .and_then(Value::as_i64)
        .unwrap_or_else(unix_now);

    let data = match wire.data {
        None | Some(Value::Null) => Payload::new(),
        Some(Value::Object(map)) => Payload::from(map),
        Some(_) => return Err(ParseError::InvalidPayload),
    };

    Ok(Message {
        kind: Kind::from_wire(&kind),
        from,
        to,
        action: Action::from_wire(&action),
        timestamp,
        data,
    })
}

/// Encodes one envelope. Always emits all six fields; an empty payload is
/// written as `{}`. The result carries no trailing newline.
#[must_use]
pub fn encode(message: &Message) -> String {
    let wire = OutboundEnvelope {
        kind: message.kind.as_str(),
        from: &message.from,
        to: &message.to,
        action: message.action.as_str(),
        timestamp: message.timestamp,
        data: message.data.as_map(),
    };
    serde_json::to_string(&wire).unwrap_or_default()
}
