//! Envelope types: message kind, action, payload and the message itself.

use serde_json::{Map, Value};

/// Envelope `type` discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Peer → server (or peer → peer) request.
    Request,
    /// Reply to a request.
    Response,
    /// Unsolicited notification.
    Notify,
}

impl Kind {
    /// Returns the wire string for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Notify => "notify",
        }
    }

    /// Maps a wire string to a kind. Unrecognized strings map to
    /// [`Kind::Notify`].
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s {
            "request" => Self::Request,
            "response" => Self::Response,
            _ => Self::Notify,
        }
    }
}

/// Envelope `action` discriminator.
///
/// Unrecognized action strings decode to [`Action::Other`], which keeps the
/// raw text so a forwarded message carries the action exactly as it arrived.
/// The envelope `type` is not preserved the same way: an unknown kind
/// decodes to [`Kind::Notify`] and is forwarded as `"notify"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Device registration.
    Register,
    /// Operator login.
    Login,
    /// Device control command, forwarded unexamined.
    Control,
    /// Status report, forwarded like `control`.
    Status,
    /// Liveness signal.
    Heartbeat,
    /// Operator asks for the online device list.
    ListDevices,
    /// Operator rotates the admin credential.
    ChangePassword,
    /// Any action string outside the known set.
    Other(String),
}

impl Action {
    /// Returns the wire string for this action.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::Control => "control",
            Self::Status => "status",
            Self::Heartbeat => "heartbeat",
            Self::ListDevices => "list_devices",
            Self::ChangePassword => "change_password",
            Self::Other(raw) => raw,
        }
    }

    /// Maps a wire string to an action.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s {
            "register" => Self::Register,
            "login" => Self::Login,
            "control" => Self::Control,
            "status" => Self::Status,
            "heartbeat" => Self::Heartbeat,
            "list_devices" => Self::ListDevices,
            "change_password" => Self::ChangePassword,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Action-specific envelope body (`data` on the wire).
///
/// Kept as an ordered field map. The hub only reads a handful of string
/// fields; everything else passes through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a payload whose `status` field is set to `status`.
    #[must_use]
    pub fn status(status: &str) -> Self {
        Self::new().with("status", status)
    }

    /// Creates the `{status: "error", message}` payload used for
    /// rejected requests.
    #[must_use]
    pub fn error(message: &str) -> Self {
        Self::status("error").with("message", message)
    }

    /// Adds (or replaces) a field, builder style.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Returns a field if it is present and is a JSON string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns a field of any JSON type.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns `true` if the payload has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the underlying field map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// One envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Envelope kind.
    pub kind: Kind,
    /// Sender endpoint id, as claimed by the sender.
    pub from: String,
    /// Destination endpoint id.
    pub to: String,
    /// What the envelope asks for.
    pub action: Action,
    /// Unix seconds.
    pub timestamp: i64,
    /// Action-specific body.
    pub data: Payload,
}

impl Message {
    /// Builds a server-originated response to `request`: addressed back to
    /// the request's sender, same action, fresh timestamp.
    #[must_use]
    pub fn reply(request: &Self, server_id: &str, data: Payload) -> Self {
        Self {
            kind: Kind::Response,
            from: server_id.to_string(),
            to: request.from.clone(),
            action: request.action.clone(),
            timestamp: unix_now(),
            data,
        }
    }
}

/// Current time as Unix seconds.
#[must_use]
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
