//! Hub error types.
//!
//! Three families, matching how far each one travels:
//!
//! | Type          | Raised by            | Surfaced as                                   |
//! |---------------|----------------------|-----------------------------------------------|
//! | [`ParseError`] | envelope codec      | logged and swallowed, no reply                |
//! | [`AuthError`]  | auth gate, dispatcher | reply payload (`status` / `message` fields) |
//! | [`HubError`]   | registry, transport, config | local to one connection or to startup |

use tokio_util::codec::AnyDelimiterCodecError;

/// Failure to turn one line of wire text into a [`crate::protocol::Message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The text is not valid JSON, or a field has the wrong JSON type.
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// A required envelope field is absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// `data` is present but is not a JSON object.
    #[error("`data` must be a JSON object")]
    InvalidPayload,
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Authentication and authorization failures.
///
/// These never terminate a connection; the dispatcher turns them into
/// reply data using [`AuthError::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The connection has not logged in (or registered) yet.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The supplied password does not match the admin credential.
    #[error("wrong password")]
    WrongPassword,

    /// Required payload fields are missing.
    #[error("invalid request")]
    InvalidRequest,
}

impl AuthError {
    /// Returns the stable wire code for this failure.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::WrongPassword => "wrong_password",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

/// Server-side error enum.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Socket accept/read/write failure.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Line framing failure reported by the codec underneath a connection.
    #[error("framing error: {0}")]
    Framing(#[from] AnyDelimiterCodecError),

    /// The connection registry has no free slot for a new id.
    #[error("connection registry full (capacity {capacity})")]
    CapacityExceeded {
        /// Configured registry capacity.
        capacity: usize,
    },

    /// Credential check failed while identifying a connection.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HubError {
    /// Returns the wire code reported to a peer whose request failed
    /// with this error.
    ///
    /// Capacity failures map to the generic `registration_failed` code.
    #[must_use]
    pub const fn wire_code(&self) -> &'static str {
        match self {
            Self::Auth(auth) => auth.as_str(),
            Self::CapacityExceeded { .. } => "registration_failed",
            Self::Transport(_) | Self::Framing(_) | Self::Config(_) => "internal_error",
        }
    }
}
