//! Action dispatcher: the per-action policy binding the auth gate, the
//! registry and the router together.
//!
//! | action            | precondition             | reply                          |
//! |-------------------|--------------------------|--------------------------------|
//! | `register`        | none                     | `success` + `device_id`        |
//! | `login`           | none                     | `success` + `token`            |
//! | `change_password` | logged in                | `success` or a failure code    |
//! | `list_devices`    | logged in                | `devices`                      |
//! | `heartbeat`       | none                     | none                           |
//! | anything else     | logged in or device      | none (forwarded to `to`)       |

use std::sync::Arc;

use serde_json::Value;

use crate::domain::Session;
use crate::error::{AuthError, HubError};
use crate::protocol::{Action, Message, Payload};
use crate::service::Hub;

/// Typed view of an incoming envelope, keyed by action.
///
/// Only the fields the hub itself acts on are extracted; `Forward`
/// payloads are never inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request<'a> {
    /// Device registration.
    Register {
        /// `data.device_type`, empty if absent.
        device_type: &'a str,
    },
    /// Operator login.
    Login {
        /// `data.password`.
        password: Option<&'a str>,
    },
    /// Credential rotation.
    ChangePassword {
        /// `data.old_password`.
        old_password: Option<&'a str>,
        /// `data.new_password`.
        new_password: Option<&'a str>,
    },
    /// Device listing.
    ListDevices,
    /// Liveness signal.
    Heartbeat,
    /// `control`, `status` or any unknown action: route to `message.to`.
    Forward,
}

impl<'a> Request<'a> {
    /// Extracts the typed view from `message`.
    #[must_use]
    pub fn parse(message: &'a Message) -> Self {
        let data = &message.data;
        match message.action {
            Action::Register => Self::Register {
                device_type: data.get_str("device_type").unwrap_or_default(),
            },
            Action::Login => Self::Login {
                password: data.get_str("password"),
            },
            Action::ChangePassword => Self::ChangePassword {
                old_password: data.get_str("old_password"),
                new_password: data.get_str("new_password"),
            },
            Action::ListDevices => Self::ListDevices,
            Action::Heartbeat => Self::Heartbeat,
            Action::Control | Action::Status | Action::Other(_) => Self::Forward,
        }
    }
}

/// Applies the action table to envelopes arriving on one connection.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    hub: Arc<Hub>,
    server_id: String,
    session_token: String,
}

impl Dispatcher {
    /// Creates a dispatcher over `hub`. Replies carry `server_id` as their
    /// sender; successful logins receive `session_token`.
    #[must_use]
    pub fn new(
        hub: Arc<Hub>,
        server_id: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            hub,
            server_id: server_id.into(),
            session_token: session_token.into(),
        }
    }

    /// The shared hub.
    #[must_use]
    pub const fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Handles one decoded envelope from `session` and returns the reply
    /// to send back on the same connection, if any.
    pub async fn dispatch(&self, session: &mut Session, message: Message) -> Option<Message> {
        tracing::debug!(
            conn = %session.conn(),
            kind = message.kind.as_str(),
            action = message.action.as_str(),
            from = %message.from,
            to = %message.to,
            "envelope"
        );

        match Request::parse(&message) {
            Request::Register { device_type } => {
                Some(self.register(session, &message, device_type).await)
            }
            Request::Login { password } => Some(self.login(session, &message, password).await),
            Request::ChangePassword {
                old_password,
                new_password,
            } => Some(
                self.change_password(session, &message, old_password, new_password)
                    .await,
            ),
            Request::ListDevices => Some(self.list_devices(session, &message).await),
            Request::Heartbeat => {
                let known = self.hub.touch(session.id(), session.conn()).await;
                tracing::debug!(from = %message.from, known, "heartbeat");
                None
            }
            Request::Forward => self.forward(session, &message).await,
        }
    }

    async fn register(
        &self,
        session: &mut Session,
        message: &Message,
        device_type: &str,
    ) -> Message {
        let entry = session.candidate_entry(&message.from, true, device_type);
        match self.hub.register(entry).await {
            Ok(admission) => {
                session.identify(&message.from, true, device_type);
                tracing::info!(
                    conn = %session.conn(),
                    id = %message.from,
                    device_type,
                    ?admission,
                    "device registered"
                );
                self.reply(
                    message,
                    Payload::status("success").with("device_id", message.from.as_str()),
                )
            }
            Err(err) => self.rejected(session, message, &err),
        }
    }

    async fn login(
        &self,
        session: &mut Session,
        message: &Message,
        password: Option<&str>,
    ) -> Message {
        let entry = session.candidate_entry(&message.from, false, "");
        match self.hub.login(password, entry).await {
            Ok(admission) => {
                session.identify(&message.from, false, "");
                tracing::info!(
                    conn = %session.conn(),
                    id = %message.from,
                    ?admission,
                    "client logged in"
                );
                self.reply(
                    message,
                    Payload::status("success").with("token", self.session_token.as_str()),
                )
            }
            Err(err) => self.rejected(session, message, &err),
        }
    }

    async fn change_password(
        &self,
        session: &mut Session,
        message: &Message,
        old_password: Option<&str>,
        new_password: Option<&str>,
    ) -> Message {
        if !session.is_logged_in() {
            tracing::info!(
                conn = %session.conn(),
                id = %session.id(),
                "change_password rejected: not authenticated"
            );
            return self.error(message, AuthError::NotAuthenticated.as_str());
        }
        let (Some(old_password), Some(new_password)) = (old_password, new_password) else {
            return self.reply(message, Payload::status(AuthError::InvalidRequest.as_str()));
        };

        match self
            .hub
            .change_password(session, old_password, new_password)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    conn = %session.conn(),
                    id = %session.id(),
                    "admin password changed"
                );
                self.reply(message, Payload::status("success"))
            }
            Err(err) => {
                tracing::info!(
                    conn = %session.conn(),
                    id = %session.id(),
                    "change_password rejected: wrong old password"
                );
                self.reply(message, Payload::status(err.as_str()))
            }
        }
    }

    async fn list_devices(&self, session: &Session, message: &Message) -> Message {
        if !session.is_logged_in() {
            tracing::info!(
                conn = %session.conn(),
                id = %session.id(),
                "list_devices rejected: not authenticated"
            );
            return self.error(message, AuthError::NotAuthenticated.as_str());
        }
        let devices = self.hub.list_devices().await;
        tracing::info!(count = devices.len(), to = %session.id(), "device list sent");
        let devices = serde_json::to_value(devices).unwrap_or(Value::Array(Vec::new()));
        self.reply(message, Payload::new().with("devices", devices))
    }

    async fn forward(&self, session: &Session, message: &Message) -> Option<Message> {
        if !session.is_logged_in() && !session.is_device() {
            tracing::info!(
                conn = %session.conn(),
                action = message.action.as_str(),
                "forward rejected: not authenticated"
            );
            return Some(self.error(message, AuthError::NotAuthenticated.as_str()));
        }
        self.hub.deliver(message).await;
        None
    }

    fn rejected(&self, session: &Session, message: &Message, err: &HubError) -> Message {
        tracing::warn!(
            conn = %session.conn(),
            id = %message.from,
            action = message.action.as_str(),
            error = %err,
            "identification failed"
        );
        self.error(message, err.wire_code())
    }

    fn error(&self, request: &Message, code: &str) -> Message {
        self.reply(request, Payload::error(code))
    }

    fn reply(&self, request: &Message, data: Payload) -> Message {
        Message::reply(request, &self.server_id, data)
    }
}
