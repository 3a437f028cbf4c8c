//! TCP accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::connection::{ConnectionLimits, run_connection};
use crate::app_state::AppState;
use crate::error::HubError;

/// Bound envelope listener.
#[derive(Debug)]
pub struct HubServer {
    listener: TcpListener,
    state: AppState,
}

impl HubServer {
    /// Binds the envelope listener on `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if the address cannot be bound.
    pub async fn bind(addr: SocketAddr, state: AppState) -> Result<Self, HubError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, state })
    }

    /// Address actually bound (useful when binding port 0).
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Transport`] if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr, HubError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` is cancelled, spawning one
    /// worker task per socket. Accept errors are logged and the loop goes
    /// on. Cancelling `shutdown` also stops every worker spawned here.
    pub async fn run(self, shutdown: CancellationToken) {
        let limits = ConnectionLimits {
            max_frame_bytes: self.state.config.max_frame_bytes,
            outbound_queue: self.state.config.outbound_queue,
        };

        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                accepted = self.listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(err) => {
                            tracing::warn!(error = %err, "accept failed");
                            continue;
                        }
                    };
                    if let Err(err) = socket.set_nodelay(true) {
                        tracing::debug!(%peer, error = %err, "set_nodelay failed");
                    }
                    tokio::spawn(run_connection(
                        socket,
                        peer,
                        Arc::clone(&self.state.dispatcher),
                        limits,
                        shutdown.child_token(),
                    ));
                }
            }
        }

        tracing::info!("listener stopped");
    }
}
