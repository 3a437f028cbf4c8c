//! Connection worker: one per accepted socket.
//!
//! Reads `\n`-delimited envelopes, hands each one to the [`Dispatcher`] and
//! queues the reply. A separate writer task drains the connection's
//! outbound queue, which also receives envelopes routed here by other
//! workers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;

use super::dispatch::Dispatcher;
use super::framing::{EnvelopeCodec, Frame};
use crate::domain::{Delivery, Outbound, Session};
use crate::protocol::{decode_bytes, encode};

/// How long a closing worker waits for its writer to flush queued replies.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-connection limits.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionLimits {
    /// Maximum envelope line length in bytes.
    pub max_frame_bytes: usize,
    /// Outbound queue depth.
    pub outbound_queue: usize,
}

/// Runs the read loop for one connection until the peer closes the socket,
/// a transport error occurs, or `shutdown` is cancelled. On exit the
/// connection's registry entry is marked offline.
pub async fn run_connection<S>(
    stream: S,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    limits: ConnectionLimits,
    shutdown: CancellationToken,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = FramedRead::new(read_half, EnvelopeCodec::new(limits.max_frame_bytes));
    let writer = FramedWrite::new(write_half, EnvelopeCodec::new(limits.max_frame_bytes));

    let (outbound, outbound_rx) = Outbound::channel(limits.outbound_queue);
    let mut writer_task = tokio::spawn(write_loop(writer, outbound_rx));
    let mut session = Session::new(peer, outbound);

    tracing::info!(conn = %session.conn(), %peer, "connected");

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                tracing::debug!(conn = %session.conn(), "shutdown requested");
                break;
            }
            frame = reader.next() => {
                match frame {
                    Some(Ok(Frame::Line(line))) => {
                        handle_line(&dispatcher, &mut session, &line).await;
                    }
                    Some(Ok(Frame::Oversized)) => {
                        tracing::warn!(
                            conn = %session.conn(),
                            max = limits.max_frame_bytes,
                            "envelope exceeds maximum frame length, dropped"
                        );
                    }
                    Some(Err(err)) => {
                        tracing::info!(conn = %session.conn(), error = %err, "read failed");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    dispatcher
        .hub()
        .disconnect(session.id(), session.conn())
        .await;
    session.close();
    tracing::info!(conn = %session.conn(), id = %session.id(), %peer, "disconnected");

    drop(session);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer_task)
        .await
        .is_err()
    {
        writer_task.abort();
    }
}

/// Decodes and dispatches one line. Parse failures, invalid UTF-8
/// included, are logged and dropped with no reply.
async fn handle_line(dispatcher: &Dispatcher, session: &mut Session, line: &[u8]) {
    if line.iter().all(u8::is_ascii_whitespace) {
        return;
    }
    let message = match decode_bytes(line) {
        Ok(message) => message,
        Err(err) => {
            tracing::warn!(conn = %session.conn(), error = %err, "parse failed, envelope dropped");
            return;
        }
    };

    if let Some(reply) = dispatcher.dispatch(session, message).await
        && session.outbound().push(encode(&reply)) != Delivery::Queued
    {
        tracing::warn!(conn = %session.conn(), "reply dropped, outbound queue unavailable");
    }
}

/// Drains the outbound queue onto the socket until every sender is gone
/// or a write fails.
async fn write_loop<W>(mut writer: FramedWrite<W, EnvelopeCodec>, mut rx: mpsc::Receiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        if let Err(err) = writer.send(line).await {
            tracing::info!(error = %err, "write failed");
            break;
        }
    }
    let _ = writer.close().await;
}
