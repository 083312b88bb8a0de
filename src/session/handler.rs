//! Socket loop for one connection.
//!
//! # Responsibilities
//! - Read one request frame at a time and answer it
//! - Race every read against shutdown and the idle timeout
//! - Send the shutdown notice before closing on shutdown
//! - Release the bound account on every exit path

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::config::SessionConfig;
use crate::lifecycle::ShutdownListener;
use crate::net::connection::ConnectionId;
use crate::observability::metrics;
use crate::protocol::frame::encode;
use crate::protocol::{
    Command, FrameError, FrameReader, ParseError, Response, REQUEST_FRAME_LEN, RESPONSE_FRAME_LEN,
};
use crate::store::AccountStore;

use super::{CommandError, Outcome, Session};

/// What woke the handler up.
enum Event {
    Frame(String),
    Malformed(ParseError),
    Closed,
    IdleTimeout,
    Shutdown,
    Failed(FrameError),
}

/// Drives the protocol for one accepted connection.
pub struct SessionHandler {
    id: ConnectionId,
    session: Session,
    shutdown: ShutdownListener,
    idle_timeout: Option<Duration>,
}

impl SessionHandler {
    pub fn new(
        id: ConnectionId,
        store: Arc<AccountStore>,
        shutdown: ShutdownListener,
        config: &SessionConfig,
    ) -> Self {
        Self {
            id,
            session: Session::new(store),
            shutdown,
            idle_timeout: config.idle_timeout(),
        }
    }

    /// Serve the connection until the client leaves, goes idle, fails, or the
    /// server shuts down.
    pub async fn run<S>(mut self, stream: S) -> Result<(), FrameError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (read_half, mut writer) = tokio::io::split(stream);
        let mut reader = FrameReader::new(read_half, REQUEST_FRAME_LEN);
        let idle_timeout = self.idle_timeout;

        let result = loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.recv() => Event::Shutdown,
                event = next_event(&mut reader, idle_timeout) => event,
            };

            match event {
                Event::Frame(text) => {
                    let response = match self.dispatch(&text) {
                        Outcome::Reply(response) => response,
                        Outcome::Close => {
                            tracing::info!(connection_id = %self.id, "Client quit");
                            break Ok(());
                        }
                    };
                    if let Err(e) = write_response(&mut writer, self.id, &response).await {
                        break Err(e);
                    }
                }
                Event::Malformed(e) => {
                    tracing::warn!(connection_id = %self.id, error = %e, "Rejected undecodable request");
                    metrics::record_command("invalid", "invalid_command");
                    let response = Response::Error(CommandError::Parse(e));
                    if let Err(e) = write_response(&mut writer, self.id, &response).await {
                        break Err(e);
                    }
                }
                Event::Closed => {
                    tracing::info!(connection_id = %self.id, "Client disconnected");
                    break Ok(());
                }
                Event::IdleTimeout => {
                    tracing::info!(
                        connection_id = %self.id,
                        idle_secs = idle_timeout.map(|d| d.as_secs()),
                        "Closing idle connection"
                    );
                    break Ok(());
                }
                Event::Shutdown => {
                    tracing::info!(connection_id = %self.id, "Server shutting down, notifying client");
                    if let Err(e) = write_response(&mut writer, self.id, &Response::Shutdown).await {
                        tracing::debug!(connection_id = %self.id, error = %e, "Shutdown notice not delivered");
                    }
                    break Ok(());
                }
                Event::Failed(e) => break Err(e),
            }
        };

        if let Some(account) = self.session.close() {
            tracing::info!(connection_id = %self.id, account = %account, "Session ended on close");
        }
        let _ = writer.shutdown().await;
        result
    }

    /// Parse and execute one request.
    fn dispatch(&mut self, text: &str) -> Outcome {
        let command = match Command::parse(text) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(connection_id = %self.id, input = %text, error = %e, "Rejected request");
                metrics::record_command("invalid", "invalid_command");
                return Outcome::Reply(Response::Error(CommandError::Parse(e)));
            }
        };

        let outcome = self.session.execute(&command);
        let label = match &outcome {
            Outcome::Reply(response) => response.outcome(),
            Outcome::Close => "closed",
        };
        tracing::info!(
            connection_id = %self.id,
            command = command.name(),
            account = self.session.account().unwrap_or("-"),
            outcome = label,
            "Command executed"
        );
        metrics::record_command(command.name(), label);
        outcome
    }
}

/// Write one response frame. A reply that cannot be encoded is replaced by
/// `ERROR: Response unavailable`; only I/O failures are returned.
async fn write_response<W>(writer: &mut W, id: ConnectionId, response: &Response) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let frame = match encode(&response.to_string(), RESPONSE_FRAME_LEN) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!(connection_id = %id, error = %e, "Response does not fit a frame");
            let fallback = Response::Error(CommandError::Unrenderable);
            encode(&fallback.to_string(), RESPONSE_FRAME_LEN)?
        }
    };
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

async fn next_event<R>(reader: &mut FrameReader<R>, idle_timeout: Option<Duration>) -> Event
where
    R: AsyncRead + Unpin,
{
    let read = reader.read_frame();
    let result = match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, read).await {
            Ok(result) => result,
            Err(_) => return Event::IdleTimeout,
        },
        None => read.await,
    };

    match result {
        Ok(Some(text)) => Event::Frame(text),
        Ok(None) => Event::Closed,
        Err(FrameError::NonAscii) => Event::Malformed(ParseError::NotAscii),
        Err(e) => Event::Failed(e),
    }
}
