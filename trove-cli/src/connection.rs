//! Client connection handling.
//!
//! One `Connection` is created per operation and closed when it drops, so
//! every exit path releases the socket exactly once. Connection failures
//! abort the operation; retry is a user-initiated re-run.

use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;
use trove_core::error::{Error, Result};
use trove_core::protocol::Request;
use trove_core::wire::{self, Frame, MAX_FRAME_SIZE};

/// A transient per-request session with the server.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl Connection {
    pub async fn open(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Error::ConnectionFailed(format!("{addr}: {e}")))?;
        let peer = stream
            .peer_addr()
            .map_err(|e| Error::ConnectionFailed(e.to_string()))?;
        debug!(%peer, "connected");
        Ok(Self { stream, peer })
    }

    /// Send one request frame, then shut the write half down: the frame
    /// ends where the byte stream ends.
    pub async fn send(&mut self, frame: &Frame) -> Result<()> {
        wire::write_frame(&mut self.stream, frame)
            .await
            .map_err(as_connection_failure)?;
        self.stream
            .shutdown()
            .await
            .map_err(|e| Error::ConnectionFailed(e.to_string()))?;
        debug!(peer = %self.peer, "request sent");
        Ok(())
    }

    /// Read the reply frame (terminated by the server closing).
    pub async fn recv(&mut self) -> Result<Frame> {
        let frame = wire::read_frame(&mut self.stream, MAX_FRAME_SIZE)
            .await
            .map_err(as_connection_failure)?;
        debug!(peer = %self.peer, reply = %frame.command, "reply received");
        Ok(frame)
    }

    /// One full request/reply exchange over a fresh connection.
    pub async fn round_trip(addr: &str, request: &Request) -> Result<Frame> {
        let mut connection = Self::open(addr).await?;
        connection.send(&request.to_frame()).await?;
        connection.recv().await
    }
}

fn as_connection_failure(err: Error) -> Error {
    match err {
        Error::Io(e) => Error::ConnectionFailed(e.to_string()),
        other => other,
    }
}
