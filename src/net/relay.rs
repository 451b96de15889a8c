//! Bidirectional byte relay between a verified client and the backend.
//!
//! Two copy tasks, one per direction. The first to finish (EOF or error)
//! signals completion; both tasks are then torn down, which drops every
//! socket half and closes both connections.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::net::connection::ConnectionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToBackend,
    BackendToClient,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::ClientToBackend => "client->backend",
            Direction::BackendToClient => "backend->client",
        }
    }
}

/// Forward `pipelined` to the backend, then relay until either side closes.
///
/// Returns the direction that finished first.
pub async fn relay(
    client: TcpStream,
    backend: TcpStream,
    pipelined: &[u8],
    id: ConnectionId,
) -> std::io::Result<Direction> {
    let (client_read, client_write) = client.into_split();
    let (backend_read, mut backend_write) = backend.into_split();

    if !pipelined.is_empty() {
        backend_write.write_all(pipelined).await?;
    }

    let (done_tx, mut done_rx) = mpsc::channel(2);
    let upstream = tokio::spawn(copy_half(
        client_read,
        backend_write,
        Direction::ClientToBackend,
        id,
        done_tx.clone(),
    ));
    let downstream = tokio::spawn(copy_half(
        backend_read,
        client_write,
        Direction::BackendToClient,
        id,
        done_tx,
    ));

    let first = done_rx.recv().await.unwrap_or(Direction::ClientToBackend);

    upstream.abort();
    downstream.abort();
    // wait for the halves to actually drop
    let _ = upstream.await;
    let _ = downstream.await;

    Ok(first)
}

async fn copy_half<R, W>(
    mut reader: R,
    mut writer: W,
    direction: Direction,
    id: ConnectionId,
    done: mpsc::Sender<Direction>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match tokio::io::copy(&mut reader, &mut writer).await {
        Ok(bytes) => {
            tracing::trace!(connection_id = %id, direction = direction.as_str(), bytes, "Copy finished");
        }
        Err(e) => {
            tracing::warn!(connection_id = %id, direction = direction.as_str(), error = %e, "Copy failed");
        }
    }
    let _ = done.send(direction).await;
}
