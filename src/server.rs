// src/server.rs
//! Network layer:
//! - restores the snapshot and starts the background workers
//! - listens for TCP connections, one task per client
//! - cuts requests out of the byte stream and hands them to the engine
//! - writes the encoded reply back, closing the connection after QUIT
//! - on Ctrl-C stops accepting and writes a final snapshot
use anyhow::{Context, Result};
use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    signal,
};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::protocol::frame_length;
use crate::store::Store;
use crate::{engine, expire, persistence};

const READ_CHUNK: usize = 4096;
/// Largest incomplete request a connection may buffer before it is dropped.
const MAX_REQUEST_BYTES: usize = 64 * 1024 * 1024;

/// Runs the server described by `cfg` until Ctrl-C.
pub async fn start(cfg: Config, store: Store) -> Result<()> {
    let snapshot = PathBuf::from(&cfg.snapshot_path);
    match persistence::restore(&store, &snapshot) {
        Ok(true) => info!(path = %snapshot.display(), keys = store.len(), "snapshot restored"),
        Ok(false) => info!(path = %snapshot.display(), "no snapshot found, starting empty"),
        Err(e) => error!("failed to restore snapshot: {:#}", e),
    }

    tokio::spawn(expire::start_cleaner(store.clone(), cfg.purge_interval_secs));
    if cfg.snapshot_enabled {
        tokio::spawn(persistence::start_snapshotter(
            store.clone(),
            snapshot.clone(),
            cfg.snapshot_interval_secs,
        ));
    }

    let addr = cfg.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "cinder listening");

    serve(listener, store.clone(), async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {}", e);
        }
    })
    .await?;

    if cfg.snapshot_enabled {
        match persistence::save(&store, &snapshot) {
            Ok(()) => info!(path = %snapshot.display(), "final snapshot saved"),
            Err(e) => error!("final snapshot failed: {:#}", e),
        }
    }
    Ok(())
}

/// Accept loop: spawns a task per connection until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, store: Store, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                info!(%peer, "client connected");

                let store = store.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(stream, peer, store, MAX_REQUEST_BYTES).await {
                        warn!(%peer, "connection error: {:#}", err);
                    }
                    info!(%peer, "client disconnected");
                });
            }
            _ = &mut shutdown => {
                info!("shutdown requested, no longer accepting connections");
                return Ok(());
            }
        }
    }
}

/// Per-connection loop. Requests are processed one at a time, in arrival order.
///
/// A partial request longer than `max_request` bytes closes the connection.
async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    store: Store,
    max_request: usize,
) -> Result<()> {
    let mut pending: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        while let Some(len) = frame_length(&pending) {
            let request: Vec<u8> = pending.drain(..len).collect();
            // blank lines from telnet-style clients are ignored
            if request.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let response = engine::process(&request, &store);
            if response.reply.is_error() {
                tracing::debug!(%peer, reply = ?response.reply, "command failed");
            }
            stream.write_all(&response.reply.encode()).await?;
            if response.close {
                return Ok(());
            }
        }

        let n = match stream.read(&mut chunk).await {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::ConnectionReset => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            return Ok(());
        }
        pending.extend_from_slice(&chunk[..n]);
        if pending.len() > max_request && frame_length(&pending).is_none() {
            warn!(%peer, buffered = pending.len(), "request too large, closing connection");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, timeout};

    async fn connected_pair() -> Result<(TcpStream, TcpStream, SocketAddr)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let client = TcpStream::connect(listener.local_addr()?).await?;
        let (server_side, peer) = listener.accept().await?;
        Ok((client, server_side, peer))
    }

    #[tokio::test]
    async fn test_oversized_request_closes_connection() -> Result<()> {
        let (mut client, server_side, peer) = connected_pair().await?;
        let store = Store::new();
        let conn = tokio::spawn(handle_connection(server_side, peer, store.clone(), 64));

        // the header promises far more than will ever be buffered
        client
            .write_all(b"*2\r\n$3\r\nGET\r\n$9223372036854775807\r\n")
            .await?;
        client.write_all(&[b'x'; 128]).await?;

        timeout(Duration::from_secs(5), conn).await???;
        let mut rest = Vec::new();
        match timeout(Duration::from_secs(5), client.read_to_end(&mut rest)).await? {
            Ok(n) => assert_eq!(n, 0, "no reply to a rejected request"),
            Err(e) => assert_eq!(e.kind(), ErrorKind::ConnectionReset),
        }
        assert!(store.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_requests_under_limit_are_served() -> Result<()> {
        let (mut client, server_side, peer) = connected_pair().await?;
        let store = Store::new();
        let conn = tokio::spawn(handle_connection(server_side, peer, store.clone(), 64));

        client.write_all(b"SET k v\r\nQUIT\r\n").await?;
        let mut replies = Vec::new();
        timeout(Duration::from_secs(5), client.read_to_end(&mut replies)).await??;
        assert_eq!(replies, b"+OK\r\n+OK\r\n");

        timeout(Duration::from_secs(5), conn).await???;
        assert_eq!(store.get("k")?, Some("v".to_string()));
        Ok(())
    }
}
