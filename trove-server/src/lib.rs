//! Trove server library: accept loop, command dispatch, shutdown.
//!
//! One task is spawned per accepted connection. Each connection carries
//! exactly one request: the client shuts its write half down after the
//! frame, the server replies and closes. Tasks share only the dispatcher.

pub mod config;
pub mod dispatcher;
pub mod shutdown;

pub use config::ServerConfig;
pub use dispatcher::Dispatcher;
pub use shutdown::{ShutdownCoordinator, ShutdownHandle};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use trove_core::protocol::{Reply, Request};
use trove_core::wire;

/// Bind the configured address and serve until shutdown.
pub async fn serve(config: ServerConfig, shutdown: ShutdownCoordinator) -> Result<()> {
    let listener = TcpListener::bind(&config.listen_addr).await?;
    serve_on(listener, config, shutdown).await
}

/// Serve on an already-bound listener until shutdown. On a termination
/// request the listener is dropped first, in-flight connections get a grace
/// period to finish, and the lock registry is torn down last.
pub async fn serve_on(
    listener: TcpListener,
    config: ServerConfig,
    mut shutdown: ShutdownCoordinator,
) -> Result<()> {
    let dispatcher = Arc::new(Dispatcher::new(&config.project_root)?);
    info!(
        addr = %listener.local_addr()?,
        root = %config.project_root.display(),
        "server listening"
    );

    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let dispatcher = dispatcher.clone();
                        let max_frame = config.max_frame_bytes;
                        connections.spawn(async move {
                            if let Err(err) = handle_connection(stream, dispatcher, max_frame).await {
                                warn!(%peer, error = %err, "connection error");
                            }
                        });
                    }
                    Err(err) => {
                        error!(error = %err, "accept failed");
                    }
                }
                // Reap tasks that have already finished.
                while connections.try_join_next().is_some() {}
            }
            _ = shutdown.requested() => {
                info!("shutdown requested; no longer accepting connections");
                break;
            }
        }
    }
    drop(listener);

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    let drain = async {
        while connections.join_next().await.is_some() {}
    };
    if tokio::time::timeout(grace, drain).await.is_err() {
        warn!(
            grace_secs = config.shutdown_grace_secs,
            "grace period elapsed; aborting remaining connections"
        );
        connections.shutdown().await;
    }

    dispatcher.lock_registry().shutdown();
    info!("server stopped");
    Ok(())
}

/// Read one request, dispatch it, write the reply. Decode failures become
/// error replies; the handling task never panics on malformed input.
async fn handle_connection(
    mut stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
    max_frame: usize,
) -> trove_core::Result<()> {
    let peer = stream.peer_addr()?;
    let (mut reader, mut writer) = stream.split();

    let decoded = wire::read_frame(&mut reader, max_frame)
        .await
        .and_then(|frame| Request::from_frame(&frame));
    let reply = match decoded {
        Ok(request) => {
            debug!(%peer, command = request.command(), project = request.project(), "request");
            dispatcher.dispatch(request).await
        }
        Err(err) => {
            warn!(%peer, error = %err, "malformed request");
            Reply::from_error(&err)
        }
    };

    wire::write_frame(&mut writer, &reply.to_frame()).await?;
    writer.shutdown().await?;
    Ok(())
}
