//! End-to-end tests over a real TCP socket.

use bytes::Bytes;
use std::net::SocketAddr;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use trove_core::manifest::FileEntry;
use trove_core::protocol::{decode_snapshot_reply, decode_version_reply, PushEntry, Request};
use trove_core::store::ContentHash;
use trove_core::wire::{self, Frame, MAX_FRAME_SIZE};
use trove_core::Error;
use trove_server::{serve_on, ServerConfig, ShutdownCoordinator, ShutdownHandle};

async fn start_server(root: &Path) -> (SocketAddr, ShutdownHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig {
        listen_addr: addr.to_string(),
        project_root: root.to_path_buf(),
        shutdown_grace_secs: 5,
        max_frame_bytes: MAX_FRAME_SIZE,
    };
    let (handle, coordinator) = ShutdownCoordinator::manual();
    tokio::spawn(async move {
        serve_on(listener, config, coordinator).await.unwrap();
    });
    (addr, handle)
}

async fn exchange(addr: SocketAddr, frame: &Frame) -> Frame {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    wire::write_frame(&mut stream, frame).await.unwrap();
    stream.shutdown().await.unwrap();
    wire::read_frame(&mut stream, MAX_FRAME_SIZE).await.unwrap()
}

async fn send(addr: SocketAddr, request: Request) -> Frame {
    exchange(addr, &request.to_frame()).await
}

fn added(path: &str, content: &[u8]) -> PushEntry {
    PushEntry::new(
        FileEntry::added(path, ContentHash::from_data(content)),
        Some(Bytes::copy_from_slice(content)),
    )
}

#[tokio::test]
async fn test_scenario_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _handle) = start_server(dir.path()).await;

    let reply = send(addr, Request::CreateProject { project: "p1".into() }).await;
    assert_eq!(decode_version_reply(&reply).unwrap(), 1);

    let reply = send(
        addr,
        Request::Push {
            project: "p1".into(),
            batch: vec![added("a.txt", b"first")],
        },
    )
    .await;
    assert_eq!(decode_version_reply(&reply).unwrap(), 2);

    let reply = send(
        addr,
        Request::Push {
            project: "p1".into(),
            batch: vec![added("a.txt", b"second")],
        },
    )
    .await;
    assert_eq!(decode_version_reply(&reply).unwrap(), 3);

    let reply = send(addr, Request::Checkout { project: "p1".into() }).await;
    let (manifest, contents) = decode_snapshot_reply(&reply).unwrap();
    assert_eq!(manifest.version, 3);
    let entry = manifest.entry("a.txt").unwrap();
    assert_eq!(entry.version, 1);
    assert_eq!(entry.hash, ContentHash::from_data(b"second"));
    assert_eq!(contents, vec![Bytes::from_static(b"second")]);

    let reply = send(addr, Request::Rollback { project: "p1".into() }).await;
    assert_eq!(decode_version_reply(&reply).unwrap(), 4);

    let reply = send(addr, Request::Checkout { project: "p1".into() }).await;
    let (manifest, contents) = decode_snapshot_reply(&reply).unwrap();
    assert_eq!(manifest.entry("a.txt").unwrap().hash, ContentHash::from_data(b"first"));
    assert_eq!(contents, vec![Bytes::from_static(b"first")]);

    let reply = send(addr, Request::GetCurrentVersion { project: "p1".into() }).await;
    assert_eq!(decode_version_reply(&reply).unwrap(), 4);
}

#[tokio::test]
async fn test_error_replies_are_specific() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _handle) = start_server(dir.path()).await;

    send(addr, Request::CreateProject { project: "p1".into() }).await;
    let reply = send(addr, Request::CreateProject { project: "p1".into() }).await;
    assert!(matches!(
        decode_version_reply(&reply),
        Err(Error::ProjectExists(_))
    ));

    let reply = send(
        addr,
        Request::Push {
            project: "ghost".into(),
            batch: vec![],
        },
    )
    .await;
    assert!(matches!(
        decode_version_reply(&reply),
        Err(Error::ProjectNotFound(_))
    ));

    let reply = send(addr, Request::Rollback { project: "p1".into() }).await;
    assert!(matches!(decode_version_reply(&reply), Err(Error::NoHistory(_))));

    let reply = send(
        addr,
        Request::Commit {
            project: "p1".into(),
            batch: vec![],
        },
    )
    .await;
    assert!(matches!(
        decode_version_reply(&reply),
        Err(Error::NothingStaged(_))
    ));
}

#[tokio::test]
async fn test_malformed_frame_gets_protocol_error_reply() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _handle) = start_server(dir.path()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"abc:push").await.unwrap();
    stream.shutdown().await.unwrap();
    let reply = wire::read_frame(&mut stream, MAX_FRAME_SIZE).await.unwrap();

    assert_eq!(reply.command, "err");
    assert_eq!(&reply.params[0][..], b"protocol");
}

#[tokio::test]
async fn test_concurrent_pushes_are_serialized() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _handle) = start_server(dir.path()).await;

    send(addr, Request::CreateProject { project: "p1".into() }).await;

    let pushers = 8;
    let mut handles = Vec::new();
    for i in 0..pushers {
        handles.push(tokio::spawn(async move {
            let content = format!("content {i}");
            let reply = send(
                addr,
                Request::Push {
                    project: "p1".into(),
                    batch: vec![added(&format!("file-{i}.txt"), content.as_bytes())],
                },
            )
            .await;
            decode_version_reply(&reply).unwrap()
        }));
    }
    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap());
    }

    // Total order: every push got its own version bump.
    versions.sort();
    let expected: Vec<u64> = (2..2 + pushers as u64).collect();
    assert_eq!(versions, expected);

    let reply = send(addr, Request::GetCurrentVersion { project: "p1".into() }).await;
    assert_eq!(decode_version_reply(&reply).unwrap(), 1 + pushers as u64);

    let reply = send(addr, Request::Checkout { project: "p1".into() }).await;
    let (manifest, _) = decode_snapshot_reply(&reply).unwrap();
    assert_eq!(manifest.len(), pushers);
}

#[tokio::test]
async fn test_cross_project_pushes_do_not_interfere() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _handle) = start_server(dir.path()).await;

    send(addr, Request::CreateProject { project: "p1".into() }).await;
    send(addr, Request::CreateProject { project: "p2".into() }).await;

    let push_to = |project: String| async move {
        let reply = send(
            addr,
            Request::Push {
                project,
                batch: vec![added("shared-name.txt", b"contents")],
            },
        )
        .await;
        decode_version_reply(&reply).unwrap()
    };
    let (v1, v2) = tokio::join!(push_to("p1".to_string()), push_to("p2".to_string()));
    assert_eq!(v1, 2);
    assert_eq!(v2, 2);
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, handle) = start_server(dir.path()).await;

    send(addr, Request::CreateProject { project: "p1".into() }).await;
    handle.shutdown();
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    assert!(TcpStream::connect(addr).await.is_err());
}
