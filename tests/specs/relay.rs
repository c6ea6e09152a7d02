// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay scenarios over real TCP sockets.

use std::sync::Arc;

use swb_daemon::registry::{WorkerEntry, WorkerRegistry};
use swb_daemon::relay::Relay;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

async fn start_relay(registry: Arc<WorkerRegistry>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(Relay::new(registry).run(listener, CancellationToken::new()));
    addr
}

async fn send_raw(addr: &str, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn control_plane_services_are_not_relayed() {
    let registry = Arc::new(WorkerRegistry::new());
    registry.insert(WorkerEntry::new("w1", "http://127.0.0.1:1", "secret"));
    let relay_addr = start_relay(registry).await;

    let response = send_raw(
        &relay_addr,
        "GET /controlplane.v1.ThreadService/List HTTP/1.1\r\nHost: x\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 403"), "{response}");
    assert!(response.ends_with("service not allowed"), "{response}");
}

#[tokio::test]
async fn worker_service_forwards_to_the_default_worker() {
    // Fake worker answering one request
    let worker_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let worker_addr = worker_listener.local_addr().unwrap().to_string();
    let captured = tokio::spawn(async move {
        let (mut stream, _) = worker_listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let n = stream.read(&mut buf).await.unwrap();
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\npong")
            .await
            .unwrap();
        String::from_utf8_lossy(&buf[..n]).into_owned()
    });

    let registry = Arc::new(WorkerRegistry::new());
    registry.insert(WorkerEntry::new("w1", format!("http://{worker_addr}"), "sekrit"));
    let relay_addr = start_relay(registry).await;

    let response = send_raw(
        &relay_addr,
        "GET /worker.v1.SystemService/Ping HTTP/1.1\r\nHost: x\r\nX-Worker-Id: \r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.ends_with("pong"), "{response}");

    let forwarded = captured.await.unwrap();
    assert!(forwarded.contains("Authorization: Bearer sekrit\r\n"), "{forwarded}");
    assert!(!forwarded.to_ascii_lowercase().contains("x-worker-id"), "{forwarded}");
}

#[tokio::test]
async fn unknown_worker_header_is_rejected() {
    let registry = Arc::new(WorkerRegistry::new());
    registry.insert(WorkerEntry::new("w1", "http://127.0.0.1:1", "secret"));
    let relay_addr = start_relay(registry).await;

    let response = send_raw(
        &relay_addr,
        "GET /worker.v1.SystemService/Ping HTTP/1.1\r\nHost: x\r\nX-Worker-Id: ghost\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 403"), "{response}");
    assert!(response.ends_with("unknown worker"), "{response}");
}
