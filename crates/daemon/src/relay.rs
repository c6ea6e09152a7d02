// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker RPC relay.
//!
//! A reverse proxy that lets UIs address worker-side RPCs through the
//! control plane. Only the two worker service prefixes pass; the
//! `X-Worker-Id` header picks the target (empty means the registry
//! default), the worker's bearer secret is injected, and from there the
//! two TCP streams are piped byte-for-byte in both directions — unary,
//! server-streaming, and bidirectional RPCs all flow through untouched.

use std::sync::Arc;

use swb_wire::worker::{PATH_SYSTEM_SERVICE, PATH_WORKER_SERVICE};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::{host_port, WorkerRegistry};

/// Routing header naming the target worker.
pub const WORKER_ID_HEADER: &str = "x-worker-id";

/// Path prefixes UIs may reach through the relay.
const ALLOWED_PREFIXES: [&str; 2] = [PATH_SYSTEM_SERVICE, PATH_WORKER_SERVICE];

/// The relay accept loop.
pub struct Relay {
    registry: Arc<WorkerRegistry>,
}

impl Relay {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }

    /// Serve until cancelled.
    pub async fn run(self, listener: TcpListener, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "relay connection");
                        let registry = Arc::clone(&self.registry);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, registry).await {
                                debug!(error = %e, "relay connection ended");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "relay accept failed"),
                }
            }
        }
        info!("relay stopped");
    }
}

/// Parsed request head plus whatever body bytes were read with it.
struct RequestHead {
    request_line: String,
    headers: Vec<(String, String)>,
    buffered: Vec<u8>,
}

impl RequestHead {
    fn path(&self) -> &str {
        self.request_line.split_whitespace().nth(1).unwrap_or("")
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

async fn handle_connection(
    mut client: TcpStream,
    registry: Arc<WorkerRegistry>,
) -> std::io::Result<()> {
    let head = match read_request_head(&mut client).await {
        Ok(head) => head,
        Err(e) => {
            debug!(error = %e, "malformed relay request");
            return Ok(());
        }
    };

    // Allow-list check comes first; everything else is not ours to route
    let path = head.path();
    if !ALLOWED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return write_forbidden(&mut client, "service not allowed").await;
    }

    // Route by header; empty falls back to the registry default
    let worker_id = head.header(WORKER_ID_HEADER).unwrap_or("");
    let Some(worker) = registry.resolve(worker_id) else {
        return write_forbidden(&mut client, "unknown worker").await;
    };

    let upstream_addr = host_port(&worker.base_url).to_string();
    let mut upstream = match TcpStream::connect(&upstream_addr).await {
        Ok(upstream) => upstream,
        Err(e) => {
            warn!(worker_id = %worker.id, %upstream_addr, error = %e, "worker unreachable");
            return write_status(&mut client, 502, "Bad Gateway", "worker unreachable").await;
        }
    };

    // Rewrite the head: route header stripped, auth + host replaced
    let mut rewritten = String::new();
    rewritten.push_str(&head.request_line);
    rewritten.push_str("\r\n");
    for (name, value) in &head.headers {
        if name.eq_ignore_ascii_case(WORKER_ID_HEADER)
            || name.eq_ignore_ascii_case("authorization")
            || name.eq_ignore_ascii_case("host")
        {
            continue;
        }
        rewritten.push_str(name);
        rewritten.push_str(": ");
        rewritten.push_str(value);
        rewritten.push_str("\r\n");
    }
    rewritten.push_str(&format!("Host: {}\r\n", upstream_addr));
    rewritten.push_str(&format!("Authorization: Bearer {}\r\n", worker.shared_secret));
    rewritten.push_str("\r\n");

    upstream.write_all(rewritten.as_bytes()).await?;
    // Body bytes already pulled into our buffer go first
    if !head.buffered.is_empty() {
        upstream.write_all(&head.buffered).await?;
    }
    upstream.flush().await?;

    // From here both directions stream transparently
    let _ = tokio::io::copy_bidirectional(&mut client, &mut upstream).await;
    Ok(())
}

/// Read the request line and headers, keeping any extra buffered bytes
/// (the start of the body) for forwarding.
async fn read_request_head(client: &mut TcpStream) -> std::io::Result<RequestHead> {
    let mut reader = BufReader::new(client);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    let request_line = request_line.trim_end().to_string();
    if request_line.is_empty() {
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "empty request line"));
    }

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed mid-head",
            ));
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let buffered = reader.buffer().to_vec();
    Ok(RequestHead { request_line, headers, buffered })
}

async fn write_forbidden(client: &mut TcpStream, body: &str) -> std::io::Result<()> {
    write_status(client, 403, "Forbidden", body).await
}

async fn write_status(
    client: &mut TcpStream,
    code: u16,
    reason: &str,
    body: &str,
) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        code,
        reason,
        body.len(),
        body
    );
    client.write_all(response.as_bytes()).await?;
    client.flush().await
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
