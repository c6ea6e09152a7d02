// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for worker unary RPCs.
//!
//! Sends HTTP/1.1 requests over TCP with bearer-token auth. Reads
//! responses using Content-Length framing (does not depend on connection
//! close for EOF).

use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Overall timeout covering connect + write + read.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// HTTP POST with a bearer auth token.
pub async fn post_authed(
    addr: &str,
    path: &str,
    body: &str,
    token: &str,
) -> Result<String, HttpError> {
    let request = format!(
        "POST {} HTTP/1.1\r\nHost: {}\r\nAuthorization: Bearer {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        path,
        addr,
        token,
        body.len(),
        body
    );
    timed_request(addr, &request).await
}

/// Connect, send, and read with one timeout covering the entire
/// operation. Prevents hangs when a worker accepts the connection but
/// never responds.
async fn timed_request(addr: &str, request: &str) -> Result<String, HttpError> {
    tokio::time::timeout(REQUEST_TIMEOUT, send_request(addr, request))
        .await
        .map_err(|_| HttpError::Timeout)?
}

async fn send_request(addr: &str, request: &str) -> Result<String, HttpError> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|e| HttpError::Transport(format!("TCP connect failed: {}", e)))?;
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| HttpError::Transport(format!("write failed: {}", e)))?;

    let mut reader = BufReader::new(&mut stream);
    read_http_response(&mut reader).await
}

/// Read and parse an HTTP/1.1 response from a buffered stream.
pub(crate) async fn read_http_response<R: tokio::io::AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<String, HttpError> {
    // Read status line
    let mut status_line = String::new();
    reader
        .read_line(&mut status_line)
        .await
        .map_err(|e| HttpError::Transport(format!("read status failed: {}", e)))?;

    let status_code =
        status_line.split_whitespace().nth(1).and_then(|s| s.parse::<u16>().ok()).unwrap_or(0);

    // Read headers, extract Content-Length (case-insensitive)
    let mut content_length: usize = 0;
    loop {
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .await
            .map_err(|e| HttpError::Transport(format!("read header failed: {}", e)))?;
        if line == "\r\n" || line == "\n" || line.is_empty() {
            break;
        }
        let line_lower = line.to_ascii_lowercase();
        if let Some(val) = line_lower.strip_prefix("content-length:") {
            content_length = val.trim().parse().unwrap_or(0);
        }
    }

    // Read body
    let body = if content_length > 0 {
        let mut buf = vec![0u8; content_length];
        reader
            .read_exact(&mut buf)
            .await
            .map_err(|e| HttpError::Transport(format!("read body failed: {}", e)))?;
        String::from_utf8_lossy(&buf).into_owned()
    } else {
        String::new()
    };

    if status_code >= 400 {
        return Err(HttpError::Status { status: status_code, body: body.trim().to_string() });
    }

    Ok(body)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
