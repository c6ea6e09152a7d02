// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for UI socket I/O.
//!
//! Accepts connections on the daemon's Unix socket and serves the
//! length-prefixed request/response protocol. Unary requests get one
//! response each; a watch request turns its connection into a one-way
//! stream of event frames until the client disconnects.

mod watch;

pub use watch::{watch_session_events, WatchScope};

use std::sync::Arc;

use swb_core::Clock;
use swb_storage::Store;
use swb_wire::{
    write_response, ProtocolError, Request, Response, SessionDetail, WatchFrame, DEFAULT_TIMEOUT,
};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::service::{CreateSessionParams, ServiceError, SessionService};
use crate::workers::WorkerApi;

/// Shared context for all connection handlers.
pub struct ListenCtx<S, W, C> {
    pub service: SessionService<S, W, C>,
    pub shutdown: CancellationToken,
}

/// Listener task for accepting socket connections.
pub struct Listener<S, W, C> {
    socket: UnixListener,
    ctx: Arc<ListenCtx<S, W, C>>,
}

impl<S, W, C> Listener<S, W, C>
where
    S: Store + 'static,
    W: WorkerApi + 'static,
    C: Clock + 'static,
{
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx<S, W, C>>) -> Self {
        Self { socket, ctx }
    }

    /// Run the accept loop until shutdown, spawning a task per connection.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.ctx.shutdown.cancelled() => break,
                accepted = self.socket.accept() => match accepted {
                    Ok((stream, _)) => {
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &ctx).await {
                                match e {
                                    ProtocolError::ConnectionClosed => {}
                                    e => debug!(error = %e, "connection ended"),
                                }
                            }
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                    }
                }
            }
        }
    }
}

async fn handle_connection<S, W, C>(
    mut stream: UnixStream,
    ctx: &ListenCtx<S, W, C>,
) -> Result<(), ProtocolError>
where
    S: Store + 'static,
    W: WorkerApi + 'static,
    C: Clock + 'static,
{
    loop {
        // Block indefinitely for the next request; UI connections idle
        let bytes = swb_wire::read_message(&mut stream).await?;
        let request: Request = match swb_wire::decode(&bytes) {
            Ok(request) => request,
            Err(e) => {
                let response = Response::invalid_argument(format!("malformed request: {e}"));
                write_response(&mut stream, &response, DEFAULT_TIMEOUT).await?;
                continue;
            }
        };

        match request {
            Request::WatchSessionEvents { session_id, thread_id, task_id, after_sequence } => {
                // The watch owns the connection from here on
                return serve_watch(stream, ctx, session_id, thread_id, task_id, after_sequence)
                    .await;
            }
            request => {
                let response = handle_request(request, ctx).await;
                write_response(&mut stream, &response, DEFAULT_TIMEOUT).await?;
            }
        }
    }
}

/// Dispatch one unary request.
async fn handle_request<S, W, C>(request: Request, ctx: &ListenCtx<S, W, C>) -> Response
where
    S: Store,
    W: WorkerApi,
    C: Clock,
{
    let service = &ctx.service;
    match request {
        Request::Ping => Response::Pong,

        Request::CreateSession { thread_id, worker_id, prompt, agent, model, mode, session_mode } => {
            let params = CreateSessionParams {
                thread_id,
                worker_id,
                prompt,
                agent,
                model,
                mode,
                session_mode,
            };
            match service.create_session(params).await {
                Ok(session) => Response::Session { session: SessionDetail::from(&session) },
                Err(e) => error_response(e),
            }
        }

        Request::GetSession { id } => match service.get_session(&id).await {
            Ok(session) => Response::Session { session: SessionDetail::from(&session) },
            Err(e) => error_response(e),
        },

        Request::ListSessions { thread_id } => match service.list_sessions(&thread_id).await {
            Ok(sessions) => Response::Sessions {
                sessions: sessions.iter().map(SessionDetail::from).collect(),
            },
            Err(e) => error_response(e),
        },

        Request::SetSessionMode { session_id, mode_id } => {
            match service.set_session_mode(&session_id, &mode_id).await {
                Ok(()) => Response::Ok,
                Err(e) => error_response(e),
            }
        }

        Request::SendUserMessage { thread_id, text } => {
            match service.send_user_message(&thread_id, &text).await {
                Ok(()) => Response::Ok,
                Err(e) => error_response(e),
            }
        }

        // Handled by the connection loop before dispatch
        Request::WatchSessionEvents { .. } => {
            Response::invalid_argument("watch cannot be dispatched as a unary request")
        }
    }
}

/// Stream watch frames over the connection until the client disconnects.
async fn serve_watch<S, W, C>(
    mut stream: UnixStream,
    ctx: &ListenCtx<S, W, C>,
    session_id: Option<String>,
    thread_id: Option<String>,
    task_id: Option<String>,
    after_sequence: i64,
) -> Result<(), ProtocolError>
where
    S: Store + 'static,
    W: WorkerApi + 'static,
    C: Clock + 'static,
{
    let scope = match WatchScope::from_request(session_id, thread_id, task_id) {
        Ok(scope) => scope,
        Err(message) => {
            let response = Response::invalid_argument(message);
            return write_response(&mut stream, &response, DEFAULT_TIMEOUT).await;
        }
    };

    let (tx, mut rx) = mpsc::channel::<WatchFrame>(WATCH_CHANNEL_CAPACITY);
    let cancel = ctx.shutdown.child_token();
    {
        let store = Arc::clone(ctx.service.store());
        let bus = ctx.service.bus().clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            watch_session_events(&store, &bus, scope, after_sequence, tx, cancel).await;
        });
    }

    // Pump frames to the socket; a write failure means the client is gone
    while let Some(frame) = rx.recv().await {
        let response = Response::Event { event: frame.event, is_history: frame.is_history };
        if let Err(e) = write_response(&mut stream, &response, DEFAULT_TIMEOUT).await {
            cancel.cancel();
            return Err(e);
        }
    }
    cancel.cancel();
    Ok(())
}

/// Frames buffered between the watch task and the socket writer.
const WATCH_CHANNEL_CAPACITY: usize = 64;

fn error_response(e: ServiceError) -> Response {
    match e {
        ServiceError::InvalidArgument(message) => Response::invalid_argument(message),
        ServiceError::FailedPrecondition(message) => Response::failed_precondition(message),
        ServiceError::NotFound(message) => Response::not_found(message),
        ServiceError::Internal(message) => {
            Response::error(swb_wire::ErrorKind::Internal, message)
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
