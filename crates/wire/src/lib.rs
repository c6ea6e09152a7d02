// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for the Switchboard control plane.
//!
//! Everything that crosses a process boundary lives here: the versioned
//! session-event record, the outbound client event schema, the state-sync
//! framing toward workers, the UI request/response protocol, the worker
//! unary RPC payloads, and the length-prefixed JSON wire format.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod record;
mod rpc;
mod sync;
mod wire;
pub mod worker;

pub use client::{to_client_event, ClientEvent, WatchFrame};
pub use record::{
    chunk_record, is_chunk_kind, marshal, to_record, unmarshal, CodecError, SessionEventRecord,
    RECORD_VERSION,
};
pub use record::kind;
pub use rpc::{ErrorKind, Request, Response, SessionDetail};
pub use sync::{SessionState, SyncFrame, SyncRequest};
pub use wire::{
    decode, encode, read_message, read_request, write_message, write_response, ProtocolError,
    DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE,
};

#[cfg(test)]
mod property_tests;
