// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for protocol serde roundtrips and the record codec laws.
//!
//! Covers every variant of Request, Response, and SyncFrame with minimal
//! fixed field values, plus the two codec laws: `unmarshal(marshal(r)) == r`
//! and `to_client_event(to_record(e))` matching the direct field mapping.

use proptest::prelude::*;
use swb_core::{ContentBlock, Location, SessionId, ToolKind, ToolStatus, WorkerEvent};

use crate::client::{to_client_event, ClientEvent};
use crate::record::{marshal, to_record, unmarshal};
use crate::rpc::{ErrorKind, Request, Response, SessionDetail};
use crate::sync::{SessionState, SyncFrame, SyncRequest};
use crate::wire::{decode, encode};

fn s() -> String {
    String::new()
}

fn all_requests() -> Vec<Request> {
    vec![
        Request::Ping,
        Request::CreateSession {
            thread_id: s(),
            worker_id: s(),
            prompt: s(),
            agent: s(),
            model: s(),
            mode: s(),
            session_mode: s(),
        },
        Request::GetSession { id: s() },
        Request::ListSessions { thread_id: s() },
        Request::SetSessionMode { session_id: s(), mode_id: s() },
        Request::SendUserMessage { thread_id: s(), text: s() },
        Request::WatchSessionEvents {
            session_id: Some(s()),
            thread_id: None,
            task_id: None,
            after_sequence: -1,
        },
    ]
}

fn sample_detail() -> SessionDetail {
    SessionDetail {
        id: s(),
        thread_id: s(),
        worker_id: s(),
        prompt: s(),
        status: swb_core::SessionStatus::Pending,
        agent: s(),
        model: s(),
        mode: s(),
        session_mode: s(),
        agent_session_id: None,
        task_id: None,
        created_at_ms: 0,
        updated_at_ms: 0,
    }
}

fn sample_client_event() -> ClientEvent {
    to_client_event(&to_record(
        &SessionId::new("s1"),
        1,
        "2026-01-15T10:30:00Z",
        &WorkerEvent::AgentMessageChunk { text: "x".to_string() },
    ))
}

fn all_responses() -> Vec<Response> {
    vec![
        Response::Ok,
        Response::Pong,
        Response::Error { kind: ErrorKind::InvalidArgument, message: s() },
        Response::Error { kind: ErrorKind::FailedPrecondition, message: s() },
        Response::Error { kind: ErrorKind::NotFound, message: s() },
        Response::Error { kind: ErrorKind::Internal, message: s() },
        Response::Session { session: sample_detail() },
        Response::Sessions { sessions: vec![sample_detail()] },
        Response::Event { event: sample_client_event(), is_history: true },
    ]
}

fn all_sync_frames() -> Vec<SyncFrame> {
    vec![
        SyncFrame::Snapshot {
            sessions: vec![SessionState { session_id: s(), status: s(), mode_id: s() }],
        },
        SyncFrame::SessionUpdate { session_id: s(), topic: s(), status: None },
        SyncFrame::SessionRemoved { session_id: s() },
        SyncFrame::SessionEvent {
            session_id: s(),
            seq: 0,
            ts: None,
            event: WorkerEvent::UserMessage { text: s() },
        },
    ]
}

fn arb_worker_event() -> impl Strategy<Value = WorkerEvent> {
    let text = "[a-z ]{0,12}";
    prop_oneof![
        text.prop_map(|text| WorkerEvent::AgentMessageChunk { text }),
        text.prop_map(|text| WorkerEvent::AgentThoughtChunk { text }),
        text.prop_map(|text| WorkerEvent::UserMessage { text }),
        text.prop_map(|status| WorkerEvent::StatusChange { status }),
        text.prop_map(|mode_id| WorkerEvent::CurrentModeUpdate { mode_id }),
        (text, text, 0u32..5).prop_map(|(tool_call_id, title, n)| WorkerEvent::ToolCall {
            tool_call_id,
            title,
            kind: ToolKind::Execute,
            status: ToolStatus::InProgress,
            raw_input: None,
            locations: (0..n)
                .map(|i| Location { path: format!("f{i}.rs"), line: i })
                .collect(),
            content: vec![ContentBlock::Text { text: "t".to_string() }],
        }),
        (text, text).prop_map(|(tool_call_id, raw_output)| WorkerEvent::ToolCallUpdate {
            tool_call_id,
            status: Some(ToolStatus::Completed),
            raw_output: Some(raw_output),
            content: vec![],
        }),
    ]
}

proptest! {
    #[test]
    fn request_serde_roundtrip(req in proptest::sample::select(all_requests())) {
        let bytes = encode(&req).unwrap();
        let back: Request = decode(&bytes).unwrap();
        prop_assert_eq!(back, req);
    }

    #[test]
    fn response_serde_roundtrip(resp in proptest::sample::select(all_responses())) {
        let bytes = encode(&resp).unwrap();
        let back: Response = decode(&bytes).unwrap();
        prop_assert_eq!(back, resp);
    }

    #[test]
    fn sync_frame_serde_roundtrip(frame in proptest::sample::select(all_sync_frames())) {
        let json = serde_json::to_string(&frame).unwrap();
        let back: SyncFrame = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, frame);
    }

    #[test]
    fn record_marshal_unmarshal_roundtrip(event in arb_worker_event(), seq in 0i64..10_000) {
        let record = to_record(&SessionId::new("s1"), seq, "2026-01-15T10:30:00.5Z", &event);
        let back = unmarshal(&marshal(&record).unwrap()).unwrap();
        prop_assert_eq!(back, record);
    }

    #[test]
    fn client_mapping_preserves_envelope_and_text(event in arb_worker_event(), seq in 0i64..10_000) {
        let record = to_record(&SessionId::new("s1"), seq, "2026-01-15T10:30:00.5Z", &event);
        let client = to_client_event(&record);
        prop_assert_eq!(&client.session_id, &record.session_id);
        prop_assert_eq!(client.seq, record.seq);
        prop_assert_eq!(&client.ts, &record.ts);
        prop_assert_eq!(&client.event_type, &record.event_type);
        prop_assert_eq!(&client.text, &record.text);
        prop_assert_eq!(&client.tool_call_id, &record.tool_call_id);
        prop_assert_eq!(&client.status, &record.status);
        prop_assert_eq!(&client.mode_id, &record.mode_id);
    }

    #[test]
    fn ack_roundtrip(seq in 0i64..i64::MAX) {
        let ack = SyncRequest::ack("s1", seq);
        let json = serde_json::to_string(&ack).unwrap();
        let back: SyncRequest = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, ack);
    }
}
