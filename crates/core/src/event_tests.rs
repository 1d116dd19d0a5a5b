// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn inbound(msg_type: u64, frame: Value) -> Event {
    Event::Inbound(InboundMessage { source: SessionId::new(3), msg_type, frame, continuation: None })
}

#[test]
fn names_cover_every_variant() {
    let events = [
        (Event::Shutdown, "shutdown"),
        (Event::Housekeeping, "housekeeping"),
        (
            Event::OutboundMessage { destination: SessionId::new(1), frame: json!([65, 1, 1]) },
            "outbound:message",
        ),
        (
            Event::SessionState {
                session: SessionId::new(1),
                state: SessionState::Opened,
                info: None,
            },
            "session:state",
        ),
        (
            Event::TcpConnect(TcpConnect {
                session: SessionId::new(1),
                outcome: ConnectOutcome::Connected,
                callback: None,
            }),
            "tcp:connect",
        ),
        (inbound(70, json!([70, 1, {}])), "inbound"),
    ];
    for (event, expected) in events {
        assert_eq!(event.name(), expected);
    }
}

#[test]
fn call_events_summarize_procedure_and_correlation() {
    let event = Event::OutboundCall(OutboundCall {
        procedure: "com.example.greet".into(),
        args: None,
        internal_request_id: 42,
        callback: Box::new(|_| {}),
    });
    assert_eq!(event.name(), "outbound:call");
    let summary = event.log_summary();
    assert!(summary.contains("com.example.greet"), "missing procedure: {}", summary);
    assert!(summary.contains("42"), "missing correlation id: {}", summary);
}

#[test]
fn inbound_summary_names_source_and_msg_type() {
    let summary = inbound(64, json!([64, 7, {}, "greet"])).log_summary();
    assert!(summary.contains("src=3"), "{}", summary);
    assert!(summary.contains("msg_type=64"), "{}", summary);
}

#[test]
fn error_context_reads_the_wire_request_id() {
    let context = inbound(64, json!([64, 7, {}, "greet"])).error_context().unwrap();
    assert_eq!(context.source, SessionId::new(3));
    assert_eq!(context.msg_type, 64);
    assert_eq!(context.request_id, Some(RequestId::new(7)));
}

#[test]
fn error_context_tolerates_a_non_integer_second_element() {
    let context = inbound(1, json!([1, "realm", {}])).error_context().unwrap();
    assert_eq!(context.request_id, None);
}

#[test]
fn only_inbound_events_have_an_error_context() {
    assert!(Event::Shutdown.error_context().is_none());
    assert!(Event::Housekeeping.error_context().is_none());
    let outbound =
        Event::OutboundMessage { destination: SessionId::new(9), frame: json!([65, 1, 1]) };
    assert!(outbound.error_context().is_none());
}

#[test]
fn call_reply_error_predicate() {
    let yielded = CallReply::Yield { options: json!({}), args: None };
    let failed = CallReply::Error { error_uri: "wamp.error.timeout".into(), args: None };
    assert!(!yielded.is_error());
    assert!(failed.is_error());
}

#[test]
fn continuation_debug_hides_the_callback() {
    let continuation = Continuation {
        procedure: "greet".into(),
        internal_request_id: 7,
        callback: Box::new(|_| {}),
    };
    let debug = format!("{:?}", continuation);
    assert!(debug.contains("greet"), "{}", debug);
    assert!(debug.contains(".."), "{}", debug);
}
