// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    hello        = { 1, MsgType::Hello },
    welcome      = { 2, MsgType::Welcome },
    abort        = { 3, MsgType::Abort },
    challenge    = { 4, MsgType::Challenge },
    authenticate = { 5, MsgType::Authenticate },
    goodbye      = { 6, MsgType::Goodbye },
    heartbeat    = { 7, MsgType::Heartbeat },
    error        = { 8, MsgType::Error },
    call         = { 48, MsgType::Call },
    register     = { 64, MsgType::Register },
    registered   = { 65, MsgType::Registered },
    invocation   = { 68, MsgType::Invocation },
    yield_       = { 70, MsgType::Yield },
)]
fn msg_type_wire_ids_round_trip(id: u64, expected: MsgType) {
    assert_eq!(MsgType::from_wire(id), Some(expected));
    assert_eq!(expected.wire_id(), id);
}

#[yare::parameterized(
    zero      = { 0 },
    publish   = { 16 },
    subscribe = { 32 },
    huge      = { 10_000 },
)]
fn unknown_wire_ids_do_not_map(id: u64) {
    assert_eq!(MsgType::from_wire(id), None);
}

#[test]
fn msg_type_displays_its_wire_name() {
    assert_eq!(MsgType::Invocation.to_string(), "INVOCATION");
}

#[test]
fn msg_id_reads_element_zero() {
    let frame = json!([64, 7, {}, "greet"]);
    assert_eq!(msg_id(&frame), Ok(64));
}

#[test]
fn msg_id_rejects_non_array() {
    assert_eq!(msg_id(&json!({"not": "an array"})), Err(MessageError::NotAnArray));
}

#[test]
fn u64_at_rejects_short_frame() {
    let frame = json!([70]);
    assert_eq!(u64_at(&frame, 1), Err(MessageError::TooShort { expected: 2, actual: 1 }));
}

#[test]
fn u64_at_rejects_wrong_type() {
    let frame = json!([70, "not a number"]);
    assert_eq!(
        u64_at(&frame, 1),
        Err(MessageError::BadElement { index: 1, expected: "unsigned integer" })
    );
}

#[test]
fn str_at_reads_strings() {
    let frame = json!([64, 7, {}, "greet"]);
    assert_eq!(str_at(&frame, 3), Ok("greet"));
    assert_eq!(
        str_at(&frame, 1),
        Err(MessageError::BadElement { index: 1, expected: "string" })
    );
}

#[test]
fn invocation_with_args() {
    let frame = invocation(RequestId::new(5), RegistrationId::new(2), Some(&json!(["hi"])));
    assert_eq!(frame, json!([68, 5, 2, {}, ["hi"]]));
}

#[test]
fn invocation_omits_missing_args() {
    let frame = invocation(RequestId::new(5), RegistrationId::new(2), None);
    assert_eq!(frame, json!([68, 5, 2, {}]));
}

#[test]
fn registered_reply_shape() {
    assert_eq!(registered(RequestId::new(7), RegistrationId::new(1)), json!([65, 7, 1]));
}

#[test]
fn yield_frame_with_and_without_args() {
    assert_eq!(
        yield_frame(RequestId::new(3), &json!({}), Some(&json!(["ok"]))),
        json!([70, 3, {}, ["ok"]])
    );
    assert_eq!(yield_frame(RequestId::new(3), &json!({}), None), json!([70, 3, {}]));
}

#[test]
fn error_response_short_shape() {
    let frame = error_response(68, RequestId::new(4), &json!({}), uri::INVALID_ARGUMENT);
    assert_eq!(frame, json!([8, 68, 4, {}, "wamp.error.invalid_argument"]));
}

#[test]
fn error_reply_full_shape() {
    let frame = error_reply(68, RequestId::new(4), uri::NO_SUCH_PROCEDURE);
    assert_eq!(frame, json!([8, 68, 4, {}, "wamp.error.no_such_procedure", [], {}]));
}

#[test]
fn error_reply_without_request_has_no_request_id() {
    let frame = error_reply_without_request(MsgType::Call, uri::NO_SUCH_PROCEDURE);
    assert_eq!(frame, json!([8, 48, {}, "wamp.error.no_such_procedure", [], {}]));
}

#[test]
fn error_reply_with_detail_appends_the_reason() {
    let frame = error_reply_with_detail(
        MsgType::Register,
        RequestId::new(9),
        uri::PROCEDURE_ALREADY_EXISTS,
        "procedure taken",
    );
    assert_eq!(
        frame,
        json!([8, 64, 9, {}, "wamp.error.procedure_already_exists", [], {}, "procedure taken"])
    );
}
