// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAMP wire form: message ids, error URIs, frame builders and accessors.
//!
//! Messages are JSON arrays whose first element is a small integer message
//! id. Builders produce `serde_json::Value` arrays ready for serialization;
//! accessors read elements out of received arrays with type checking.

use serde_json::{json, Value};
use thiserror::Error;

use crate::id::{RegistrationId, RequestId};

/// Known WAMP message types.
///
/// `Heartbeat` keeps the legacy draft id; peers that still emit it are
/// tolerated and the frame is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    Hello = 1,
    Welcome = 2,
    Abort = 3,
    Challenge = 4,
    Authenticate = 5,
    Goodbye = 6,
    Heartbeat = 7,
    Error = 8,
    Call = 48,
    Register = 64,
    Registered = 65,
    Invocation = 68,
    Yield = 70,
}

impl MsgType {
    /// Map a raw wire id to a known message type.
    pub fn from_wire(id: u64) -> Option<Self> {
        match id {
            1 => Some(Self::Hello),
            2 => Some(Self::Welcome),
            3 => Some(Self::Abort),
            4 => Some(Self::Challenge),
            5 => Some(Self::Authenticate),
            6 => Some(Self::Goodbye),
            7 => Some(Self::Heartbeat),
            8 => Some(Self::Error),
            48 => Some(Self::Call),
            64 => Some(Self::Register),
            65 => Some(Self::Registered),
            68 => Some(Self::Invocation),
            70 => Some(Self::Yield),
            _ => None,
        }
    }

    pub fn wire_id(self) -> u64 {
        self as u64
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Hello => "HELLO",
            Self::Welcome => "WELCOME",
            Self::Abort => "ABORT",
            Self::Challenge => "CHALLENGE",
            Self::Authenticate => "AUTHENTICATE",
            Self::Goodbye => "GOODBYE",
            Self::Heartbeat => "HEARTBEAT",
            Self::Error => "ERROR",
            Self::Call => "CALL",
            Self::Register => "REGISTER",
            Self::Registered => "REGISTERED",
            Self::Invocation => "INVOCATION",
            Self::Yield => "YIELD",
        }
    }
}

impl std::fmt::Display for MsgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error URIs this runtime produces or recognizes.
pub mod uri {
    pub const NO_SUCH_PROCEDURE: &str = "wamp.error.no_such_procedure";
    pub const PROCEDURE_ALREADY_EXISTS: &str = "wamp.error.procedure_already_exists";
    pub const INVALID_ARGUMENT: &str = "wamp.error.invalid_argument";
    pub const MESSAGE_NOT_SUPPORTED: &str = "wamp.error.message_not_supported";
    pub const TIMEOUT: &str = "wamp.error.timeout";
    pub const CANCELED: &str = "wamp.error.canceled";
    pub const NO_SUCH_SESSION: &str = "wamp.error.no_such_session";
    /// Fallback when a peer's ERROR frame carries no parsable URI.
    pub const UNKNOWN: &str = "wamp.error.unknown";
}

/// A received frame that cannot be read as expected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("frame is not an array")]
    NotAnArray,

    #[error("frame has {actual} elements, expected at least {expected}")]
    TooShort { expected: usize, actual: usize },

    #[error("frame element {index} is not a {expected}")]
    BadElement { index: usize, expected: &'static str },
}

/// Read the message id (element 0) of a frame.
pub fn msg_id(frame: &Value) -> Result<u64, MessageError> {
    u64_at(frame, 0)
}

/// Read element `index` as an unsigned integer.
pub fn u64_at(frame: &Value, index: usize) -> Result<u64, MessageError> {
    element(frame, index)?
        .as_u64()
        .ok_or(MessageError::BadElement { index, expected: "unsigned integer" })
}

/// Read element `index` as a string slice.
pub fn str_at(frame: &Value, index: usize) -> Result<&str, MessageError> {
    element(frame, index)?
        .as_str()
        .ok_or(MessageError::BadElement { index, expected: "string" })
}

/// Read element `index`, failing if the frame is not an array or too short.
pub fn element(frame: &Value, index: usize) -> Result<&Value, MessageError> {
    let array = frame.as_array().ok_or(MessageError::NotAnArray)?;
    array
        .get(index)
        .ok_or(MessageError::TooShort { expected: index + 1, actual: array.len() })
}

/// `[INVOCATION, request_id, registration_id, {}, args?]`
///
/// The trailing args element is omitted when the call carried none.
pub fn invocation(
    request: RequestId,
    registration: RegistrationId,
    args: Option<&Value>,
) -> Value {
    let mut msg = vec![
        json!(MsgType::Invocation.wire_id()),
        json!(request),
        json!(registration),
        json!({}),
    ];
    if let Some(args) = args {
        msg.push(args.clone());
    }
    Value::Array(msg)
}

/// `[REGISTERED, request_id, registration_id]`
pub fn registered(request: RequestId, registration: RegistrationId) -> Value {
    json!([MsgType::Registered.wire_id(), request, registration])
}

/// `[YIELD, request_id, options, args?]`
pub fn yield_frame(request: RequestId, options: &Value, args: Option<&Value>) -> Value {
    let mut msg = vec![json!(MsgType::Yield.wire_id()), json!(request), options.clone()];
    if let Some(args) = args {
        msg.push(args.clone());
    }
    Value::Array(msg)
}

/// `[ERROR, request_type, request_id, options, error_uri]`
///
/// The short reply shape used for locally originated error responses.
pub fn error_response(
    request_type: u64,
    request: RequestId,
    options: &Value,
    error_uri: &str,
) -> Value {
    json!([MsgType::Error.wire_id(), request_type, request, options.clone(), error_uri])
}

/// `[ERROR, request_type, request_id, {}, error_uri, [], {}]`
pub fn error_reply(request_type: u64, request: RequestId, error_uri: &str) -> Value {
    json!([MsgType::Error.wire_id(), request_type, request, {}, error_uri, [], {}])
}

/// `[ERROR, request_type, {}, error_uri, [], {}]`
///
/// The request id is left out: it cannot be trusted on a frame that already
/// failed validation.
pub fn error_reply_without_request(request_type: MsgType, error_uri: &str) -> Value {
    json!([MsgType::Error.wire_id(), request_type.wire_id(), {}, error_uri, [], {}])
}

/// `[ERROR, request_type, request_id, {}, error_uri, [], {}, detail]`
///
/// The trailing detail element carries a human-readable reason for peers
/// that surface it.
pub fn error_reply_with_detail(
    request_type: MsgType,
    request: RequestId,
    error_uri: &str,
    detail: &str,
) -> Value {
    json!([
        MsgType::Error.wire_id(),
        request_type.wire_id(),
        request,
        {},
        error_uri,
        [],
        {},
        detail
    ])
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
