// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types for the dispatch engine
//!
//! Every unit of work consumed by the dispatch worker is one `Event`.
//! Producers (transport read loops, application code, the housekeeping
//! ticker) construct events and hand them to the queue by value; the worker
//! takes ownership at drain time. State that must outlive dispatch, such as
//! the completion callback of an in-flight call, moves into a
//! [`Continuation`] held by the session table until the matching reply
//! arrives.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use std::fmt;

use crate::id::{RequestId, SessionId};
use crate::message;

/// Reply delivered to an outbound call's completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallReply {
    /// The callee yielded a result.
    Yield { options: Value, args: Option<Value> },
    /// The call failed, locally or at the peer.
    Error { error_uri: SmolStr, args: Option<Value> },
}

impl CallReply {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Completion callback of an outbound call. Fires exactly once, on the
/// dispatch worker thread.
pub type CallCallback = Box<dyn FnOnce(CallReply) + Send>;

/// Callback invoked when a connect attempt resolves.
pub type ConnectCallback = Box<dyn FnOnce(SessionId, ConnectOutcome) + Send>;

/// Result of a TCP connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    /// OS-level failure; `code` is the platform error number.
    Failed { code: i32 },
}

/// Pending-request state for a frame sent with `send_request`.
///
/// Stored in the session table keyed by the allocated request id; recovered
/// when the matching YIELD or ERROR arrives and moved onto the inbound
/// event's continuation slot.
pub struct Continuation {
    pub procedure: SmolStr,
    /// The caller's own correlation id, distinct from the wire request id.
    pub internal_request_id: u64,
    pub callback: CallCallback,
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("procedure", &self.procedure)
            .field("internal_request_id", &self.internal_request_id)
            .finish_non_exhaustive()
    }
}

/// A local caller's request to invoke a procedure somewhere in the
/// federation.
pub struct OutboundCall {
    pub procedure: SmolStr,
    pub args: Option<Value>,
    pub internal_request_id: u64,
    pub callback: CallCallback,
}

impl fmt::Debug for OutboundCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundCall")
            .field("procedure", &self.procedure)
            .field("internal_request_id", &self.internal_request_id)
            .finish_non_exhaustive()
    }
}

/// Which reply an [`OutboundResponse`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Yield,
    Error,
}

/// A reply to a previously received request, destined for a peer session.
#[derive(Debug)]
pub struct OutboundResponse {
    pub destination: SessionId,
    pub kind: ResponseKind,
    /// Message type of the request being answered, echoed in ERROR frames.
    pub request_type: u64,
    pub request: RequestId,
    pub options: Value,
    pub args: Option<Value>,
    /// Required when `kind` is [`ResponseKind::Error`].
    pub error_uri: Option<SmolStr>,
}

/// Lifecycle state reported for a peer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Opened,
    Closed,
}

/// Peer-supplied facts about a session, delivered with the open event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authid: Option<SmolStr>,
}

/// Result of a connect attempt, reported back to the initiator.
pub struct TcpConnect {
    pub session: SessionId,
    pub outcome: ConnectOutcome,
    pub callback: Option<ConnectCallback>,
}

impl fmt::Debug for TcpConnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpConnect")
            .field("session", &self.session)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

/// A decoded WAMP frame received from a peer session.
#[derive(Debug)]
pub struct InboundMessage {
    pub source: SessionId,
    /// Raw wire message id; may be a value this runtime does not know.
    pub msg_type: u64,
    /// The full JSON array as received.
    pub frame: Value,
    /// Populated by the session table for YIELD/ERROR frames that answer a
    /// request this runtime sent.
    pub continuation: Option<Continuation>,
}

/// Where the error reply for a failed event should be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorContext {
    pub source: SessionId,
    pub msg_type: u64,
    /// Wire request id at the conventional position, when readable.
    pub request_id: Option<RequestId>,
}

/// The unit of work consumed by the dispatch worker.
#[derive(Debug)]
pub enum Event {
    /// Sentinel: the worker exits its dequeue cycle without processing
    /// anything that follows.
    Shutdown,

    OutboundCall(OutboundCall),

    OutboundResponse(OutboundResponse),

    /// A pre-built protocol frame to forward as-is.
    OutboundMessage { destination: SessionId, frame: Value },

    SessionState { session: SessionId, state: SessionState, info: Option<SessionInfo> },

    /// Periodic tick driving session maintenance.
    Housekeeping,

    TcpConnect(TcpConnect),

    Inbound(InboundMessage),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Shutdown => "shutdown",
            Event::OutboundCall { .. } => "outbound:call",
            Event::OutboundResponse { .. } => "outbound:response",
            Event::OutboundMessage { .. } => "outbound:message",
            Event::SessionState { .. } => "session:state",
            Event::Housekeeping => "housekeeping",
            Event::TcpConnect { .. } => "tcp:connect",
            Event::Inbound { .. } => "inbound",
        }
    }

    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::Shutdown | Event::Housekeeping => t.to_string(),

            Event::OutboundCall(call) => {
                format!("{} procedure={} internal_req={}", t, call.procedure, call.internal_request_id)
            }

            Event::OutboundResponse(response) => format!(
                "{} dest={} kind={:?} req={}",
                t, response.destination, response.kind, response.request
            ),

            Event::OutboundMessage { destination, .. } => format!("{} dest={}", t, destination),

            Event::SessionState { session, state, .. } => {
                format!("{} session={} state={:?}", t, session, state)
            }

            Event::TcpConnect(connect) => {
                format!("{} session={} outcome={:?}", t, connect.session, connect.outcome)
            }

            Event::Inbound(msg) => format!("{} src={} msg_type={}", t, msg.source, msg.msg_type),
        }
    }

    /// Reply coordinates for error-to-reply translation.
    ///
    /// Extracted before dispatch consumes the event, so a failure can still
    /// be answered. Only inbound events have a peer to answer.
    pub fn error_context(&self) -> Option<ErrorContext> {
        match self {
            Event::Inbound(msg) => Some(ErrorContext {
                source: msg.source,
                msg_type: msg.msg_type,
                request_id: message::u64_at(&msg.frame, 1).ok().map(RequestId),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
