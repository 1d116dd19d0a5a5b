// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session registry: outbound routing, request correlation, housekeeping
//!
//! Each peer session owns a frame sink (the transport write half), a
//! request-id allocator and a pending-request map. Requests sent with
//! [`SessionManager::send_request`] record a [`Continuation`]; when the
//! matching YIELD or ERROR arrives, [`SessionTable::route_inbound`] moves
//! the continuation onto the inbound event before enqueueing it, so the
//! dispatcher can complete the original call.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use wamprs_core::message::{self, uri, MsgType};
use wamprs_core::{
    CallReply, Clock, Continuation, Event, InboundMessage, RequestId, SessionId, SessionInfo,
    SessionState, SystemClock,
};

use crate::queue::EventQueue;

/// Transport write half for one session. Implementations serialize the
/// frame and enqueue it for the socket.
pub trait FrameSink: Send + Sync {
    fn send(&self, frame: &Value) -> Result<(), SinkError>;
}

/// The transport refused or failed to take a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("transport rejected frame: {reason}")]
pub struct SinkError {
    pub reason: String,
}

impl SinkError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no such session: {0}")]
    NoSuchSession(SessionId),

    #[error("session {0} is closed")]
    Closed(SessionId),

    #[error("transport write failed: {0}")]
    Sink(#[from] SinkError),
}

/// Builds the outbound frame for an allocated request id and hands back the
/// continuation to retain until the reply arrives.
pub type RequestBuilder = Box<dyn FnOnce(RequestId) -> (Value, Option<Continuation>) + Send>;

/// Session-side collaborator consumed by the dispatch core.
pub trait SessionManager: Send + Sync {
    /// Serialize and enqueue a frame for transport write.
    fn send_to_session(&self, session: SessionId, frame: Value) -> Result<(), SessionError>;

    /// Allocate a request id, build the frame, record the continuation and
    /// send. Returns the allocated id.
    fn send_request(
        &self,
        session: SessionId,
        msg_type: MsgType,
        builder: RequestBuilder,
    ) -> Result<RequestId, SessionError>;

    /// Deliver a session lifecycle change.
    fn handle_session_state(
        &self,
        session: SessionId,
        state: SessionState,
        info: Option<SessionInfo>,
    );

    /// Periodic maintenance: request timeouts, closed-session reaping.
    fn handle_housekeeping(&self);
}

/// Tuning for [`SessionTable`] housekeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Pending requests older than this fire their continuation with
    /// `wamp.error.timeout`.
    pub request_timeout: Duration,
    /// Closed session records are kept resolvable for this long so events
    /// already in flight can still look them up.
    pub closed_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { request_timeout: Duration::from_secs(30), closed_grace: Duration::from_secs(60) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionPhase {
    /// Transport is up; the realm handshake has not completed.
    Pending,
    Open,
    Closed,
}

struct PendingRequest {
    msg_type: MsgType,
    continuation: Option<Continuation>,
    sent_at: Instant,
}

struct SessionRecord {
    phase: SessionPhase,
    info: SessionInfo,
    sink: Arc<dyn FrameSink>,
    next_request_id: u64,
    pending: HashMap<RequestId, PendingRequest>,
    closed_at: Option<Instant>,
}

type CloseHook = Box<dyn Fn(SessionId) + Send + Sync>;

/// Concrete session manager.
pub struct SessionTable<C: Clock = SystemClock> {
    queue: Arc<EventQueue>,
    clock: C,
    config: SessionConfig,
    next_session_id: AtomicU64,
    records: Mutex<HashMap<SessionId, SessionRecord>>,
    on_closed: Mutex<Option<CloseHook>>,
}

impl<C: Clock> SessionTable<C> {
    pub fn new(queue: Arc<EventQueue>, clock: C, config: SessionConfig) -> Self {
        Self {
            queue,
            clock,
            config,
            next_session_id: AtomicU64::new(1),
            records: Mutex::new(HashMap::new()),
            on_closed: Mutex::new(None),
        }
    }

    /// Admit a new session with its transport write half.
    pub fn add_session(&self, sink: Arc<dyn FrameSink>) -> SessionId {
        let session = SessionId::new(self.next_session_id.fetch_add(1, Ordering::Relaxed));
        let record = SessionRecord {
            phase: SessionPhase::Pending,
            info: SessionInfo::default(),
            sink,
            next_request_id: 1,
            pending: HashMap::new(),
            closed_at: None,
        };
        self.records.lock().insert(session, record);
        debug!(%session, "session admitted");
        session
    }

    pub fn session_count(&self) -> usize {
        self.records.lock().len()
    }

    /// Register the hook run after a session closes (registration cleanup).
    pub fn set_close_hook(&self, hook: impl Fn(SessionId) + Send + Sync + 'static) {
        *self.on_closed.lock() = Some(Box::new(hook));
    }

    /// Entry point for the transport read loop: classify a decoded frame,
    /// recover the continuation for YIELD/ERROR replies, and enqueue the
    /// inbound event for dispatch.
    ///
    /// Frames arriving while the queue is closing are dropped; the worker
    /// will never look at them.
    pub fn route_inbound(&self, session: SessionId, frame: Value) -> Result<(), SessionError> {
        let msg_type = match message::msg_id(&frame) {
            Ok(id) => id,
            Err(error) => {
                warn!(%session, %error, "dropping unreadable inbound frame");
                return Ok(());
            }
        };

        let continuation = self.recover_continuation(session, msg_type, &frame)?;
        let event =
            Event::Inbound(InboundMessage { source: session, msg_type, frame, continuation });
        if self.queue.push(event).is_err() {
            debug!(%session, "queue is closing; inbound frame dropped");
        }
        Ok(())
    }

    /// For YIELD (`[YIELD, request_id, ..]`) and ERROR
    /// (`[ERROR, request_type, request_id, ..]`) frames, take the pending
    /// continuation recorded when the request was sent.
    fn recover_continuation(
        &self,
        session: SessionId,
        msg_type: u64,
        frame: &Value,
    ) -> Result<Option<Continuation>, SessionError> {
        let request_index = match MsgType::from_wire(msg_type) {
            Some(MsgType::Yield) => 1,
            Some(MsgType::Error) => 2,
            _ => return Ok(None),
        };
        let Ok(request_id) = message::u64_at(frame, request_index) else {
            return Ok(None);
        };
        let request = RequestId::new(request_id);

        let mut records = self.records.lock();
        let record = records.get_mut(&session).ok_or(SessionError::NoSuchSession(session))?;
        Ok(record.pending.remove(&request).and_then(|pending| pending.continuation))
    }

    fn with_sink(&self, session: SessionId) -> Result<Arc<dyn FrameSink>, SessionError> {
        let records = self.records.lock();
        let record = records.get(&session).ok_or(SessionError::NoSuchSession(session))?;
        if record.phase == SessionPhase::Closed {
            return Err(SessionError::Closed(session));
        }
        Ok(Arc::clone(&record.sink))
    }

    /// Fire continuations outside the table lock.
    fn fail_continuations(pending: Vec<PendingRequest>, session: SessionId, error_uri: &str) {
        for request in pending {
            let Some(continuation) = request.continuation else { continue };
            debug!(
                %session,
                procedure = %continuation.procedure,
                msg_type = %request.msg_type,
                error_uri,
                "failing pending request"
            );
            (continuation.callback)(CallReply::Error {
                error_uri: error_uri.into(),
                args: None,
            });
        }
    }
}

impl<C: Clock> SessionManager for SessionTable<C> {
    fn send_to_session(&self, session: SessionId, frame: Value) -> Result<(), SessionError> {
        let sink = self.with_sink(session)?;
        sink.send(&frame)?;
        Ok(())
    }

    fn send_request(
        &self,
        session: SessionId,
        msg_type: MsgType,
        builder: RequestBuilder,
    ) -> Result<RequestId, SessionError> {
        let (request, frame, sink) = {
            let mut records = self.records.lock();
            let record =
                records.get_mut(&session).ok_or(SessionError::NoSuchSession(session))?;
            if record.phase == SessionPhase::Closed {
                return Err(SessionError::Closed(session));
            }

            let request = RequestId::new(record.next_request_id);
            record.next_request_id += 1;

            let (frame, continuation) = builder(request);
            record.pending.insert(
                request,
                PendingRequest { msg_type, continuation, sent_at: self.clock.now() },
            );
            (request, frame, Arc::clone(&record.sink))
        };

        if let Err(error) = sink.send(&frame) {
            // The request never left; forget it rather than let it time out.
            if let Some(record) = self.records.lock().get_mut(&session) {
                record.pending.remove(&request);
            }
            return Err(error.into());
        }
        Ok(request)
    }

    fn handle_session_state(
        &self,
        session: SessionId,
        state: SessionState,
        info: Option<SessionInfo>,
    ) {
        match state {
            SessionState::Opened => {
                let mut records = self.records.lock();
                let Some(record) = records.get_mut(&session) else {
                    warn!(%session, "state change for unknown session");
                    return;
                };
                if record.phase == SessionPhase::Closed {
                    warn!(%session, "ignoring open for a closed session");
                    return;
                }
                record.phase = SessionPhase::Open;
                if let Some(info) = info {
                    record.info = info;
                }
                info!(%session, realm = ?record.info.realm, "session open");
            }

            SessionState::Closed => {
                let pending = {
                    let mut records = self.records.lock();
                    let Some(record) = records.get_mut(&session) else {
                        warn!(%session, "close for unknown session");
                        return;
                    };
                    record.phase = SessionPhase::Closed;
                    record.closed_at = Some(self.clock.now());
                    mem::take(&mut record.pending).into_values().collect::<Vec<_>>()
                };
                info!(%session, canceled = pending.len(), "session closed");
                Self::fail_continuations(pending, session, uri::CANCELED);

                if let Some(hook) = self.on_closed.lock().as_ref() {
                    hook(session);
                }
            }
        }
    }

    fn handle_housekeeping(&self) {
        let now = self.clock.now();
        let mut expired = Vec::new();
        let mut reaped = 0usize;

        {
            let mut records = self.records.lock();
            for (session, record) in records.iter_mut() {
                let timed_out: Vec<RequestId> = record
                    .pending
                    .iter()
                    .filter(|(_, pending)| {
                        now.saturating_duration_since(pending.sent_at) >= self.config.request_timeout
                    })
                    .map(|(request, _)| *request)
                    .collect();
                for request in timed_out {
                    if let Some(pending) = record.pending.remove(&request) {
                        expired.push((*session, pending));
                    }
                }
            }
            records.retain(|session, record| {
                let reap = record.phase == SessionPhase::Closed
                    && record.closed_at.is_some_and(|at| {
                        now.saturating_duration_since(at) >= self.config.closed_grace
                    });
                if reap {
                    debug!(%session, "reaping closed session record");
                    reaped += 1;
                }
                !reap
            });
        }

        if !expired.is_empty() || reaped > 0 {
            debug!(expired = expired.len(), reaped, "housekeeping pass");
        }
        for (session, pending) in expired {
            Self::fail_continuations(vec![pending], session, uri::TIMEOUT);
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
