// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-threaded dispatch worker
//!
//! One long-lived thread drains the queue in batches and routes every event:
//! to the session manager, to the RPC manager, to an installed handler, or
//! into an outbound frame. All handler bodies and manager calls made during
//! dispatch run on this thread, so the registration table and session
//! records never need locks against each other.
//!
//! Failure policy: the worker never dies from a handler fault. Protocol
//! errors become outbound ERROR frames; anything else is logged and the
//! batch continues.

use serde_json::json;
use smol_str::SmolStr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use wamprs_core::message::{self, uri, MsgType};
use wamprs_core::{
    CallReply, Continuation, ErrorContext, Event, EventError, InboundMessage, OutboundCall,
    OutboundResponse, RequestId, ResponseKind,
};

use crate::handlers::HandlerTable;
use crate::queue::EventQueue;
use crate::rpc::RpcManager;
use crate::session::{RequestBuilder, SessionManager};

/// Collaborators moved into the worker at spawn.
///
/// Handlers are installed before spawn; afterwards the worker is the only
/// reader and nothing else can touch the table.
pub struct DispatchConfig {
    pub handlers: HandlerTable,
    pub rpc: Option<Arc<dyn RpcManager>>,
    pub sessions: Option<Arc<dyn SessionManager>>,
}

/// Handle to the dispatch worker.
///
/// Spawning starts the worker; dropping pushes the shutdown sentinel and
/// joins. Events still queued behind the sentinel are dropped unprocessed
/// and their callbacks never fire.
pub struct Dispatch {
    queue: Arc<EventQueue>,
    worker: Option<JoinHandle<()>>,
}

impl Dispatch {
    pub fn spawn(queue: Arc<EventQueue>, config: DispatchConfig) -> Self {
        let worker_queue = Arc::clone(&queue);
        let worker = thread::spawn(move || {
            Worker {
                queue: worker_queue,
                handlers: config.handlers,
                rpc: config.rpc,
                sessions: config.sessions,
            }
            .run();
        });
        Self { queue, worker: Some(worker) }
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    /// True until the worker has observed the sentinel and exited.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }
}

impl Drop for Dispatch {
    fn drop(&mut self) {
        // Already-closing is fine: someone pushed the sentinel before us.
        let _ = self.queue.push(Event::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("dispatch worker panicked");
            }
        }
    }
}

struct Worker {
    queue: Arc<EventQueue>,
    handlers: HandlerTable,
    rpc: Option<Arc<dyn RpcManager>>,
    sessions: Option<Arc<dyn SessionManager>>,
}

impl Worker {
    fn run(self) {
        info!("event dispatcher started");
        loop {
            let batch = self.queue.drain();
            debug!(batch = batch.len(), "processing event batch");
            for event in batch {
                if matches!(event, Event::Shutdown) {
                    info!("shutdown sentinel observed; dispatcher exiting");
                    return;
                }
                self.dispatch(event);
            }
        }
    }

    /// Process one event, converting every failure per the error taxonomy.
    fn dispatch(&self, event: Event) {
        debug!("{}", event.log_summary());
        let context = event.error_context();

        match panic::catch_unwind(AssertUnwindSafe(|| self.process_event(event))) {
            Ok(Ok(())) => {}
            Ok(Err(event_error)) => {
                error!(%event_error, "event processing failed");
                self.process_event_error(context, &event_error);
            }
            Err(_) => {
                error!("handler panicked during event processing");
            }
        }
    }

    fn process_event(&self, event: Event) -> Result<(), EventError> {
        match event {
            // run() exits on the sentinel before dispatch is reached.
            Event::Shutdown => Ok(()),

            Event::OutboundCall(call) => self.process_outbound_call(call),

            Event::OutboundResponse(response) => self.process_outbound_response(response),

            Event::OutboundMessage { destination, frame } => {
                let Some(sessions) = &self.sessions else {
                    error!(%destination, "no session manager bound; dropping outbound frame");
                    return Ok(());
                };
                if let Err(send_error) = sessions.send_to_session(destination, frame) {
                    warn!(%destination, %send_error, "failed to forward outbound frame");
                }
                Ok(())
            }

            Event::SessionState { session, state, info } => {
                let Some(sessions) = &self.sessions else {
                    error!(%session, "no session manager bound for session state change");
                    return Ok(());
                };
                sessions.handle_session_state(session, state, info);
                Ok(())
            }

            Event::Housekeeping => {
                if let Some(sessions) = &self.sessions {
                    sessions.handle_housekeeping();
                }
                Ok(())
            }

            Event::TcpConnect(connect) => {
                if let Some(callback) = connect.callback {
                    callback(connect.session, connect.outcome);
                }
                Ok(())
            }

            Event::Inbound(msg) => self.process_inbound(msg),
        }
    }

    /// Resolve the procedure and send an INVOCATION to its owner; the
    /// continuation travels to the session table until the reply arrives.
    fn process_outbound_call(&self, call: OutboundCall) -> Result<(), EventError> {
        let (Some(rpc), Some(sessions)) = (&self.rpc, &self.sessions) else {
            warn!(procedure = %call.procedure, "no dealer bound; failing call locally");
            (call.callback)(CallReply::Error {
                error_uri: uri::NO_SUCH_PROCEDURE.into(),
                args: None,
            });
            return Ok(());
        };

        let Some(details) = rpc.lookup(&call.procedure) else {
            warn!(procedure = %call.procedure, "call to unregistered procedure");
            (call.callback)(CallReply::Error {
                error_uri: uri::NO_SUCH_PROCEDURE.into(),
                args: None,
            });
            return Ok(());
        };

        let OutboundCall { procedure, args, internal_request_id, callback } = call;
        let registration = details.registration_id;
        let builder: RequestBuilder = Box::new(move |request| {
            let frame = message::invocation(request, registration, args.as_ref());
            let continuation = Continuation { procedure, internal_request_id, callback };
            (frame, Some(continuation))
        });

        if let Err(send_error) = sessions.send_request(details.owner, MsgType::Invocation, builder)
        {
            warn!(owner = %details.owner, %send_error, "failed to send INVOCATION");
        }
        Ok(())
    }

    fn process_outbound_response(&self, response: OutboundResponse) -> Result<(), EventError> {
        let Some(sessions) = &self.sessions else {
            error!(destination = %response.destination, "no session manager bound for response");
            return Ok(());
        };

        let frame = match response.kind {
            ResponseKind::Yield => message::yield_frame(
                response.request,
                &response.options,
                response.args.as_ref(),
            ),
            ResponseKind::Error => {
                let Some(error_uri) = &response.error_uri else {
                    error!(
                        destination = %response.destination,
                        "error response without an error uri; dropping"
                    );
                    return Ok(());
                };
                message::error_response(
                    response.request_type,
                    response.request,
                    &response.options,
                    error_uri,
                )
            }
        };

        if let Err(send_error) = sessions.send_to_session(response.destination, frame) {
            warn!(destination = %response.destination, %send_error, "failed to send response");
        }
        Ok(())
    }

    fn process_inbound(&self, msg: InboundMessage) -> Result<(), EventError> {
        let Some(msg_type) = MsgType::from_wire(msg.msg_type) else {
            return Err(EventError::uri(uri::MESSAGE_NOT_SUPPORTED));
        };

        match msg_type {
            MsgType::Yield => self.process_inbound_yield(msg),

            MsgType::Error => {
                self.process_inbound_error(msg);
                Ok(())
            }

            MsgType::Register => self.process_inbound_register(&msg),

            // Transport-level noise from older peers.
            MsgType::Heartbeat => Ok(()),

            // The broker path: calls are not routed locally.
            MsgType::Call => {
                warn!(source = %msg.source, "inbound CALL is not brokered; dropping");
                Ok(())
            }

            MsgType::Hello
            | MsgType::Registered
            | MsgType::Invocation
            | MsgType::Challenge
            | MsgType::Authenticate => self.dispatch_to_handler(&msg),

            MsgType::Welcome | MsgType::Abort | MsgType::Goodbye => {
                Err(EventError::uri(uri::MESSAGE_NOT_SUPPORTED))
            }
        }
    }

    fn dispatch_to_handler(&self, msg: &InboundMessage) -> Result<(), EventError> {
        match self.handlers.get(msg.msg_type) {
            Some(handler) => handler(msg),
            None => {
                error!(msg_type = msg.msg_type, source = %msg.source, "no handler for message type");
                Ok(())
            }
        }
    }

    /// A YIELD received off a socket. An installed handler wins; otherwise
    /// the originating call's continuation completes here.
    fn process_inbound_yield(&self, mut msg: InboundMessage) -> Result<(), EventError> {
        if self.handlers.contains(msg.msg_type) {
            return self.dispatch_to_handler(&msg);
        }

        let Some(continuation) = msg.continuation.take() else {
            error!(source = %msg.source, "no continuation found for YIELD");
            return Ok(());
        };

        // [YIELD, request_id, options, args?]
        let options = message::element(&msg.frame, 2).cloned().unwrap_or_else(|_| json!({}));
        let args = message::element(&msg.frame, 3).ok().cloned();
        debug!(procedure = %continuation.procedure, "completing call with yield");
        (continuation.callback)(CallReply::Yield { options, args });
        Ok(())
    }

    /// An ERROR received off a socket, answering a request this runtime
    /// sent; routed to the originating call's continuation.
    fn process_inbound_error(&self, mut msg: InboundMessage) {
        let Some(continuation) = msg.continuation.take() else {
            error!(source = %msg.source, "no continuation found for inbound ERROR");
            return;
        };

        // [ERROR, request_type, request_id, details, error_uri, args?, kwargs?]
        let error_uri = message::str_at(&msg.frame, 4)
            .map(SmolStr::new)
            .unwrap_or_else(|_| SmolStr::new(uri::UNKNOWN));
        let args = message::element(&msg.frame, 5).ok().cloned();
        debug!(procedure = %continuation.procedure, %error_uri, "completing call with error");
        (continuation.callback)(CallReply::Error { error_uri, args });
    }

    /// Register the procedure and acknowledge synchronously: the REGISTERED
    /// reply reaches the session manager before this function returns, so an
    /// INVOCATION the peer triggers afterwards can never observe the
    /// registration unacknowledged.
    fn process_inbound_register(&self, msg: &InboundMessage) -> Result<(), EventError> {
        let Some(rpc) = &self.rpc else {
            return Err(EventError::no_such_procedure());
        };
        let Some(sessions) = &self.sessions else {
            error!(source = %msg.source, "no session manager bound; cannot acknowledge REGISTER");
            return Ok(());
        };

        let (request, registration) = rpc.register(msg.source, &msg.frame)?;
        let reply = message::registered(request, registration);
        if let Err(send_error) = sessions.send_to_session(msg.source, reply) {
            warn!(source = %msg.source, %send_error, "failed to send REGISTERED");
        }
        Ok(())
    }

    /// Translate a protocol error into an outbound ERROR frame.
    ///
    /// Deliberately narrow: only frame building and one send happen here,
    /// and a failure is logged and swallowed so error handling can never
    /// re-enter itself.
    fn process_event_error(&self, context: Option<ErrorContext>, event_error: &EventError) {
        let Some(sessions) = &self.sessions else {
            error!("cannot send error reply: no session manager bound");
            return;
        };
        let Some(context) = context else {
            error!(%event_error, "no reply destination for failed event");
            return;
        };

        let frame = if let Some(msg_type) = event_error.msg_type {
            let request = event_error.request_id.unwrap_or(RequestId::new(0));
            message::error_reply(msg_type.wire_id(), request, &event_error.error_uri)
        } else {
            match MsgType::from_wire(context.msg_type) {
                Some(MsgType::Call) => message::error_reply_without_request(
                    MsgType::Call,
                    &event_error.error_uri,
                ),
                Some(MsgType::Register) => {
                    let request = context.request_id.unwrap_or(RequestId::new(0));
                    message::error_reply_with_detail(
                        MsgType::Register,
                        request,
                        &event_error.error_uri,
                        &event_error.to_string(),
                    )
                }
                _ => {
                    error!(
                        msg_type = context.msg_type,
                        %event_error,
                        "no error reply shape for message type"
                    );
                    return;
                }
            }
        };

        if let Err(send_error) = sessions.send_to_session(context.source, frame) {
            error!(%send_error, "failure while handling event error");
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
