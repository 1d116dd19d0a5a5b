// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wamprs-engine: the event dispatch engine of the wamprs runtime
//!
//! External producers (transport read loops, application code, the
//! housekeeping ticker) enqueue [`wamprs_core::Event`]s; a single worker
//! thread drains them in batches and drives the two stateful collaborators:
//! the session table and the procedure registry.

pub mod dispatch;
pub mod handlers;
pub mod queue;
pub mod rpc;
pub mod runtime;
pub mod session;

pub use dispatch::{Dispatch, DispatchConfig};
pub use handlers::{HandlerTable, InboundHandler};
pub use queue::{EventQueue, QueueError};
pub use rpc::{ProcedureRegistry, RpcDetails, RpcManager};
pub use runtime::{Runtime, RuntimeConfig};
pub use session::{
    FrameSink, RequestBuilder, SessionConfig, SessionError, SessionManager, SessionTable,
    SinkError,
};
