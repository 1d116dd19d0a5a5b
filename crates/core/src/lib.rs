// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wamprs-core: event model and wire form for the wamprs runtime

pub mod clock;
pub mod error;
pub mod event;
pub mod id;
pub mod message;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::EventError;
pub use event::{
    CallCallback, CallReply, ConnectCallback, ConnectOutcome, Continuation, ErrorContext, Event,
    InboundMessage, OutboundCall, OutboundResponse, ResponseKind, SessionInfo, SessionState,
    TcpConnect,
};
pub use id::{RegistrationId, RequestId, SessionId};
pub use message::{MessageError, MsgType};
