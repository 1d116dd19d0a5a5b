// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol error raised while processing an event

use smol_str::SmolStr;
use thiserror::Error;

use crate::id::RequestId;
use crate::message::{uri, MessageError, MsgType};

/// A failure that translates into an outbound `ERROR` frame.
///
/// Raised by handlers and managers during event processing. When `msg_type`
/// is set, the producer has already decided which request type the reply
/// should echo; otherwise the dispatcher derives the reply shape from the
/// failing event itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("protocol error {error_uri}")]
pub struct EventError {
    pub error_uri: SmolStr,
    pub msg_type: Option<MsgType>,
    pub request_id: Option<RequestId>,
}

impl EventError {
    pub fn uri(error_uri: impl Into<SmolStr>) -> Self {
        Self { error_uri: error_uri.into(), msg_type: None, request_id: None }
    }

    /// An error bound to a specific request, replied with the full shape.
    pub fn for_request(
        error_uri: impl Into<SmolStr>,
        msg_type: MsgType,
        request: RequestId,
    ) -> Self {
        Self { error_uri: error_uri.into(), msg_type: Some(msg_type), request_id: Some(request) }
    }

    pub fn no_such_procedure() -> Self {
        Self::uri(uri::NO_SUCH_PROCEDURE)
    }

    pub fn procedure_already_exists() -> Self {
        Self::uri(uri::PROCEDURE_ALREADY_EXISTS)
    }
}

impl From<MessageError> for EventError {
    /// A malformed frame surfaces to the peer as an invalid-argument error.
    fn from(_: MessageError) -> Self {
        Self::uri(uri::INVALID_ARGUMENT)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
