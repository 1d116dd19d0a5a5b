// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration table for the dealer path

use parking_lot::Mutex;
use serde_json::Value;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use wamprs_core::message;
use wamprs_core::{EventError, RegistrationId, RequestId, SessionId};

/// A procedure registration: which session owns a name, under which id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcDetails {
    pub procedure: SmolStr,
    pub registration_id: RegistrationId,
    pub owner: SessionId,
}

/// Registration table consumed by the dispatch core.
pub trait RpcManager: Send + Sync {
    /// Resolve a procedure name to its registration.
    fn lookup(&self, procedure: &str) -> Option<RpcDetails>;

    /// Handle an inbound REGISTER frame `[REGISTER, request_id, options,
    /// procedure]`. Returns the echoed request id and the fresh registration
    /// id, or a protocol error for duplicates and malformed frames.
    fn register(
        &self,
        source: SessionId,
        frame: &Value,
    ) -> Result<(RequestId, RegistrationId), EventError>;

    /// Drop every registration owned by a session that has closed.
    ///
    /// Driven by the session table's close hook, not by the dispatcher.
    fn session_closed(&self, session: SessionId);
}

/// In-memory registry with monotonically assigned registration ids.
///
/// Procedure names are unique across the table; ids start at 1 so that 0
/// never denotes a live registration.
pub struct ProcedureRegistry {
    table: Mutex<HashMap<SmolStr, RpcDetails>>,
    next_id: AtomicU64,
}

impl ProcedureRegistry {
    pub fn new() -> Self {
        Self { table: Mutex::new(HashMap::new()), next_id: AtomicU64::new(1) }
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}

impl Default for ProcedureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcManager for ProcedureRegistry {
    fn lookup(&self, procedure: &str) -> Option<RpcDetails> {
        self.table.lock().get(procedure).cloned()
    }

    fn register(
        &self,
        source: SessionId,
        frame: &Value,
    ) -> Result<(RequestId, RegistrationId), EventError> {
        let request = RequestId::new(message::u64_at(frame, 1)?);
        let procedure = message::str_at(frame, 3)?;

        let mut table = self.table.lock();
        if table.contains_key(procedure) {
            warn!(procedure, %source, "rejecting duplicate registration");
            return Err(EventError::procedure_already_exists());
        }

        let registration_id = RegistrationId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let procedure = SmolStr::new(procedure);
        table.insert(
            procedure.clone(),
            RpcDetails { procedure: procedure.clone(), registration_id, owner: source },
        );
        info!(%procedure, %registration_id, %source, "procedure registered");
        Ok((request, registration_id))
    }

    fn session_closed(&self, session: SessionId) {
        let mut table = self.table.lock();
        let before = table.len();
        table.retain(|_, details| details.owner != session);
        let dropped = before - table.len();
        if dropped > 0 {
            debug!(%session, dropped, "dropped registrations for closed session");
        }
    }
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
