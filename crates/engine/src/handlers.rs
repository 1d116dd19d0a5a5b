// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Msg-id-indexed callback table installed by the surrounding runtime

use tracing::warn;

use wamprs_core::{EventError, InboundMessage, MsgType};

/// Application callback for an inbound protocol message.
///
/// Runs on the dispatch worker thread; a returned [`EventError`] is
/// translated into an outbound ERROR frame.
pub type InboundHandler = Box<dyn Fn(&InboundMessage) -> Result<(), EventError> + Send>;

// One slot past the highest message id this runtime routes.
const DEFAULT_SLOTS: usize = MsgType::Yield as usize + 1;

/// Sparse map from wire message id to an application callback.
///
/// Populated before the worker is fed and moved into the worker at spawn;
/// the table itself is single-writer, then single-reader. Grows on `set`,
/// never shrinks. Reads past the end are misses, not panics.
pub struct HandlerTable {
    slots: Vec<Option<InboundHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        let mut slots = Vec::new();
        slots.resize_with(DEFAULT_SLOTS, || None);
        Self { slots }
    }

    /// Install the callback for a message id, replacing any previous one.
    pub fn set(&mut self, msg_id: u64, handler: InboundHandler) {
        let index = msg_id as usize;
        if index >= self.slots.len() {
            warn!(msg_id, "growing handler table beyond its default size");
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(handler);
    }

    pub fn get(&self, msg_id: u64) -> Option<&InboundHandler> {
        self.slots.get(msg_id as usize).and_then(Option::as_ref)
    }

    pub fn contains(&self, msg_id: u64) -> bool {
        self.get(msg_id).is_some()
    }

    /// Number of installed handlers.
    pub fn installed(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
