// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thread-safe FIFO feeding the dispatch worker
//!
//! Producers push from any thread; the single consumer blocks until the
//! queue is non-empty and then takes the whole backlog in one swap. A
//! producer returning from `push` happens-before the consumer observing the
//! pushed event.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use thiserror::Error;

use wamprs_core::Event;

/// Push rejected because the shutdown sentinel is already queued.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue is closing; event dropped")]
    Closing,
}

#[derive(Default)]
struct QueueState {
    items: VecDeque<Event>,
    closing: bool,
}

/// Unbounded multi-producer, single-consumer event queue.
pub struct EventQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { state: Mutex::new(QueueState::default()), ready: Condvar::new() }
    }

    /// Enqueue an event and wake the consumer.
    ///
    /// The first [`Event::Shutdown`] flips the queue into closing; it is
    /// enqueued itself, and every later push is rejected so nothing can land
    /// behind the sentinel.
    pub fn push(&self, event: Event) -> Result<(), QueueError> {
        let mut state = self.state.lock();
        if state.closing {
            return Err(QueueError::Closing);
        }
        if matches!(event, Event::Shutdown) {
            state.closing = true;
        }
        state.items.push_back(event);
        drop(state);
        self.ready.notify_one();
        Ok(())
    }

    /// Block until at least one event is queued, then take the whole
    /// backlog, leaving the queue empty.
    pub fn drain(&self) -> VecDeque<Event> {
        let mut state = self.state.lock();
        while state.items.is_empty() {
            self.ready.wait(&mut state);
        }
        std::mem::take(&mut state.items)
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// True once the shutdown sentinel has been accepted.
    pub fn is_closing(&self) -> bool {
        self.state.lock().closing
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
