// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime facade: queue, managers, dispatch worker and housekeeping ticker

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error};

use wamprs_core::{Clock, Event, SystemClock};

use crate::dispatch::{Dispatch, DispatchConfig};
use crate::handlers::HandlerTable;
use crate::queue::{EventQueue, QueueError};
use crate::rpc::{ProcedureRegistry, RpcManager};
use crate::session::{SessionConfig, SessionManager, SessionTable};

/// Runtime tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Interval between housekeeping ticks.
    pub housekeeping_interval: Duration,
    pub session: SessionConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { housekeeping_interval: Duration::from_secs(1), session: SessionConfig::default() }
    }
}

/// Owns the whole engine: event queue, procedure registry, session table,
/// the dispatch worker and the housekeeping ticker.
///
/// Handlers are installed before start and move into the worker. Teardown
/// order on drop: the worker is stopped first (sentinel + join), then the
/// ticker is signalled and joined.
pub struct Runtime<C: Clock = SystemClock> {
    queue: Arc<EventQueue>,
    rpc: Arc<ProcedureRegistry>,
    sessions: Arc<SessionTable<C>>,
    // Field order is drop order: dispatch joins before the ticker stops.
    dispatch: Dispatch,
    #[allow(dead_code)]
    ticker: Ticker,
}

impl Runtime<SystemClock> {
    pub fn start(config: RuntimeConfig, handlers: HandlerTable) -> Self {
        Self::with_clock(config, handlers, SystemClock)
    }
}

impl<C: Clock + 'static> Runtime<C> {
    pub fn with_clock(config: RuntimeConfig, handlers: HandlerTable, clock: C) -> Self {
        let queue = Arc::new(EventQueue::new());
        let rpc = Arc::new(ProcedureRegistry::new());
        let sessions =
            Arc::new(SessionTable::new(Arc::clone(&queue), clock, config.session));

        // Registrations die with their owning session.
        let hook_rpc = Arc::clone(&rpc);
        sessions.set_close_hook(move |session| hook_rpc.session_closed(session));

        let dispatch = Dispatch::spawn(
            Arc::clone(&queue),
            DispatchConfig {
                handlers,
                rpc: Some(Arc::clone(&rpc) as Arc<dyn RpcManager>),
                sessions: Some(Arc::clone(&sessions) as Arc<dyn SessionManager>),
            },
        );
        let ticker = Ticker::spawn(Arc::clone(&queue), config.housekeeping_interval);

        Self { queue, rpc, sessions, dispatch, ticker }
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub fn sessions(&self) -> &Arc<SessionTable<C>> {
        &self.sessions
    }

    pub fn rpc(&self) -> &Arc<ProcedureRegistry> {
        &self.rpc
    }

    /// Hand an event to the dispatch worker.
    pub fn push(&self, event: Event) -> Result<(), QueueError> {
        self.queue.push(event)
    }

    pub fn is_running(&self) -> bool {
        self.dispatch.is_running()
    }
}

/// Periodic housekeeping source: pushes [`Event::Housekeeping`] until the
/// queue starts closing or the runtime stops it.
struct Ticker {
    stop: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    fn spawn(queue: Arc<EventQueue>, interval: Duration) -> Self {
        let stop = Arc::new((Mutex::new(false), Condvar::new()));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let (lock, signal) = &*thread_stop;
            let mut stopped = lock.lock();
            loop {
                if *stopped {
                    return;
                }
                let timed_out = signal.wait_for(&mut stopped, interval).timed_out();
                if *stopped {
                    return;
                }
                if timed_out && queue.push(Event::Housekeeping).is_err() {
                    debug!("queue is closing; housekeeping ticker exiting");
                    return;
                }
            }
        });
        Self { stop, handle: Some(handle) }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        let (lock, signal) = &*self.stop;
        *lock.lock() = true;
        signal.notify_all();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("housekeeping ticker panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
