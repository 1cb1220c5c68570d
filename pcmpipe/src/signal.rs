//! Single-slot wakeup signal
//!
//! A `Signal` connects exactly one waiting party with the party that
//! changes the state it waits on. It is the building block for the two
//! pipe signals, "data available" and "space available".
//!
//! # Workflow
//!
//! ```ignore
//! // waiting side, inside a borrow of the shared state
//! let wakeup = {
//!     let mut state = shared.borrow_mut();
//!     if !should_wait(&state) {
//!         break;
//!     }
//!     state.signal.wait()
//! };
//! // the borrow is released before suspending
//! wakeup.await;
//!
//! // firing side, after it has changed the state
//! state.signal.fire();
//! ```
//!
//! The check and the registration happen in one uninterrupted step, so
//! on a single thread a wakeup can't be lost between them.
//!
//! # Edge-triggered
//!
//! `fire` only delivers if somebody is registered. A fire without a waiter
//! is dropped instead of being remembered, so a later `wait` never returns
//! because of a stale transition. The firing side is expected to fire only
//! on the transition it is responsible for.

use std::fmt;
use std::future::Future;

use tokio::sync::oneshot;

pub struct Signal {
    name: &'static str,
    waiter: Option<oneshot::Sender<()>>,
}

impl Signal {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name, waiter: None }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check if a live waiter is registered
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.waiter.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Register the (single) waiter and get the future to await
    ///
    /// A previously registered waiter is replaced. That only happens when
    /// the earlier wait was abandoned (its future dropped) before the
    /// signal fired.
    pub fn wait(&mut self) -> impl Future<Output = ()> + 'static {
        let (tx, rx) = oneshot::channel();

        if let Some(old) = self.waiter.replace(tx) {
            if old.is_closed() {
                log::debug!("signal {}: dropping abandoned waiter", self.name);
            } else {
                log::warn!("signal {}: replacing a live waiter", self.name);
            }
        }

        // The sender lives in the shared state next to both pipe ends, so
        // `rx` only errors if the wait was replaced. Either way the caller
        // re-checks its condition.
        async move {
            let _ = rx.await;
        }
    }

    /// Wake the registered waiter, if any
    ///
    /// Returns `true` if a waiter was woken.
    pub fn fire(&mut self) -> bool {
        let Some(tx) = self.waiter.take() else {
            return false;
        };
        if tx.send(()).is_err() {
            log::trace!("signal {}: waiter gone before fire", self.name);
            return false;
        }
        log::trace!("signal {}: fired", self.name);
        true
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("waiting", &self.is_waiting())
            .finish()
    }
}
