//! Keyed one-shot timers for LURK.
//!
//! A [`KeyedTimer`] runs at most one pending task per key. Arming a key
//! that already has a pending task aborts the old one first, so rearming
//! pushes the deadline back instead of stacking a second firing.
//!
//! # Integration
//!
//! The game keeps one `KeyedTimer<String>` for monster heals, keyed by
//! monster name, next to the world under the same lock. It is armed every
//! time a monster is engaged:
//!
//! ```ignore
//! state.heal_timers.arm(name.clone(), heal_after, async move {
//!     let mut state = shared.lock().await;
//!     state.heal_timers.forget(&name);
//!     let outbox = state.world.heal(&name, Instant::now());
//!     drop(state);
//!     outbox.dispatch();
//! });
//! ```
//!
//! Aborting is safe at any await point of the task: a heal that is still
//! waiting for the world lock is simply dropped.

use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

struct Pending {
    handle: JoinHandle<()>,
    deadline: Instant,
}

/// One-shot timers where re-arming a key replaces its pending timer.
///
/// Dropping the `KeyedTimer` aborts every timer still pending.
pub struct KeyedTimer<K> {
    pending: HashMap<K, Pending>,
    armed: u64,
}

impl<K> KeyedTimer<K>
where
    K: Eq + Hash + Clone + Display,
{
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            armed: 0,
        }
    }

    /// Runs `task` after `delay`, replacing any timer pending for `key`.
    ///
    /// Returns `true` if a pending timer was replaced.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn arm<F>(&mut self, key: K, delay: Duration, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let replaced = self.cancel(&key);
        let deadline = Instant::now() + delay;
        let handle = tokio::spawn(async move {
            time::sleep_until(deadline).await;
            task.await;
        });
        self.armed += 1;
        debug!(%key, ?delay, replaced, "timer armed");
        self.pending.insert(key, Pending { handle, deadline });
        replaced
    }

    /// Aborts the timer pending for `key`.
    ///
    /// Returns `true` if one was still pending.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.pending.remove(key) {
            Some(pending) => {
                let was_live = !pending.handle.is_finished();
                pending.handle.abort();
                if was_live {
                    trace!(%key, "timer cancelled");
                }
                was_live
            }
            None => false,
        }
    }

    /// Drops the bookkeeping for `key` without aborting its task.
    ///
    /// A firing task calls this on its own key, where aborting would
    /// cancel the very task that is running.
    pub fn forget(&mut self, key: &K) {
        self.pending.remove(key);
    }

    /// Returns `true` if a timer for `key` has not fired yet.
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending
            .get(key)
            .is_some_and(|p| !p.handle.is_finished())
    }

    /// When the timer for `key` is due, if one is pending.
    pub fn deadline(&self, key: &K) -> Option<Instant> {
        self.pending
            .get(key)
            .filter(|p| !p.handle.is_finished())
            .map(|p| p.deadline)
    }

    /// Number of timers that have not fired yet.
    pub fn pending_count(&self) -> usize {
        self.pending
            .values()
            .filter(|p| !p.handle.is_finished())
            .count()
    }

    /// Total number of times any timer has been armed.
    pub fn armed_total(&self) -> u64 {
        self.armed
    }
}

impl<K> Default for KeyedTimer<K>
where
    K: Eq + Hash + Clone + Display,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> std::fmt::Debug for KeyedTimer<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedTimer")
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl<K> Drop for KeyedTimer<K> {
    fn drop(&mut self) {
        for pending in self.pending.values() {
            pending.handle.abort();
        }
    }
}
