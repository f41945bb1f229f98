//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired cache entries.

use std::hash::Hash;
use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::CacheCore;

// == Sweeper State ==
/// Lifecycle of the sweeper. `Running -> Stopped` is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    Running,
    Stopped,
}

// == Sweeper ==
/// Owned handle to a running expiry sweeper task.
///
/// The task ends when [`Sweeper::stop`] is called, when this handle is
/// dropped, or when the cache it sweeps is gone.
#[derive(Debug)]
pub struct Sweeper {
    /// Some while running; taken by the first stop
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    task: JoinHandle<()>,
}

impl Sweeper {
    // == Stop ==
    /// Signals the task to exit.
    ///
    /// Returns true if this call stopped the sweeper, false if it had
    /// already been stopped. Repeated calls are harmless.
    pub fn stop(&self) -> bool {
        match self.shutdown.lock().take() {
            Some(shutdown) => {
                // The task may already be gone if the cache was dropped
                let _ = shutdown.send(());
                info!("Expiry sweeper stopped");
                true
            }
            None => {
                warn!("Expiry sweeper already stopped, ignoring repeated stop");
                false
            }
        }
    }

    // == State ==
    pub fn state(&self) -> SweeperState {
        if self.shutdown.lock().is_some() {
            SweeperState::Running
        } else {
            SweeperState::Stopped
        }
    }

    /// Returns true once the underlying task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the sweeper on `runtime`.
///
/// Every `period` it takes the cache's write lock and removes all expired
/// entries, which blocks foreground `get`/`set` for the length of the pass.
/// The first pass runs one full period after spawning.
///
/// The task only holds a weak reference, so it never keeps the cache alive.
pub(crate) fn spawn_sweeper<K, V>(core: Weak<CacheCore<K, V>>, period: Duration, runtime: &Handle) -> Sweeper
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = runtime.spawn(async move {
        info!("Starting expiry sweeper with interval of {:?}", period);

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Fires on stop() and when the Sweeper handle is dropped
                _ = &mut shutdown_rx => {
                    debug!("Expiry sweeper received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    let Some(core) = core.upgrade() else {
                        debug!("Cache dropped, expiry sweeper exiting");
                        break;
                    };

                    let removed = core.sweep_expired();
                    if removed > 0 {
                        info!("Expiry sweep: removed {} expired entries", removed);
                    } else {
                        debug!("Expiry sweep: no expired entries found");
                    }
                }
            }
        }
    });

    Sweeper {
        shutdown: Mutex::new(Some(shutdown_tx)),
        task,
    }
}
