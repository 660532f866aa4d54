use crate::domain::ports::task_spawner::TaskSpawner;
use crate::domain::ports::time_service::TimeService;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Callback receiving each settled value
pub type SettleFn<T> = Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Default)]
struct Slot {
    generation: u64,
    pending: Option<CancellationToken>,
    disposed: bool,
}

/// Coalesces rapid input into one emission after `delay` of quiescence.
///
/// Every [`push`](Debouncer::push) restarts the timer and drops the pending
/// value. A value is only emitted if no newer push, cancel or dispose happened
/// while it waited. Dropping the debouncer disposes it.
pub struct Debouncer<T> {
    delay: Duration,
    time: Arc<dyn TimeService>,
    spawner: Arc<dyn TaskSpawner>,
    on_settle: SettleFn<T>,
    slot: Arc<Mutex<Slot>>,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(
        delay: Duration,
        time: Arc<dyn TimeService>,
        spawner: Arc<dyn TaskSpawner>,
        on_settle: SettleFn<T>,
    ) -> Self {
        Self {
            delay,
            time,
            spawner,
            on_settle,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Feed a raw value, superseding any pending one
    pub fn push(&self, value: T) {
        let (generation, token) = {
            let mut slot = lock(&self.slot);
            if slot.disposed {
                return;
            }
            if let Some(previous) = slot.pending.take() {
                previous.cancel();
            }
            slot.generation += 1;
            let token = CancellationToken::new();
            slot.pending = Some(token.clone());
            (slot.generation, token)
        };

        let time = Arc::clone(&self.time);
        let slot = Arc::clone(&self.slot);
        let on_settle = Arc::clone(&self.on_settle);
        let delay = self.delay;

        self.spawner.spawn(
            async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = time.sleep(delay) => {}
                }

                let current = {
                    let mut slot = lock(&slot);
                    if slot.disposed || slot.generation != generation {
                        false
                    } else {
                        slot.pending = None;
                        true
                    }
                };

                if current {
                    on_settle(value).await;
                } else {
                    debug!("Dropping superseded debounced value (generation {})", generation);
                }
            }
            .boxed(),
        );
    }

    /// Drop the pending value, if any, without emitting it
    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        if let Some(pending) = slot.pending.take() {
            pending.cancel();
        }
        slot.generation += 1;
    }

    /// Cancel and refuse all further input
    pub fn dispose(&self) {
        self.cancel();
        lock(&self.slot).disposed = true;
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if let Some(pending) = slot.pending.take() {
            pending.cancel();
        }
        slot.disposed = true;
    }
}
