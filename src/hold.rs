use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{clock::Clock, collab::PowerService};

const NEVER: i64 = i64::MIN;

/// Timed hold around a gesture side effect.
///
/// Backed by a kernel wake lock with a timeout. It is never released early:
/// it lapses when the duration runs out.
pub struct ExclusiveHold {
    tag: &'static str,
    duration: Duration,
    held_until_ms: AtomicI64,
    clock: Arc<dyn Clock>,
    power: Arc<dyn PowerService>,
}

impl ExclusiveHold {
    pub fn new(
        tag: &'static str,
        duration: Duration,
        clock: Arc<dyn Clock>,
        power: Arc<dyn PowerService>,
    ) -> Self {
        Self {
            tag,
            duration,
            held_until_ms: AtomicI64::new(NEVER),
            clock,
            power,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Mark the hold active for the full duration from now. Re-acquiring re-arms it.
    pub fn acquire(&self) -> i64 {
        let until = self.clock.now_ms() + self.duration.as_millis() as i64;
        self.held_until_ms.store(until, Ordering::SeqCst);
        if let Err(e) = self.power.acquire_wake_lock(self.tag, self.duration) {
            log::warn!("DISPATCH: wake lock {} failed: {}", self.tag, e);
        }
        until
    }

    pub fn is_held(&self) -> bool {
        self.clock.now_ms() < self.held_until_ms.load(Ordering::SeqCst)
    }

    pub fn held_until_ms(&self) -> Option<i64> {
        match self.held_until_ms.load(Ordering::SeqCst) {
            NEVER => None,
            t => Some(t),
        }
    }
}
