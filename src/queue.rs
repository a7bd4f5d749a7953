//! Single-slot gesture queue. A newer request replaces the pending one; a
//! request already taken by the worker is never touched.

use std::sync::{Condvar, Mutex};

use crate::dispatcher::GestureKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchRequest {
    pub gesture: GestureKind,
    pub issued_at_ms: i64,
}

#[derive(Debug, Default)]
struct Slot {
    pending: Option<DispatchRequest>,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct GestureQueue {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl GestureQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `req`, returning the request it superseded, if any.
    pub fn submit(&self, req: DispatchRequest) -> Option<DispatchRequest> {
        let mut g = self.slot.lock().unwrap();
        let old = g.pending.replace(req);
        self.ready.notify_one();
        old
    }

    pub fn try_take(&self) -> Option<DispatchRequest> {
        self.slot.lock().unwrap().pending.take()
    }

    /// Block until a request is pending. `None` once the queue is closed.
    pub fn take(&self) -> Option<DispatchRequest> {
        let mut g = self.slot.lock().unwrap();
        loop {
            if let Some(req) = g.pending.take() {
                return Some(req);
            }
            if g.closed {
                return None;
            }
            g = self.ready.wait(g).unwrap();
        }
    }

    pub fn close(&self) {
        let mut g = self.slot.lock().unwrap();
        g.closed = true;
        self.ready.notify_all();
    }

    pub fn is_pending(&self) -> bool {
        self.slot.lock().unwrap().pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    fn req(gesture: GestureKind, at: i64) -> DispatchRequest {
        DispatchRequest { gesture, issued_at_ms: at }
    }

    #[test]
    fn newest_request_wins() {
        let q = GestureQueue::new();
        assert_eq!(q.submit(req(GestureKind::Torch, 1)), None);
        let superseded = q.submit(req(GestureKind::MediaNext, 2));
        assert_eq!(superseded, Some(req(GestureKind::Torch, 1)));
        assert_eq!(q.try_take(), Some(req(GestureKind::MediaNext, 2)));
        assert_eq!(q.try_take(), None);
    }

    #[test]
    fn blocked_taker_wakes_on_submit_and_close() {
        let q = Arc::new(GestureQueue::new());
        let worker = {
            let q = q.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(r) = q.take() {
                    seen.push(r.gesture);
                }
                seen
            })
        };
        q.submit(req(GestureKind::MediaPlayPause, 5));
        while q.is_pending() {
            thread::yield_now();
        }
        q.close();
        assert_eq!(worker.join().unwrap(), vec![GestureKind::MediaPlayPause]);
    }
}
