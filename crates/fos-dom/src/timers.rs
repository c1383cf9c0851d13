//! Timers
//!
//! One-shot timeouts on a virtual millisecond clock. The host advances
//! the clock; nothing runs on its own.

use std::collections::BTreeMap;

use crate::Document;

/// Timeout callback
pub type TimerFn = Box<dyn FnOnce(&mut Document)>;

/// Timeout handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

#[derive(Default)]
pub(crate) struct TimerQueue {
    now: u64,
    next_id: u64,
    timers: BTreeMap<TimerId, (u64, TimerFn)>,
}

impl std::fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("now", &self.now)
            .field("pending", &self.timers.len())
            .finish()
    }
}

impl TimerQueue {
    pub(crate) fn now(&self) -> u64 {
        self.now
    }

    pub(crate) fn schedule(&mut self, delay_ms: u64, callback: TimerFn) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.insert(id, (self.now + delay_ms, callback));
        id
    }

    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.timers.len()
    }

    /// Pop the earliest timer due at or before `deadline`, advancing the clock to it
    pub(crate) fn pop_due(&mut self, deadline: u64) -> Option<TimerFn> {
        let (&id, _) = self
            .timers
            .iter()
            .filter(|(_, (due, _))| *due <= deadline)
            .min_by_key(|(id, (due, _))| (*due, **id))?;
        let (due, callback) = self.timers.remove(&id)?;
        self.now = self.now.max(due);
        Some(callback)
    }

    pub(crate) fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }
}
