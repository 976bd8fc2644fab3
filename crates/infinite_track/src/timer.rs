//! Countdown timers advanced by the simulation tick.
//!
//! Stands in for delayed engine callbacks: each entry carries its remaining time and fires once
//! when [`TimerQueue::advance`] runs it down to zero. The queue can be paused as a whole and is
//! cleared on reset.

#[derive(Clone, Debug)]
struct Timer<K> {
    key: K,
    remaining: f32,
}

#[derive(Clone, Debug)]
pub struct TimerQueue<K> {
    timers: Vec<Timer<K>>,
    paused: bool,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            paused: false,
        }
    }
}

impl<K: PartialEq> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `key` to fire after `delay` seconds. Non-positive delays fire on the next advance.
    pub fn schedule(&mut self, key: K, delay: f32) {
        self.timers.push(Timer {
            key,
            remaining: delay.max(0.0),
        });
    }

    /// Runs every timer down by `dt` and returns the keys that fired, in scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<K> {
        if self.paused || self.timers.is_empty() {
            return Vec::new();
        }

        let mut fired = Vec::new();
        let mut pending = Vec::with_capacity(self.timers.len());
        for mut timer in self.timers.drain(..) {
            timer.remaining -= dt;
            if timer.remaining <= 0.0 {
                fired.push(timer.key);
            } else {
                pending.push(timer);
            }
        }
        self.timers = pending;
        fired
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Drops every pending timer for `key`. Returns true if any was removed.
    pub fn cancel(&mut self, key: &K) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| &t.key != key);
        before != self.timers.len()
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
        self.paused = false;
    }

    /// Remaining time of the first pending timer for `key`.
    pub fn remaining(&self, key: &K) -> Option<f32> {
        self.timers
            .iter()
            .find(|t| &t.key == key)
            .map(|t| t.remaining)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
