//! Delay-ordered action timeline driven by host ticks.
//!
//! Actions carry a delay relative to the moment playback started. Each tick
//! advances the elapsed playback time by the wall time since the previous
//! tick and releases every action whose delay has passed, in delay order.
//! Equal delays are released in insertion order.

use core_types::Millis;
use std::collections::VecDeque;

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledAction<T> {
    pub payload: T,
    pub delay: Millis,
}

#[derive(Debug)]
pub struct ActionTimelineScheduler<T> {
    time_offset: Millis,
    last_tick: Millis,
    actions: VecDeque<ScheduledAction<T>>,
    active: bool,
    live: bool,
}

impl<T> ActionTimelineScheduler<T> {
    pub fn new() -> Self {
        Self {
            time_offset: 0.0,
            last_tick: 0.0,
            actions: VecDeque::new(),
            active: false,
            live: false,
        }
    }

    /// Insert keeping the buffer sorted; lands after existing equal delays.
    pub fn add_action(&mut self, payload: T, delay: Millis) {
        let index = self.actions.partition_point(|a| a.delay <= delay);
        self.actions.insert(index, ScheduledAction { payload, delay });
    }

    /// Bulk append before [`ActionTimelineScheduler::start`], which sorts.
    pub fn add_actions<I>(&mut self, actions: I)
    where
        I: IntoIterator<Item = ScheduledAction<T>>,
    {
        self.actions.extend(actions);
    }

    /// Reset elapsed time to zero and begin ticking from `now`.
    pub fn start(&mut self, now: Millis) {
        // stable sort keeps insertion order among equal delays
        self.actions
            .make_contiguous()
            .sort_by(|a, b| a.delay.total_cmp(&b.delay));
        self.time_offset = 0.0;
        self.last_tick = now;
        self.active = true;
        log::trace!(target: "replay.scheduler", "start with {} actions", self.actions.len());
    }

    /// Re-activate an idle scheduler without resetting elapsed time.
    pub fn resume(&mut self, now: Millis) {
        if !self.active {
            self.last_tick = now;
            self.active = true;
        }
    }

    pub fn advance(&mut self, now: Millis) {
        if !self.active {
            return;
        }
        self.time_offset += (now - self.last_tick).max(0.0);
        self.last_tick = now;
    }

    /// Next due action, if any. Goes idle once the buffer drains outside live
    /// mode.
    pub fn pop_due(&mut self) -> Option<T> {
        if !self.active {
            return None;
        }
        let due = self
            .actions
            .front()
            .is_some_and(|a| a.delay <= self.time_offset);
        if due {
            return self.actions.pop_front().map(|a| a.payload);
        }
        if self.actions.is_empty() && !self.live {
            self.active = false;
        }
        None
    }

    /// Advance to `now` and release everything due.
    pub fn tick(&mut self, now: Millis) -> Vec<T> {
        self.advance(now);
        std::iter::from_fn(|| self.pop_due()).collect()
    }

    /// Cancel the pending tick and drop every buffered action.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_live_mode(&mut self, live: bool) {
        self.live = live;
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Playback time elapsed since the last `start`.
    pub fn time_offset(&self) -> Millis {
        self.time_offset
    }

    /// Delay of the last buffered action.
    pub fn last_delay(&self) -> Option<Millis> {
        self.actions.back().map(|a| a.delay)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<T> Default for ActionTimelineScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_delay_order_within_one_tick() {
        let mut scheduler = ActionTimelineScheduler::new();
        scheduler.start(0.0);
        scheduler.add_action(50, 50.0);
        scheduler.add_action(10, 10.0);
        scheduler.add_action(30, 30.0);
        assert_eq!(scheduler.tick(60.0), vec![10, 30, 50]);
    }

    #[test]
    fn equal_delays_keep_insertion_order() {
        let mut scheduler = ActionTimelineScheduler::new();
        scheduler.add_actions([
            ScheduledAction { payload: "b", delay: 5.0 },
            ScheduledAction { payload: "a", delay: 1.0 },
            ScheduledAction { payload: "c", delay: 5.0 },
        ]);
        scheduler.start(100.0);
        scheduler.add_action("d", 5.0);
        scheduler.add_action("z", 1.0);
        assert_eq!(scheduler.tick(110.0), vec!["a", "z", "b", "c", "d"]);
    }

    #[test]
    fn tick_is_a_prefix_pop() {
        let mut scheduler = ActionTimelineScheduler::new();
        scheduler.add_actions([
            ScheduledAction { payload: 1, delay: 10.0 },
            ScheduledAction { payload: 2, delay: 20.0 },
        ]);
        scheduler.start(0.0);
        assert_eq!(scheduler.tick(15.0), vec![1]);
        assert!(scheduler.is_active());
        assert_eq!(scheduler.time_offset(), 15.0);
        assert_eq!(scheduler.tick(25.0), vec![2]);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn clear_cancels_everything() {
        let mut scheduler = ActionTimelineScheduler::new();
        scheduler.start(0.0);
        scheduler.add_action((), 1.0);
        scheduler.clear();
        assert!(!scheduler.is_active());
        assert!(scheduler.tick(100.0).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn live_mode_keeps_ticking_when_empty() {
        let mut scheduler = ActionTimelineScheduler::new();
        scheduler.set_live_mode(true);
        scheduler.start(0.0);
        assert!(scheduler.tick(10.0).is_empty());
        assert!(scheduler.is_active());
        scheduler.add_action("late", 30.0);
        assert!(scheduler.tick(20.0).is_empty());
        assert_eq!(scheduler.tick(31.0), vec!["late"]);
        assert!(scheduler.is_active());
    }

    #[test]
    fn long_buffer_drains_in_order() {
        let mut scheduler = ActionTimelineScheduler::new();
        scheduler.add_actions((0..50_000).rev().map(|i| ScheduledAction {
            payload: i,
            delay: f64::from(i),
        }));
        scheduler.start(0.0);
        assert_eq!(scheduler.last_delay(), Some(49_999.0));
        let fired = scheduler.tick(50_000.0);
        assert_eq!(fired.len(), 50_000);
        assert!(fired.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(scheduler.last_delay(), None);
    }

    #[test]
    fn resume_preserves_elapsed_time() {
        let mut scheduler = ActionTimelineScheduler::new();
        scheduler.add_action(1, 5.0);
        scheduler.start(0.0);
        assert_eq!(scheduler.tick(10.0), vec![1]);
        assert!(scheduler.tick(10.0).is_empty());
        assert!(!scheduler.is_active());
        scheduler.add_action(2, 40.0);
        scheduler.resume(500.0);
        assert!(scheduler.tick(520.0).is_empty());
        assert_eq!(scheduler.time_offset(), 30.0);
        assert_eq!(scheduler.tick(530.0), vec![2]);
    }
}
