#![forbid(unsafe_code)]

//! Recent scroll positions and `Alt+c` cycling.
//!
//! Positions are recorded once scrolling has been quiet for the record
//! delay. A recorded position replaces any stored one within the dedup
//! distance and goes to the front; the list is capped. The document top is
//! registered at construction.
//!
//! A cycle starts on the first `Alt+c` and ends when Alt is released, at
//! which point the chosen position moves to the front. Presses further apart
//! than the fast-switch window toggle between the two most recent positions;
//! quicker presses walk the whole list.

use std::collections::VecDeque;

use core::time::Duration;

use imgstep_core::clock::Clock;
use imgstep_core::event::KeyEvent;
use imgstep_core::keybinding::{CycleKey, KeyMap};
use imgstep_engine::config::HistoryPolicy;
use tracing::{debug, trace};

/// What the host should do after a key event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// The key is not a cycling key.
    Ignored,
    /// Suppress the browser default and smooth-scroll to `offset`.
    ScrollTo { offset: f64 },
    /// The cycle ended; nothing to scroll.
    Ended,
}

#[derive(Debug, Clone, Copy)]
struct ActiveCycle {
    index: usize,
}

/// Remembers recent scroll positions and cycles through them.
#[derive(Debug)]
pub struct PositionCycler<C> {
    policy: HistoryPolicy,
    keymap: KeyMap,
    clock: C,
    positions: VecDeque<f64>,
    pending: Option<(f64, Duration)>,
    cycle: Option<ActiveCycle>,
    last_press: Option<Duration>,
}

impl<C: Clock> PositionCycler<C> {
    /// Create a cycler with the document top registered.
    pub fn new(policy: HistoryPolicy, keymap: KeyMap, clock: C) -> Self {
        let mut cycler = Self {
            positions: VecDeque::with_capacity(policy.capacity + 1),
            policy,
            keymap,
            clock,
            pending: None,
            cycle: None,
            last_press: None,
        };
        cycler.commit(0.0);
        cycler
    }

    /// Stored positions, most recent first.
    pub fn positions(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.positions.iter().copied()
    }

    /// Whether a cycle is in progress.
    #[must_use]
    pub fn is_cycling(&self) -> bool {
        self.cycle.is_some()
    }

    /// Note a scroll to `offset`; it is recorded once scrolling settles.
    pub fn on_scroll(&mut self, offset: f64) {
        let due = self.clock.now_mono() + self.record_delay();
        self.pending = Some((offset, due));
    }

    /// Commit a settled scroll sample.
    pub fn tick(&mut self) {
        let now = self.clock.now_mono();
        if let Some((offset, due)) = self.pending
            && due <= now
        {
            self.pending = None;
            self.commit(offset);
        }
    }

    /// When `tick` next has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.map(|(_, due)| due)
    }

    /// Handle a key press or release.
    pub fn handle_key(&mut self, event: &KeyEvent) -> CycleOutcome {
        match self.keymap.resolve_cycle(event) {
            Some(CycleKey::Advance) => self.advance(),
            Some(CycleKey::Release) => {
                if self.end_cycle() {
                    CycleOutcome::Ended
                } else {
                    CycleOutcome::Ignored
                }
            }
            None => CycleOutcome::Ignored,
        }
    }

    fn advance(&mut self) -> CycleOutcome {
        let now = self.clock.now_mono();
        let len = self.positions.len();
        if len == 0 {
            return CycleOutcome::Ignored;
        }

        let mut index = match self.cycle {
            None => 0,
            Some(active) => (active.index + 1) % len,
        };

        let slow = self
            .last_press
            .is_none_or(|last| now.saturating_sub(last) > self.fast_switch());
        if slow {
            index %= len.min(2);
        }
        self.cycle = Some(ActiveCycle { index });
        self.last_press = Some(now);

        let offset = self.positions[index];
        debug!(index, offset, slow, positions = len, "cycle scroll position");
        CycleOutcome::ScrollTo { offset }
    }

    /// End the cycle, moving the chosen position to the front.
    fn end_cycle(&mut self) -> bool {
        let Some(active) = self.cycle.take() else {
            return false;
        };
        if let Some(chosen) = self.positions.remove(active.index) {
            self.positions.push_front(chosen);
        }
        true
    }

    fn commit(&mut self, offset: f64) {
        if let Some(near) = self
            .positions
            .iter()
            .position(|stored| (stored - offset).abs() < self.policy.dedup_px)
        {
            self.positions.remove(near);
        }
        self.positions.push_front(offset);
        self.positions.truncate(self.policy.capacity);
        trace!(offset, positions = self.positions.len(), "scroll position recorded");
    }

    fn record_delay(&self) -> Duration {
        Duration::from_millis(self.policy.record_delay_ms)
    }

    fn fast_switch(&self) -> Duration {
        Duration::from_millis(self.policy.fast_switch_ms)
    }
}
