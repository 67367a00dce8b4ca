#![forbid(unsafe_code)]

//! Image navigation driven by key events.
//!
//! The [`Navigator`] owns the position cache and the decision engine. The
//! host calls [`handle_key`](Navigator::handle_key) from its key listener
//! and [`tick`](Navigator::tick) whenever [`next_deadline`](Navigator::next_deadline)
//! passes. Everything else (mutation observers, load listeners) talks to the
//! navigator only through the [`StaleHandle`] it hands out.
//!
//! # Key handling
//!
//! 1. Resolve the key against the [`KeyMap`] and the focus context.
//! 2. Read the position index (cached within the freshness window).
//! 3. Run the decision procedure and clamp its target to the document.
//! 4. If the clamped move is below the stuck threshold, count it and show a
//!    diagnostic; any real move resets the count.
//! 5. If the target differs from the current offset, ask the host to scroll
//!    instantly and suppress the key's default action, and schedule a
//!    settle invalidation so lazily loaded images are picked up.

use std::collections::VecDeque;
use std::sync::Arc;

use core::time::Duration;

use imgstep_core::clock::Clock;
use imgstep_core::event::{FocusContext, KeyEvent};
use imgstep_core::keybinding::{KeyMap, NavCommand};
use imgstep_engine::{DecisionEngine, NavConfig, ScrollDecision, ViewportState};
use imgstep_index::{CacheStats, DocumentHost, PositionCache, PositionIndex, StaleHandle};
use tracing::{debug, info_span, warn};

use crate::diagnostics::{DiagnosticAction, DiagnosticQueue, stuck_message};

/// Result of a navigation key.
#[derive(Debug, Clone, PartialEq)]
pub struct NavOutcome {
    /// Command that ran.
    pub command: NavCommand,
    /// Engine decision before clamping.
    pub decision: ScrollDecision,
    /// Offset when the key was pressed.
    pub current: f64,
    /// Clamped target.
    pub target: f64,
    /// Instant scroll the host should perform.
    pub scroll_to: Option<f64>,
    /// The move was below the stuck threshold.
    pub stuck: bool,
    /// Images in the index used for the decision.
    pub positions: usize,
    /// Toast updates for the host.
    pub diagnostics: Vec<DiagnosticAction>,
}

impl NavOutcome {
    /// Whether the host should suppress the key's default action.
    #[must_use]
    pub fn prevent_default(&self) -> bool {
        self.scroll_to.is_some()
    }
}

/// Result of [`Navigator::handle_key`].
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// Not a navigation key in this context; let the browser handle it.
    Ignored,
    /// A navigation command ran.
    Navigated(NavOutcome),
}

impl KeyOutcome {
    /// The navigation outcome, if any.
    #[must_use]
    pub fn navigated(&self) -> Option<&NavOutcome> {
        match self {
            Self::Ignored => None,
            Self::Navigated(outcome) => Some(outcome),
        }
    }
}

/// Navigator counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavigatorStats {
    /// Navigation commands run.
    pub commands: u64,
    /// Commands that requested a scroll.
    pub scrolls: u64,
    /// Commands detected as stuck.
    pub stuck: u64,
    /// Decisions whose snap pass hit the iteration cap.
    pub snap_exhaustions: u64,
    /// Settle invalidations fired.
    pub settles: u64,
    /// Position cache counters.
    pub cache: CacheStats,
}

/// Key-driven image navigator.
#[derive(Debug)]
pub struct Navigator<E, C> {
    keymap: KeyMap,
    engine: DecisionEngine,
    cache: PositionCache<E>,
    clock: C,
    stuck_threshold: f64,
    settle_delay: Duration,
    stuck_toast: Duration,
    settle_deadlines: VecDeque<Duration>,
    stuck_count: u32,
    diagnostics: DiagnosticQueue,
    commands: u64,
    scrolls: u64,
    stuck: u64,
    snap_exhaustions: u64,
    settles: u64,
}

impl<E, C: Clock> Navigator<E, C> {
    /// Create a navigator from a configuration.
    pub fn new(config: &NavConfig, clock: C) -> Self {
        Self {
            keymap: config.key_map(),
            engine: DecisionEngine::new(config),
            cache: PositionCache::new(config.index_builder(), config.freshness()),
            clock,
            stuck_threshold: config.runtime.stuck_threshold_px,
            settle_delay: config.settle_delay(),
            stuck_toast: config.stuck_toast_duration(),
            settle_deadlines: VecDeque::new(),
            stuck_count: 0,
            diagnostics: DiagnosticQueue::new(),
            commands: 0,
            scrolls: 0,
            stuck: 0,
            snap_exhaustions: 0,
            settles: 0,
        }
    }

    /// Flag shared with mutation and load callbacks.
    #[must_use]
    pub fn stale_handle(&self) -> StaleHandle {
        self.cache.stale_handle()
    }

    /// Consecutive stuck commands.
    #[must_use]
    pub fn stuck_count(&self) -> u32 {
        self.stuck_count
    }

    /// Toast state.
    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticQueue {
        &self.diagnostics
    }

    /// The active key assignments.
    #[must_use]
    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> NavigatorStats {
        NavigatorStats {
            commands: self.commands,
            scrolls: self.scrolls,
            stuck: self.stuck,
            snap_exhaustions: self.snap_exhaustions,
            settles: self.settles,
            cache: self.cache.stats(),
        }
    }

    /// Earliest time at which [`tick`](Self::tick) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        let settle = self.settle_deadlines.front().copied();
        match (settle, self.diagnostics.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire due settle invalidations and expire toasts.
    pub fn tick(&mut self) -> Vec<DiagnosticAction> {
        let now = self.clock.now_mono();
        let mut fired = 0u32;
        while let Some(&due) = self.settle_deadlines.front()
            && due <= now
        {
            self.settle_deadlines.pop_front();
            fired += 1;
        }
        if fired > 0 {
            self.cache.invalidate();
            self.settles += u64::from(fired);
            debug!(fired, "settle delay elapsed; position index marked stale");
        }
        self.diagnostics.tick(now)
    }

    /// Read the position index as a key press would.
    pub fn positions<H>(&mut self, host: &H) -> Arc<PositionIndex<E>>
    where
        H: DocumentHost<Element = E>,
    {
        let now = self.clock.now_mono();
        self.cache.get_positions(host, now, false)
    }

    /// Handle a key event.
    pub fn handle_key<H>(
        &mut self,
        host: &H,
        event: &KeyEvent,
        focus: FocusContext,
        viewport: ViewportState,
    ) -> KeyOutcome
    where
        H: DocumentHost<Element = E>,
    {
        let Some(command) = self.keymap.resolve(event, focus) else {
            return KeyOutcome::Ignored;
        };
        let _span = info_span!("navigate", command = command.label()).entered();
        self.commands += 1;

        let now = self.clock.now_mono();
        let index = self.cache.get_positions(host, now, false);
        let images = index.records();
        let decision = match command {
            NavCommand::Next => self.engine.next(images, &viewport),
            NavCommand::Previous => self.engine.previous(images, &viewport),
            NavCommand::PageUp => self.engine.page_up(images, &viewport),
        };
        if decision.snap_exhausted {
            self.snap_exhaustions += 1;
        }

        let current = viewport.scroll_offset;
        let target = viewport.clamp(decision.target_offset);
        let delta = (target - current).abs();
        let stuck = delta < self.stuck_threshold;

        let diagnostics = if stuck {
            self.stuck_count += 1;
            self.stuck += 1;
            warn!(
                stuck_count = self.stuck_count,
                branch = decision.reason.branch(),
                current,
                target,
                positions = index.len(),
                "navigation made no progress"
            );
            let message = stuck_message(self.stuck_count, &decision.rationale(), delta, index.len());
            self.diagnostics.push(message, now, self.stuck_toast)
        } else {
            self.stuck_count = 0;
            Vec::new()
        };

        let scroll_to = (target != current).then_some(target);
        if scroll_to.is_some() {
            self.scrolls += 1;
            self.settle_deadlines.push_back(now + self.settle_delay);
        }

        debug!(
            branch = decision.reason.branch(),
            current,
            target,
            scrolled = scroll_to.is_some(),
            "navigation handled"
        );

        KeyOutcome::Navigated(NavOutcome {
            command,
            decision,
            current,
            target,
            scroll_to,
            stuck,
            positions: index.len(),
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgstep_core::clock::DeterministicClock;
    use imgstep_core::event::{KeyCode, Modifiers};
    use imgstep_index::synthetic::{ElemId, SyntheticPage};

    fn navigator(clock: &DeterministicClock) -> Navigator<ElemId, DeterministicClock> {
        Navigator::new(&NavConfig::default(), clock.clone())
    }

    fn key(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch))
    }

    fn press(
        navigator: &mut Navigator<ElemId, DeterministicClock>,
        page: &SyntheticPage,
        event: KeyEvent,
        offset: f64,
    ) -> NavOutcome {
        let viewport = ViewportState::new(offset, 1000.0, page.document_height());
        match navigator.handle_key(page, &event, FocusContext::Document, viewport) {
            KeyOutcome::Navigated(outcome) => outcome,
            KeyOutcome::Ignored => panic!("key {event:?} was ignored"),
        }
    }

    #[test]
    fn next_scrolls_and_prevents_default() {
        let clock = DeterministicClock::new();
        let page = SyntheticPage::with_images(&[(0.0, 800.0), (1000.0, 2300.0), (2500.0, 4000.0)]);
        let mut nav = navigator(&clock);
        let outcome = press(&mut nav, &page, key('s'), 0.0);
        assert_eq!(outcome.command, NavCommand::Next);
        assert_eq!(outcome.scroll_to, Some(1000.0));
        assert!(outcome.prevent_default());
        assert!(!outcome.stuck);
        assert_eq!(outcome.positions, 3);
    }

    #[test]
    fn editable_focus_is_ignored() {
        let clock = DeterministicClock::new();
        let page = SyntheticPage::with_images(&[(0.0, 800.0)]);
        let mut nav = navigator(&clock);
        let viewport = ViewportState::new(0.0, 1000.0, 2000.0);
        let outcome = nav.handle_key(&page, &key('s'), FocusContext::TextInput, viewport);
        assert_eq!(outcome, KeyOutcome::Ignored);
        assert_eq!(nav.stats().commands, 0);
    }

    #[test]
    fn shift_w_pages_up() {
        let clock = DeterministicClock::new();
        let page = SyntheticPage::with_images(&[(0.0, 400.0), (1050.0, 1600.0), (2000.0, 2600.0)]);
        let mut nav = navigator(&clock);
        let event = KeyEvent::new(KeyCode::Char('W')).with_modifiers(Modifiers::SHIFT);
        let outcome = press(&mut nav, &page, event, 2000.0);
        assert_eq!(outcome.command, NavCommand::PageUp);
        assert_eq!(outcome.scroll_to, Some(1050.0));
    }

    #[test]
    fn stuck_counts_and_resets() {
        let clock = DeterministicClock::new();
        let page = SyntheticPage::with_images(&[(0.0, 800.0)]);
        let mut nav = navigator(&clock);

        // Already at the top: previous cannot move.
        let first = press(&mut nav, &page, key('w'), 0.0);
        assert!(first.stuck);
        assert_eq!(first.scroll_to, None);
        assert!(!first.prevent_default());
        assert_eq!(nav.stuck_count(), 1);
        assert!(matches!(&first.diagnostics[..], [DiagnosticAction::Show(t)]
            if t.message.contains("STUCK (1x)") && t.message.contains("W: No images above")));

        let second = press(&mut nav, &page, key('w'), 0.0);
        assert!(second.stuck);
        assert_eq!(nav.stuck_count(), 2);
        assert_eq!(second.diagnostics.len(), 2);

        let page = SyntheticPage::with_images(&[(0.0, 800.0), (1500.0, 2000.0)]);
        let moved = press(&mut nav, &page, key('s'), 0.0);
        assert!(!moved.stuck);
        assert_eq!(nav.stuck_count(), 0);
        assert_eq!(nav.stats().stuck, 2);
    }

    #[test]
    fn target_is_clamped_to_document() {
        let clock = DeterministicClock::new();
        let mut page = SyntheticPage::with_images(&[(0.0, 800.0), (1200.0, 1500.0)]);
        page.set_document_height(1800.0);
        let mut nav = navigator(&clock);
        let outcome = press(&mut nav, &page, key('s'), 0.0);
        assert_eq!(outcome.decision.target_offset, 1200.0);
        assert_eq!(outcome.target, 800.0);
        assert_eq!(outcome.scroll_to, Some(800.0));
    }

    #[test]
    fn settle_invalidates_after_delay() {
        let clock = DeterministicClock::new();
        let page = SyntheticPage::with_images(&[(0.0, 800.0), (1000.0, 2300.0)]);
        let mut nav = navigator(&clock);
        press(&mut nav, &page, key('s'), 0.0);
        assert_eq!(nav.next_deadline(), Some(Duration::from_millis(150)));

        clock.advance_ms(100);
        nav.positions(&page);
        clock.advance_ms(49);
        nav.tick();
        assert_eq!(nav.stats().settles, 0);

        clock.advance_ms(1);
        nav.tick();
        assert_eq!(nav.stats().settles, 1);
        assert_eq!(nav.next_deadline(), None);

        // The index built at 100ms is still inside the freshness window,
        // but the settle forced a rescan.
        clock.advance_ms(1);
        let before = nav.stats().cache.rebuilds;
        nav.positions(&page);
        assert_eq!(nav.stats().cache.rebuilds, before + 1);
    }

    #[test]
    fn stale_handle_forces_rescan() {
        let clock = DeterministicClock::new();
        let page = SyntheticPage::with_images(&[(0.0, 800.0)]);
        let mut nav = navigator(&clock);
        let first = nav.positions(&page);
        let again = nav.positions(&page);
        assert!(Arc::ptr_eq(&first, &again));

        nav.stale_handle().mark();
        let rebuilt = nav.positions(&page);
        assert!(!Arc::ptr_eq(&first, &rebuilt));
    }

    #[test]
    fn stuck_toast_expires_on_tick() {
        let clock = DeterministicClock::new();
        let page = SyntheticPage::with_images(&[]);
        let mut nav = navigator(&clock);
        press(&mut nav, &page, key('w'), 0.0);
        assert!(nav.diagnostics().visible().is_some());
        assert_eq!(nav.next_deadline(), Some(Duration::from_secs(5)));

        clock.advance_ms(5000);
        let actions = nav.tick();
        assert!(matches!(&actions[..], [DiagnosticAction::Hide(_)]));
        assert!(nav.diagnostics().visible().is_none());
    }
}
