#![forbid(unsafe_code)]

//! Host-neutral event plumbing.
//!
//! Both controllers see every keydown. The position cycler goes first: it
//! only reacts to `Alt+c`, which the navigator ignores anyway because Alt is
//! held. Mutation and load notifications go straight to the stale flag.

use core::time::Duration;

use imgstep_core::clock::Clock;
use imgstep_core::event::{FocusContext, KeyEvent, KeyEventKind};
use imgstep_engine::{NavConfig, ScrollDecision, ViewportState};
use imgstep_index::{DocumentHost, DomChange, NodeKind, StaleHandle};
use imgstep_runtime::{CycleOutcome, DiagnosticAction, KeyOutcome, Navigator, PositionCycler};
use tracing::trace;

/// How the host should scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehaviorKind {
    /// Jump without animation.
    Instant,
    /// Animate.
    Smooth,
}

/// A scroll the host should perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    /// Target scroll offset.
    pub top: f64,
    /// Scroll behaviour.
    pub behavior: ScrollBehaviorKind,
}

/// A keydown as the browser reports it.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyInput<'a> {
    /// `KeyboardEvent.key`.
    pub key: &'a str,
    /// Shift held.
    pub shift: bool,
    /// Ctrl held.
    pub ctrl: bool,
    /// Alt held.
    pub alt: bool,
    /// Meta held.
    pub meta: bool,
    /// Auto-repeat.
    pub repeat: bool,
    /// Tag name of the event target.
    pub target_tag: Option<&'a str>,
    /// `contenteditable` attribute of the event target.
    pub content_editable: Option<&'a str>,
}

impl KeyInput<'_> {
    fn to_event(self) -> KeyEvent {
        let event = KeyEvent::from_dom_key(self.key, self.shift, self.ctrl, self.alt, self.meta);
        if self.repeat {
            event.with_kind(KeyEventKind::Repeat)
        } else {
            event
        }
    }

    fn focus(self) -> FocusContext {
        FocusContext::from_target(self.target_tag, self.content_editable)
    }
}

/// What the host should do after a keydown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyDownResult {
    /// Call `preventDefault` on the event.
    pub prevent_default: bool,
    /// Scroll to perform.
    pub scroll: Option<ScrollRequest>,
    /// Toast updates.
    pub diagnostics: Vec<DiagnosticAction>,
    /// Navigation decision, when a navigation key ran.
    pub decision: Option<ScrollDecision>,
    /// The navigation key made no progress.
    pub stuck: bool,
}

/// Navigator and position cycler behind one event surface.
#[derive(Debug)]
pub struct StepperCore<E, C> {
    navigator: Navigator<E, C>,
    cycler: PositionCycler<C>,
    stale: StaleHandle,
}

impl<E, C: Clock + Clone> StepperCore<E, C> {
    /// Create both controllers from one configuration.
    pub fn new(config: &NavConfig, clock: C) -> Self {
        let navigator = Navigator::new(config, clock.clone());
        let stale = navigator.stale_handle();
        let cycler = PositionCycler::new(config.history.clone(), config.key_map(), clock);
        Self {
            navigator,
            cycler,
            stale,
        }
    }

    /// The image navigator.
    #[must_use]
    pub fn navigator(&self) -> &Navigator<E, C> {
        &self.navigator
    }

    /// The position cycler.
    #[must_use]
    pub fn cycler(&self) -> &PositionCycler<C> {
        &self.cycler
    }

    /// Handle a keydown.
    pub fn key_down<H>(&mut self, host: &H, input: KeyInput<'_>, viewport: ViewportState) -> KeyDownResult
    where
        H: DocumentHost<Element = E>,
    {
        let event = input.to_event();

        if let CycleOutcome::ScrollTo { offset } = self.cycler.handle_key(&event) {
            return KeyDownResult {
                prevent_default: true,
                scroll: Some(ScrollRequest {
                    top: offset,
                    behavior: ScrollBehaviorKind::Smooth,
                }),
                ..KeyDownResult::default()
            };
        }

        match self.navigator.handle_key(host, &event, input.focus(), viewport) {
            KeyOutcome::Ignored => KeyDownResult::default(),
            KeyOutcome::Navigated(outcome) => KeyDownResult {
                prevent_default: outcome.prevent_default(),
                scroll: outcome.scroll_to.map(|top| ScrollRequest {
                    top,
                    behavior: ScrollBehaviorKind::Instant,
                }),
                diagnostics: outcome.diagnostics,
                decision: Some(outcome.decision),
                stuck: outcome.stuck,
            },
        }
    }

    /// Handle a keyup. Returns whether a position cycle ended.
    pub fn key_up(&mut self, key: &str) -> bool {
        let event = KeyEvent::from_dom_key(key, false, false, false, false)
            .with_kind(KeyEventKind::Release);
        matches!(self.cycler.handle_key(&event), CycleOutcome::Ended)
    }

    /// Handle a window scroll event.
    pub fn scrolled(&mut self, offset: f64) {
        self.cycler.on_scroll(offset);
    }

    /// Handle a child-list mutation. Returns whether the index went stale.
    pub fn child_list_changed(&self, added: &[NodeKind], removed: &[NodeKind]) -> bool {
        self.observe(&DomChange::ChildList { added, removed })
    }

    /// Handle an attribute mutation. Returns whether the index went stale.
    pub fn attribute_changed(&self, target: NodeKind, name: &str) -> bool {
        self.observe(&DomChange::Attribute { target, name })
    }

    /// Handle a load event. Returns whether the index went stale.
    pub fn loaded(&self, target: NodeKind) -> bool {
        self.observe(&DomChange::Loaded { target })
    }

    fn observe(&self, change: &DomChange<'_>) -> bool {
        let stale = self.stale.observe(change);
        if stale {
            trace!(?change, "position index marked stale");
        }
        stale
    }

    /// Run due timers.
    pub fn tick(&mut self) -> Vec<DiagnosticAction> {
        self.cycler.tick();
        self.navigator.tick()
    }

    /// Earliest time at which [`tick`](Self::tick) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.navigator.next_deadline(), self.cycler.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgstep_core::clock::DeterministicClock;
    use imgstep_index::synthetic::{ElemId, SyntheticPage};
    use pretty_assertions::assert_eq;

    fn core(clock: &DeterministicClock) -> StepperCore<ElemId, DeterministicClock> {
        StepperCore::new(&NavConfig::default(), clock.clone())
    }

    fn gallery() -> SyntheticPage {
        SyntheticPage::with_images(&[(0.0, 800.0), (1000.0, 2300.0), (2500.0, 4000.0)])
    }

    fn key(key: &str) -> KeyInput<'_> {
        KeyInput {
            key,
            target_tag: Some("BODY"),
            ..KeyInput::default()
        }
    }

    #[test]
    fn s_scrolls_instantly() {
        let clock = DeterministicClock::new();
        let page = gallery();
        let mut core = core(&clock);
        let result = core.key_down(&page, key("s"), ViewportState::new(0.0, 1000.0, 4000.0));
        assert!(result.prevent_default);
        assert_eq!(
            result.scroll,
            Some(ScrollRequest {
                top: 1000.0,
                behavior: ScrollBehaviorKind::Instant,
            })
        );
        assert!(result.diagnostics.is_empty());
        assert!(!result.stuck);
        assert_eq!(result.decision.map(|d| d.reason.branch()), Some("next_image"));
    }

    #[test]
    fn typing_in_a_textarea_is_ignored() {
        let clock = DeterministicClock::new();
        let page = gallery();
        let mut core = core(&clock);
        let input = KeyInput {
            target_tag: Some("TEXTAREA"),
            ..key("s")
        };
        let result = core.key_down(&page, input, ViewportState::new(0.0, 1000.0, 4000.0));
        assert_eq!(result, KeyDownResult::default());
    }

    #[test]
    fn meta_shortcuts_pass_through() {
        let clock = DeterministicClock::new();
        let page = gallery();
        let mut core = core(&clock);
        for k in ["s", "w", "W"] {
            let input = KeyInput {
                meta: true,
                shift: k == "W",
                ..key(k)
            };
            let result = core.key_down(&page, input, ViewportState::new(0.0, 1000.0, 4000.0));
            assert_eq!(result, KeyDownResult::default());
        }
        assert_eq!(core.navigator().stuck_count(), 0);
    }

    #[test]
    fn alt_c_cycles_smoothly_and_alt_release_ends() {
        let clock = DeterministicClock::new();
        let page = gallery();
        let mut core = core(&clock);
        core.scrolled(2500.0);
        clock.advance_ms(300);
        core.tick();

        let input = KeyInput {
            alt: true,
            ..key("c")
        };
        let viewport = ViewportState::new(2500.0, 1000.0, 4000.0);
        let result = core.key_down(&page, input, viewport);
        assert!(result.prevent_default);
        assert_eq!(
            result.scroll,
            Some(ScrollRequest {
                top: 2500.0,
                behavior: ScrollBehaviorKind::Smooth,
            })
        );

        clock.advance_ms(500);
        let result = core.key_down(&page, input, viewport);
        assert_eq!(result.scroll.map(|s| s.top), Some(0.0));

        assert!(core.key_up("Alt"));
        assert!(!core.key_up("Alt"));
        assert_eq!(core.cycler().positions().next(), Some(0.0));
    }

    #[test]
    fn load_event_marks_stale() {
        let clock = DeterministicClock::new();
        let core = core(&clock);
        assert!(core.loaded(NodeKind::from_node_name("IMG", false)));
        assert!(!core.loaded(NodeKind::from_node_name("SCRIPT", false)));
        assert!(core.attribute_changed(NodeKind::Image, "src"));
        assert!(!core.attribute_changed(NodeKind::Image, "alt"));
        assert!(core.child_list_changed(
            &[NodeKind::from_node_name("DIV", true)],
            &[]
        ));
    }

    #[test]
    fn next_deadline_covers_both_controllers() {
        let clock = DeterministicClock::new();
        let page = gallery();
        let mut core = core(&clock);
        assert_eq!(core.next_deadline(), None);

        core.scrolled(100.0);
        assert_eq!(core.next_deadline(), Some(Duration::from_millis(250)));

        core.key_down(&page, key("s"), ViewportState::new(0.0, 1000.0, 4000.0));
        assert_eq!(core.next_deadline(), Some(Duration::from_millis(150)));
    }
}
