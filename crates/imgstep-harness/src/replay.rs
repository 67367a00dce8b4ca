#![forbid(unsafe_code)]

//! Deterministic replay of a [`Fixture`] through [`StepperCore`].
//!
//! Time only moves on `wait` steps. Every timer due inside a wait fires at
//! its own deadline, in order, before the clock lands on the wait's end.

use core::time::Duration;

use imgstep_core::clock::{Clock, DeterministicClock};
use imgstep_engine::{NavConfig, ViewportState};
use imgstep_index::NodeKind;
use imgstep_index::synthetic::ElemId;
use imgstep_runtime::DiagnosticAction;
use imgstep_web::{KeyDownResult, KeyInput, StepperCore};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::fixture::{BuiltPage, Expectation, Fixture, Step};

/// Offsets closer than this compare equal.
const OFFSET_TOLERANCE: f64 = 0.5;

/// Outcome of one replayed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub action: String,
    pub offset_before: f64,
    pub offset_after: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub handled: bool,
    pub stuck: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<String>,
}

/// Cache counters at the end of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheSummary {
    pub hits: u64,
    pub rebuilds: u64,
    pub invalidations: u64,
}

/// Result of replaying one fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub name: String,
    pub steps: Vec<StepRecord>,
    pub final_offset: f64,
    pub stuck_count: u32,
    pub toasts_shown: u64,
    pub snap_exhaustions: u64,
    pub cache: CacheSummary,
}

impl ReplayReport {
    #[must_use]
    pub fn mismatch_count(&self) -> usize {
        self.steps.iter().map(|step| step.mismatches.len()).sum()
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.mismatch_count() == 0
    }

    /// Offsets after each handled key, in order.
    #[must_use]
    pub fn visited(&self) -> Vec<f64> {
        self.steps
            .iter()
            .filter(|step| step.handled)
            .map(|step| step.offset_after)
            .collect()
    }
}

struct Session {
    clock: DeterministicClock,
    built: BuiltPage,
    core: StepperCore<ElemId, DeterministicClock>,
    offset: f64,
    viewport_height: f64,
    toasts_shown: u64,
}

impl Session {
    fn viewport(&self) -> ViewportState {
        ViewportState::new(
            self.offset,
            self.viewport_height,
            self.built.page.document_height(),
        )
    }

    fn count_toasts(&mut self, actions: &[DiagnosticAction]) {
        self.toasts_shown += actions
            .iter()
            .filter(|action| matches!(action, DiagnosticAction::Show(_)))
            .count() as u64;
    }

    fn key(&mut self, input: KeyInput<'_>) -> KeyDownResult {
        let viewport = self.viewport();
        let result = self.core.key_down(&self.built.page, input, viewport);
        self.count_toasts(&result.diagnostics);
        if let Some(request) = result.scroll {
            self.scroll_to(request.top);
        }
        result
    }

    fn scroll_to(&mut self, offset: f64) {
        self.offset = offset;
        self.core.scrolled(offset);
    }

    fn wait(&mut self, ms: u64) {
        let end = self.clock.now_mono() + Duration::from_millis(ms);
        while let Some(deadline) = self.core.next_deadline()
            && deadline <= end
        {
            if deadline > self.clock.now_mono() {
                self.clock.set(deadline);
            }
            let actions = self.core.tick();
            self.count_toasts(&actions);
        }
        self.clock.set(end);
        let actions = self.core.tick();
        self.count_toasts(&actions);
    }
}

fn check(expect: &Expectation, record: &StepRecord) -> Vec<String> {
    let mut mismatches = Vec::new();
    if let Some(offset) = expect.offset
        && (record.offset_after - offset).abs() > OFFSET_TOLERANCE
    {
        mismatches.push(format!(
            "expected offset {offset}, got {}",
            record.offset_after
        ));
    }
    if let Some(branch) = &expect.branch
        && record.branch != Some(branch.as_str())
    {
        mismatches.push(format!(
            "expected branch {branch}, got {}",
            record.branch.unwrap_or("none")
        ));
    }
    if let Some(stuck) = expect.stuck
        && record.stuck != stuck
    {
        mismatches.push(format!("expected stuck={stuck}, got {}", record.stuck));
    }
    if let Some(handled) = expect.handled
        && record.handled != handled
    {
        mismatches.push(format!(
            "expected handled={handled}, got {}",
            record.handled
        ));
    }
    mismatches
}

/// Replay `fixture` under `config`.
#[must_use]
pub fn replay(fixture: &Fixture, config: &NavConfig) -> ReplayReport {
    let _span = info_span!("replay", fixture = %fixture.name).entered();

    let clock = DeterministicClock::new();
    let mut session = Session {
        core: StepperCore::new(config, clock.clone()),
        clock,
        built: fixture.build_page(),
        offset: 0.0,
        viewport_height: fixture.viewport_height,
        toasts_shown: 0,
    };
    if fixture.start_offset != 0.0 {
        session.scroll_to(fixture.start_offset);
    }

    let mut steps = Vec::with_capacity(fixture.steps.len());
    for (index, step) in fixture.steps.iter().enumerate() {
        let offset_before = session.offset;
        let mut record = StepRecord {
            index,
            action: String::new(),
            offset_before,
            offset_after: offset_before,
            branch: None,
            rationale: None,
            handled: false,
            stuck: false,
            mismatches: Vec::new(),
        };

        match step {
            Step::Key {
                key,
                shift,
                alt,
                ctrl,
                meta,
                target,
                expect,
            } => {
                record.action = format!("key {key}");
                let result = session.key(KeyInput {
                    key: key.as_str(),
                    shift: *shift,
                    ctrl: *ctrl,
                    alt: *alt,
                    meta: *meta,
                    repeat: false,
                    target_tag: target.as_deref(),
                    content_editable: None,
                });
                record.offset_after = session.offset;
                record.handled = result.prevent_default;
                record.stuck = result.stuck;
                if let Some(decision) = &result.decision {
                    record.branch = Some(decision.reason.branch());
                    record.rationale = Some(decision.rationale());
                }
                if let Some(expect) = expect {
                    record.mismatches = check(expect, &record);
                }
            }
            Step::KeyUp { key } => {
                record.action = format!("keyup {key}");
                record.handled = session.core.key_up(key);
            }
            Step::Wait { ms } => {
                record.action = format!("wait {ms}ms");
                session.wait(*ms);
            }
            Step::Load { image } => {
                record.action = format!("load image {image}");
                session.built.finish_load(*image);
                session.core.loaded(NodeKind::Image);
            }
            Step::Scroll { offset } => {
                record.action = format!("scroll {offset}");
                session.scroll_to(*offset);
                record.offset_after = *offset;
            }
        }

        debug!(
            step = index,
            action = %record.action,
            from = record.offset_before,
            to = record.offset_after,
            branch = record.branch.unwrap_or("-"),
            "replayed step"
        );
        for mismatch in &record.mismatches {
            warn!(step = index, %mismatch, "expectation failed");
        }
        steps.push(record);
    }

    let stats = session.core.navigator().stats();
    let report = ReplayReport {
        name: fixture.name.clone(),
        steps,
        final_offset: session.offset,
        stuck_count: session.core.navigator().stuck_count(),
        toasts_shown: session.toasts_shown,
        snap_exhaustions: stats.snap_exhaustions,
        cache: CacheSummary {
            hits: stats.cache.hits,
            rebuilds: stats.cache.rebuilds,
            invalidations: stats.cache.invalidations,
        },
    };
    info!(
        steps = report.steps.len(),
        mismatches = report.mismatch_count(),
        final_offset = report.final_offset,
        stuck = report.stuck_count,
        "replay finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixture(raw: &str) -> Fixture {
        Fixture::from_json_str(raw).unwrap()
    }

    #[test]
    fn walks_gallery_forward() {
        let fixture = fixture(
            r#"{
                "name": "walk",
                "images": [
                    { "top": 100, "height": 600 },
                    { "top": 800, "height": 600 },
                    { "top": 1500, "height": 500 }
                ],
                "document_height": 3000,
                "steps": [
                    { "action": "key", "key": "s", "expect": { "offset": 800, "branch": "truncated_at_bottom" } },
                    { "action": "key", "key": "s", "expect": { "offset": 1500 } },
                    { "action": "key", "key": "s", "expect": { "offset": 2000, "branch": "no_images_below" } }
                ]
            }"#,
        );
        let report = replay(&fixture, &NavConfig::default());
        assert!(report.passed(), "{:#?}", report.steps);
        assert_eq!(report.visited(), vec![800.0, 1500.0, 2000.0]);
        assert_eq!(report.final_offset, 2000.0);
        assert_eq!(report.stuck_count, 0);
    }

    #[test]
    fn mismatch_is_reported() {
        let fixture = fixture(
            r#"{
                "name": "wrong",
                "images": [{ "top": 100, "height": 600 }],
                "document_height": 3000,
                "steps": [
                    { "action": "key", "key": "s", "expect": { "offset": 200 } }
                ]
            }"#,
        );
        let report = replay(&fixture, &NavConfig::default());
        assert!(!report.passed());
        assert_eq!(
            report.steps[0].mismatches,
            vec!["expected offset 200, got 850".to_string()]
        );
    }

    #[test]
    fn focused_input_is_not_handled() {
        let fixture = fixture(
            r#"{
                "name": "typing",
                "images": [{ "top": 100, "height": 600 }],
                "steps": [
                    { "action": "key", "key": "s", "target": "INPUT", "expect": { "handled": false, "offset": 0 } }
                ]
            }"#,
        );
        let report = replay(&fixture, &NavConfig::default());
        assert!(report.passed(), "{:#?}", report.steps);
        assert_eq!(report.steps[0].branch, None);
    }

    #[test]
    fn wait_fires_settle_timer() {
        let fixture = fixture(
            r#"{
                "name": "settle",
                "images": [{ "top": 100, "height": 600 }],
                "document_height": 3000,
                "steps": [
                    { "action": "key", "key": "s" },
                    { "action": "wait", "ms": 400 }
                ]
            }"#,
        );
        let report = replay(&fixture, &NavConfig::default());
        assert_eq!(report.cache.invalidations, 1);
        assert_eq!(report.cache.rebuilds, 1);
    }
}
