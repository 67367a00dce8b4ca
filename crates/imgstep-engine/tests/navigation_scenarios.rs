#![forbid(unsafe_code)]

//! Reference navigation scenarios with exact expected targets.

use imgstep_engine::{DecisionEngine, DecisionReason, SnapCorrector, ViewportState};
use imgstep_index::PositionIndex;

#[test]
fn three_images_next_skips_the_visible_one() {
    let index = PositionIndex::from_spans(&[(0.0, 800.0), (1000.0, 2300.0), (2500.0, 4000.0)]);
    let viewport = ViewportState::new(0.0, 1000.0, 4000.0);
    let decision = DecisionEngine::default().next(index.records(), &viewport);
    assert_eq!(decision.target_offset, 1000.0);
    assert_eq!(
        decision.reason,
        DecisionReason::NextImage {
            index: 1,
            image_top: 1000.0,
            current: 0.0,
        }
    );
}

#[test]
fn large_image_from_its_top_steps_within() {
    let index = PositionIndex::from_spans(&[(0.0, 3000.0)]);
    let viewport = ViewportState::new(0.0, 1000.0, 3000.0);
    let decision = DecisionEngine::default().next(index.records(), &viewport);
    assert_eq!(decision.target_offset, 850.0);
    assert_eq!(
        decision.rationale(),
        "S: Inside large img[0]\n→ Scroll within image\nCurrent: 0px → 850px\nRemaining below: 2000px"
    );
}

#[test]
fn large_image_remaining_exactly_at_threshold_leaves() {
    let index = PositionIndex::from_spans(&[(0.0, 3000.0)]);
    let viewport = ViewportState::new(1900.0, 1000.0, 4200.0);
    let decision = DecisionEngine::default().next(index.records(), &viewport);
    assert_eq!(decision.target_offset, 2750.0);
    assert_eq!(decision.reason.branch(), "leave_large_no_next");

    // A short document bounds the fallback step.
    let viewport = ViewportState::new(1900.0, 1000.0, 3000.0);
    let decision = DecisionEngine::default().next(index.records(), &viewport);
    assert_eq!(decision.target_offset, 2000.0);
}

#[test]
fn snap_moves_off_a_bisected_small_image() {
    let index = PositionIndex::from_spans(&[(480.0, 520.0)]);
    let outcome = SnapCorrector::default().snap(500.0, index.records(), 1000.0);
    assert_eq!(outcome.offset, 480.0);
    assert!(!outcome.exhausted);
}

#[test]
fn next_from_an_image_top_moves() {
    let index = PositionIndex::from_spans(&[(0.0, 600.0), (700.0, 1300.0), (1400.0, 2000.0)]);
    let engine = DecisionEngine::default();
    for record in index.records() {
        let viewport = ViewportState::new(record.top, 1000.0, 3000.0);
        let decision = engine.next(index.records(), &viewport);
        assert_ne!(decision.target_offset, record.top, "stuck at {}", record.top);
    }
}

#[test]
fn previous_from_below_an_image_returns_its_top() {
    let index = PositionIndex::from_spans(&[(0.0, 600.0), (700.0, 1300.0), (1400.0, 2000.0)]);
    let engine = DecisionEngine::default();
    for record in index.records() {
        let viewport = ViewportState::new(record.top + 100.0, 1000.0, 3000.0);
        let decision = engine.previous(index.records(), &viewport);
        assert_eq!(decision.target_offset, record.top);
    }
}

#[test]
fn next_then_previous_walks_the_gallery() {
    let index = PositionIndex::from_spans(&[
        (100.0, 700.0),
        (800.0, 1400.0),
        (1500.0, 2100.0),
        (2200.0, 2800.0),
    ]);
    let engine = DecisionEngine::default();
    let document_height = 3000.0;

    let mut offset = 100.0;
    let mut forward = vec![offset];
    loop {
        let viewport = ViewportState::new(offset, 900.0, document_height);
        let target = viewport.clamp(engine.next(index.records(), &viewport).target_offset);
        if (target - offset).abs() < 5.0 {
            break;
        }
        offset = target;
        forward.push(offset);
    }
    assert_eq!(forward, vec![100.0, 800.0, 1500.0, 2100.0]);

    let viewport = ViewportState::new(2100.0, 900.0, document_height);
    let decision = engine.previous(index.records(), &viewport);
    assert_eq!(decision.target_offset, 1500.0);
}
