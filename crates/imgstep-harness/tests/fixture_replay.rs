#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use imgstep_engine::NavConfig;
use imgstep_harness::{Fixture, ReplayReport, replay};
use pretty_assertions::assert_eq;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn replay_named(name: &str) -> ReplayReport {
    let path = fixtures_dir().join(format!("{name}.json"));
    let fixture = Fixture::from_path(&path).unwrap();
    replay(&fixture, &NavConfig::default())
}

#[test]
fn every_bundled_fixture_passes() {
    let mut paths: Vec<PathBuf> = fs::read_dir(fixtures_dir())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty());

    for path in paths {
        let fixture = Fixture::from_path(&path).unwrap();
        let report = replay(&fixture, &NavConfig::default());
        let failures: Vec<_> = report
            .steps
            .iter()
            .filter(|step| !step.mismatches.is_empty())
            .collect();
        assert!(failures.is_empty(), "{}: {failures:#?}", path.display());
    }
}

#[test]
fn gallery_walk_visits_each_image() {
    let report = replay_named("gallery_walk");
    assert_eq!(
        report.visited(),
        vec![800.0, 1500.0, 2000.0, 1500.0, 800.0, 100.0, 0.0]
    );
    assert_eq!(report.stuck_count, 1);
    assert_eq!(report.toasts_shown, 1);
}

#[test]
fn loaded_image_forces_a_rescan() {
    let report = replay_named("lazy_frames");
    assert_eq!(report.cache.rebuilds, 3);
    assert_eq!(report.cache.hits, 2);
    assert_eq!(report.final_offset, 3000.0);
}

#[test]
fn cross_origin_frame_images_are_skipped() {
    let report = replay_named("lazy_frames");
    // The cross-origin image would sit at 2000..2400 and turn the third
    // press into a truncated-at-bottom stop.
    assert_eq!(report.steps[4].branch, Some("next_image"));
    assert_eq!(report.steps[4].offset_after, 2500.0);
}

#[test]
fn rationale_uses_display_text() {
    let report = replay_named("gallery_walk");
    let rationale = report.steps[0].rationale.as_deref().unwrap();
    assert!(rationale.starts_with("S: "), "{rationale}");
}

#[test]
fn position_cycle_returns_to_recorded_offsets() {
    let report = replay_named("position_cycle");
    assert_eq!(report.final_offset, 2500.0);
    assert_eq!(report.stuck_count, 0);
    assert!(report.steps.iter().all(|step| step.branch.is_none()));
}

#[test]
fn tighter_step_ratio_changes_large_image_walk() {
    let path = fixtures_dir().join("large_image.json");
    let mut fixture = Fixture::from_path(&path).unwrap();
    fixture.steps.truncate(1);
    let mut config = NavConfig::default();
    config.step.step_ratio = 0.5;
    let report = replay(&fixture, &config);
    assert_eq!(report.final_offset, 500.0);
    assert_eq!(report.mismatch_count(), 1);
}
