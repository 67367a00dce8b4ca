#![forbid(unsafe_code)]

//! Index construction across frame boundaries.

use core::time::Duration;

use imgstep_index::synthetic::SyntheticPage;
use imgstep_index::{DocumentHost, IndexBuilder, PositionCache};

fn tops(page: &SyntheticPage) -> Vec<f64> {
    let (index, _) = IndexBuilder::default().build(page, Duration::ZERO);
    index.records().iter().map(|r| r.top).collect()
}

#[test]
fn frame_images_are_merged_in_document_space() {
    let mut page = SyntheticPage::new();
    let root = page.root();
    page.add_image(root, None, 0.0, 600.0, 500.0);
    let (_, inner) = page.add_frame(root, None, 600.0);
    page.add_image(inner, None, 10.0, 600.0, 400.0);
    page.add_image(inner, None, 420.0, 600.0, 400.0);
    page.add_image(root, None, 1500.0, 600.0, 500.0);

    assert_eq!(tops(&page), vec![0.0, 610.0, 1020.0, 1500.0]);
}

#[test]
fn nested_frames_accumulate_every_hosting_offset() {
    let mut page = SyntheticPage::new();
    let root = page.root();
    let (_, level1) = page.add_frame(root, None, 1000.0);
    let holder = page.add_block(level1, None, 200.0);
    let (_, level2) = page.add_frame(level1, Some(holder), 50.0);
    page.add_image(level2, None, 5.0, 600.0, 400.0);

    assert_eq!(tops(&page), vec![1255.0]);
}

#[test]
fn cross_origin_frames_are_skipped_silently() {
    let mut page = SyntheticPage::with_images(&[(0.0, 500.0)]);
    let root = page.root();
    page.add_cross_origin_frame(root, None, 600.0);
    let (_, inner) = page.add_frame(root, None, 1200.0);
    page.add_image(inner, None, 0.0, 600.0, 400.0);

    let (index, report) = IndexBuilder::default().build(&page, Duration::ZERO);
    assert_eq!(index.len(), 2);
    assert_eq!(report.inaccessible_frames, 1);
    assert_eq!(report.documents, 2);
}

#[test]
fn order_index_counts_every_discovered_image() {
    let mut page = SyntheticPage::new();
    let root = page.root();
    page.add_image(root, None, 900.0, 20.0, 20.0);
    page.add_image(root, None, 300.0, 600.0, 400.0);
    let (_, inner) = page.add_frame(root, None, 0.0);
    page.add_image(inner, None, 0.0, 600.0, 200.0);

    let (index, report) = IndexBuilder::default().build(&page, Duration::ZERO);
    let order: Vec<usize> = index.records().iter().map(|r| r.order_index).collect();
    assert_eq!(order, vec![2, 1]);
    assert_eq!(report.discovered, 3);
    assert_eq!(report.too_small, 1);
}

#[test]
fn frame_load_then_mark_stale_picks_up_new_images() {
    let mut page = SyntheticPage::with_images(&[(0.0, 500.0)]);
    let mut cache = PositionCache::new(IndexBuilder::default(), Duration::from_millis(100));
    let stale = cache.stale_handle();

    assert_eq!(cache.get_positions(&page, Duration::ZERO, false).len(), 1);

    let root = page.root();
    let (frame, inner) = page.add_frame(root, None, 700.0);
    page.add_image(inner, None, 0.0, 600.0, 400.0);
    assert_eq!(page.hosting_frame(&inner), Some(frame));

    stale.mark();
    let index = cache.get_positions(&page, Duration::from_millis(1), false);
    assert_eq!(index.len(), 2);
    assert_eq!(index.records()[1].top, 700.0);
}
