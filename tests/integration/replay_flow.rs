//! Integration tests for chunking and replaying full traces
//!
//! Drives realistic command streams through the chunker, the replay engine
//! and the registry, and checks the rendered views.

use super::common::traces::{bubble_sort, tree_walk};
use stepviz::view::{CellState, LayoutView};
use stepviz::{chunk_commands, ReplayEngine, View};

fn root_layout(engine: &ReplayEngine) -> LayoutView {
    match engine.render_root() {
        Some(View::Layout(layout)) => layout,
        other => panic!("expected layout root, got {other:?}"),
    }
}

fn pane<'a>(layout: &'a LayoutView, key: &str) -> &'a View {
    &layout
        .panes
        .iter()
        .find(|pane| pane.key == key)
        .unwrap_or_else(|| panic!("no pane {key}"))
        .view
}

/// Test that a bubble sort trace ends sorted with no highlights left
#[test]
fn test_bubble_sort_replays_to_sorted_state() {
    let mut engine = ReplayEngine::new(0);
    engine.load(chunk_commands(bubble_sort(&[5, 1, 4, 2, 8])));

    let report = engine.seek(engine.chunk_count()).unwrap();
    assert!(report.is_clean(), "failures: {:?}", report.failures);

    let layout = root_layout(&engine);
    assert!(!layout.horizontal);
    assert_eq!(layout.panes.len(), 3);

    let View::Array(array) = pane(&layout, "array") else {
        panic!("expected array pane");
    };
    let texts: Vec<&str> = array.rows[0].iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["1", "2", "4", "5", "8"]);
    assert!(array.rows[0].iter().all(|c| !c.selected && !c.patched));

    let View::Chart(chart) = pane(&layout, "chart") else {
        panic!("expected chart pane");
    };
    let values: Vec<Option<f64>> = chart.bars.iter().map(|b| b.value).collect();
    assert_eq!(
        values,
        vec![Some(1.0), Some(2.0), Some(4.0), Some(5.0), Some(8.0)]
    );

    let View::Log(log) = pane(&layout, "log") else {
        panic!("expected log pane");
    };
    assert!(log.text.starts_with("compare 5 and 1\n"));
    assert!(log.text.ends_with("sorted\n"));
}

/// Test that the chart mirrors highlights while a swap is in progress
#[test]
fn test_chart_mirrors_patches_mid_swap() {
    let mut engine = ReplayEngine::new(0);
    engine.load(chunk_commands(bubble_sort(&[2, 1])));

    // setup, compare, swap, trailing
    assert_eq!(engine.chunk_count(), 4);
    engine.seek(3).unwrap();
    assert_eq!(engine.line_indicator(), Some(6));

    let layout = root_layout(&engine);
    let View::Chart(chart) = pane(&layout, "chart") else {
        panic!("expected chart pane");
    };
    assert_eq!(chart.bars[0].state, CellState::Patched);
    assert_eq!(chart.bars[0].label, "1");
    assert_eq!(chart.bars[1].label, "2");
}

/// Test that stepping forward and seeking agree at every cursor
#[test]
fn test_incremental_steps_match_seeks() {
    let chunks = chunk_commands(bubble_sort(&[3, 9, 1, 7, 2, 6]));

    let mut stepper = ReplayEngine::new(0);
    stepper.load(chunks.clone());
    let mut seeker = ReplayEngine::new(0);
    seeker.load(chunks.clone());

    for cursor in 1..=chunks.len() {
        stepper.step_forward().unwrap();
        seeker.seek(cursor).unwrap();
        assert_eq!(
            stepper.registry().snapshot(),
            seeker.registry().snapshot(),
            "diverged at cursor {cursor}"
        );
        assert_eq!(stepper.line_indicator(), seeker.line_indicator());
    }
}

/// Test that checkpointed seeks land on the same state as full rebuilds
#[test]
fn test_checkpointed_seeks_match_full_rebuilds() {
    let chunks = chunk_commands(bubble_sort(&[8, 3, 5, 1, 9, 2, 7]));
    let count = chunks.len();

    let mut plain = ReplayEngine::new(0);
    plain.load(chunks.clone());
    let mut checkpointed = ReplayEngine::new(5);
    checkpointed.load(chunks);
    checkpointed.seek(count).unwrap();
    assert_eq!(checkpointed.checkpoints().len(), count / 5);

    let mut targets: Vec<usize> = (1..=count).rev().step_by(3).collect();
    targets.extend([1, count / 2, count]);
    for target in targets {
        plain.seek(target).unwrap();
        checkpointed.seek(target).unwrap();
        assert_eq!(
            plain.registry().snapshot(),
            checkpointed.registry().snapshot(),
            "mismatch at cursor {target}"
        );
    }
}

/// Test that resizing a layout changes shares until the next rebuild
#[test]
fn test_resize_changes_pane_shares() {
    let mut engine = ReplayEngine::new(0);
    engine.load(chunk_commands(bubble_sort(&[2, 1])));
    engine.move_to(1).unwrap();

    let shares: Vec<f64> = root_layout(&engine).panes.iter().map(|p| p.share).collect();
    for share in &shares {
        assert!((share - 1.0 / 3.0).abs() < 1e-9);
    }

    engine.resize("layout", vec![2.0, 1.0, 1.0]).unwrap();
    let shares: Vec<f64> = root_layout(&engine).panes.iter().map(|p| p.share).collect();
    assert_eq!(shares, vec![0.5, 0.25, 0.25]);

    engine.move_to(2).unwrap();
    assert_eq!(root_layout(&engine).panes[0].share, 0.5);

    engine.seek(2).unwrap();
    assert!((root_layout(&engine).panes[0].share - 1.0 / 3.0).abs() < 1e-9);
}

/// Test that a tree walk lays out by depth and logs each visit
#[test]
fn test_tree_walk_layout_and_log() {
    let mut engine = ReplayEngine::new(0);
    engine.load(chunk_commands(tree_walk()));
    let count = engine.chunk_count();
    assert_eq!(count, 6);

    engine.seek(1).unwrap();
    let layout = root_layout(&engine);
    assert!(layout.horizontal);
    let View::Graph(graph) = pane(&layout, "graph") else {
        panic!("expected graph pane");
    };
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.edges.len(), 3);
    let node = |id: i64| {
        graph
            .nodes
            .iter()
            .find(|n| n.id == id)
            .unwrap_or_else(|| panic!("no node {id}"))
    };
    assert!(node(0).x.abs() < 1e-9);
    assert!(node(0).y < node(1).y);
    assert_eq!(node(1).y, node(2).y);
    assert!(node(1).y < node(3).y);

    engine.seek(count).unwrap();
    let layout = root_layout(&engine);
    let View::Log(log) = pane(&layout, "log") else {
        panic!("expected log pane");
    };
    assert_eq!(log.text, " -> 0\n0 -> 1\n1 -> 3\n0 -> 2\n");

    let View::Graph(graph) = pane(&layout, "graph") else {
        panic!("expected graph pane");
    };
    assert!(graph.nodes.iter().all(|n| n.visited_count == 1));
    assert!(graph.edges.iter().all(|e| e.visited_count == 1));
}
