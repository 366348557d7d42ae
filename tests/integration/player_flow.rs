//! Integration tests for the player task
//!
//! Builds traces through real backends and drives playback on a paused
//! tokio clock.

use std::sync::Arc;
use std::time::Duration;

use super::common::fixtures::TraceDir;
use super::common::traces::bubble_sort;
use stepviz::backend::{JsonBackend, MarkdownBackend, MockBackend};
use stepviz::player::PlayerConfig;
use stepviz::{
    BackendRegistry, PlayerHandle, PlayerState, PlayerTask, PlayerUpdate, SourceFile,
    TraceError, View,
};
use tokio::sync::mpsc;

fn registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register("json", Arc::new(JsonBackend));
    registry.register("md", Arc::new(MarkdownBackend));
    registry
}

fn spawn_player(backends: BackendRegistry) -> (PlayerHandle, mpsc::UnboundedReceiver<PlayerUpdate>) {
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let config = PlayerConfig {
        base_interval: Duration::from_millis(500),
        speed: 1.0,
        checkpoint_interval: 4,
    };
    (PlayerTask::spawn(config, backends, update_tx), update_rx)
}

/// Collect updates until `state` is reported
async fn collect_until(
    rx: &mut mpsc::UnboundedReceiver<PlayerUpdate>,
    state: PlayerState,
) -> Vec<PlayerUpdate> {
    let mut seen = Vec::new();
    while let Some(update) = rx.recv().await {
        let done = update == PlayerUpdate::State(state);
        seen.push(update);
        if done {
            return seen;
        }
    }
    panic!("update channel closed before {state:?}");
}

fn cursors(updates: &[PlayerUpdate]) -> Vec<usize> {
    updates
        .iter()
        .filter_map(|u| match u {
            PlayerUpdate::Cursor { cursor, .. } => Some(*cursor),
            _ => None,
        })
        .collect()
}

/// Test that a json trace file plays from the first step to the last
#[tokio::test(start_paused = true)]
async fn test_json_trace_plays_to_the_end() {
    let dir = TraceDir::new();
    let path = dir.write_trace("bubble.json", &bubble_sort(&[3, 1, 2]));
    let source = SourceFile::read(&path).await.unwrap();
    assert_eq!(source.name, "bubble.json");

    let (player, mut rx) = spawn_player(registry());
    player.build(source);
    collect_until(&mut rx, PlayerState::Paused).await;
    let snapshot = player.snapshot().await.unwrap();
    assert_eq!(snapshot.cursor, 1);
    let count = snapshot.chunk_count;

    player.play();
    collect_until(&mut rx, PlayerState::Playing).await;
    let updates = collect_until(&mut rx, PlayerState::Paused).await;
    assert_eq!(cursors(&updates), (2..=count).collect::<Vec<_>>());
    assert!(!updates.iter().any(|u| matches!(u, PlayerUpdate::Error(_))));

    let snapshot = player.snapshot().await.unwrap();
    assert_eq!(snapshot.cursor, count);
    assert_eq!(snapshot.line, None);
    assert!(matches!(snapshot.root, Some(View::Layout(_))));
    player.shutdown();
}

/// Test that pausing stops the timer and play resumes from the cursor
#[tokio::test(start_paused = true)]
async fn test_pause_and_resume() {
    let dir = TraceDir::new();
    let path = dir.write_trace("bubble.json", &bubble_sort(&[4, 3, 2, 1]));
    let (player, mut rx) = spawn_player(registry());
    player.build(SourceFile::read(&path).await.unwrap());
    collect_until(&mut rx, PlayerState::Paused).await;

    player.play();
    collect_until(&mut rx, PlayerState::Playing).await;
    // Interval at speed 1 is 500ms / e, about 184ms.
    tokio::time::sleep(Duration::from_millis(400)).await;
    player.pause();
    collect_until(&mut rx, PlayerState::Paused).await;
    let paused_at = player.snapshot().await.unwrap().cursor;
    assert_eq!(paused_at, 3);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(player.snapshot().await.unwrap().cursor, paused_at);

    player.play();
    collect_until(&mut rx, PlayerState::Playing).await;
    let updates = collect_until(&mut rx, PlayerState::Paused).await;
    assert_eq!(cursors(&updates).first(), Some(&(paused_at + 1)));
}

/// Test that seeking and resizing go through the handle
#[tokio::test(start_paused = true)]
async fn test_seek_and_resize_through_handle() {
    let dir = TraceDir::new();
    let path = dir.write_trace("bubble.json", &bubble_sort(&[2, 1]));
    let (player, mut rx) = spawn_player(registry());
    player.build(SourceFile::read(&path).await.unwrap());
    collect_until(&mut rx, PlayerState::Paused).await;

    assert!(player.seek(1.0).await);
    assert_eq!(player.snapshot().await.unwrap().cursor, 4);

    player.resize("layout", vec![1.0, 0.0, 1.0]).await.unwrap();
    let Some(View::Layout(layout)) = player.snapshot().await.unwrap().root else {
        panic!("expected layout root");
    };
    assert_eq!(layout.panes[1].share, 0.0);

    let err = player.resize("layout", vec![1.0]).await.unwrap_err();
    assert!(matches!(err, TraceError::Index(_)));
}

/// Test that a markdown document becomes a single-step trace
#[tokio::test(start_paused = true)]
async fn test_markdown_document() {
    let (player, mut rx) = spawn_player(registry());
    player.open("readme");
    player.build(SourceFile::new("README.md", "# Bubble sort\n\nSwap until sorted."));
    collect_until(&mut rx, PlayerState::Paused).await;

    let snapshot = player.snapshot().await.unwrap();
    assert_eq!(snapshot.chunk_count, 1);
    let Some(View::Markdown(view)) = snapshot.root else {
        panic!("expected markdown root");
    };
    assert_eq!(view.title, "Markdown");
    assert!(view.text.starts_with("# Bubble sort"));
}

/// Test that backend errors surface once and leave the player idle
#[tokio::test(start_paused = true)]
async fn test_build_error_leaves_player_idle() {
    let mut backends = registry();
    backends.register(
        "js",
        Arc::new(MockBackend::new().failing(TraceError::build("SyntaxError: Unexpected token"))),
    );
    let (player, mut rx) = spawn_player(backends);

    player.build(SourceFile::new("broken.js", "for ("));
    let updates = collect_until(&mut rx, PlayerState::Idle).await;
    let errors: Vec<&PlayerUpdate> = updates
        .iter()
        .filter(|u| matches!(u, PlayerUpdate::Error(_)))
        .collect();
    assert_eq!(
        errors,
        vec![&PlayerUpdate::Error(
            "Build failed: SyntaxError: Unexpected token".into()
        )]
    );

    player.play();
    let snapshot = player.snapshot().await.unwrap();
    assert_eq!(snapshot.state, PlayerState::Idle);
    assert_eq!(snapshot.chunk_count, 0);
}

/// Test that reset cancels an in-flight build without an error
#[tokio::test(start_paused = true)]
async fn test_reset_cancels_build_silently() {
    let slow = MockBackend::new()
        .with_commands(bubble_sort(&[2, 1]))
        .with_delay(Duration::from_secs(30));
    let mut backends = registry();
    backends.register("slow", Arc::new(slow.clone()));
    let (player, mut rx) = spawn_player(backends);

    player.build(SourceFile::new("a.slow", ""));
    collect_until(&mut rx, PlayerState::Building).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    player.reset();
    collect_until(&mut rx, PlayerState::Idle).await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    let snapshot = player.snapshot().await.unwrap();
    assert_eq!(snapshot.state, PlayerState::Idle);
    assert_eq!(snapshot.chunk_count, 0);
    assert_eq!(slow.call_count(), 1);
    while let Ok(update) = rx.try_recv() {
        assert!(!matches!(update, PlayerUpdate::Error(_)));
    }
}
