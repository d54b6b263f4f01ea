use std::time::Duration;

use sketchtimer_lib::{
    db::{Database, RunStatus},
    player::{Frame, PlayerController, PlayerEvent, PlayerStatus},
};
use tempfile::{tempdir, TempDir};
use tokio::time::sleep;

fn controller() -> (TempDir, Database, PlayerController) {
    let dir = tempdir().unwrap();
    let db = Database::new(dir.path().join("player.sqlite3")).unwrap();
    let controller = PlayerController::new(db.clone(), 2);
    (dir, db, controller)
}

fn images(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("/refs/pose-{i}.png")).collect()
}

fn image_index(frame: &Frame) -> Option<usize> {
    match frame {
        Frame::Image { index, .. } => Some(*index),
        Frame::Break => None,
    }
}

// Half-second offsets keep the test clock away from tick deadlines.
async fn run_for(secs: u64) {
    sleep(Duration::from_millis(secs * 1000 + 500)).await;
}

#[tokio::test(start_paused = true)]
async fn ticker_walks_the_schedule_once_per_second() {
    let (_dir, _db, controller) = controller();
    let begun = controller
        .begin_session(images(2), "2x3sec + 1x2sec break", false, "test".into())
        .await
        .unwrap();
    assert_eq!(begun.status, PlayerStatus::Idle);
    assert_eq!(begun.remaining_secs, 3);

    controller.start().await.unwrap();
    run_for(1).await;
    let snapshot = controller.snapshot().await.unwrap();
    assert_eq!(snapshot.remaining_secs, 2);
    assert_eq!(image_index(&snapshot.frame), Some(0));

    sleep(Duration::from_secs(2)).await;
    let snapshot = controller.snapshot().await.unwrap();
    assert_eq!(image_index(&snapshot.frame), Some(1));
    assert_eq!(snapshot.remaining_secs, 3);

    sleep(Duration::from_secs(3)).await;
    let snapshot = controller.snapshot().await.unwrap();
    assert_eq!(snapshot.frame, Frame::Break);
    assert_eq!(snapshot.remaining_secs, 2);
    assert!(snapshot.cue_active);
    assert_eq!(snapshot.elapsed_secs, 6);

    sleep(Duration::from_secs(2)).await;
    let snapshot = controller.snapshot().await.unwrap();
    assert_eq!(image_index(&snapshot.frame), Some(0));
    assert!(!snapshot.can_go_back);
}

#[tokio::test(start_paused = true)]
async fn pause_freezes_the_countdown() {
    let (_dir, db, controller) = controller();
    controller
        .begin_fixed(images(3), 10, false, "test".into())
        .await
        .unwrap();

    controller.start().await.unwrap();
    run_for(4).await;
    let paused = controller.pause().await.unwrap();
    assert_eq!(paused.status, PlayerStatus::Paused);
    assert_eq!(paused.remaining_secs, 6);

    sleep(Duration::from_secs(30)).await;
    let snapshot = controller.snapshot().await.unwrap();
    assert_eq!(snapshot.remaining_secs, 6);
    assert_eq!(snapshot.elapsed_secs, 4);

    // Pausing persists progress.
    let runs = db.list_practice_runs(10, 0).await.unwrap();
    assert_eq!(runs[0].active_secs, 4);
    assert_eq!(runs[0].status, RunStatus::Running);

    controller.start().await.unwrap();
    run_for(6).await;
    let snapshot = controller.snapshot().await.unwrap();
    assert_eq!(image_index(&snapshot.frame), Some(1));
    assert_eq!(snapshot.remaining_secs, 10);
}

#[tokio::test(start_paused = true)]
async fn events_follow_state_changes_and_ticks() {
    let (_dir, _db, controller) = controller();
    let mut events = controller.subscribe();

    controller
        .begin_session(images(1), "1x2sec", false, "test".into())
        .await
        .unwrap();
    controller.start().await.unwrap();

    match events.recv().await.unwrap() {
        PlayerEvent::StateChanged(snapshot) => assert_eq!(snapshot.status, PlayerStatus::Idle),
        other => panic!("unexpected event {other:?}"),
    }
    match events.recv().await.unwrap() {
        PlayerEvent::StateChanged(snapshot) => assert_eq!(snapshot.status, PlayerStatus::Running),
        other => panic!("unexpected event {other:?}"),
    }

    let tick = events.recv().await.unwrap();
    assert!(matches!(tick, PlayerEvent::Tick(_)));
    assert_eq!(tick.snapshot().remaining_secs, 1);

    // Reaching zero emits the tick and the step change.
    assert!(matches!(events.recv().await.unwrap(), PlayerEvent::Tick(_)));
    let advanced = events.recv().await.unwrap();
    assert!(matches!(advanced, PlayerEvent::StateChanged(_)));
    assert_eq!(advanced.snapshot().remaining_secs, 2);

    let ended = controller.end().await.unwrap();
    loop {
        match events.recv().await.unwrap() {
            PlayerEvent::Ended(snapshot) => {
                assert_eq!(snapshot.status, PlayerStatus::Ended);
                assert_eq!(snapshot.elapsed_secs, ended.elapsed_secs);
                break;
            }
            PlayerEvent::Tick(_) | PlayerEvent::StateChanged(_) => continue,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn end_is_idempotent_and_closes_the_run() {
    let (_dir, db, controller) = controller();
    controller
        .begin_session(images(3), "1x5sec + 1x5sec break", false, "Figures".into())
        .await
        .unwrap();
    controller.start().await.unwrap();
    run_for(7).await;

    let ended = controller.end().await.unwrap();
    assert_eq!(ended.status, PlayerStatus::Ended);
    assert_eq!(ended.elapsed_secs, 7);
    assert!(!ended.can_go_back);

    sleep(Duration::from_secs(10)).await;
    let again = controller.end().await.unwrap();
    assert_eq!(again.status, PlayerStatus::Ended);
    assert_eq!(again.elapsed_secs, 7);

    let skipped = controller.skip_forward().await.unwrap();
    assert_eq!(skipped.segment_index, ended.segment_index);
    assert!(controller.start().await.unwrap().status == PlayerStatus::Ended);

    let runs = db.list_practice_runs(10, 0).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Completed);
    assert_eq!(runs[0].active_secs, 7);
    assert_eq!(runs[0].source, "Figures");
    assert_eq!(runs[0].duration_text, "1x5sec + 1x5sec break");
    assert!(runs[0].stopped_at.is_some());
}

#[tokio::test]
async fn navigation_maps_onto_the_player() {
    let (_dir, _db, controller) = controller();
    assert!(controller.skip_forward().await.is_err());
    assert!(controller.snapshot().await.is_none());

    controller
        .begin_session(images(3), "1x30sec + 1x1min break", false, "test".into())
        .await
        .unwrap();

    let forward = controller.skip_forward().await.unwrap();
    assert_eq!(forward.frame, Frame::Break);
    assert_eq!(forward.clock, "01:00");

    let forward = controller.skip_forward().await.unwrap();
    assert_eq!(image_index(&forward.frame), Some(1));

    let back = controller.skip_backward().await.unwrap();
    assert_eq!(back.frame, Frame::Break);
    let back = controller.skip_backward().await.unwrap();
    assert_eq!(image_index(&back.frame), Some(0));
    assert!(!back.can_go_back);

    let reset = controller.reset_timer().await.unwrap();
    assert_eq!(reset.remaining_secs, 30);

    let shuffled = controller.set_shuffle(true).await.unwrap();
    assert!(shuffled.shuffle);
}

#[tokio::test]
async fn beginning_again_completes_the_previous_run() {
    let (_dir, db, controller) = controller();
    controller
        .begin_fixed(images(2), 20, false, "first".into())
        .await
        .unwrap();
    controller
        .begin_session(images(2), "Warmup: 2x1min", true, "second".into())
        .await
        .unwrap();

    let runs = db.list_practice_runs(10, 0).await.unwrap();
    assert_eq!(runs.len(), 2);
    let first = runs.iter().find(|run| run.source == "first").unwrap();
    let second = runs.iter().find(|run| run.source == "second").unwrap();
    assert_eq!(first.status, RunStatus::Completed);
    assert_eq!(second.status, RunStatus::Running);
    assert_eq!(second.duration_text, "2x1min");

    assert!(controller
        .begin_session(Vec::new(), "1x30sec", false, "empty".into())
        .await
        .is_err());
    assert!(controller
        .begin_session(images(1), "3xsoon", false, "bad".into())
        .await
        .is_err());
}
