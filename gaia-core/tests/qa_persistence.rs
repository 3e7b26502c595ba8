//! QA tests for playthrough persistence.
//!
//! A playthrough round-trips through JSON: bible plus progression store.
//! Loading re-validates the bible and re-fences the store so stale
//! in-flight dialogue can never land in the restored state.

use gaia_core::persist::{self, SavedPlaythrough};
use gaia_core::testing::sample_bible;
use gaia_core::{Bridge, GameEvent, GamePhase, GameSession, ProgressionStore, SessionConfig};
use std::path::PathBuf;

fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Unique temp path per test so parallel runs do not collide.
fn temp_save_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("gaia_{}_{}.json", name, std::process::id()));
    path
}

fn offline_config() -> SessionConfig {
    SessionConfig::new().with_base_url("http://localhost:1/api")
}

#[tokio::test]
async fn test_saved_playthrough_round_trip() {
    setup();
    let path = temp_save_path("round_trip");

    let bible = sample_bible();
    let mut progress = ProgressionStore::new();
    progress.reset_for_world(&bible);
    progress.complete_task(&bible, "task_convince_wren");
    let saved_generation = progress.generation();

    persist::write(
        &path,
        &SavedPlaythrough {
            bible,
            progress,
        },
    )
    .await
    .unwrap();

    let restored = persist::read(&path).await.unwrap();
    assert!(restored.progress.is_completed("task_convince_wren"));
    assert!(restored.progress.is_completed("task_retrieve_data"));
    assert_eq!(restored.progress.generation(), saved_generation);

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn test_session_save_and_load() {
    setup();
    let path = temp_save_path("session");

    let (bridge, _presentation) = Bridge::channel();
    let mut session = GameSession::new(offline_config(), bridge);
    session.load_bible(sample_bible()).unwrap();
    let original_generation = session.store().generation();
    session.save(&path).await.unwrap();

    let (bridge, mut presentation) = Bridge::channel();
    let restored = GameSession::load(&path, offline_config(), bridge)
        .await
        .unwrap();

    assert_eq!(restored.phase(), GamePhase::Playing);
    assert_eq!(
        restored.bible().unwrap().world.title,
        "Echoes of the Deep"
    );
    // Every character state survived the round trip.
    let characters = restored.bible().unwrap().characters.clone();
    for character in &characters {
        assert!(restored.store().npc(&character.id).is_some());
    }
    // The restored store is re-fenced: anything in flight at save time
    // belongs to a generation that no longer exists.
    assert_ne!(restored.store().generation(), original_generation);

    // Loading announces the world and the restored completed-set.
    assert!(matches!(
        presentation.try_recv_event(),
        Some(GameEvent::WorldLoaded { .. })
    ));
    assert!(matches!(
        presentation.try_recv_event(),
        Some(GameEvent::CompletedTasksChanged { .. })
    ));

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn test_load_rejects_corrupted_bible() {
    setup();
    let path = temp_save_path("corrupted");

    let mut bible = sample_bible();
    let mut progress = ProgressionStore::new();
    progress.reset_for_world(&bible);
    // Corrupt the saved bible: dangling requirement.
    bible.tasks[0].requires.push("task_missing".to_string());

    persist::write(&path, &SavedPlaythrough { bible, progress })
        .await
        .unwrap();

    let (bridge, _presentation) = Bridge::channel();
    let result = GameSession::load(&path, offline_config(), bridge).await;
    assert!(result.is_err());

    let _ = tokio::fs::remove_file(&path).await;
}

#[tokio::test]
async fn test_load_missing_file_is_an_error() {
    setup();
    let (bridge, _presentation) = Bridge::channel();
    let result = GameSession::load(
        temp_save_path("does_not_exist"),
        offline_config(),
        bridge,
    )
    .await;
    assert!(result.is_err());
}
