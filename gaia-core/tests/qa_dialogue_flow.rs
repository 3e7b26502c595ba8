//! QA tests for the dialogue turn flow.
//!
//! These tests verify routing precedence and turn application:
//! - Done characters dismiss without a service call
//! - Gatekeepers with only locked tasks refuse without a service call
//! - Trust is overwritten with the authoritative value
//! - A full playthrough of the sample world works end to end

use gaia_core::testing::{
    assert_active, assert_completed, assert_trust, scripted_response, TestHarness,
};

fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// DISMISSAL PRECEDENCE
// =============================================================================

#[test]
fn test_done_character_dismisses_without_service_call() {
    setup();
    let mut harness = TestHarness::new();
    harness.complete("task_convince_wren");

    let outcome = harness.interact("wren_ai");

    assert_eq!(harness.npc.calls(), 0, "dismissal must not reach the service");
    assert!(outcome.is_convinced);
    assert!(!outcome.blocked);
    assert!(outcome.choices.is_empty());
    assert_eq!(outcome.narration, "WREN: we are done here. Good luck out there.");
    assert_eq!(outcome.resolution.active.len(), 0);
    assert_eq!(outcome.resolution.blocked.len(), 0);
}

#[test]
fn test_dismissal_leaves_trust_untouched() {
    setup();
    let mut harness = TestHarness::new();
    harness.expect_narration("Fine.", 80);
    harness.interact("wren_ai");
    harness.complete("task_convince_wren");

    let outcome = harness.interact("wren_ai");

    assert_eq!(outcome.trust_level, 80);
    assert_trust(&harness, "wren_ai", 80);
}

// =============================================================================
// REFUSAL PRECEDENCE
// =============================================================================

#[test]
fn test_gatekeeper_with_locked_tasks_refuses() {
    setup();
    let mut harness = TestHarness::new();

    // Tomás gates task_convince_tomas, which requires the (incomplete)
    // data retrieval task.
    let outcome = harness.interact("tomas_fisherman");

    assert_eq!(harness.npc.calls(), 0, "refusal must not reach the service");
    assert!(outcome.blocked);
    assert!(outcome.choices.is_empty());
    assert_eq!(
        outcome.narration,
        "Tomás: come back when you have done your part."
    );
    assert_eq!(
        outcome.resolution.blocked[0].missing,
        vec!["Retrieve the Uncorrupted Data".to_string()]
    );
    // Trust unchanged, nothing recorded against the character.
    assert_trust(&harness, "tomas_fisherman", 0);
    assert_eq!(harness.history_len("tomas_fisherman"), 0);
}

#[test]
fn test_refusal_clears_once_prerequisites_complete() {
    setup();
    let mut harness = TestHarness::new();
    harness.interact("tomas_fisherman");
    assert_eq!(harness.npc.calls(), 0);

    // Completing WREN's task sweeps the retrieval task and unblocks Tomás.
    harness.complete("task_convince_wren");

    harness.expect_narration("Maybe you're different.", 20);
    let outcome = harness.interact("tomas_fisherman");

    assert_eq!(harness.npc.calls(), 1);
    assert!(!outcome.blocked);
    assert_eq!(outcome.trust_level, 20);
}

// =============================================================================
// TURN APPLICATION
// =============================================================================

#[test]
fn test_trust_is_overwritten_not_incremented() {
    setup();
    let mut harness = TestHarness::new();

    harness.expect_narration("Suspicious.", 10);
    harness.interact("wren_ai");
    assert_trust(&harness, "wren_ai", 10);

    // The service reports an absolute 8, not a delta; stored value drops.
    harness.expect_narration("That was the wrong thing to say.", 8);
    harness.choose("wren_ai", 2, "The tribunal demands your data.");
    assert_trust(&harness, "wren_ai", 8);
}

#[test]
fn test_history_grows_user_then_npc() {
    setup();
    let mut harness = TestHarness::new();

    harness.expect_narration("State your business.", 0);
    harness.interact("wren_ai");
    assert_eq!(harness.history_len("wren_ai"), 1);

    harness.expect_narration("Go on.", 12);
    harness.choose("wren_ai", 0, "I want to finish your research.");
    assert_eq!(harness.history_len("wren_ai"), 3);

    let state = harness.store.npc("wren_ai").unwrap();
    assert_eq!(state.history[1].content, "I want to finish your research.");
    assert_eq!(state.history[2].content, "Go on.");
}

#[test]
fn test_response_choices_pass_through() {
    setup();
    let mut harness = TestHarness::new();

    let mut response = scripted_response("Prove it.", 15);
    response.player_choices = vec![
        storyforge::PlayerChoice {
            index: 0,
            text: "I have the migration data.".to_string(),
            trust_hint: Some(18),
        },
        storyforge::PlayerChoice {
            index: 1,
            text: "Trust me.".to_string(),
            trust_hint: Some(-5),
        },
    ];
    harness.expect_response(response);

    let outcome = harness.interact("wren_ai");
    assert_eq!(outcome.choices.len(), 2);
    assert_eq!(outcome.choices[0].trust_hint, Some(18));
}

// =============================================================================
// FULL PLAYTHROUGH
// =============================================================================

#[test]
fn test_full_playthrough_of_sample_world() {
    setup();
    let mut harness = TestHarness::new();

    // Act 1: convince WREN; the retrieval task sweeps behind it.
    let mut wren_done = scripted_response("Very well. I will release the data.", 80);
    wren_done.is_convinced = true;
    wren_done.completed_task_id = Some("task_convince_wren".to_string());
    harness.expect_response(wren_done);
    harness.interact("wren_ai");
    assert_completed(&harness, "task_retrieve_data");

    // Act 2: Tomás agrees to guide, then the crossing completes.
    let mut tomas_done = scripted_response("Alright. We do this my way.", 65);
    tomas_done.is_convinced = true;
    tomas_done.completed_task_id = Some("task_convince_tomas".to_string());
    harness.expect_response(tomas_done);
    harness.choose("tomas_fisherman", 0, "Look at what they did to your waters.");
    assert_active(&harness, "tomas_fisherman", &["task_reach_okafor"]);

    let mut crossing_done = scripted_response("We made it. There's his hut.", 70);
    crossing_done.completed_task_id = Some("task_reach_okafor".to_string());
    harness.expect_response(crossing_done);
    harness.interact("tomas_fisherman");

    // Tomás is now fully done; further interaction dismisses locally.
    let calls_before = harness.npc.calls();
    let outcome = harness.interact("tomas_fisherman");
    assert_eq!(harness.npc.calls(), calls_before);
    assert!(outcome.is_convinced);

    // Act 3: Okafor co-signs; the timed transmission sweeps behind it
    // and the story graph runs out of acts.
    let mut okafor_done = scripted_response("For the whales. I'll sign.", 75);
    okafor_done.is_convinced = true;
    okafor_done.completed_task_id = Some("task_convince_okafor".to_string());
    harness.expect_response(okafor_done);
    harness.choose("dr_okafor", 1, "Your family will be protected.");

    assert_completed(&harness, "task_transmit_data");
    assert_eq!(
        harness.store.completed().len(),
        harness.bible.tasks.len(),
        "every task in the bible should be complete"
    );
    assert!(gaia_core::tasks::current_act(&harness.bible, harness.store.completed()).is_none());
}
