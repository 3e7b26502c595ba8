//! Drive a full scripted playthrough of the sample world, no backend
//! required. Useful for eyeballing the progression flow.
//!
//! Run with: `cargo run -p gaia-core --example scripted_playthrough`

use gaia_core::testing::{sample_bible, scripted_response, TestHarness};

fn main() {
    env_logger::init();

    let bible = sample_bible();
    println!("== {} ==", bible.world.title);
    println!("{}\n", bible.story_graph.opening_scene);

    let mut harness = TestHarness::with_bible(bible);

    // Talking to Tomás too early gets a local refusal.
    let outcome = harness.interact("tomas_fisherman");
    println!("[refused] {}", outcome.narration);
    for blocked in &outcome.resolution.blocked {
        println!("  locked: {} (needs {})", blocked.task.title, blocked.missing.join(", "));
    }

    // Convince WREN; the retrieval task sweeps behind it.
    let mut response = scripted_response("Very well. I will release the data.", 80);
    response.is_convinced = true;
    response.completed_task_id = Some("task_convince_wren".to_string());
    harness.expect_response(response);
    let outcome = harness.interact("wren_ai");
    println!("\n[{}] {}", outcome.character_name, outcome.narration);
    println!("  completed now: {:?}", outcome.completed_now);

    // Tomás now has an active task.
    let mut response = scripted_response("Alright. We do this my way.", 65);
    response.is_convinced = true;
    response.completed_task_id = Some("task_convince_tomas".to_string());
    harness.expect_response(response);
    let outcome = harness.choose("tomas_fisherman", 0, "Look at what they did to your waters.");
    println!("\n[{}] {}", outcome.character_name, outcome.narration);

    let mut response = scripted_response("We made it. There's his hut.", 70);
    response.completed_task_id = Some("task_reach_okafor".to_string());
    harness.expect_response(response);
    harness.interact("tomas_fisherman");

    // Okafor signs; the timed transmission sweeps and the story completes.
    let mut response = scripted_response("For the whales. I'll sign.", 75);
    response.is_convinced = true;
    response.completed_task_id = Some("task_convince_okafor".to_string());
    harness.expect_response(response);
    let outcome = harness.choose("dr_okafor", 1, "Your family will be protected.");
    println!("\n[{}] {}", outcome.character_name, outcome.narration);

    println!(
        "\ncompleted {}/{} tasks",
        harness.store.completed().len(),
        harness.bible.tasks.len()
    );
    println!("{}", harness.bible.story_graph.ending_scene);
}
