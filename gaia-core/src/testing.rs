//! Testing utilities for the progression engine.
//!
//! This module provides tools for integration testing:
//! - `MockNpc` for deterministic dialogue turns without a backend
//! - `TestHarness` for scripted playthrough scenarios
//! - A compact sample world and assertion helpers
//!
//! The harness drives the same routing and apply paths the real session
//! uses; only the service call is replaced by the script.

use crate::dialogue::{self, DialogueController, Routing, TurnOutcome};
use crate::progress::ProgressionStore;
use crate::tasks;
use std::collections::HashMap;
use storyforge::{
    Act, Character, DialogueResponse, DialogueTree, GameBible, Location, MovementProfile, Role,
    StoryGraph, Task, TaskType, WorldInfo,
};

// ============================================================================
// Fixture builders
// ============================================================================

/// Build a character with the opaque text fields filled in tersely.
pub fn character(id: &str, name: &str, role: Role, trust_threshold: u8) -> Character {
    Character {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name}, a figure in the deep-sea story"),
        visual_description: String::new(),
        role,
        motivation: format!("{name} wants the ocean protected"),
        personality_traits: vec!["guarded".to_string(), "principled".to_string()],
        relationship_to_player: "unknown".to_string(),
        convincing_triggers: vec![format!("show {name} real evidence")],
        trust_threshold,
        movement_style: String::new(),
        sprite_prompt: String::new(),
        portrait_prompt: String::new(),
        dialogue_tree: DialogueTree {
            greeting: format!("{name}: state your business."),
            cooperative: format!("{name} softens a little."),
            resistant: format!("{name}: come back when you have done your part."),
            convinced: format!("{name}: we are done here. Good luck out there."),
        },
    }
}

/// Build a task. `requires` are task ids; `unlocks` is left for the caller
/// to fill when a scenario needs it.
pub fn task(
    id: &str,
    title: &str,
    task_type: TaskType,
    assigned_npc: Option<&str>,
    requires: &[&str],
) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("{title}."),
        task_type,
        assigned_npc: assigned_npc.map(str::to_string),
        unlocks: Vec::new(),
        requires: requires.iter().map(|s| s.to_string()).collect(),
        blocking: true,
        completion_condition: format!("{title} is achieved"),
        reward: String::new(),
    }
}

fn location(id: &str, name: &str, npcs_present: &[&str], connected_to: &[&str]) -> Location {
    Location {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        terrain_type: String::new(),
        background_prompt: String::new(),
        tile_map_prompt: String::new(),
        movement_profile: MovementProfile::default(),
        npcs_present: npcs_present.iter().map(|s| s.to_string()).collect(),
        npc_spawn_slots: HashMap::new(),
        player_spawn: "player_start".to_string(),
        connected_to: connected_to.iter().map(|s| s.to_string()).collect(),
    }
}

fn act(act_number: u32, title: &str, tasks_in_act: &[&str], location_id: &str) -> Act {
    Act {
        act_number,
        title: title.to_string(),
        description: String::new(),
        tasks_in_act: tasks_in_act.iter().map(|s| s.to_string()).collect(),
        location_id: location_id.to_string(),
    }
}

/// A compact valid world: the deep-sea whistleblower story, with every
/// task type and the full prerequisite chain represented.
pub fn sample_bible() -> GameBible {
    let mut convince_wren = task(
        "task_convince_wren",
        "Convince WREN to Release the Data",
        TaskType::AiPersuasion,
        Some("wren_ai"),
        &[],
    );
    convince_wren.unlocks = vec!["task_retrieve_data".to_string()];

    let mut retrieve_data = task(
        "task_retrieve_data",
        "Retrieve the Uncorrupted Data",
        TaskType::DataRetrieval,
        None,
        &["task_convince_wren"],
    );
    retrieve_data.unlocks = vec!["task_convince_tomas".to_string()];

    let mut convince_tomas = task(
        "task_convince_tomas",
        "Convince Tomás to Guide You",
        TaskType::Persuasion,
        Some("tomas_fisherman"),
        &["task_retrieve_data"],
    );
    convince_tomas.unlocks = vec!["task_reach_okafor".to_string()];

    let mut reach_okafor = task(
        "task_reach_okafor",
        "Reach Dr. Okafor's Island",
        TaskType::Navigation,
        Some("tomas_fisherman"),
        &["task_convince_tomas"],
    );
    reach_okafor.unlocks = vec!["task_convince_okafor".to_string()];

    let mut convince_okafor = task(
        "task_convince_okafor",
        "Convince Dr. Okafor to Co-Sign",
        TaskType::EmotionalPersuasion,
        Some("dr_okafor"),
        &["task_reach_okafor"],
    );
    convince_okafor.unlocks = vec!["task_transmit_data".to_string()];

    let transmit_data = task(
        "task_transmit_data",
        "Transmit Data to the Tribunal",
        TaskType::TimedActionSequence,
        None,
        &["task_convince_okafor"],
    );

    GameBible {
        world: WorldInfo {
            title: "Echoes of the Deep".to_string(),
            setting: "An abandoned research station hides evidence of illegal sonic drilling."
                .to_string(),
            end_goal: "Deliver the uncorrupted data to the tribunal.".to_string(),
            tone: "tense underwater thriller".to_string(),
            time_of_day: None,
            weather: None,
        },
        characters: vec![
            character("zara_diver", "Zara", Role::Protagonist, 0),
            character("dr_okafor", "Dr. Okafor", Role::Npc, 70),
            character("tomas_fisherman", "Tomás", Role::Ally, 60),
            character("wren_ai", "WREN", Role::Npc, 75),
        ],
        tasks: vec![
            convince_wren,
            retrieve_data,
            convince_tomas,
            reach_okafor,
            convince_okafor,
            transmit_data,
        ],
        story_graph: StoryGraph {
            opening_scene: "Dive lights cut through the dark of the station.".to_string(),
            acts: vec![
                act(
                    1,
                    "The Abandoned Station",
                    &["task_convince_wren", "task_retrieve_data"],
                    "loc_research_station",
                ),
                act(
                    2,
                    "The Journey to Okafor",
                    &["task_convince_tomas", "task_reach_okafor"],
                    "loc_ocean_route",
                ),
                act(
                    3,
                    "The Final Transmission",
                    &["task_convince_okafor", "task_transmit_data"],
                    "loc_okafor_island",
                ),
            ],
            ending_scene: "The transmission completes.".to_string(),
        },
        locations: vec![
            location(
                "loc_research_station",
                "Abandoned Research Station",
                &["wren_ai"],
                &["loc_ocean_route"],
            ),
            location(
                "loc_ocean_route",
                "Ocean Route",
                &["tomas_fisherman"],
                &["loc_research_station", "loc_okafor_island"],
            ),
            location(
                "loc_okafor_island",
                "Dr. Okafor's Island",
                &["dr_okafor"],
                &["loc_ocean_route"],
            ),
        ],
    }
}

/// A minimal successful dialogue response. Tests adjust fields as needed.
pub fn scripted_response(narration: &str, new_trust_level: i32) -> DialogueResponse {
    DialogueResponse {
        npc_response: narration.to_string(),
        emotion: "neutral".to_string(),
        trust_delta: 0,
        new_trust_level,
        is_convinced: false,
        player_choices: Vec::new(),
        completed_task_id: None,
        blocked: false,
        blocked_reason: None,
    }
}

// ============================================================================
// Mock dialogue service
// ============================================================================

/// A mock NPC dialogue service that returns scripted responses in order.
///
/// Use this for deterministic tests without a backend.
pub struct MockNpc {
    responses: Vec<DialogueResponse>,
    response_index: usize,
    calls: usize,
}

impl MockNpc {
    pub fn new(responses: Vec<DialogueResponse>) -> Self {
        Self {
            responses,
            response_index: 0,
            calls: 0,
        }
    }

    /// Queue another scripted response.
    pub fn queue_response(&mut self, response: DialogueResponse) {
        self.responses.push(response);
    }

    /// The next scripted response; `None` when the script is exhausted.
    pub fn next_response(&mut self) -> Option<DialogueResponse> {
        self.calls += 1;
        let response = self.responses.get(self.response_index).cloned();
        if response.is_some() {
            self.response_index += 1;
        }
        response
    }

    /// How many turns reached the service (canned turns never do).
    pub fn calls(&self) -> usize {
        self.calls
    }
}

// ============================================================================
// Test harness
// ============================================================================

/// Harness for running scripted playthrough scenarios against the real
/// routing, resolution, and apply logic.
pub struct TestHarness {
    pub bible: GameBible,
    pub store: ProgressionStore,
    pub npc: MockNpc,
    controller: DialogueController,
}

impl TestHarness {
    /// Harness over the sample world with an empty script.
    pub fn new() -> Self {
        Self::with_bible(sample_bible())
    }

    pub fn with_bible(bible: GameBible) -> Self {
        let mut store = ProgressionStore::new();
        store.reset_for_world(&bible);
        Self {
            bible,
            store,
            npc: MockNpc::new(Vec::new()),
            controller: DialogueController::new(),
        }
    }

    /// Queue a plain narrative response at the given trust level.
    pub fn expect_narration(&mut self, text: &str, new_trust_level: i32) -> &mut Self {
        self.npc.queue_response(scripted_response(text, new_trust_level));
        self
    }

    /// Queue a fully specified response.
    pub fn expect_response(&mut self, response: DialogueResponse) -> &mut Self {
        self.npc.queue_response(response);
        self
    }

    /// Walk up to a character and interact.
    pub fn interact(&mut self, character_id: &str) -> TurnOutcome {
        self.run(character_id, None, "")
    }

    /// Pick a dialogue choice.
    pub fn choose(&mut self, character_id: &str, index: usize, text: &str) -> TurnOutcome {
        self.run(character_id, Some(index), text)
    }

    fn run(&mut self, character_id: &str, choice_index: Option<usize>, text: &str) -> TurnOutcome {
        let routing = dialogue::route(&self.bible, &self.store, character_id, choice_index, text)
            .expect("routing failed");
        match routing {
            Routing::Dismiss(outcome) | Routing::Refuse(outcome) => outcome,
            Routing::CallService(_request) => {
                assert!(self.controller.begin(), "turn already in flight");
                let response = self.npc.next_response().unwrap_or_else(|| {
                    let trust = self
                        .store
                        .npc(character_id)
                        .map(|s| s.trust_level)
                        .unwrap_or(0);
                    scripted_response("They have nothing more to say.", i32::from(trust))
                });
                let outcome = dialogue::apply_response(
                    &self.bible,
                    &mut self.store,
                    character_id,
                    text,
                    response,
                )
                .expect("apply failed");
                self.controller.finish();
                outcome
            }
        }
    }

    /// Complete a task directly, as a dialogue response carrying its id
    /// would. Returns everything newly completed, cascade included.
    pub fn complete(&mut self, task_id: &str) -> Vec<String> {
        self.store.complete_task(&self.bible, task_id)
    }

    pub fn trust(&self, character_id: &str) -> u8 {
        self.store
            .npc(character_id)
            .map(|s| s.trust_level)
            .unwrap_or(0)
    }

    pub fn history_len(&self, character_id: &str) -> usize {
        self.store
            .npc(character_id)
            .map(|s| s.history.len())
            .unwrap_or(0)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert a task is in the completed set.
#[track_caller]
pub fn assert_completed(harness: &TestHarness, task_id: &str) {
    assert!(
        harness.store.is_completed(task_id),
        "Expected task '{task_id}' to be completed"
    );
}

/// Assert a task is NOT in the completed set.
#[track_caller]
pub fn assert_not_completed(harness: &TestHarness, task_id: &str) {
    assert!(
        !harness.store.is_completed(task_id),
        "Expected task '{task_id}' to NOT be completed"
    );
}

/// Assert a character's active task ids, in order.
#[track_caller]
pub fn assert_active(harness: &TestHarness, character_id: &str, expected: &[&str]) {
    let resolution =
        tasks::resolve_for_character(&harness.bible, harness.store.completed(), character_id);
    let actual: Vec<&str> = resolution.active.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(
        actual, expected,
        "Active tasks for '{character_id}' did not match"
    );
}

/// Assert a character's blocked task ids, in order.
#[track_caller]
pub fn assert_blocked(harness: &TestHarness, character_id: &str, expected: &[&str]) {
    let resolution =
        tasks::resolve_for_character(&harness.bible, harness.store.completed(), character_id);
    let actual: Vec<&str> = resolution
        .blocked
        .iter()
        .map(|b| b.task.id.as_str())
        .collect();
    assert_eq!(
        actual, expected,
        "Blocked tasks for '{character_id}' did not match"
    );
}

/// Assert a character's trust level.
#[track_caller]
pub fn assert_trust(harness: &TestHarness, character_id: &str, expected: u8) {
    let actual = harness.trust(character_id);
    assert_eq!(
        actual, expected,
        "Expected trust {expected} for '{character_id}', got {actual}"
    );
}
