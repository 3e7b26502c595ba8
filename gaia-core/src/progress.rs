//! Per-playthrough mutable state.
//!
//! `ProgressionStore` is the sole mutable source of truth for a session:
//! the monotonically growing completed-task set, per-character trust and
//! conversation state, and the coarse game phase. Everything else in the
//! engine reads it; only the dialogue controller and the session facade
//! write to it. It is discarded wholesale when a new world loads.

use crate::tasks;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use storyforge::{DialogueMessage, GameBible};
use uuid::Uuid;

/// Coarse lifecycle phase of a playthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    /// Waiting for a story premise.
    Input,
    /// World generation in flight.
    Loading,
    /// A world is loaded and the player is in it.
    Playing,
}

impl Default for GamePhase {
    fn default() -> Self {
        GamePhase::Input
    }
}

/// Who spoke a recorded conversation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Player,
    Npc,
}

/// One line of recorded conversation with a character.
///
/// Stored in the engine's own shape; converted to the service's wire
/// message type only at the client seam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub speaker: Speaker,
    pub content: String,
}

impl ConversationEntry {
    pub fn player(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Player,
            content: content.into(),
        }
    }

    pub fn npc(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Npc,
            content: content.into(),
        }
    }
}

/// Mutable dialogue state for one character.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpcState {
    /// Trust the player has earned, 0-100. The dialogue service returns the
    /// authoritative absolute value each turn; the engine never computes it.
    pub trust_level: u8,
    pub is_convinced: bool,
    pub history: Vec<ConversationEntry>,
}

impl NpcState {
    /// Conversation history in the shape the dialogue service expects.
    pub fn wire_history(&self) -> Vec<DialogueMessage> {
        self.history
            .iter()
            .map(|entry| match entry.speaker {
                Speaker::Player => DialogueMessage::user(&entry.content),
                Speaker::Npc => DialogueMessage::assistant(&entry.content),
            })
            .collect()
    }
}

/// Shallow-merge patch for [`ProgressionStore::update_npc`]. Fields left
/// `None` keep their current value.
#[derive(Debug, Clone, Default)]
pub struct NpcPatch {
    pub trust_level: Option<u8>,
    pub is_convinced: Option<bool>,
    pub history: Option<Vec<ConversationEntry>>,
}

/// All mutable state of one playthrough.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionStore {
    phase: GamePhase,
    completed: BTreeSet<String>,
    npc_states: HashMap<String, NpcState>,
    /// Fences in-flight dialogue calls: bumped on every world load, and a
    /// response is only applied if its captured generation still matches.
    generation: Uuid,
}

impl ProgressionStore {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Input,
            completed: BTreeSet::new(),
            npc_states: HashMap::new(),
            generation: Uuid::new_v4(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: GamePhase) {
        self.phase = phase;
    }

    pub fn generation(&self) -> Uuid {
        self.generation
    }

    /// Give the store a fresh generation without touching progression.
    /// Used after deserializing a saved playthrough so that anything that
    /// was in flight when the save was written can never apply to it.
    pub fn refresh_generation(&mut self) {
        self.generation = Uuid::new_v4();
    }

    /// The completed-task set. Grows monotonically within a playthrough.
    pub fn completed(&self) -> &BTreeSet<String> {
        &self.completed
    }

    pub fn is_completed(&self, task_id: &str) -> bool {
        self.completed.contains(task_id)
    }

    /// Dialogue state for a character, if the character has one yet.
    /// After [`reset_for_world`](Self::reset_for_world) every character in
    /// the bible has an entry, so `None` only happens before the first load
    /// or for ids outside the world.
    pub fn npc(&self, character_id: &str) -> Option<&NpcState> {
        self.npc_states.get(character_id)
    }

    /// Mark a task complete and run the auto-completion sweep to its fixed
    /// point before returning. Insertion is idempotent; completing an
    /// already-completed task is a no-op apart from the (also idempotent)
    /// sweep. Returns every task id newly completed by this call, the
    /// explicit one first, cascade completions after it in bible order.
    pub fn complete_task(&mut self, bible: &GameBible, task_id: &str) -> Vec<String> {
        let mut newly = Vec::new();
        if self.completed.insert(task_id.to_string()) {
            newly.push(task_id.to_string());
        }
        newly.extend(tasks::sweep_auto_completions(bible, &mut self.completed));
        newly
    }

    /// Shallow-merge `patch` into a character's state, creating default
    /// state first if the character has none.
    pub fn update_npc(&mut self, character_id: &str, patch: NpcPatch) {
        let state = self.npc_states.entry(character_id.to_string()).or_default();
        if let Some(trust_level) = patch.trust_level {
            state.trust_level = trust_level;
        }
        if let Some(is_convinced) = patch.is_convinced {
            state.is_convinced = is_convinced;
        }
        if let Some(history) = patch.history {
            state.history = history;
        }
    }

    /// Append one conversation line to a character's history.
    pub fn push_history(&mut self, character_id: &str, entry: ConversationEntry) {
        self.npc_states
            .entry(character_id.to_string())
            .or_default()
            .history
            .push(entry);
    }

    /// Reset for a freshly loaded world: drop all progression, seed a zeroed
    /// state for every character in the bible, and bump the generation so
    /// any still-pending dialogue response from the previous world is
    /// discarded on arrival.
    pub fn reset_for_world(&mut self, bible: &GameBible) {
        self.completed.clear();
        self.npc_states.clear();
        for character in &bible.characters {
            self.npc_states
                .insert(character.id.clone(), NpcState::default());
        }
        self.generation = Uuid::new_v4();
        self.phase = GamePhase::Playing;
    }
}

impl Default for ProgressionStore {
    fn default() -> Self {
        Self::new()
    }
}
