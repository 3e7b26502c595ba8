//! Minimal client for the Storyforge backend.
//!
//! Storyforge is the external service that turns a free-text story premise
//! into a Game Bible (world, characters, tasks, story graph, locations) and
//! brokers NPC dialogue turns to a language model. This crate provides a
//! focused client for that API with:
//! - World generation from a premise and end goal
//! - Bible listing and retrieval
//! - NPC dialogue turns carrying character profile, trust, history, and
//!   task context
//!
//! The bible and dialogue types in this crate mirror the service's JSON
//! wire format exactly; interpretation of that data (task resolution, trust
//! state, progression) lives in `gaia-core`.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const BASE_URL_ENV: &str = "STORYFORGE_URL";

/// Errors that can occur when talking to the Storyforge API.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Storyforge API client.
#[derive(Clone)]
pub struct Storyforge {
    client: reqwest::Client,
    base_url: String,
}

impl Storyforge {
    /// Create a new client against the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
        }
    }

    /// Create a client from the `STORYFORGE_URL` environment variable,
    /// falling back to the local development server.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Generate a new Game Bible from a story premise and end goal.
    ///
    /// World generation is the slowest endpoint by far; the client-wide
    /// 120 second timeout exists for this call.
    pub async fn generate_world(
        &self,
        request: GenerateWorldRequest,
    ) -> Result<GenerateWorldResponse, Error> {
        self.post_json("/generate-world", &request).await
    }

    /// List previously generated bibles.
    pub async fn bibles(&self) -> Result<BibleList, Error> {
        self.get_json("/bibles").await
    }

    /// Fetch a specific bible by id.
    pub async fn bible(&self, id: &str) -> Result<GenerateWorldResponse, Error> {
        self.get_json(&format!("/bibles/{id}")).await
    }

    /// Run one NPC dialogue turn.
    pub async fn npc_dialogue(&self, request: DialogueRequest) -> Result<DialogueResponse, Error> {
        self.post_json("/npc-dialogue", &request).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .headers(Self::headers())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Self::parse_response(response).await
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .headers(Self::headers())
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Self::parse_response(response).await
    }

    async fn parse_response<T>(response: reqwest::Response) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        response.json().await.map_err(|e| Error::Parse(e.to_string()))
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

// ============================================================================
// Game Bible wire schema
// ============================================================================

/// The complete generated world description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameBible {
    pub world: WorldInfo,
    pub characters: Vec<Character>,
    pub tasks: Vec<Task>,
    pub story_graph: StoryGraph,
    pub locations: Vec<Location>,
}

/// Top-level world summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldInfo {
    pub title: String,
    pub setting: String,
    pub end_goal: String,
    /// Free text; the generator does not stay inside a fixed vocabulary.
    pub tone: String,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub weather: Option<String>,
}

/// Narrative role of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Protagonist,
    Npc,
    Ally,
    Antagonist,
}

impl Role {
    pub fn is_protagonist(&self) -> bool {
        matches!(self, Role::Protagonist)
    }
}

/// Static fallback lines for a character, keyed by disposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueTree {
    pub greeting: String,
    pub cooperative: String,
    pub resistant: String,
    pub convinced: String,
}

/// A character in the generated world.
///
/// Most text fields are opaque to the engine; they are passed through to
/// the dialogue service verbatim. Only `id`, `role`, `trust_threshold`, and
/// `dialogue_tree` are interpreted client-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visual_description: String,
    pub role: Role,
    pub motivation: String,
    pub personality_traits: Vec<String>,
    pub relationship_to_player: String,
    pub convincing_triggers: Vec<String>,
    /// The convincing bar, 0-100.
    pub trust_threshold: u8,
    #[serde(default)]
    pub movement_style: String,
    #[serde(default)]
    pub sprite_prompt: String,
    #[serde(default)]
    pub portrait_prompt: String,
    pub dialogue_tree: DialogueTree,
}

/// Kind of task. Only the persuasion family requires a dialogue turn with
/// the assigned character to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "persuasion")]
    Persuasion,
    #[serde(rename = "emotional persuasion")]
    EmotionalPersuasion,
    #[serde(rename = "AI persuasion")]
    AiPersuasion,
    #[serde(rename = "data retrieval")]
    DataRetrieval,
    #[serde(rename = "navigation")]
    Navigation,
    #[serde(rename = "timed action sequence")]
    TimedActionSequence,
}

impl TaskType {
    /// Whether this type can only be completed through NPC dialogue.
    pub fn is_persuasion(&self) -> bool {
        matches!(
            self,
            TaskType::Persuasion | TaskType::EmotionalPersuasion | TaskType::AiPersuasion
        )
    }
}

/// A quest/objective unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Character gating completion; `None` means the task is free-standing.
    pub assigned_npc: Option<String>,
    #[serde(default)]
    pub unlocks: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    /// Narrative-only annotation; the engine carries it but never gates on it.
    pub blocking: bool,
    /// Human-readable; evaluated by the dialogue service, not the engine.
    pub completion_condition: String,
    #[serde(default)]
    pub reward: String,
}

/// Narrative structure: ordered acts between an opening and an ending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryGraph {
    pub opening_scene: String,
    pub acts: Vec<Act>,
    pub ending_scene: String,
}

/// A narrative act grouping tasks at one location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Act {
    pub act_number: u32,
    pub title: String,
    pub description: String,
    pub tasks_in_act: Vec<String>,
    pub location_id: String,
}

/// Presentation hints for moving through a location. Carried opaquely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementProfile {
    #[serde(default)]
    pub speed: f32,
    #[serde(default)]
    pub friction: f32,
    #[serde(default)]
    pub camera_shake: bool,
    #[serde(default)]
    pub ambient_sound: String,
    #[serde(default)]
    pub step_sound: String,
}

/// A location in the generated world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub terrain_type: String,
    #[serde(default)]
    pub background_prompt: String,
    #[serde(default)]
    pub tile_map_prompt: String,
    #[serde(default)]
    pub movement_profile: MovementProfile,
    #[serde(default)]
    pub npcs_present: Vec<String>,
    #[serde(default)]
    pub npc_spawn_slots: HashMap<String, String>,
    #[serde(default)]
    pub player_spawn: String,
    #[serde(default)]
    pub connected_to: Vec<String>,
}

// ============================================================================
// World generation endpoint types
// ============================================================================

/// Request body for `POST /generate-world`.
///
/// The UI enforces minimum lengths (premise >= 10, goal >= 5) before this
/// request is ever built; the client passes text through untouched.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateWorldRequest {
    pub story: String,
    pub end_goal: String,
}

impl GenerateWorldRequest {
    pub fn new(story: impl Into<String>, end_goal: impl Into<String>) -> Self {
        Self {
            story: story.into(),
            end_goal: end_goal.into(),
        }
    }
}

/// Response from `POST /generate-world` and `GET /bibles/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateWorldResponse {
    pub game_bible: GameBible,
}

/// One entry from `GET /bibles`.
#[derive(Debug, Clone, Deserialize)]
pub struct BibleSummary {
    pub id: String,
    pub title: String,
    pub setting: String,
    pub tone: String,
    pub end_goal: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response from `GET /bibles`.
#[derive(Debug, Clone, Deserialize)]
pub struct BibleList {
    pub bibles: Vec<BibleSummary>,
}

// ============================================================================
// NPC dialogue endpoint types
// ============================================================================

/// Who spoke a line of recorded conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogueRole {
    User,
    Assistant,
}

/// One line of conversation history, as the service expects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueMessage {
    pub role: DialogueRole,
    pub content: String,
}

impl DialogueMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: DialogueRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: DialogueRole::Assistant,
            content: content.into(),
        }
    }
}

/// Task context attached to a dialogue request: the tasks this character
/// could advance right now.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveTaskContext {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub completion_condition: String,
}

/// Task context for tasks this character gates but which are still locked.
/// `missing_titles` names the unmet prerequisites so the NPC can refuse
/// in-fiction.
#[derive(Debug, Clone, Serialize)]
pub struct BlockedTaskContext {
    pub id: String,
    pub title: String,
    pub missing_titles: Vec<String>,
}

/// Request body for `POST /npc-dialogue`. The character profile is sent
/// flattened, field by field, exactly as the service expects it.
#[derive(Debug, Clone, Serialize)]
pub struct DialogueRequest {
    pub character_id: String,
    pub character_name: String,
    pub description: String,
    pub personality_traits: Vec<String>,
    pub motivation: String,
    pub relationship_to_player: String,
    pub convincing_triggers: Vec<String>,
    pub trust_level: u8,
    pub trust_threshold: u8,
    pub dialogue_tree: DialogueTree,
    pub player_choice_index: Option<usize>,
    pub player_choice_text: String,
    pub conversation_history: Vec<DialogueMessage>,
    pub active_tasks: Vec<ActiveTaskContext>,
    pub blocked_tasks: Vec<BlockedTaskContext>,
}

impl DialogueRequest {
    /// Build a request for the opening exchange with a character: no choice
    /// made yet, empty history.
    pub fn opening(character: &Character) -> Self {
        Self {
            character_id: character.id.clone(),
            character_name: character.name.clone(),
            description: character.description.clone(),
            personality_traits: character.personality_traits.clone(),
            motivation: character.motivation.clone(),
            relationship_to_player: character.relationship_to_player.clone(),
            convincing_triggers: character.convincing_triggers.clone(),
            trust_level: 0,
            trust_threshold: character.trust_threshold,
            dialogue_tree: character.dialogue_tree.clone(),
            player_choice_index: None,
            player_choice_text: String::new(),
            conversation_history: Vec::new(),
            active_tasks: Vec::new(),
            blocked_tasks: Vec::new(),
        }
    }

    pub fn with_trust(mut self, trust_level: u8) -> Self {
        self.trust_level = trust_level;
        self
    }

    pub fn with_choice(mut self, index: usize, text: impl Into<String>) -> Self {
        self.player_choice_index = Some(index);
        self.player_choice_text = text.into();
        self
    }

    pub fn with_history(mut self, history: Vec<DialogueMessage>) -> Self {
        self.conversation_history = history;
        self
    }

    pub fn with_task_context(
        mut self,
        active: Vec<ActiveTaskContext>,
        blocked: Vec<BlockedTaskContext>,
    ) -> Self {
        self.active_tasks = active;
        self.blocked_tasks = blocked;
        self
    }
}

/// A follow-up choice offered to the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerChoice {
    pub index: usize,
    pub text: String,
    /// UI color cue only; never used for logic.
    #[serde(default)]
    pub trust_hint: Option<i32>,
}

/// Response from `POST /npc-dialogue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueResponse {
    pub npc_response: String,
    /// Free-form emotion tag, used only for presentation.
    pub emotion: String,
    /// Informational; `new_trust_level` is the authoritative value.
    pub trust_delta: i32,
    pub new_trust_level: i32,
    #[serde(default)]
    pub is_convinced: bool,
    #[serde(default)]
    pub player_choices: Vec<PlayerChoice>,
    #[serde(default)]
    pub completed_task_id: Option<String>,
    /// Set on client-side-only refusals.
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub blocked_reason: Option<String>,
}
