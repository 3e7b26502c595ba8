//! The dialogue turn controller.
//!
//! One player-initiated exchange moves through
//! `IDLE -> ROUTING -> {AUTO_DISMISS | AUTO_REFUSE | AWAITING_RESPONSE -> APPLYING} -> IDLE`.
//! Routing and applying are pure synchronous functions here; the session
//! facade owns the one genuine suspension point (the service call) and the
//! [`DialogueController`] busy flag that keeps a single turn in flight.
//!
//! Dismiss and refuse turns are synthesized locally from the character's
//! fallback lines and never reach the service. The session publishes them
//! through the bridge queue, so the presentation layer observes them on a
//! later tick than the triggering intent; delivering them synchronously
//! races the scene update that detected the interaction.

use crate::bible::BibleIndex;
use crate::progress::{ConversationEntry, NpcPatch, ProgressionStore};
use crate::tasks::{self, TaskResolution};
use storyforge::{
    ActiveTaskContext, BlockedTaskContext, DialogueRequest, DialogueResponse, GameBible,
    PlayerChoice,
};
use thiserror::Error;

/// Errors from routing or applying a dialogue turn.
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("Unknown character: {0}")]
    UnknownCharacter(String),
}

/// The applied result of one dialogue turn, enriched with character
/// identity and task context for the presentation layer.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub character_id: String,
    pub character_name: String,
    pub narration: String,
    /// Free-form emotion tag, presentation only.
    pub emotion: String,
    pub trust_level: u8,
    pub is_convinced: bool,
    /// Follow-up choices for the player; empty on canned turns.
    pub choices: Vec<PlayerChoice>,
    /// Set on refusals (local or service-side).
    pub blocked: bool,
    pub blocked_reason: Option<String>,
    /// The character's task partition after this turn was applied.
    pub resolution: TaskResolution,
    /// Task ids completed by this turn, cascade included.
    pub completed_now: Vec<String>,
}

/// What routing decided for an interaction attempt.
#[derive(Debug)]
pub enum Routing {
    /// Everything this character gates is done; canned send-off, no call.
    Dismiss(TurnOutcome),
    /// Only locked tasks remain; canned refusal with the blocked list, no call.
    Refuse(TurnOutcome),
    /// A real exchange: call the service with this request.
    CallService(DialogueRequest),
}

/// Decide what an interaction with `character_id` becomes.
///
/// Synchronous and side-effect free. The protagonist never receives canned
/// dismissals or refusals; talking to yourself always routes to the
/// service.
pub fn route(
    bible: &GameBible,
    store: &ProgressionStore,
    character_id: &str,
    choice_index: Option<usize>,
    choice_text: &str,
) -> Result<Routing, DialogueError> {
    let index = BibleIndex::new(bible);
    let character = index
        .character(character_id)
        .ok_or_else(|| DialogueError::UnknownCharacter(character_id.to_string()))?;

    let resolution = tasks::resolve_for_character(bible, store.completed(), character_id);
    let state = store.npc(character_id).cloned().unwrap_or_default();
    let is_protagonist = character.role.is_protagonist();

    if !is_protagonist && tasks::all_tasks_done_for(bible, store.completed(), character_id) {
        return Ok(Routing::Dismiss(TurnOutcome {
            character_id: character.id.clone(),
            character_name: character.name.clone(),
            narration: character.dialogue_tree.convinced.clone(),
            emotion: "cooperative".to_string(),
            trust_level: state.trust_level,
            is_convinced: true,
            choices: Vec::new(),
            blocked: false,
            blocked_reason: None,
            resolution,
            completed_now: Vec::new(),
        }));
    }

    if !is_protagonist && resolution.active.is_empty() && !resolution.blocked.is_empty() {
        let reason = resolution
            .blocked
            .first()
            .map(|b| format!("{} still needs: {}", b.task.title, b.missing.join(", ")));
        return Ok(Routing::Refuse(TurnOutcome {
            character_id: character.id.clone(),
            character_name: character.name.clone(),
            narration: character.dialogue_tree.resistant.clone(),
            emotion: "wary".to_string(),
            trust_level: state.trust_level,
            is_convinced: state.is_convinced,
            choices: Vec::new(),
            blocked: true,
            blocked_reason: reason,
            resolution,
            completed_now: Vec::new(),
        }));
    }

    let active = resolution
        .active
        .iter()
        .map(|t| ActiveTaskContext {
            id: t.id.clone(),
            title: t.title.clone(),
            description: t.description.clone(),
            task_type: t.task_type,
            completion_condition: t.completion_condition.clone(),
        })
        .collect();
    let blocked = resolution
        .blocked
        .iter()
        .map(|b| BlockedTaskContext {
            id: b.task.id.clone(),
            title: b.task.title.clone(),
            missing_titles: b.missing.clone(),
        })
        .collect();

    let mut request = DialogueRequest::opening(character)
        .with_trust(state.trust_level)
        .with_history(state.wire_history())
        .with_task_context(active, blocked);
    if let Some(choice_index) = choice_index {
        request = request.with_choice(choice_index, choice_text);
    }

    Ok(Routing::CallService(request))
}

/// Apply a successful service response to the store and build the outcome.
///
/// Appends the exchange to the character's history, overwrites trust with
/// the authoritative absolute value (clamped to 0-100), and runs the
/// completion cascade for a carried `completed_task_id`. The cascade
/// settles inside this call, so the next interaction's routing reads a
/// fully converged completed-set.
pub fn apply_response(
    bible: &GameBible,
    store: &mut ProgressionStore,
    character_id: &str,
    choice_text: &str,
    response: DialogueResponse,
) -> Result<TurnOutcome, DialogueError> {
    let (character_id, character_name) = {
        let index = BibleIndex::new(bible);
        let character = index
            .character(character_id)
            .ok_or_else(|| DialogueError::UnknownCharacter(character_id.to_string()))?;
        (character.id.clone(), character.name.clone())
    };

    if !choice_text.is_empty() {
        store.push_history(&character_id, ConversationEntry::player(choice_text));
    }
    store.push_history(&character_id, ConversationEntry::npc(&response.npc_response));

    let trust_level = response.new_trust_level.clamp(0, 100) as u8;
    store.update_npc(
        &character_id,
        NpcPatch {
            trust_level: Some(trust_level),
            is_convinced: Some(response.is_convinced),
            ..Default::default()
        },
    );

    let completed_now = match response.completed_task_id.as_deref() {
        Some(task_id) => store.complete_task(bible, task_id),
        None => Vec::new(),
    };

    let resolution = tasks::resolve_for_character(bible, store.completed(), &character_id);

    Ok(TurnOutcome {
        character_id,
        character_name,
        narration: response.npc_response,
        emotion: response.emotion,
        trust_level,
        is_convinced: response.is_convinced,
        choices: response.player_choices,
        blocked: response.blocked,
        blocked_reason: response.blocked_reason,
        resolution,
        completed_now,
    })
}

/// Busy flag for the one-turn-at-a-time discipline.
///
/// This is a UI-paced, single-player system: while a turn is awaiting the
/// service, new interaction triggers are rejected rather than queued.
#[derive(Debug, Default)]
pub struct DialogueController {
    in_flight: bool,
}

impl DialogueController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        !self.in_flight
    }

    /// Claim the in-flight slot. Returns `false` if a turn is already
    /// awaiting a response.
    pub fn begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Release the in-flight slot, success or failure.
    pub fn finish(&mut self) {
        self.in_flight = false;
    }
}
