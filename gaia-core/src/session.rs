//! GameSession - the primary public API for a playthrough.
//!
//! A session owns the Storyforge client, the loaded bible, the progression
//! store, and the engine side of the presentation bridge. All mutation
//! flows through it, which keeps the single-writer discipline: resolution
//! and the rendering layer only ever read.

use crate::bible::{self, BibleError};
use crate::bridge::{Bridge, GameEvent, PlayerIntent};
use crate::dialogue::{self, DialogueController, DialogueError, Routing};
use crate::persist::{self, PersistError, SavedPlaythrough};
use crate::progress::{GamePhase, ProgressionStore};
use crate::tasks::{self, TaskResolution};
use std::path::Path;
use storyforge::{Act, BibleSummary, GameBible, GenerateWorldRequest, Storyforge};
use thiserror::Error;

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storyforge error: {0}")]
    Service(#[from] storyforge::Error),

    #[error("Invalid game bible: {0}")]
    Bible(#[from] BibleError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("No world loaded")]
    NoWorld,

    #[error("Unknown character: {0}")]
    UnknownCharacter(String),

    #[error("A dialogue turn is already awaiting a response")]
    Busy,
}

/// Configuration for creating a session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Backend base URL; falls back to `STORYFORGE_URL` / the local default.
    pub base_url: Option<String>,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn build_client(&self) -> Storyforge {
        match &self.base_url {
            Some(url) => Storyforge::new(url.clone()),
            None => Storyforge::from_env(),
        }
    }
}

/// One playthrough of one generated world.
pub struct GameSession {
    client: Storyforge,
    bible: Option<GameBible>,
    store: ProgressionStore,
    controller: DialogueController,
    bridge: Bridge,
}

impl GameSession {
    /// Create a session with no world loaded yet. The matching
    /// [`PresentationHandle`](crate::bridge::PresentationHandle) comes from
    /// [`Bridge::channel`].
    pub fn new(config: SessionConfig, bridge: Bridge) -> Self {
        Self {
            client: config.build_client(),
            bible: None,
            store: ProgressionStore::new(),
            controller: DialogueController::new(),
            bridge,
        }
    }

    // ========================================================================
    // World lifecycle
    // ========================================================================

    /// Generate a fresh world from a premise and end goal, then load it.
    ///
    /// Phase moves Input -> Loading -> Playing; on any failure it returns
    /// to Input and the session keeps whatever world it had before.
    pub async fn generate_world(
        &mut self,
        story: impl Into<String>,
        end_goal: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.store.set_phase(GamePhase::Loading);
        let request = GenerateWorldRequest::new(story, end_goal);
        let response = match self.client.generate_world(request).await {
            Ok(response) => response,
            Err(e) => {
                self.store.set_phase(GamePhase::Input);
                return Err(e.into());
            }
        };
        let result = self.load_bible(response.game_bible);
        if result.is_err() {
            self.store.set_phase(GamePhase::Input);
        }
        result
    }

    /// Fetch a previously generated bible by id and load it.
    pub async fn fetch_bible(&mut self, id: &str) -> Result<(), SessionError> {
        let response = self.client.bible(id).await?;
        self.load_bible(response.game_bible)
    }

    /// List previously generated bibles on the backend.
    pub async fn list_bibles(&self) -> Result<Vec<BibleSummary>, SessionError> {
        Ok(self.client.bibles().await?.bibles)
    }

    /// Replace the session's world wholesale.
    ///
    /// The bible is validated first; a malformed bible fails this load and
    /// nothing else - the previous world and its progression survive
    /// untouched. On success all progression resets, every character gets a
    /// zeroed trust state, and the generation bump orphans any dialogue
    /// response still in flight for the old world.
    pub fn load_bible(&mut self, bible: GameBible) -> Result<(), SessionError> {
        bible::validate(&bible)?;
        self.store.reset_for_world(&bible);
        self.bible = Some(bible);
        self.bridge.publish(GameEvent::WorldLoaded {
            generation: self.store.generation(),
        });
        Ok(())
    }

    // ========================================================================
    // Dialogue turns
    // ========================================================================

    /// The player walked up to `character_id` and pressed interact.
    pub async fn interact(&mut self, character_id: &str) -> Result<(), SessionError> {
        self.run_turn(character_id, None, String::new()).await
    }

    /// The player picked a dialogue choice.
    pub async fn choose(
        &mut self,
        character_id: &str,
        choice_index: usize,
        choice_text: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.run_turn(character_id, Some(choice_index), choice_text.into())
            .await
    }

    /// Drain every queued player intent from the bridge.
    pub async fn pump_intents(&mut self) {
        while let Some(intent) = self.bridge.try_next_intent() {
            if let Err(e) = self.dispatch(intent).await {
                log::warn!("player intent failed: {e}");
            }
        }
    }

    async fn dispatch(&mut self, intent: PlayerIntent) -> Result<(), SessionError> {
        match intent {
            PlayerIntent::Interact { character_id } => self.interact(&character_id).await,
            PlayerIntent::Choose {
                character_id,
                choice_index,
                choice_text,
            } => self.choose(&character_id, choice_index, choice_text).await,
        }
    }

    async fn run_turn(
        &mut self,
        character_id: &str,
        choice_index: Option<usize>,
        choice_text: String,
    ) -> Result<(), SessionError> {
        let bible = self.bible.as_ref().ok_or(SessionError::NoWorld)?;

        let routing =
            match dialogue::route(bible, &self.store, character_id, choice_index, &choice_text) {
                Ok(routing) => routing,
                Err(DialogueError::UnknownCharacter(id)) => {
                    log::warn!("interaction with unknown character '{id}'; aborting");
                    self.bridge.publish(GameEvent::DialogueAborted);
                    return Err(SessionError::UnknownCharacter(id));
                }
            };

        match routing {
            // Canned turns ride the event queue, so the rendering layer
            // observes them on a later tick than the triggering intent.
            Routing::Dismiss(outcome) | Routing::Refuse(outcome) => {
                self.bridge.publish(GameEvent::DialogueTurn(outcome));
                Ok(())
            }
            Routing::CallService(request) => {
                if !self.controller.begin() {
                    return Err(SessionError::Busy);
                }
                let generation = self.store.generation();
                let result = self.client.npc_dialogue(request).await;
                self.controller.finish();

                let response = match result {
                    Ok(response) => response,
                    Err(e) => {
                        log::warn!("dialogue service failure: {e}");
                        self.bridge.publish(GameEvent::DialogueAborted);
                        return Err(e.into());
                    }
                };

                if self.store.generation() != generation {
                    // Expected race after a world swap, not a fault.
                    log::debug!("discarding dialogue response from a previous generation");
                    return Ok(());
                }

                let outcome = match dialogue::apply_response(
                    bible,
                    &mut self.store,
                    character_id,
                    &choice_text,
                    response,
                ) {
                    Ok(outcome) => outcome,
                    Err(DialogueError::UnknownCharacter(id)) => {
                        self.bridge.publish(GameEvent::DialogueAborted);
                        return Err(SessionError::UnknownCharacter(id));
                    }
                };

                let completed_changed = !outcome.completed_now.is_empty();
                self.bridge.publish(GameEvent::DialogueTurn(outcome));
                if completed_changed {
                    self.bridge.publish(GameEvent::CompletedTasksChanged {
                        completed: self.store.completed().clone(),
                    });
                }
                Ok(())
            }
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn bible(&self) -> Option<&GameBible> {
        self.bible.as_ref()
    }

    pub fn store(&self) -> &ProgressionStore {
        &self.store
    }

    pub fn phase(&self) -> GamePhase {
        self.store.phase()
    }

    /// Active/blocked partition for a character against the current state.
    pub fn resolution_for(&self, character_id: &str) -> Result<TaskResolution, SessionError> {
        let bible = self.bible.as_ref().ok_or(SessionError::NoWorld)?;
        Ok(tasks::resolve_for_character(
            bible,
            self.store.completed(),
            character_id,
        ))
    }

    /// The act the story is currently in, for act-intro gating.
    pub fn current_act(&self) -> Option<&Act> {
        self.bible
            .as_ref()
            .and_then(|bible| tasks::current_act(bible, self.store.completed()))
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Save the playthrough (bible + progression) to a file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let bible = self.bible.as_ref().ok_or(SessionError::NoWorld)?;
        let saved = SavedPlaythrough {
            bible: bible.clone(),
            progress: self.store.clone(),
        };
        persist::write(path, &saved).await?;
        Ok(())
    }

    /// Restore a playthrough from a file.
    ///
    /// The saved bible is re-validated and the store re-fenced with a fresh
    /// generation before the session goes live.
    pub async fn load(
        path: impl AsRef<Path>,
        config: SessionConfig,
        bridge: Bridge,
    ) -> Result<Self, SessionError> {
        let saved = persist::read(path).await?;
        bible::validate(&saved.bible)?;

        let mut store = saved.progress;
        store.refresh_generation();
        store.set_phase(GamePhase::Playing);

        let session = Self {
            client: config.build_client(),
            bible: Some(saved.bible),
            store,
            controller: DialogueController::new(),
            bridge,
        };
        session.bridge.publish(GameEvent::WorldLoaded {
            generation: session.store.generation(),
        });
        session.bridge.publish(GameEvent::CompletedTasksChanged {
            completed: session.store.completed().clone(),
        });
        Ok(session)
    }
}
