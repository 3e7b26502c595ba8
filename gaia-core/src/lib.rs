//! Narrative progression engine for Open Gaia.
//!
//! Open Gaia is a story RPG whose worlds are generated by the external
//! Storyforge service: a Game Bible (world, characters, tasks, locations,
//! acts) is produced from a text premise, and NPC dialogue turns are
//! brokered to a language model. This crate is the part with real
//! invariants: the task dependency and completion engine and the NPC
//! trust-and-dialogue state machine that drive story progression.
//!
//! This crate provides:
//! - Structural validation of a loaded Game Bible
//! - The per-playthrough progression store (completed tasks, NPC trust)
//! - Task resolution (active/blocked partition, auto-completion cascade)
//! - The dialogue turn controller (routing, canned turns, applying results)
//! - A typed event bridge toward the rendering layer
//! - Playthrough persistence and a scripted test harness
//!
//! Rendering, sprite movement, and map generation live in the UI shell
//! that consumes this crate; they are not represented here.
//!
//! # Quick Start
//!
//! ```ignore
//! use gaia_core::{Bridge, GameSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (bridge, mut presentation) = Bridge::channel();
//!     let mut session = GameSession::new(SessionConfig::new(), bridge);
//!
//!     session
//!         .generate_world(
//!             "A salvage diver finds an abandoned deep-sea station.",
//!             "Expose the corporation before the tribunal convenes.",
//!         )
//!         .await?;
//!
//!     session.interact("wren_ai").await?;
//!     while let Some(event) = presentation.try_recv_event() {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod bible;
pub mod bridge;
pub mod dialogue;
pub mod persist;
pub mod progress;
pub mod session;
pub mod tasks;
pub mod testing;

// Primary public API
pub use bible::{validate, BibleError, BibleIndex};
pub use bridge::{Bridge, GameEvent, PlayerIntent, PresentationHandle};
pub use dialogue::{DialogueController, Routing, TurnOutcome};
pub use persist::SavedPlaythrough;
pub use progress::{GamePhase, NpcPatch, NpcState, ProgressionStore, Speaker};
pub use session::{GameSession, SessionConfig, SessionError};
pub use tasks::{
    all_tasks_done_for, resolve_for_character, sweep_auto_completions, BlockedTask,
    TaskResolution,
};
pub use testing::{MockNpc, TestHarness};
