//! The seam between the engine and the rendering layer.
//!
//! Two FIFO channels with enumerated, typed events on both directions:
//! player intents flow in, state updates flow out. Sends never block and
//! never fail visibly; a departed peer just stops draining its queue.
//!
//! Ordering guarantee: events published during a synchronous completion
//! cascade are enqueued only after the cascade has converged, so a consumer
//! never observes a half-swept completed-set. Canned dismiss/refuse turns
//! are published through the same queue, which is what defers them to a
//! later tick than the intent that triggered them.

use crate::dialogue::TurnOutcome;
use std::collections::BTreeSet;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Raw player intents from the rendering layer.
#[derive(Debug, Clone)]
pub enum PlayerIntent {
    /// The player walked up to a character and pressed interact.
    Interact { character_id: String },
    /// The player picked a dialogue choice.
    Choose {
        character_id: String,
        choice_index: usize,
        choice_text: String,
    },
}

/// State updates pushed out to the rendering layer.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// A new world finished loading; all prior state is gone.
    WorldLoaded { generation: Uuid },
    /// A dialogue turn was applied (or synthesized locally).
    DialogueTurn(TurnOutcome),
    /// An in-flight dialogue failed; nothing was mutated. Recoverable.
    DialogueAborted,
    /// The completed-task set grew; carries the full set for act gating.
    CompletedTasksChanged { completed: BTreeSet<String> },
}

/// Engine-side endpoint: drains intents, publishes events.
#[derive(Debug)]
pub struct Bridge {
    intents: mpsc::UnboundedReceiver<PlayerIntent>,
    events: mpsc::UnboundedSender<GameEvent>,
}

/// Rendering-side endpoint: sends intents, drains events.
#[derive(Debug)]
pub struct PresentationHandle {
    intents: mpsc::UnboundedSender<PlayerIntent>,
    events: mpsc::UnboundedReceiver<GameEvent>,
}

impl Bridge {
    /// Create a connected bridge/presentation pair.
    pub fn channel() -> (Bridge, PresentationHandle) {
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            Bridge {
                intents: intent_rx,
                events: event_tx,
            },
            PresentationHandle {
                intents: intent_tx,
                events: event_rx,
            },
        )
    }

    /// Publish an event. If the presentation side is gone the event is
    /// dropped; the engine keeps running headless.
    pub fn publish(&self, event: GameEvent) {
        if self.events.send(event).is_err() {
            log::debug!("no presentation attached; event dropped");
        }
    }

    /// Next queued intent, if any. Non-blocking.
    pub fn try_next_intent(&mut self) -> Option<PlayerIntent> {
        self.intents.try_recv().ok()
    }

    /// Wait for the next intent; `None` when the presentation side is gone.
    pub async fn next_intent(&mut self) -> Option<PlayerIntent> {
        self.intents.recv().await
    }
}

impl PresentationHandle {
    /// Send a player intent. Dropped silently if the engine is gone.
    pub fn send_intent(&self, intent: PlayerIntent) {
        let _ = self.intents.send(intent);
    }

    /// Next queued event, if any. Non-blocking; call once per frame.
    pub fn try_recv_event(&mut self) -> Option<GameEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the next event; `None` when the engine is gone.
    pub async fn recv_event(&mut self) -> Option<GameEvent> {
        self.events.recv().await
    }
}
