//! Game Bible validation and indexing.
//!
//! A bible arrives wholesale from the Storyforge service and is immutable
//! for the lifetime of a playthrough. Before a session accepts one, it is
//! checked structurally: every cross-reference must resolve and the task
//! requirement graph must be acyclic. A bible that fails any check is
//! rejected in full; the session never partially loads a world.

use std::collections::HashMap;
use storyforge::{Character, GameBible, Task};
use thiserror::Error;

/// Structural problems that make a bible unplayable.
#[derive(Debug, Error)]
pub enum BibleError {
    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("Duplicate character id: {0}")]
    DuplicateCharacter(String),

    #[error("Task {task} is assigned to unknown character {character}")]
    UnknownAssignee { task: String, character: String },

    #[error("Task {task} requires unknown task {requirement}")]
    UnknownRequirement { task: String, requirement: String },

    #[error("Task {task} unlocks unknown task {unlocked}")]
    UnknownUnlock { task: String, unlocked: String },

    #[error("Act {act} references unknown task {task}")]
    UnknownActTask { act: u32, task: String },

    #[error("Act {act} references unknown location {location}")]
    UnknownActLocation { act: u32, location: String },

    #[error("Location {location} lists unknown character {character}")]
    UnknownResident { location: String, character: String },

    #[error("Task requirement cycle involving {0}; the task can never unlock")]
    RequirementCycle(String),
}

/// Validate a bible before it is allowed to back a session.
///
/// Checks, in order: id uniqueness, `assigned_npc` references,
/// `requires`/`unlocks` references, act task/location references,
/// `npcs_present` references, and acyclicity of the `requires` graph.
/// A cycle would leave every task on it locked forever, so it is rejected
/// at load time rather than discovered as an unwinnable game.
pub fn validate(bible: &GameBible) -> Result<(), BibleError> {
    let mut task_ids: HashMap<&str, ()> = HashMap::new();
    for task in &bible.tasks {
        if task_ids.insert(task.id.as_str(), ()).is_some() {
            return Err(BibleError::DuplicateTask(task.id.clone()));
        }
    }

    let mut character_ids: HashMap<&str, ()> = HashMap::new();
    for character in &bible.characters {
        if character_ids.insert(character.id.as_str(), ()).is_some() {
            return Err(BibleError::DuplicateCharacter(character.id.clone()));
        }
    }

    let location_ids: HashMap<&str, ()> = bible
        .locations
        .iter()
        .map(|l| (l.id.as_str(), ()))
        .collect();

    for task in &bible.tasks {
        if let Some(ref npc) = task.assigned_npc {
            if !character_ids.contains_key(npc.as_str()) {
                return Err(BibleError::UnknownAssignee {
                    task: task.id.clone(),
                    character: npc.clone(),
                });
            }
        }
        for requirement in &task.requires {
            if !task_ids.contains_key(requirement.as_str()) {
                return Err(BibleError::UnknownRequirement {
                    task: task.id.clone(),
                    requirement: requirement.clone(),
                });
            }
        }
        for unlocked in &task.unlocks {
            if !task_ids.contains_key(unlocked.as_str()) {
                return Err(BibleError::UnknownUnlock {
                    task: task.id.clone(),
                    unlocked: unlocked.clone(),
                });
            }
        }
    }

    for act in &bible.story_graph.acts {
        for task_id in &act.tasks_in_act {
            if !task_ids.contains_key(task_id.as_str()) {
                return Err(BibleError::UnknownActTask {
                    act: act.act_number,
                    task: task_id.clone(),
                });
            }
        }
        if !location_ids.contains_key(act.location_id.as_str()) {
            return Err(BibleError::UnknownActLocation {
                act: act.act_number,
                location: act.location_id.clone(),
            });
        }
    }

    for location in &bible.locations {
        for resident in &location.npcs_present {
            if !character_ids.contains_key(resident.as_str()) {
                return Err(BibleError::UnknownResident {
                    location: location.id.clone(),
                    character: resident.clone(),
                });
            }
        }
    }

    check_requirement_cycles(bible)?;

    log::debug!(
        "validated bible '{}': {} characters, {} tasks, {} locations",
        bible.world.title,
        bible.characters.len(),
        bible.tasks.len(),
        bible.locations.len()
    );
    Ok(())
}

/// Three-color depth-first search over the `requires` edges.
fn check_requirement_cycles(bible: &GameBible) -> Result<(), BibleError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    let by_id: HashMap<&str, &Task> = bible.tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut marks: HashMap<&str, Mark> = HashMap::new();

    fn visit<'a>(
        id: &'a str,
        by_id: &HashMap<&'a str, &'a Task>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> Result<(), BibleError> {
        match marks.get(id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => return Err(BibleError::RequirementCycle(id.to_string())),
            None => {}
        }
        marks.insert(id, Mark::InProgress);
        if let Some(task) = by_id.get(id) {
            for requirement in &task.requires {
                visit(requirement.as_str(), by_id, marks)?;
            }
        }
        marks.insert(id, Mark::Done);
        Ok(())
    }

    for task in &bible.tasks {
        visit(task.id.as_str(), &by_id, &mut marks)?;
    }
    Ok(())
}

/// Id-keyed lookup over an already validated bible.
///
/// Built fresh wherever resolution needs it; construction is one pass over
/// the task and character lists.
pub struct BibleIndex<'a> {
    tasks: HashMap<&'a str, &'a Task>,
    characters: HashMap<&'a str, &'a Character>,
}

impl<'a> BibleIndex<'a> {
    pub fn new(bible: &'a GameBible) -> Self {
        Self {
            tasks: bible.tasks.iter().map(|t| (t.id.as_str(), t)).collect(),
            characters: bible
                .characters
                .iter()
                .map(|c| (c.id.as_str(), c))
                .collect(),
        }
    }

    pub fn task(&self, id: &str) -> Option<&'a Task> {
        self.tasks.get(id).copied()
    }

    pub fn character(&self, id: &str) -> Option<&'a Character> {
        self.characters.get(id).copied()
    }

    /// Title of a task, falling back to the raw id when the id is unknown.
    /// Blocked-task enrichment uses this so a dangling reference degrades
    /// to something readable instead of failing the turn.
    pub fn task_title(&self, id: &str) -> String {
        self.tasks
            .get(id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| id.to_string())
    }
}
