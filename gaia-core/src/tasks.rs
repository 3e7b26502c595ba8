//! Task resolution: which tasks a character can advance, and the
//! auto-completion cascade for free-standing tasks.
//!
//! Everything here is a pure function over `(bible, completed-set)`; the
//! store calls [`sweep_auto_completions`] inside its completion transaction
//! so observers always see a fully cascaded set.

use crate::bible::BibleIndex;
use std::collections::BTreeSet;
use storyforge::{Act, GameBible, Task};

/// A task a character gates that is still locked, with the titles of its
/// unmet prerequisites resolved for the dialogue context.
#[derive(Debug, Clone)]
pub struct BlockedTask {
    pub task: Task,
    pub missing: Vec<String>,
}

/// Partition of a character's incomplete assigned tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskResolution {
    /// Prerequisites met; completable through dialogue right now.
    pub active: Vec<Task>,
    /// At least one prerequisite unmet.
    pub blocked: Vec<BlockedTask>,
}

impl TaskResolution {
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.blocked.is_empty()
    }
}

fn requirements_met(task: &Task, completed: &BTreeSet<String>) -> bool {
    task.requires.iter().all(|id| completed.contains(id))
}

/// Partition the tasks assigned to `character_id` into active and blocked.
///
/// Tasks appear in bible order in both lists. Blocked tasks carry the
/// titles of their unmet prerequisites, falling back to the raw id for a
/// dangling reference.
pub fn resolve_for_character(
    bible: &GameBible,
    completed: &BTreeSet<String>,
    character_id: &str,
) -> TaskResolution {
    let index = BibleIndex::new(bible);
    let mut resolution = TaskResolution::default();

    for task in &bible.tasks {
        if task.assigned_npc.as_deref() != Some(character_id) || completed.contains(&task.id) {
            continue;
        }
        if requirements_met(task, completed) {
            resolution.active.push(task.clone());
        } else {
            let missing = task
                .requires
                .iter()
                .filter(|id| !completed.contains(*id))
                .map(|id| index.task_title(id))
                .collect();
            resolution.blocked.push(BlockedTask {
                task: task.clone(),
                missing,
            });
        }
    }

    resolution
}

/// True iff the character has at least one assigned task and every one of
/// them is completed. A character with no assigned tasks is never "done";
/// that would dismiss characters who simply have nothing to gate.
pub fn all_tasks_done_for(
    bible: &GameBible,
    completed: &BTreeSet<String>,
    character_id: &str,
) -> bool {
    let mut any = false;
    for task in &bible.tasks {
        if task.assigned_npc.as_deref() == Some(character_id) {
            any = true;
            if !completed.contains(&task.id) {
                return false;
            }
        }
    }
    any
}

/// Complete every free-standing task whose prerequisites are satisfied,
/// iterating until no task changes state in a pass.
///
/// A task auto-completes only when it has no assigned character and its
/// type is outside the persuasion family; persuading someone always takes
/// a dialogue turn, even if the task data forgot to assign the NPC. One
/// completion can unlock another, so passes repeat to a fixed point; the
/// requirement graph is acyclic, so the task count bounds the pass count.
///
/// Returns the newly completed ids in the order they completed.
pub fn sweep_auto_completions(bible: &GameBible, completed: &mut BTreeSet<String>) -> Vec<String> {
    let mut newly = Vec::new();

    for _pass in 0..bible.tasks.len() {
        let mut changed = false;
        for task in &bible.tasks {
            if completed.contains(&task.id)
                || task.assigned_npc.is_some()
                || task.task_type.is_persuasion()
            {
                continue;
            }
            if requirements_met(task, completed) {
                completed.insert(task.id.clone());
                newly.push(task.id.clone());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    if !newly.is_empty() {
        log::debug!("auto-completed {} task(s): {:?}", newly.len(), newly);
    }
    newly
}

/// Whether every task grouped under the act is completed.
pub fn act_tasks_complete(bible: &GameBible, completed: &BTreeSet<String>, act_number: u32) -> bool {
    bible
        .story_graph
        .acts
        .iter()
        .find(|act| act.act_number == act_number)
        .map(|act| act.tasks_in_act.iter().all(|id| completed.contains(id)))
        .unwrap_or(false)
}

/// The first act whose tasks are not all complete; `None` once the whole
/// story graph is finished. The presentation layer uses this for act-intro
/// gating.
pub fn current_act<'a>(bible: &'a GameBible, completed: &BTreeSet<String>) -> Option<&'a Act> {
    bible
        .story_graph
        .acts
        .iter()
        .find(|act| !act.tasks_in_act.iter().all(|id| completed.contains(id)))
}
