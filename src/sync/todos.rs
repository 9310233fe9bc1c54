use chrono::NaiveDate;

use super::Outcome;
use super::board::{Board, created_id};
use super::form::FormPayload;
use super::gateway::{Endpoint, TableType};
use super::wire::{format_date, format_time};
use crate::core::project::{Section, UNSECTIONED};
use crate::core::todo::{Placement, TimeSegment, TimeTaken, Todo, TodoDraft};
use crate::core::validate;
use crate::error::ValidationError;

/// Where a saved todo lands, with its sort inside the target section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub project_id: i64,
    pub section_id: i64,
    pub sort: i64,
}

/// Resolve the requested placement against the current board.
///
/// A section outside the chosen project is dropped. An update that stays in
/// its section keeps its sort; otherwise the todo goes to the end of the
/// section. Unassigned todos always sort 0.
pub fn resolve_slot(
    todos: &[Todo],
    sections: &[Section],
    wanted: Placement,
    previous: Option<&Todo>,
) -> Slot {
    let project_id = wanted.project_id;
    if project_id == 0 {
        return Slot { project_id: 0, section_id: UNSECTIONED, sort: 0 };
    }
    let mut section_id = wanted.section_id;
    if section_id != UNSECTIONED
        && !sections
            .iter()
            .any(|s| s.id == section_id && s.project_id == project_id)
    {
        log::debug!("Section {} is not in project {}, placing unsectioned", section_id, project_id);
        section_id = UNSECTIONED;
    }
    if let Some(prev) = previous {
        if prev.project_id == project_id && prev.section_id == section_id {
            return Slot { project_id, section_id, sort: prev.sort };
        }
    }
    let self_id = previous.map(|p| p.id);
    let siblings = todos
        .iter()
        .filter(|t| t.project_id == project_id && t.section_id == section_id && Some(t.id) != self_id)
        .count();
    Slot { project_id, section_id, sort: siblings as i64 }
}

fn todo_form(draft: &TodoDraft, slot: Slot) -> FormPayload {
    let mut form = FormPayload::new();
    form.push("date", format_date(draft.date))
        .push("time", format_time(draft.time))
        .push("type", draft.kind.as_wire())
        .push("projectId", slot.project_id)
        .push("sectionId", slot.section_id)
        .push("sort", slot.sort)
        .push("content", &draft.content)
        .push("estimated", format_time(draft.estimated))
        .push("completed", u8::from(draft.completed))
        .push("memo", &draft.memo);
    for (i, segment) in draft.time_taken.iter().enumerate() {
        form.push_nested("timeTaken", i, "start", format_time(segment.start))
            .push_nested("timeTaken", i, "end", format_time(segment.end));
    }
    form
}

/// Pair submitted segments with the ids the store returned, by position.
fn confirm_segments(
    segments: &[TimeSegment],
    ids: &[i64],
    todo_id: i64,
    date: NaiveDate,
) -> Vec<TimeTaken> {
    if segments.len() != ids.len() {
        log::warn!(
            "Todo {} sent {} time segments but {} ids came back",
            todo_id,
            segments.len(),
            ids.len()
        );
    }
    segments
        .iter()
        .zip(ids)
        .map(|(segment, id)| segment.confirmed(*id, todo_id, date))
        .collect()
}

impl Board {
    fn slot_for(&self, wanted: Placement, previous: Option<&Todo>) -> Slot {
        let sections = self.sections.snapshot();
        self.todos
            .with(|todos| resolve_slot(todos, &sections, wanted, previous))
    }

    pub async fn create_todo(&self, draft: &TodoDraft) -> Outcome<Todo> {
        if let Err(e) = validate::todo(draft) {
            return Outcome::Invalid(e);
        }
        let slot = self.slot_for(draft.placement, None);
        let form = todo_form(draft, slot).with("action", "save");

        let Some(ack) = self.gateway.send(Endpoint::Todo, form).await else {
            return Outcome::Rejected;
        };
        let Some(id) = created_id(Endpoint::Todo, &ack) else {
            return Outcome::Rejected;
        };

        let todo = Todo::confirmed(id, draft, slot.project_id, slot.section_id, slot.sort);
        let segments = confirm_segments(&draft.time_taken, &ack.time_taken_ids, id, draft.date);
        {
            let mut todos = self.todos.write();
            let mut time_taken = self.time_taken.write();
            todos.push(todo.clone());
            time_taken.extend(segments);
        }
        log::debug!("Created todo {}", id);
        Outcome::Applied(todo)
    }

    /// Replace a todo and its whole set of time segments.
    pub async fn update_todo(&self, id: i64, draft: &TodoDraft) -> Outcome<Todo> {
        if let Err(e) = validate::todo(draft) {
            return Outcome::Invalid(e);
        }
        let Some(previous) = self.todos.get(id) else {
            return Outcome::Invalid(ValidationError::new("id", format!("no todo with id {}", id)));
        };
        let slot = self.slot_for(draft.placement, Some(&previous));
        let form = todo_form(draft, slot)
            .with("action", "update")
            .with("id", id);

        let Some(ack) = self.gateway.send(Endpoint::Todo, form).await else {
            return Outcome::Rejected;
        };

        let todo = Todo::confirmed(id, draft, slot.project_id, slot.section_id, slot.sort);
        let segments = confirm_segments(&draft.time_taken, &ack.time_taken_ids, id, draft.date);
        {
            let mut todos = self.todos.write();
            let mut time_taken = self.time_taken.write();
            if let Some(existing) = todos.iter_mut().find(|t| t.id == id) {
                *existing = todo.clone();
            }
            time_taken.retain(|t| t.todo_id != id);
            time_taken.extend(segments);
        }
        log::debug!("Updated todo {}", id);
        Outcome::Applied(todo)
    }

    /// Delete a todo together with its time segments.
    pub async fn delete_todo(&self, id: i64) -> Outcome {
        if !self.send_delete(TableType::Todo, &[id]).await {
            return Outcome::Rejected;
        }
        {
            let mut todos = self.todos.write();
            let mut time_taken = self.time_taken.write();
            todos.retain(|t| t.id != id);
            time_taken.retain(|t| t.todo_id != id);
        }
        log::debug!("Deleted todo {}", id);
        Outcome::Applied(())
    }

    pub async fn set_todo_completed(&self, id: i64, completed: bool) -> Outcome<Todo> {
        if !self.todos.contains(id) {
            return Outcome::Invalid(ValidationError::new("id", format!("no todo with id {}", id)));
        }
        let form = FormPayload::new()
            .with("id", id)
            .with("completed", u8::from(completed));
        if self.gateway.send(Endpoint::Completed, form).await.is_none() {
            return Outcome::Rejected;
        }
        self.todos.update(id, |t| t.completed = completed);
        match self.todos.get(id) {
            Some(todo) => Outcome::Applied(todo),
            None => Outcome::Rejected,
        }
    }
}
