//! Drag-and-drop reordering of todos inside a project board and of sections
//! inside a project.
//!
//! A gesture is `begin_drag`, any number of `hover` events, then `drop_dragged`
//! (or `cancel_drag`). Hovering inside one group only moves a local preview.
//! Hovering into another group commits at once. The drop commits whatever the
//! preview changed. A commit reindexes every touched group to `sort = index`,
//! sends them in one bulk request and, once acknowledged, patches only `sort`
//! (and the section of a todo moved across groups) in the collection.
//!
//! Each engine allows one commit in flight. Hovers and drops that arrive while
//! a commit is outstanding are ignored and report [`ReorderOutcome::Busy`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::board::Board;
use super::form::FormPayload;
use super::gateway::{Endpoint, TableType};
use crate::core::project::{Section, UNSECTIONED, project_sections};
use crate::core::todo::Todo;

/// What is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// Todos of one project, grouped by section with the unsectioned bucket last.
    Tasks,
    /// Sections of one project, a single group.
    Sections,
}

/// Vertical extent of a hovered element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub height: f64,
}

impl Bounds {
    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hover {
    /// The pointer is over another item.
    Item { target: i64, bounds: Bounds, pointer_y: f64 },
    /// The pointer entered a group's drop area.
    Group(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// The local preview changed; nothing was sent.
    Previewed,
    /// Nothing to do: no drag, no movement, or the midpoint was not crossed.
    Ignored,
    /// A commit was already in flight; this event was dropped.
    Busy,
    /// The store acknowledged the new order and the collection was patched.
    Committed,
    /// The store gave no result; the collection is unchanged.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub items: Vec<i64>,
}

/// Groups in board order, each holding item ids in sort order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub groups: Vec<Group>,
}

/// An item's position after reindexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: i64,
    pub group: i64,
    pub sort: i64,
}

impl Layout {
    /// Group index and position of `id`.
    pub fn locate(&self, id: i64) -> Option<(usize, usize)> {
        self.groups.iter().enumerate().find_map(|(gi, group)| {
            group.items.iter().position(|item| *item == id).map(|pos| (gi, pos))
        })
    }

    fn group_index(&self, group_id: i64) -> Option<usize> {
        self.groups.iter().position(|g| g.id == group_id)
    }

    pub fn group(&self, group_id: i64) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    /// Move `id` onto `target` in the same group once the pointer has crossed
    /// the target's midpoint in the direction of travel.
    pub fn move_within(&mut self, id: i64, target: i64, bounds: Bounds, pointer_y: f64) -> bool {
        let (Some((gi, from)), Some((tgi, to))) = (self.locate(id), self.locate(target)) else {
            return false;
        };
        if gi != tgi || from == to {
            return false;
        }
        let crossed = if from < to {
            pointer_y > bounds.midpoint()
        } else {
            pointer_y < bounds.midpoint()
        };
        if !crossed {
            return false;
        }
        let items = &mut self.groups[gi].items;
        let moved = items.remove(from);
        items.insert(to, moved);
        true
    }

    /// Move `id` into another group: to its top when moving down the board,
    /// to its bottom when moving up.
    pub fn move_across(&mut self, id: i64, dest_group: i64) -> bool {
        let (Some((gi, from)), Some(dest)) = (self.locate(id), self.group_index(dest_group)) else {
            return false;
        };
        if gi == dest {
            return false;
        }
        let moved = self.groups[gi].items.remove(from);
        let items = &mut self.groups[dest].items;
        if dest > gi {
            items.insert(0, moved);
        } else {
            items.push(moved);
        }
        true
    }

    /// `sort = index` for every item of the listed groups.
    pub fn reindex(&self, group_ids: &[i64]) -> Vec<Slot> {
        group_ids
            .iter()
            .filter_map(|gid| self.group(*gid))
            .flat_map(|group| {
                group.items.iter().enumerate().map(|(i, id)| Slot {
                    id: *id,
                    group: group.id,
                    sort: i as i64,
                })
            })
            .collect()
    }

    /// Ids of groups whose order differs from `other`.
    pub fn changed_groups(&self, other: &Layout) -> Vec<i64> {
        self.groups
            .iter()
            .filter(|g| other.group(g.id).is_none_or(|o| o.items != g.items))
            .map(|g| g.id)
            .collect()
    }
}

/// Todos of `project_id` laid out by section, unsectioned last.
pub fn task_layout(todos: &[Todo], sections: &[Section], project_id: i64) -> Layout {
    let mut groups: Vec<Group> = project_sections(sections, project_id)
        .iter()
        .map(|s| Group { id: s.id, items: Vec::new() })
        .collect();
    groups.push(Group { id: UNSECTIONED, items: Vec::new() });

    let mut tasks: Vec<&Todo> = todos.iter().filter(|t| t.project_id == project_id).collect();
    tasks.sort_by_key(|t| (t.sort, t.id));
    for task in tasks {
        let gi = groups
            .iter()
            .position(|g| g.id == task.section_id)
            .unwrap_or(groups.len() - 1);
        groups[gi].items.push(task.id);
    }
    Layout { groups }
}

pub fn section_layout(sections: &[Section], project_id: i64) -> Layout {
    Layout {
        groups: vec![Group {
            id: project_id,
            items: project_sections(sections, project_id).iter().map(|s| s.id).collect(),
        }],
    }
}

/// Whether `sorts` (in any order) are exactly `0..n`.
pub fn is_contiguous(sorts: &[i64]) -> bool {
    let mut sorted = sorts.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, s)| *s == i as i64)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging { id: i64, scope: i64, preview: Layout },
}

/// Releases the commit flag when dropped.
pub(crate) struct CommitPermit<'a>(&'a AtomicBool);

impl Drop for CommitPermit<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub(crate) enum Step<'a> {
    Done(ReorderOutcome),
    Commit {
        id: i64,
        scope: i64,
        /// Destination group when the dragged item changed group.
        moved_to: Option<i64>,
        layout: Layout,
        groups: Vec<i64>,
        permit: CommitPermit<'a>,
    },
}

/// Gesture state for one [`Subject`].
pub struct ReorderEngine {
    state: Mutex<DragState>,
    committing: AtomicBool,
}

impl Default for ReorderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReorderEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DragState::Idle),
            committing: AtomicBool::new(false),
        }
    }

    pub fn is_committing(&self) -> bool {
        self.committing.load(Ordering::Acquire)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(*self.state(), DragState::Dragging { .. })
    }

    pub fn preview(&self) -> Option<Layout> {
        match &*self.state() {
            DragState::Dragging { preview, .. } => Some(preview.clone()),
            DragState::Idle => None,
        }
    }

    fn state(&self) -> MutexGuard<'_, DragState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_commit(&self) -> Option<CommitPermit<'_>> {
        self.committing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CommitPermit(&self.committing))
    }

    pub(crate) fn begin(&self, id: i64, scope: i64, layout: Layout) {
        *self.state() = DragState::Dragging { id, scope, preview: layout };
    }

    pub(crate) fn cancel(&self) {
        *self.state() = DragState::Idle;
    }

    pub(crate) fn scope(&self) -> Option<i64> {
        match &*self.state() {
            DragState::Dragging { scope, .. } => Some(*scope),
            DragState::Idle => None,
        }
    }

    pub(crate) fn hover(&self, hover: Hover, allow_cross: bool) -> Step<'_> {
        let mut state = self.state();
        let DragState::Dragging { id, scope, preview } = &mut *state else {
            return Step::Done(ReorderOutcome::Ignored);
        };
        if self.is_committing() {
            return Step::Done(ReorderOutcome::Busy);
        }
        let Some((from_gi, _)) = preview.locate(*id) else {
            return Step::Done(ReorderOutcome::Ignored);
        };
        let source = preview.groups[from_gi].id;
        let dest = match hover {
            Hover::Item { target, .. } => match preview.locate(target) {
                Some((gi, _)) => preview.groups[gi].id,
                None => return Step::Done(ReorderOutcome::Ignored),
            },
            Hover::Group(group) => group,
        };

        if dest == source {
            let moved = match hover {
                Hover::Item { target, bounds, pointer_y } => {
                    preview.move_within(*id, target, bounds, pointer_y)
                }
                Hover::Group(_) => false,
            };
            return Step::Done(if moved {
                ReorderOutcome::Previewed
            } else {
                ReorderOutcome::Ignored
            });
        }

        if !allow_cross {
            return Step::Done(ReorderOutcome::Ignored);
        }
        let mut next = preview.clone();
        if !next.move_across(*id, dest) {
            return Step::Done(ReorderOutcome::Ignored);
        }
        let Some(permit) = self.try_commit() else {
            return Step::Done(ReorderOutcome::Busy);
        };
        Step::Commit {
            id: *id,
            scope: *scope,
            moved_to: Some(dest),
            layout: next,
            groups: vec![source, dest],
            permit,
        }
    }

    /// End the gesture, committing groups whose preview differs from `current`.
    pub(crate) fn finish(&self, current: &Layout) -> Step<'_> {
        let state = std::mem::replace(&mut *self.state(), DragState::Idle);
        let DragState::Dragging { id, scope, preview } = state else {
            return Step::Done(ReorderOutcome::Ignored);
        };
        if self.is_committing() {
            return Step::Done(ReorderOutcome::Busy);
        }
        let groups = preview.changed_groups(current);
        if groups.is_empty() {
            return Step::Done(ReorderOutcome::Ignored);
        }
        let Some(permit) = self.try_commit() else {
            return Step::Done(ReorderOutcome::Busy);
        };
        Step::Commit {
            id,
            scope,
            moved_to: None,
            layout: preview,
            groups,
            permit,
        }
    }

    /// Reset the preview to `layout` if the gesture that committed is still the current one.
    pub(crate) fn rebase(&self, id: i64, scope: i64, layout: Layout) -> bool {
        match &mut *self.state() {
            DragState::Dragging { id: dragged, scope: current, preview }
                if *dragged == id && *current == scope =>
            {
                *preview = layout;
                true
            }
            _ => false,
        }
    }
}

/// A sibling group whose sort values are not `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenGroup {
    pub subject: Subject,
    pub project_id: i64,
    pub group: i64,
    pub sorts: Vec<i64>,
}

impl Board {
    fn engine(&self, subject: Subject) -> &ReorderEngine {
        match subject {
            Subject::Tasks => &self.task_drag,
            Subject::Sections => &self.section_drag,
        }
    }

    /// The authoritative layout of `scope` (a project id).
    pub fn layout(&self, subject: Subject, scope: i64) -> Layout {
        let sections = self.sections.snapshot();
        match subject {
            Subject::Tasks => self
                .todos
                .with(|todos| task_layout(todos, &sections, scope)),
            Subject::Sections => section_layout(&sections, scope),
        }
    }

    pub fn drag_preview(&self, subject: Subject) -> Option<Layout> {
        self.engine(subject).preview()
    }

    pub fn is_committing(&self, subject: Subject) -> bool {
        self.engine(subject).is_committing()
    }

    /// Start dragging `id`. Todos outside any project cannot be dragged.
    pub fn begin_drag(&self, subject: Subject, id: i64) -> bool {
        let scope = match subject {
            Subject::Tasks => self.todos.get(id).map(|t| t.project_id),
            Subject::Sections => self.sections.get(id).map(|s| s.project_id),
        };
        let Some(scope) = scope.filter(|p| *p != 0) else {
            return false;
        };
        self.engine(subject).begin(id, scope, self.layout(subject, scope));
        true
    }

    pub fn cancel_drag(&self, subject: Subject) {
        self.engine(subject).cancel();
    }

    pub async fn hover(&self, subject: Subject, hover: Hover) -> ReorderOutcome {
        let engine = self.engine(subject);
        let (id, scope, moved_to, layout, groups, permit) =
            match engine.hover(hover, subject == Subject::Tasks) {
                Step::Done(outcome) => return outcome,
                Step::Commit { id, scope, moved_to, layout, groups, permit } => {
                    (id, scope, moved_to, layout, groups, permit)
                }
            };
        let moved = moved_to.map(|dest| (id, dest));
        let outcome = self.commit(subject, &layout, &groups, moved).await;
        drop(permit);
        if !engine.rebase(id, scope, self.layout(subject, scope)) {
            log::debug!("Drag of {} ended before its commit settled", id);
        }
        outcome
    }

    pub async fn drop_dragged(&self, subject: Subject) -> ReorderOutcome {
        let engine = self.engine(subject);
        let Some(scope) = engine.scope() else {
            return ReorderOutcome::Ignored;
        };
        let current = self.layout(subject, scope);
        match engine.finish(&current) {
            Step::Done(outcome) => outcome,
            Step::Commit { id, moved_to, layout, groups, permit, .. } => {
                let outcome = self
                    .commit(subject, &layout, &groups, moved_to.map(|dest| (id, dest)))
                    .await;
                drop(permit);
                outcome
            }
        }
    }

    /// Persist the order of `groups`. `moved` is the item that changed group and
    /// its destination; every other todo keeps the section it already has.
    async fn commit(
        &self,
        subject: Subject,
        layout: &Layout,
        groups: &[i64],
        moved: Option<(i64, i64)>,
    ) -> ReorderOutcome {
        let slots = layout.reindex(groups);
        if slots.is_empty() {
            return ReorderOutcome::Ignored;
        }
        let section_of = |slot: &Slot| match moved {
            Some((id, dest)) if id == slot.id => dest,
            _ => self
                .todos
                .get(slot.id)
                .map(|t| t.section_id)
                .unwrap_or(slot.group),
        };
        let sections: Vec<i64> = match subject {
            Subject::Tasks => slots.iter().map(section_of).collect(),
            Subject::Sections => Vec::new(),
        };
        let table = match subject {
            Subject::Tasks => TableType::Todo,
            Subject::Sections => TableType::Section,
        };
        let mut form = FormPayload::new().with("tableType", table.as_wire());
        for (i, slot) in slots.iter().enumerate() {
            form.push_indexed("id", i, slot.id)
                .push_indexed("sort", i, slot.sort);
            if let Some(section_id) = sections.get(i) {
                form.push_indexed("sectionId", i, section_id);
            }
        }
        if self.gateway.send(Endpoint::Sort, form).await.is_none() {
            return ReorderOutcome::Rejected;
        }
        match subject {
            Subject::Tasks => {
                let mut todos = self.todos.write();
                for (slot, section_id) in slots.iter().zip(&sections) {
                    if let Some(todo) = todos.iter_mut().find(|t| t.id == slot.id) {
                        todo.sort = slot.sort;
                        todo.section_id = *section_id;
                    }
                }
            }
            Subject::Sections => {
                let mut sections = self.sections.write();
                for slot in &slots {
                    if let Some(section) = sections.iter_mut().find(|s| s.id == slot.id) {
                        section.sort = slot.sort;
                    }
                }
            }
        }
        log::debug!("Reordered {} {} rows", slots.len(), table.as_wire());
        ReorderOutcome::Committed
    }

    /// Sibling groups whose sort values are not contiguous from zero.
    pub fn broken_sibling_groups(&self) -> Vec<BrokenGroup> {
        let todos = self.todos.snapshot();
        let sections = self.sections.snapshot();
        let mut broken = Vec::new();
        for project in self.projects.snapshot() {
            for group in task_layout(&todos, &sections, project.id).groups {
                let sorts: Vec<i64> = group
                    .items
                    .iter()
                    .filter_map(|id| todos.iter().find(|t| t.id == *id).map(|t| t.sort))
                    .collect();
                if !is_contiguous(&sorts) {
                    broken.push(BrokenGroup {
                        subject: Subject::Tasks,
                        project_id: project.id,
                        group: group.id,
                        sorts,
                    });
                }
            }
            let sorts: Vec<i64> = project_sections(&sections, project.id)
                .iter()
                .map(|s| s.sort)
                .collect();
            if !is_contiguous(&sorts) {
                broken.push(BrokenGroup {
                    subject: Subject::Sections,
                    project_id: project.id,
                    group: project.id,
                    sorts,
                });
            }
        }
        broken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::Project;
    use crate::core::todo::{TodoDraft, TodoType};
    use crate::sync::board::tests::board;
    use crate::sync::gateway::Envelope;
    use crate::sync::testing::ScriptedStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn todo(id: i64, section_id: i64, sort: i64) -> Todo {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        Todo::confirmed(id, &TodoDraft::new(date, TodoType::Work, "t"), 1, section_id, sort)
    }

    fn section(id: i64, sort: i64) -> Section {
        Section { id, project_id: 1, name: format!("s{}", id), sort, memo: String::new() }
    }

    /// Project 1 with sections 10 and 20; todos 1,2,3 in 10, 4,5 in 20, 6 unsectioned.
    fn seeded(store: &Arc<ScriptedStore>) -> Board {
        let b = board(store);
        b.projects.finish_loading(Some(vec![Project {
            id: 1,
            name: "p".into(),
            end: None,
            completed: false,
            memo: String::new(),
        }]));
        b.sections.finish_loading(Some(vec![section(10, 0), section(20, 1)]));
        b.todos.finish_loading(Some(vec![
            todo(1, 10, 0),
            todo(2, 10, 1),
            todo(3, 10, 2),
            todo(4, 20, 0),
            todo(5, 20, 1),
            todo(6, 0, 0),
        ]));
        b
    }

    fn below(target: i64) -> Hover {
        Hover::Item { target, bounds: Bounds { top: 100.0, height: 40.0 }, pointer_y: 130.0 }
    }

    fn above(target: i64) -> Hover {
        Hover::Item { target, bounds: Bounds { top: 100.0, height: 40.0 }, pointer_y: 110.0 }
    }

    fn items(layout: &Layout, group: i64) -> Vec<i64> {
        layout.group(group).map(|g| g.items.clone()).unwrap_or_default()
    }

    fn assert_all_contiguous(b: &Board) {
        assert_eq!(b.broken_sibling_groups(), vec![]);
    }

    #[test]
    fn layout_puts_unsectioned_last() {
        let todos = vec![todo(1, 0, 0), todo(2, 20, 0), todo(3, 10, 0), todo(4, 99, 1)];
        let sections = vec![section(20, 1), section(10, 0)];
        let layout = task_layout(&todos, &sections, 1);
        let ids: Vec<i64> = layout.groups.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![10, 20, 0]);
        assert_eq!(items(&layout, 0), vec![1, 4]);
    }

    #[test]
    fn midpoint_must_be_crossed_in_direction_of_travel() {
        let mut layout = Layout { groups: vec![Group { id: 10, items: vec![1, 2, 3] }] };
        let b = Bounds { top: 100.0, height: 40.0 };

        assert!(!layout.move_within(1, 2, b, 110.0));
        assert!(layout.move_within(1, 2, b, 130.0));
        assert_eq!(layout.groups[0].items, vec![2, 1, 3]);

        assert!(!layout.move_within(3, 1, b, 130.0));
        assert!(layout.move_within(3, 1, b, 110.0));
        assert_eq!(layout.groups[0].items, vec![2, 3, 1]);
    }

    #[test]
    fn cross_group_inserts_at_edge_by_direction() {
        let mut layout = Layout {
            groups: vec![
                Group { id: 10, items: vec![1, 2] },
                Group { id: 20, items: vec![3, 4] },
            ],
        };
        assert!(layout.move_across(2, 20));
        assert_eq!(layout.groups[1].items, vec![2, 3, 4]);
        assert!(layout.move_across(4, 10));
        assert_eq!(layout.groups[0].items, vec![1, 4]);
        assert!(!layout.move_across(1, 10));
    }

    #[test]
    fn contiguity() {
        assert!(is_contiguous(&[2, 0, 1]));
        assert!(is_contiguous(&[]));
        assert!(!is_contiguous(&[0, 2]));
        assert!(!is_contiguous(&[0, 0, 1]));
    }

    #[tokio::test]
    async fn hover_within_group_sends_nothing_until_drop() {
        let store = ScriptedStore::new();
        let b = seeded(&store);
        assert!(b.begin_drag(Subject::Tasks, 1));

        assert_eq!(b.hover(Subject::Tasks, above(2)).await, ReorderOutcome::Ignored);
        assert_eq!(b.hover(Subject::Tasks, below(2)).await, ReorderOutcome::Previewed);
        assert_eq!(b.hover(Subject::Tasks, below(3)).await, ReorderOutcome::Previewed);
        assert_eq!(store.request_count(), 0);
        assert_eq!(items(&b.drag_preview(Subject::Tasks).unwrap(), 10), vec![2, 3, 1]);
        assert_eq!(b.todos().get(1).unwrap().sort, 0);

        assert_eq!(b.drop_dragged(Subject::Tasks).await, ReorderOutcome::Committed);

        assert_eq!(store.request_count(), 1);
        let (endpoint, form) = store.last_request().unwrap();
        assert_eq!(endpoint, Endpoint::Sort);
        assert_eq!(form.get("tableType"), Some("todo"));
        assert_eq!(form.get("id[0]"), Some("2"));
        assert_eq!(form.get("sort[2]"), Some("2"));
        assert_eq!(form.get("id[2]"), Some("1"));
        assert_eq!(form.get("sectionId[2]"), Some("10"));
        assert_eq!(form.get("id[3]"), None);
        assert_eq!(b.todos().get(1).unwrap().sort, 2);
        assert_eq!(b.todos().get(2).unwrap().sort, 0);
        assert_all_contiguous(&b);
    }

    #[tokio::test]
    async fn cross_group_hover_commits_both_groups() {
        let store = ScriptedStore::new();
        let b = seeded(&store);
        b.begin_drag(Subject::Tasks, 2);

        assert_eq!(b.hover(Subject::Tasks, Hover::Group(20)).await, ReorderOutcome::Committed);

        let (_, form) = store.last_request().unwrap();
        assert_eq!(form.get("id[2]"), Some("2"));
        assert_eq!(form.get("sectionId[2]"), Some("20"));
        assert_eq!(form.get("sort[2]"), Some("0"));
        let moved = b.todos().get(2).unwrap();
        assert_eq!((moved.section_id, moved.sort), (20, 0));
        assert_eq!(b.todos().get(3).unwrap().sort, 1);
        assert_eq!(b.todos().get(4).unwrap().sort, 1);
        assert_eq!(b.todos().get(2).unwrap().content, "t");
        assert_eq!(items(&b.drag_preview(Subject::Tasks).unwrap(), 20), vec![2, 4, 5]);
        assert_all_contiguous(&b);

        assert_eq!(b.drop_dragged(Subject::Tasks).await, ReorderOutcome::Ignored);
        assert_eq!(store.request_count(), 1);
    }

    #[tokio::test]
    async fn moving_up_the_board_lands_at_bottom() {
        let store = ScriptedStore::new();
        let b = seeded(&store);
        b.begin_drag(Subject::Tasks, 6);

        assert_eq!(b.hover(Subject::Tasks, above(4)).await, ReorderOutcome::Committed);

        let moved = b.todos().get(6).unwrap();
        assert_eq!((moved.section_id, moved.sort), (20, 2));
        assert_all_contiguous(&b);
    }

    #[tokio::test]
    async fn rejected_commit_leaves_collection_and_resets_preview() {
        let store = ScriptedStore::new();
        store.reply(Envelope::failed("Database error"));
        let b = seeded(&store);
        let before = b.todos().snapshot();
        b.begin_drag(Subject::Tasks, 1);

        assert_eq!(b.hover(Subject::Tasks, Hover::Group(0)).await, ReorderOutcome::Rejected);

        assert_eq!(b.todos().snapshot(), before);
        assert_eq!(items(&b.drag_preview(Subject::Tasks).unwrap(), 10), vec![1, 2, 3]);
        assert!(!b.is_committing(Subject::Tasks));
    }

    #[tokio::test]
    async fn sections_reorder_within_project_only() {
        let store = ScriptedStore::new();
        let b = seeded(&store);
        assert!(b.begin_drag(Subject::Sections, 10));

        assert_eq!(b.hover(Subject::Sections, below(20)).await, ReorderOutcome::Previewed);
        assert_eq!(b.drop_dragged(Subject::Sections).await, ReorderOutcome::Committed);

        let (_, form) = store.last_request().unwrap();
        assert_eq!(form.get("tableType"), Some("section"));
        assert_eq!(form.get("sectionId[0]"), None);
        assert_eq!(b.sections().get(10).unwrap().sort, 1);
        assert_eq!(b.sections().get(20).unwrap().sort, 0);
        assert_all_contiguous(&b);
    }

    #[tokio::test]
    async fn unassigned_todo_cannot_be_dragged() {
        let store = ScriptedStore::new();
        let b = seeded(&store);
        b.todos.push(Todo { project_id: 0, ..todo(9, 0, 0) });
        assert!(!b.begin_drag(Subject::Tasks, 9));
        assert_eq!(b.drop_dragged(Subject::Tasks).await, ReorderOutcome::Ignored);
    }

    #[tokio::test]
    async fn repeated_moves_keep_groups_contiguous() {
        let store = ScriptedStore::new();
        let b = seeded(&store);

        b.begin_drag(Subject::Tasks, 3);
        b.hover(Subject::Tasks, Hover::Group(0)).await;
        b.hover(Subject::Tasks, Hover::Group(20)).await;
        b.drop_dragged(Subject::Tasks).await;

        b.begin_drag(Subject::Tasks, 5);
        b.hover(Subject::Tasks, above(4)).await;
        b.drop_dragged(Subject::Tasks).await;

        b.begin_drag(Subject::Tasks, 1);
        b.hover(Subject::Tasks, Hover::Group(0)).await;
        b.hover(Subject::Tasks, above(6)).await;
        b.drop_dragged(Subject::Tasks).await;

        assert_all_contiguous(&b);
        let layout = b.layout(Subject::Tasks, 1);
        let total: usize = layout.groups.iter().map(|g| g.items.len()).sum();
        assert_eq!(total, 6);
    }

    #[tokio::test]
    async fn second_commit_while_one_is_in_flight_is_ignored() {
        let store = ScriptedStore::new();
        let b = Arc::new(seeded(&store));
        let gate = store.hold();
        b.begin_drag(Subject::Tasks, 1);

        let first = {
            let b = b.clone();
            tokio::spawn(async move { b.hover(Subject::Tasks, Hover::Group(20)).await })
        };
        store.arrived.notified().await;
        assert!(b.is_committing(Subject::Tasks));

        assert_eq!(b.hover(Subject::Tasks, Hover::Group(0)).await, ReorderOutcome::Busy);
        assert_eq!(b.drop_dragged(Subject::Tasks).await, ReorderOutcome::Busy);
        assert_eq!(store.request_count(), 1);

        store.release();
        gate.notify_one();
        assert_eq!(first.await.unwrap(), ReorderOutcome::Committed);

        assert_eq!(store.request_count(), 1);
        assert!(!b.is_committing(Subject::Tasks));
        assert_eq!(b.todos().get(1).unwrap().section_id, 20);
        assert_all_contiguous(&b);
    }

    #[tokio::test]
    async fn settling_commit_leaves_a_newer_drag_alone() {
        let store = ScriptedStore::new();
        let b = Arc::new(seeded(&store));
        b.projects.push(Project {
            id: 2,
            name: "q".into(),
            end: None,
            completed: false,
            memo: String::new(),
        });
        b.sections.push(Section { id: 30, project_id: 2, name: "s30".into(), sort: 0, memo: String::new() });
        b.todos.push(Todo { project_id: 2, ..todo(7, 30, 0) });
        b.todos.push(Todo { project_id: 2, ..todo(8, 30, 1) });

        let gate = store.hold();
        b.begin_drag(Subject::Tasks, 1);
        let first = {
            let b = b.clone();
            tokio::spawn(async move { b.hover(Subject::Tasks, Hover::Group(20)).await })
        };
        store.arrived.notified().await;

        assert!(b.begin_drag(Subject::Tasks, 7));
        store.release();
        gate.notify_one();
        assert_eq!(first.await.unwrap(), ReorderOutcome::Committed);

        assert_eq!(b.drag_preview(Subject::Tasks), Some(b.layout(Subject::Tasks, 2)));
        assert_eq!(b.hover(Subject::Tasks, below(8)).await, ReorderOutcome::Previewed);
        assert_eq!(b.drop_dragged(Subject::Tasks).await, ReorderOutcome::Committed);

        assert_eq!(store.request_count(), 2);
        let (_, form) = store.last_request().unwrap();
        assert_eq!(form.get("id[0]"), Some("8"));
        assert_eq!(form.get("id[1]"), Some("7"));
        assert_eq!(form.get("id[2]"), None);
        assert_eq!(b.todos().get(7).unwrap().sort, 1);
        assert_eq!(b.todos().get(1).unwrap().section_id, 20);
    }

    #[tokio::test]
    async fn same_group_reorder_keeps_sections() {
        let store = ScriptedStore::new();
        let b = seeded(&store);
        // 99 is not a section of project 1, so todo 7 lays out in the unsectioned bucket
        b.todos.push(todo(7, 99, 1));
        b.begin_drag(Subject::Tasks, 6);

        assert_eq!(b.hover(Subject::Tasks, below(7)).await, ReorderOutcome::Previewed);
        assert_eq!(b.drop_dragged(Subject::Tasks).await, ReorderOutcome::Committed);

        let (_, form) = store.last_request().unwrap();
        assert_eq!(form.get("id[0]"), Some("7"));
        assert_eq!(form.get("sectionId[0]"), Some("99"));
        assert_eq!(form.get("sectionId[1]"), Some("0"));
        let kept = b.todos().get(7).unwrap();
        assert_eq!((kept.section_id, kept.sort), (99, 0));
        assert_eq!(b.todos().get(6).unwrap().sort, 1);
    }
}
