use super::Outcome;
use super::board::{Board, created_id};
use super::codec::encode_memo;
use super::form::FormPayload;
use super::gateway::{Endpoint, TableType};
use super::wire::format_date;
use crate::core::project::{Project, ProjectDraft, ProjectEdit, Section, SectionDraft, UNSECTIONED};
use crate::core::validate;
use crate::error::ValidationError;

fn edit_value(edit: &ProjectEdit) -> String {
    match edit {
        ProjectEdit::Name(name) => name.clone(),
        ProjectEdit::End(end) => end.map(format_date).unwrap_or_default(),
        ProjectEdit::Completed(done) => u8::from(*done).to_string(),
        ProjectEdit::Memo(memo) => encode_memo(memo),
    }
}

fn check_edit(edit: &ProjectEdit) -> Result<(), ValidationError> {
    match edit {
        ProjectEdit::Name(name) => validate::name(name),
        ProjectEdit::Memo(memo) => validate::memo_text(memo),
        ProjectEdit::End(_) | ProjectEdit::Completed(_) => Ok(()),
    }
}

impl Board {
    pub async fn create_project(&self, draft: &ProjectDraft) -> Outcome<Project> {
        if let Err(e) = validate::project(draft) {
            return Outcome::Invalid(e);
        }
        let form = FormPayload::new()
            .with("action", "save")
            .with("name", &draft.name)
            .with("end", draft.end.map(format_date).unwrap_or_default())
            .with("completed", u8::from(draft.completed))
            .with("memo", encode_memo(&draft.memo));

        let Some(ack) = self.gateway.send(Endpoint::Project, form).await else {
            return Outcome::Rejected;
        };
        let Some(id) = created_id(Endpoint::Project, &ack) else {
            return Outcome::Rejected;
        };
        let project = Project {
            id,
            name: draft.name.clone(),
            end: draft.end,
            completed: draft.completed,
            memo: draft.memo.clone(),
        };
        self.projects.push(project.clone());
        log::debug!("Created project {}", id);
        Outcome::Applied(project)
    }

    /// Change one field of a project; the store updates a single column per request.
    pub async fn update_project(&self, id: i64, edit: ProjectEdit) -> Outcome<Project> {
        if let Err(e) = check_edit(&edit) {
            return Outcome::Invalid(e);
        }
        if !self.projects.contains(id) {
            return Outcome::Invalid(ValidationError::new("id", format!("no project with id {}", id)));
        }
        let form = FormPayload::new()
            .with("action", "update")
            .with("id", id)
            .with("type", edit.field())
            .with(edit.field(), edit_value(&edit));

        if self.gateway.send(Endpoint::Project, form).await.is_none() {
            return Outcome::Rejected;
        }
        self.projects.update(id, |p| p.apply(&edit));
        match self.projects.get(id) {
            Some(project) => Outcome::Applied(project),
            None => Outcome::Rejected,
        }
    }

    /// Delete a project. Its sections go with it and its todos become unassigned.
    pub async fn delete_project(&self, id: i64) -> Outcome {
        if !self.send_delete(TableType::Project, &[id]).await {
            return Outcome::Rejected;
        }
        let unassigned = {
            let mut projects = self.projects.write();
            let mut sections = self.sections.write();
            let mut todos = self.todos.write();
            projects.retain(|p| p.id != id);
            sections.retain(|s| s.project_id != id);
            let mut count = 0;
            for todo in todos.iter_mut().filter(|t| t.project_id == id) {
                todo.project_id = 0;
                todo.section_id = UNSECTIONED;
                todo.sort = 0;
                count += 1;
            }
            count
        };
        log::debug!("Deleted project {}, unassigned {} todos", id, unassigned);
        Outcome::Applied(())
    }

    /// Add a section at the end of its project.
    pub async fn create_section(&self, draft: &SectionDraft) -> Outcome<Section> {
        if let Err(e) = validate::section(draft) {
            return Outcome::Invalid(e);
        }
        if !self.projects.contains(draft.project_id) {
            return Outcome::Invalid(ValidationError::new(
                "projectId",
                format!("no project with id {}", draft.project_id),
            ));
        }
        let sort = self
            .sections
            .with(|sections| sections.iter().filter(|s| s.project_id == draft.project_id).count())
            as i64;
        let form = FormPayload::new()
            .with("action", "save")
            .with("projectId", draft.project_id)
            .with("name", &draft.name)
            .with("sort", sort)
            .with("memo", &draft.memo);

        let Some(ack) = self.gateway.send(Endpoint::Section, form).await else {
            return Outcome::Rejected;
        };
        let Some(id) = created_id(Endpoint::Section, &ack) else {
            return Outcome::Rejected;
        };
        let section = Section {
            id,
            project_id: draft.project_id,
            name: draft.name.clone(),
            sort,
            memo: draft.memo.clone(),
        };
        self.sections.push(section.clone());
        log::debug!("Created section {} in project {}", id, draft.project_id);
        Outcome::Applied(section)
    }

    /// Rename a section or change its memo. Its project and position are kept.
    pub async fn update_section(&self, id: i64, name: &str, memo: &str) -> Outcome<Section> {
        let Some(previous) = self.sections.get(id) else {
            return Outcome::Invalid(ValidationError::new("id", format!("no section with id {}", id)));
        };
        let draft = SectionDraft {
            project_id: previous.project_id,
            name: name.to_string(),
            memo: memo.to_string(),
        };
        if let Err(e) = validate::section(&draft) {
            return Outcome::Invalid(e);
        }
        let form = FormPayload::new()
            .with("action", "update")
            .with("id", id)
            .with("projectId", previous.project_id)
            .with("name", name)
            .with("sort", previous.sort)
            .with("memo", memo);

        if self.gateway.send(Endpoint::Section, form).await.is_none() {
            return Outcome::Rejected;
        }
        self.sections.update(id, |s| {
            s.name = draft.name.clone();
            s.memo = draft.memo.clone();
        });
        match self.sections.get(id) {
            Some(section) => Outcome::Applied(section),
            None => Outcome::Rejected,
        }
    }

    /// Delete an empty section. Sections that still hold todos are refused.
    pub async fn delete_section(&self, id: i64) -> Outcome {
        let in_use = self
            .todos
            .with(|todos| todos.iter().filter(|t| t.section_id == id).count());
        if in_use > 0 {
            return Outcome::Invalid(ValidationError::new(
                "section",
                format!("section {} still holds {} todos", id, in_use),
            ));
        }
        if !self.send_delete(TableType::Section, &[id]).await {
            return Outcome::Rejected;
        }
        self.sections.remove(id);
        log::debug!("Deleted section {}", id);
        Outcome::Applied(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::todo::{Todo, TodoDraft, TodoType};
    use crate::sync::board::tests::board;
    use crate::sync::codec::decode_memo;
    use crate::sync::gateway::Envelope;
    use crate::sync::testing::ScriptedStore;
    use chrono::NaiveDate;

    fn project(id: i64) -> Project {
        Project { id, name: format!("p{}", id), end: None, completed: false, memo: String::new() }
    }

    fn section(id: i64, project_id: i64, sort: i64) -> Section {
        Section { id, project_id, name: format!("s{}", id), sort, memo: String::new() }
    }

    fn todo(id: i64, project_id: i64, section_id: i64, sort: i64) -> Todo {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        Todo::confirmed(id, &TodoDraft::new(date, TodoType::Work, "t"), project_id, section_id, sort)
    }

    #[tokio::test]
    async fn delete_project_fans_out() {
        let store = ScriptedStore::new();
        let b = board(&store);
        b.projects.finish_loading(Some(vec![project(1), project(2)]));
        b.sections.finish_loading(Some(vec![section(11, 1, 0), section(12, 1, 1), section(21, 2, 0)]));
        b.todos.finish_loading(Some(vec![todo(100, 1, 11, 3), todo(101, 1, 0, 2), todo(102, 2, 21, 0)]));

        assert!(b.delete_project(1).await.is_applied());

        assert_eq!(b.projects().snapshot(), vec![project(2)]);
        assert_eq!(b.sections().snapshot(), vec![section(21, 2, 0)]);
        let todos = b.todos().snapshot();
        for t in todos.iter().filter(|t| t.id == 100 || t.id == 101) {
            assert_eq!((t.project_id, t.section_id, t.sort), (0, 0, 0));
        }
        assert_eq!(todos.iter().find(|t| t.id == 102), Some(&todo(102, 2, 21, 0)));
    }

    #[tokio::test]
    async fn rejected_project_delete_changes_nothing() {
        let store = ScriptedStore::new();
        store.reply(Envelope::failed("Database error"));
        let b = board(&store);
        b.projects.finish_loading(Some(vec![project(1)]));
        b.sections.finish_loading(Some(vec![section(11, 1, 0)]));
        b.todos.finish_loading(Some(vec![todo(100, 1, 11, 0)]));

        assert_eq!(b.delete_project(1).await, Outcome::Rejected);

        assert_eq!(b.projects().len(), 1);
        assert_eq!(b.sections().len(), 1);
        assert_eq!(b.todos().snapshot(), vec![todo(100, 1, 11, 0)]);
    }

    #[tokio::test]
    async fn create_project_encodes_memo() {
        let store = ScriptedStore::new();
        store.reply(Envelope::ok().with_id(8));
        let b = board(&store);
        let mut draft = ProjectDraft::new("Garden");
        draft.memo = "plant <roses>".into();

        let created = b.create_project(&draft).await.applied().unwrap();

        assert_eq!(created.id, 8);
        assert_eq!(created.memo, "plant <roses>");
        let (_, form) = store.last_request().unwrap();
        assert_eq!(form.get("memo").map(decode_memo), Some("plant <roses>".to_string()));
        assert_eq!(form.get("end"), Some(""));
    }

    #[tokio::test]
    async fn update_project_sends_single_field() {
        let store = ScriptedStore::new();
        let b = board(&store);
        b.projects.finish_loading(Some(vec![project(1)]));
        let end = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let updated = b.update_project(1, ProjectEdit::End(Some(end))).await.applied().unwrap();

        assert_eq!(updated.end, Some(end));
        let (_, form) = store.last_request().unwrap();
        assert_eq!(form.get("type"), Some("end"));
        assert_eq!(form.get("end"), Some("2024-05-01"));
        assert_eq!(form.get("name"), None);
    }

    #[tokio::test]
    async fn section_create_sorts_last_in_project() {
        let store = ScriptedStore::new();
        store.reply(Envelope::ok().with_id(13));
        let b = board(&store);
        b.projects.finish_loading(Some(vec![project(1)]));
        b.sections.finish_loading(Some(vec![section(11, 1, 0), section(12, 1, 1), section(21, 2, 0)]));

        let created = b.create_section(&SectionDraft::new(1, "Later")).await.applied().unwrap();

        assert_eq!(created.sort, 2);
        assert_eq!(store.last_request().unwrap().1.get("sort"), Some("2"));
    }

    #[tokio::test]
    async fn section_with_todos_cannot_be_deleted() {
        let store = ScriptedStore::new();
        let b = board(&store);
        b.sections.finish_loading(Some(vec![section(11, 1, 0)]));
        b.todos.finish_loading(Some(vec![todo(100, 1, 11, 0)]));

        assert!(matches!(b.delete_section(11).await, Outcome::Invalid(_)));
        assert_eq!(store.request_count(), 0);

        b.todos.finish_loading(Some(vec![]));
        assert!(b.delete_section(11).await.is_applied());
        assert!(b.sections().is_empty());
    }

    #[tokio::test]
    async fn rejected_project_update_keeps_fields() {
        let store = ScriptedStore::new();
        store.reply(Envelope::failed("Database error"));
        let b = board(&store);
        b.projects.finish_loading(Some(vec![project(1)]));

        let outcome = b.update_project(1, ProjectEdit::Name("Renamed".into())).await;

        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(b.projects().snapshot(), vec![project(1)]);
        assert!(!b.projects().is_loading());
    }

    #[tokio::test]
    async fn rejected_section_create_adds_nothing() {
        let store = ScriptedStore::new();
        store.reply(Envelope::failed("Database error"));
        let b = board(&store);
        b.projects.finish_loading(Some(vec![project(1)]));
        b.sections.finish_loading(Some(vec![section(11, 1, 0)]));

        let outcome = b.create_section(&SectionDraft::new(1, "Later")).await;

        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(b.sections().snapshot(), vec![section(11, 1, 0)]);
        assert!(!b.sections().is_loading());
    }

    #[tokio::test]
    async fn rejected_section_update_keeps_name() {
        let store = ScriptedStore::new();
        store.reply(Envelope::failed("Database error"));
        let b = board(&store);
        b.sections.finish_loading(Some(vec![section(11, 1, 0)]));

        let outcome = b.update_section(11, "Renamed", "note").await;

        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(b.sections().snapshot(), vec![section(11, 1, 0)]);
        assert_eq!(store.last_request().unwrap().1.get("name"), Some("Renamed"));
    }
}
