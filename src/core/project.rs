use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Entity;
use super::todo::Todo;
use crate::sync::wire;

/// Section id of the synthetic bucket holding a project's unsectioned tasks.
pub const UNSECTIONED: i64 = 0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(with = "wire::int")]
    pub id: i64,
    #[serde(with = "wire::text")]
    pub name: String,
    #[serde(with = "wire::opt_date", default)]
    pub end: Option<NaiveDate>,
    #[serde(with = "wire::flag", default)]
    pub completed: bool,
    #[serde(with = "wire::text", default)]
    pub memo: String,
}

impl Entity for Project {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Project {
    /// Tasks of this project, completed or not.
    pub fn tasks<'a>(&self, todos: &'a [Todo]) -> Vec<&'a Todo> {
        todos.iter().filter(|t| t.project_id == self.id).collect()
    }

    pub fn completion_ratio(&self, todos: &[Todo]) -> (usize, usize) {
        let tasks = self.tasks(todos);
        let done = tasks.iter().filter(|t| t.completed).count();
        (done, tasks.len())
    }

    pub fn apply(&mut self, edit: &ProjectEdit) {
        match edit {
            ProjectEdit::Name(name) => self.name = name.clone(),
            ProjectEdit::End(end) => self.end = *end,
            ProjectEdit::Completed(done) => self.completed = *done,
            ProjectEdit::Memo(memo) => self.memo = memo.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub end: Option<NaiveDate>,
    pub completed: bool,
    pub memo: String,
}

impl ProjectDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            end: None,
            completed: false,
            memo: String::new(),
        }
    }
}

/// A single-field project update; the store updates one column at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectEdit {
    Name(String),
    End(Option<NaiveDate>),
    Completed(bool),
    Memo(String),
}

impl ProjectEdit {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::End(_) => "end",
            Self::Completed(_) => "completed",
            Self::Memo(_) => "memo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(with = "wire::int")]
    pub id: i64,
    #[serde(with = "wire::int")]
    pub project_id: i64,
    #[serde(with = "wire::text")]
    pub name: String,
    #[serde(with = "wire::int", default)]
    pub sort: i64,
    #[serde(with = "wire::text", default)]
    pub memo: String,
}

impl Entity for Section {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionDraft {
    pub project_id: i64,
    pub name: String,
    pub memo: String,
}

impl SectionDraft {
    pub fn new(project_id: i64, name: impl Into<String>) -> Self {
        Self {
            project_id,
            name: name.into(),
            memo: String::new(),
        }
    }
}

/// Sections of a project in board order.
pub fn project_sections(sections: &[Section], project_id: i64) -> Vec<Section> {
    let mut out: Vec<Section> = sections
        .iter()
        .filter(|s| s.project_id == project_id)
        .cloned()
        .collect();
    out.sort_by_key(|s| (s.sort, s.id));
    out
}
