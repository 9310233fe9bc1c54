use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::Entity;
use super::temporal::Dated;
use crate::sync::wire;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TodoType {
    #[serde(rename = "仕事")]
    Work,
    #[serde(rename = "プライベート")]
    Private,
    #[serde(rename = "ルーティン")]
    Routine,
}

impl TodoType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Work => "仕事",
            Self::Private => "プライベート",
            Self::Routine => "ルーティン",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "仕事" => Some(Self::Work),
            "プライベート" => Some(Self::Private),
            "ルーティン" => Some(Self::Routine),
            _ => None,
        }
    }
}

/// A task. `project_id`/`section_id` of 0 mean unassigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(with = "wire::int")]
    pub id: i64,
    #[serde(with = "wire::date")]
    pub date: NaiveDate,
    #[serde(with = "wire::time")]
    pub time: NaiveTime,
    #[serde(rename = "type")]
    pub kind: TodoType,
    #[serde(with = "wire::int", default)]
    pub project_id: i64,
    #[serde(with = "wire::int", default)]
    pub section_id: i64,
    #[serde(with = "wire::int", default)]
    pub sort: i64,
    #[serde(with = "wire::text")]
    pub content: String,
    #[serde(with = "wire::time")]
    pub estimated: NaiveTime,
    #[serde(with = "wire::flag", default)]
    pub completed: bool,
    #[serde(with = "wire::text", default)]
    pub memo: String,
}

impl Entity for Todo {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Dated for Todo {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Todo {
    /// The confirmed record for a draft the store acknowledged under `id`.
    pub fn confirmed(id: i64, draft: &TodoDraft, project_id: i64, section_id: i64, sort: i64) -> Self {
        Self {
            id,
            date: draft.date,
            time: draft.time,
            kind: draft.kind,
            project_id,
            section_id,
            sort,
            content: draft.content.clone(),
            estimated: draft.estimated,
            completed: draft.completed,
            memo: draft.memo.clone(),
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.project_id == 0
    }
}

/// One worked interval of a todo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTaken {
    #[serde(with = "wire::int")]
    pub id: i64,
    #[serde(with = "wire::int")]
    pub todo_id: i64,
    #[serde(with = "wire::datetime")]
    pub start: NaiveDateTime,
    #[serde(with = "wire::datetime")]
    pub end: NaiveDateTime,
}

impl Entity for TimeTaken {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Dated for TimeTaken {
    fn date(&self) -> NaiveDate {
        self.start.date()
    }
}

/// A worked interval as entered in a form, relative to the todo's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSegment {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSegment {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Anchor the segment on `date` with the store-assigned id.
    pub fn confirmed(&self, id: i64, todo_id: i64, date: NaiveDate) -> TimeTaken {
        TimeTaken {
            id,
            todo_id,
            start: date.and_time(self.start),
            end: date.and_time(self.end),
        }
    }
}

/// Where a todo should land inside a project board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub project_id: i64,
    pub section_id: i64,
}

/// Unsaved todo as submitted from a form.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoDraft {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub kind: TodoType,
    pub placement: Placement,
    pub content: String,
    pub estimated: NaiveTime,
    pub completed: bool,
    pub memo: String,
    pub time_taken: Vec<TimeSegment>,
}

impl TodoDraft {
    pub fn new(date: NaiveDate, kind: TodoType, content: impl Into<String>) -> Self {
        Self {
            date,
            time: NaiveTime::MIN,
            kind,
            placement: Placement::default(),
            content: content.into(),
            estimated: NaiveTime::MIN,
            completed: false,
            memo: String::new(),
            time_taken: Vec::new(),
        }
    }
}

/// Total worked time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkedTime {
    pub hours: i64,
    pub minutes: i64,
    pub millis: i64,
}

/// Sum the segments worked on `date`, skipping any still ending at the midnight placeholder.
pub fn total_time_taken(segments: &[TimeTaken], date: NaiveDate) -> WorkedTime {
    let placeholder = date.and_time(NaiveTime::MIN);
    let millis: i64 = segments
        .iter()
        .filter(|s| s.end != placeholder)
        .map(|s| (s.end - s.start).num_milliseconds())
        .sum();
    let hour_ms = 60 * 60 * 1000;
    WorkedTime {
        hours: millis.div_euclid(hour_ms),
        minutes: (millis.rem_euclid(hour_ms) as f64 / 60_000.0).round() as i64,
        millis,
    }
}
