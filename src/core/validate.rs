//! Rules checked on drafts before anything is sent to the remote store.

use regex::Regex;
use std::sync::LazyLock;

use super::health::HealthDraft;
use super::memo::MemoDraft;
use super::money::MoneyDraft;
use super::project::{ProjectDraft, SectionDraft};
use super::todo::TodoDraft;
use crate::error::ValidationError;

pub const CONTENT_MAX: usize = 100;
pub const NAME_MAX: usize = 100;
pub const MEMO_MAX: usize = 500;

static BODY_WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d*\.?\d*$").unwrap());
static CREDENTIAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

type Checked = Result<(), ValidationError>;

fn required(field: &str, value: &str, max: usize) -> Checked {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if value.chars().count() > max {
        return Err(ValidationError::new(field, format!("must be at most {} characters", max)));
    }
    Ok(())
}

fn at_most(field: &str, value: &str, max: usize) -> Checked {
    if value.chars().count() > max {
        return Err(ValidationError::new(field, format!("must be at most {} characters", max)));
    }
    Ok(())
}

pub fn todo(draft: &TodoDraft) -> Checked {
    required("content", &draft.content, CONTENT_MAX)?;
    at_most("memo", &draft.memo, MEMO_MAX)?;
    for (i, segment) in draft.time_taken.iter().enumerate() {
        if segment.end != chrono::NaiveTime::MIN && segment.end < segment.start {
            return Err(ValidationError::new(
                format!("timeTaken[{}]", i),
                "end must not be before start",
            ));
        }
    }
    Ok(())
}

pub fn project(draft: &ProjectDraft) -> Checked {
    required("name", &draft.name, NAME_MAX)?;
    at_most("memo", &draft.memo, MEMO_MAX)
}

pub fn name(name: &str) -> Checked {
    required("name", name, NAME_MAX)
}

pub fn section(draft: &SectionDraft) -> Checked {
    required("name", &draft.name, NAME_MAX)?;
    at_most("memo", &draft.memo, MEMO_MAX)
}

pub fn memo(draft: &MemoDraft) -> Checked {
    required("name", &draft.name, NAME_MAX)?;
    at_most("memo", &draft.memo, MEMO_MAX)
}

pub fn memo_text(text: &str) -> Checked {
    at_most("memo", text, MEMO_MAX)
}

pub fn money(draft: &MoneyDraft) -> Checked {
    if draft.amount < 1 {
        return Err(ValidationError::new("amount", "must be at least 1"));
    }
    if !draft.category.belongs_to(draft.kind) {
        return Err(ValidationError::new(
            "category",
            format!("{} is not a {} category", draft.category.as_wire(), draft.kind.as_wire()),
        ));
    }
    at_most("content", &draft.content, CONTENT_MAX)
}

pub fn health(draft: &HealthDraft) -> Checked {
    if !BODY_WEIGHT_RE.is_match(draft.body.trim()) {
        return Err(ValidationError::new("body", "must be a number"));
    }
    if draft.symptoms.other && draft.memo.trim().is_empty() {
        return Err(ValidationError::new("memo", "describe the other symptom"));
    }
    at_most("memo", &draft.memo, MEMO_MAX)
}

pub fn credentials(user_name: &str, password: &str) -> Checked {
    if !CREDENTIAL_RE.is_match(user_name) {
        return Err(ValidationError::new("userName", "must be letters and digits only"));
    }
    if !CREDENTIAL_RE.is_match(password) {
        return Err(ValidationError::new("password", "must be letters and digits only"));
    }
    Ok(())
}
