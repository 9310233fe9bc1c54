use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Entity;
use super::temporal::Dated;
use crate::sync::wire;

/// A free-standing named note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memo {
    #[serde(with = "wire::int")]
    pub id: i64,
    #[serde(with = "wire::text", default)]
    pub name: String,
    #[serde(with = "wire::text", default)]
    pub memo: String,
    #[serde(with = "wire::int", default)]
    pub sort: i64,
}

impl Entity for Memo {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Memo {
    pub fn apply(&mut self, edit: &MemoEdit) {
        match edit {
            MemoEdit::Name(name) => self.name = name.clone(),
            MemoEdit::Memo(text) => self.memo = text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoDraft {
    pub name: String,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemoEdit {
    Name(String),
    Memo(String),
}

impl MemoEdit {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Memo(_) => "memo",
        }
    }
}

/// The note attached to a calendar month, dated on any day of that month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMemo {
    #[serde(with = "wire::int")]
    pub id: i64,
    #[serde(with = "wire::date")]
    pub date: NaiveDate,
    #[serde(with = "wire::text", default)]
    pub memo: String,
}

impl Entity for MonthlyMemo {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Dated for MonthlyMemo {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

pub fn memo_for_month(memos: &[MonthlyMemo], month: NaiveDate) -> Option<&MonthlyMemo> {
    memos
        .iter()
        .find(|m| m.date.year() == month.year() && m.date.month() == month.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_memo_by_month_not_day() {
        let memos = vec![
            MonthlyMemo { id: 1, date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), memo: "jan".into() },
            MonthlyMemo { id: 2, date: NaiveDate::from_ymd_opt(2024, 2, 14).unwrap(), memo: "feb".into() },
        ];
        let feb = memo_for_month(&memos, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(feb.map(|m| m.id), Some(2));
        assert!(memo_for_month(&memos, NaiveDate::from_ymd_opt(2023, 2, 1).unwrap()).is_none());
    }

    #[test]
    fn edit_by_field() {
        let mut memo = Memo { id: 1, name: "ideas".into(), memo: String::new(), sort: 0 };
        memo.apply(&MemoEdit::Memo("buy plants".into()));
        assert_eq!(memo.memo, "buy plants");
        assert_eq!(memo.name, "ideas");
    }
}
