use chrono::NaiveDate;

use super::Outcome;
use super::board::{Board, created_id};
use super::codec::encode_memo;
use super::form::FormPayload;
use super::gateway::{Endpoint, TableType};
use super::wire::format_date;
use crate::core::memo::{Memo, MemoDraft, MemoEdit, MonthlyMemo, memo_for_month};
use crate::core::temporal::first_day_of_month;
use crate::core::validate;
use crate::error::ValidationError;

impl Board {
    pub async fn create_memo(&self, draft: &MemoDraft) -> Outcome<Memo> {
        if let Err(e) = validate::memo(draft) {
            return Outcome::Invalid(e);
        }
        let form = FormPayload::new()
            .with("action", "save")
            .with("name", &draft.name)
            .with("memo", encode_memo(&draft.memo));
        let Some(ack) = self.gateway.send(Endpoint::Memo, form).await else {
            return Outcome::Rejected;
        };
        let Some(id) = created_id(Endpoint::Memo, &ack) else {
            return Outcome::Rejected;
        };
        let memo = Memo {
            id,
            name: draft.name.clone(),
            memo: draft.memo.clone(),
            sort: 0,
        };
        self.memos.push(memo.clone());
        Outcome::Applied(memo)
    }

    pub async fn update_memo(&self, id: i64, edit: MemoEdit) -> Outcome<Memo> {
        let (checked, value) = match &edit {
            MemoEdit::Name(name) => (validate::name(name), name.clone()),
            MemoEdit::Memo(text) => (validate::memo_text(text), encode_memo(text)),
        };
        if let Err(e) = checked {
            return Outcome::Invalid(e);
        }
        if !self.memos.contains(id) {
            return Outcome::Invalid(ValidationError::new("id", format!("no memo with id {}", id)));
        }
        let form = FormPayload::new()
            .with("action", "update")
            .with("id", id)
            .with("type", edit.field())
            .with(edit.field(), value);
        if self.gateway.send(Endpoint::Memo, form).await.is_none() {
            return Outcome::Rejected;
        }
        self.memos.update(id, |m| m.apply(&edit));
        match self.memos.get(id) {
            Some(memo) => Outcome::Applied(memo),
            None => Outcome::Rejected,
        }
    }

    pub async fn delete_memo(&self, id: i64) -> Outcome {
        if !self.send_delete(TableType::Memo, &[id]).await {
            return Outcome::Rejected;
        }
        self.memos.remove(id);
        Outcome::Applied(())
    }

    pub fn monthly_memo(&self, month: NaiveDate) -> Option<MonthlyMemo> {
        self.monthly_memos
            .with(|memos| memo_for_month(memos, month).cloned())
    }

    /// Write the note for the month containing `month`: create it when the
    /// month has none, otherwise update it. Unchanged text sends nothing.
    pub async fn save_monthly_memo(&self, month: NaiveDate, text: &str) -> Outcome<MonthlyMemo> {
        if let Err(e) = validate::memo_text(text) {
            return Outcome::Invalid(e);
        }
        match self.monthly_memo(month) {
            Some(existing) if existing.memo == text => Outcome::Applied(existing),
            Some(existing) => {
                let form = FormPayload::new()
                    .with("action", "update")
                    .with("id", existing.id)
                    .with("date", format_date(existing.date))
                    .with("memo", encode_memo(text));
                if self.gateway.send(Endpoint::MonthlyMemo, form).await.is_none() {
                    return Outcome::Rejected;
                }
                let updated = MonthlyMemo {
                    memo: text.to_string(),
                    ..existing
                };
                self.monthly_memos.update(updated.id, |m| m.memo = updated.memo.clone());
                Outcome::Applied(updated)
            }
            None => {
                let date = first_day_of_month(month);
                let form = FormPayload::new()
                    .with("action", "save")
                    .with("date", format_date(date))
                    .with("memo", encode_memo(text));
                let Some(ack) = self.gateway.send(Endpoint::MonthlyMemo, form).await else {
                    return Outcome::Rejected;
                };
                let Some(id) = created_id(Endpoint::MonthlyMemo, &ack) else {
                    return Outcome::Rejected;
                };
                let created = MonthlyMemo {
                    id,
                    date,
                    memo: text.to_string(),
                };
                self.monthly_memos.push(created.clone());
                Outcome::Applied(created)
            }
        }
    }
}
