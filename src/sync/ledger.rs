use super::Outcome;
use super::board::{Board, created_id};
use super::form::FormPayload;
use super::gateway::{Endpoint, TableType};
use super::wire::format_date;
use crate::core::money::{Money, MoneyDraft};
use crate::core::validate;
use crate::error::ValidationError;

fn money_form(draft: &MoneyDraft) -> FormPayload {
    FormPayload::new()
        .with("date", format_date(draft.date))
        .with("type", draft.kind.as_wire())
        .with("category", draft.category.as_wire())
        .with("amount", draft.amount)
        .with("content", &draft.content)
}

impl Board {
    pub async fn create_money(&self, draft: &MoneyDraft) -> Outcome<Money> {
        if let Err(e) = validate::money(draft) {
            return Outcome::Invalid(e);
        }
        let form = money_form(draft).with("action", "save");
        let Some(ack) = self.gateway.send(Endpoint::Money, form).await else {
            return Outcome::Rejected;
        };
        let Some(id) = created_id(Endpoint::Money, &ack) else {
            return Outcome::Rejected;
        };
        let entry = draft.confirmed(id);
        self.money.push(entry.clone());
        log::debug!("Recorded money entry {}", id);
        Outcome::Applied(entry)
    }

    pub async fn update_money(&self, id: i64, draft: &MoneyDraft) -> Outcome<Money> {
        if let Err(e) = validate::money(draft) {
            return Outcome::Invalid(e);
        }
        if !self.money.contains(id) {
            return Outcome::Invalid(ValidationError::new("id", format!("no money entry with id {}", id)));
        }
        let form = money_form(draft).with("action", "update").with("id", id);
        if self.gateway.send(Endpoint::Money, form).await.is_none() {
            return Outcome::Rejected;
        }
        let entry = draft.confirmed(id);
        self.money.update(id, |m| *m = entry.clone());
        Outcome::Applied(entry)
    }

    pub async fn delete_money(&self, id: i64) -> Outcome {
        self.delete_money_many(&[id]).await
    }

    /// Delete several entries in one request. All of them go or none do.
    pub async fn delete_money_many(&self, ids: &[i64]) -> Outcome {
        if ids.is_empty() {
            return Outcome::Invalid(ValidationError::new("id", "nothing selected"));
        }
        if !self.send_delete(TableType::Money, ids).await {
            return Outcome::Rejected;
        }
        self.money.retain(|m| !ids.contains(&m.id));
        log::debug!("Deleted {} money entries", ids.len());
        Outcome::Applied(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::money::{MoneyCategory, MoneyKind};
    use crate::sync::board::tests::board;
    use crate::sync::gateway::Envelope;
    use crate::sync::testing::ScriptedStore;
    use chrono::NaiveDate;

    fn draft(amount: i64) -> MoneyDraft {
        MoneyDraft {
            date: NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            kind: MoneyKind::Expense,
            category: MoneyCategory::Food,
            amount,
            content: "lunch".into(),
        }
    }

    #[tokio::test]
    async fn create_uses_returned_id() {
        let store = ScriptedStore::new();
        store.reply(Envelope::ok().with_id(55));
        let b = board(&store);

        let entry = b.create_money(&draft(1200)).await.applied().unwrap();

        assert_eq!(entry.id, 55);
        assert_eq!(b.money().get(55), Some(entry));
        let (_, form) = store.last_request().unwrap();
        assert_eq!(form.get("category"), Some("食費"));
        assert_eq!(form.get("amount"), Some("1200"));
    }

    #[tokio::test]
    async fn update_merges_by_id() {
        let store = ScriptedStore::new();
        let b = board(&store);
        b.money.finish_loading(Some(vec![draft(100).confirmed(1), draft(200).confirmed(2)]));

        assert!(b.update_money(2, &draft(250)).await.is_applied());

        let amounts: Vec<i64> = b.money().snapshot().iter().map(|m| m.amount).collect();
        assert_eq!(amounts, vec![100, 250]);
    }

    #[tokio::test]
    async fn bulk_delete_is_all_or_nothing() {
        let store = ScriptedStore::new();
        store.reply(Envelope::failed("Database error"));
        let b = board(&store);
        b.money.finish_loading(Some(vec![
            draft(1).confirmed(1),
            draft(2).confirmed(2),
            draft(3).confirmed(3),
        ]));

        assert_eq!(b.delete_money_many(&[1, 3]).await, Outcome::Rejected);
        assert_eq!(b.money().len(), 3);

        assert!(b.delete_money_many(&[1, 3]).await.is_applied());
        assert_eq!(b.money().snapshot().iter().map(|m| m.id).collect::<Vec<_>>(), vec![2]);
        assert!(matches!(b.delete_money_many(&[]).await, Outcome::Invalid(_)));
    }

    #[tokio::test]
    async fn rejected_create_adds_nothing() {
        let store = ScriptedStore::new();
        store.reply(Envelope::failed("Database error"));
        let b = board(&store);

        assert_eq!(b.create_money(&draft(900)).await, Outcome::Rejected);

        assert!(b.money().is_empty());
        assert!(b.money().is_loading());
    }

    #[tokio::test]
    async fn rejected_update_keeps_entry() {
        let store = ScriptedStore::new();
        store.reply(Envelope::failed("Database error"));
        let b = board(&store);
        b.money.finish_loading(Some(vec![draft(100).confirmed(1)]));
        let before = b.money().snapshot();

        assert_eq!(b.update_money(1, &draft(250)).await, Outcome::Rejected);

        assert_eq!(b.money().snapshot(), before);
        assert!(!b.money().is_loading());
    }
}
