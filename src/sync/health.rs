use super::Outcome;
use super::board::{Board, created_id};
use super::form::FormPayload;
use super::gateway::{Endpoint, TableType};
use super::wire::{format_date, format_datetime};
use crate::core::health::{Health, HealthDraft};
use crate::core::validate;
use crate::error::ValidationError;

fn health_form(draft: &HealthDraft) -> FormPayload {
    let mut form = FormPayload::new();
    form.push("date", format_date(draft.date))
        .push("upTime", format_datetime(draft.up_time))
        .push("bedTime", format_datetime(draft.bed_time))
        .push("body", draft.body.trim());
    // flags go as "true"/"false"
    for (name, on) in draft.symptoms.fields() {
        form.push(name, on);
    }
    form.push("memo", &draft.memo);
    form
}

impl Board {
    pub async fn create_health(&self, draft: &HealthDraft) -> Outcome<Health> {
        if let Err(e) = validate::health(draft) {
            return Outcome::Invalid(e);
        }
        let form = health_form(draft).with("action", "save");
        let Some(ack) = self.gateway.send(Endpoint::Health, form).await else {
            return Outcome::Rejected;
        };
        let Some(id) = created_id(Endpoint::Health, &ack) else {
            return Outcome::Rejected;
        };
        let entry = draft.confirmed(id);
        self.health.push(entry.clone());
        log::debug!("Recorded health log {} for {}", id, draft.date);
        Outcome::Applied(entry)
    }

    pub async fn update_health(&self, id: i64, draft: &HealthDraft) -> Outcome<Health> {
        if let Err(e) = validate::health(draft) {
            return Outcome::Invalid(e);
        }
        if !self.health.contains(id) {
            return Outcome::Invalid(ValidationError::new("id", format!("no health log with id {}", id)));
        }
        let form = health_form(draft).with("action", "update").with("id", id);
        if self.gateway.send(Endpoint::Health, form).await.is_none() {
            return Outcome::Rejected;
        }
        let entry = draft.confirmed(id);
        self.health.update(id, |h| *h = entry.clone());
        Outcome::Applied(entry)
    }

    pub async fn delete_health(&self, id: i64) -> Outcome {
        self.delete_health_many(&[id]).await
    }

    pub async fn delete_health_many(&self, ids: &[i64]) -> Outcome {
        if ids.is_empty() {
            return Outcome::Invalid(ValidationError::new("id", "nothing selected"));
        }
        if !self.send_delete(TableType::Health, ids).await {
            return Outcome::Rejected;
        }
        self.health.retain(|h| !ids.contains(&h.id));
        log::debug!("Deleted {} health logs", ids.len());
        Outcome::Applied(())
    }
}
