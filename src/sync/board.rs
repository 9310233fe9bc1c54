//! The client-side view of everything the remote store holds for one user.
//!
//! A [`Board`] owns one [`Collection`] per entity kind. Operations live in the
//! per-kind modules as `impl Board` blocks and all follow one shape: check the
//! draft, send through the [`Gateway`], and splice the collections only once
//! the store has acknowledged.
//!
//! When one operation writes several collections it takes their write locks
//! together in this order: projects, sections, todos, time taken.

use futures::future::join_all;
use serde::de::DeserializeOwned;

use super::collection::Collection;
use super::form::FormPayload;
use super::gateway::{Ack, Endpoint, Gateway, TableType};
use super::reorder::ReorderEngine;
use crate::core::Entity;
use crate::core::health::Health;
use crate::core::memo::{Memo, MonthlyMemo};
use crate::core::money::Money;
use crate::core::project::{Project, Section};
use crate::core::todo::{TimeTaken, Todo};

pub struct Board {
    pub(crate) gateway: Gateway,
    pub(crate) todos: Collection<Todo>,
    pub(crate) time_taken: Collection<TimeTaken>,
    pub(crate) sections: Collection<Section>,
    pub(crate) projects: Collection<Project>,
    pub(crate) money: Collection<Money>,
    pub(crate) health: Collection<Health>,
    pub(crate) memos: Collection<Memo>,
    pub(crate) monthly_memos: Collection<MonthlyMemo>,
    pub(crate) task_drag: ReorderEngine,
    pub(crate) section_drag: ReorderEngine,
}

impl Board {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            todos: Collection::new(),
            time_taken: Collection::new(),
            sections: Collection::new(),
            projects: Collection::new(),
            money: Collection::new(),
            health: Collection::new(),
            memos: Collection::new(),
            monthly_memos: Collection::new(),
            task_drag: ReorderEngine::new(),
            section_drag: ReorderEngine::new(),
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn todos(&self) -> &Collection<Todo> {
        &self.todos
    }

    pub fn time_taken(&self) -> &Collection<TimeTaken> {
        &self.time_taken
    }

    pub fn sections(&self) -> &Collection<Section> {
        &self.sections
    }

    pub fn projects(&self) -> &Collection<Project> {
        &self.projects
    }

    pub fn money(&self) -> &Collection<Money> {
        &self.money
    }

    pub fn health(&self) -> &Collection<Health> {
        &self.health
    }

    pub fn memos(&self) -> &Collection<Memo> {
        &self.memos
    }

    pub fn monthly_memos(&self) -> &Collection<MonthlyMemo> {
        &self.monthly_memos
    }

    /// Whether any collection is still waiting for its first fetch to settle.
    pub fn is_loading(&self) -> bool {
        self.todos.is_loading()
            || self.time_taken.is_loading()
            || self.sections.is_loading()
            || self.projects.is_loading()
            || self.money.is_loading()
            || self.health.is_loading()
            || self.memos.is_loading()
            || self.monthly_memos.is_loading()
    }

    /// Replace one collection with the store's rows. Returns whether the fetch
    /// succeeded; the collection stops loading either way and keeps its old
    /// contents on failure.
    pub async fn fetch(&self, table: TableType) -> bool {
        match table {
            TableType::Todo => self.load(table, &self.todos).await,
            TableType::TimeTaken => self.load(table, &self.time_taken).await,
            TableType::Section => self.load(table, &self.sections).await,
            TableType::Project => self.load(table, &self.projects).await,
            TableType::Money => self.load(table, &self.money).await,
            TableType::Health => self.load(table, &self.health).await,
            TableType::Memo => self.load(table, &self.memos).await,
            TableType::MonthlyMemo => self.load(table, &self.monthly_memos).await,
        }
    }

    /// Fetch every kind concurrently. Returns the kinds that failed.
    pub async fn fetch_all(&self) -> Vec<TableType> {
        let results = join_all(TableType::ALL.iter().map(|table| self.fetch(*table))).await;
        TableType::ALL
            .iter()
            .zip(results)
            .filter(|(_, ok)| !ok)
            .map(|(table, _)| *table)
            .collect()
    }

    async fn load<T>(&self, table: TableType, collection: &Collection<T>) -> bool
    where
        T: Entity + DeserializeOwned,
    {
        let rows = self.gateway.fetch::<T>(table).await;
        let ok = rows.is_some();
        if let Some(rows) = &rows {
            log::debug!("Loaded {} {} rows", rows.len(), table.as_wire());
        }
        collection.finish_loading(rows);
        ok
    }

    /// Delete one row, or several at once through the indexed form.
    pub(crate) async fn send_delete(&self, table: TableType, ids: &[i64]) -> bool {
        let mut form = FormPayload::new().with("tableType", table.as_wire());
        match ids {
            [id] => {
                form.push("id", id);
            }
            _ => {
                form.push_list("id", ids);
            }
        }
        self.gateway.send(Endpoint::Delete, form).await.is_some()
    }
}

/// The id a create acknowledged. A create acknowledged without one is treated
/// as not applied.
pub(crate) fn created_id(endpoint: Endpoint, ack: &Ack) -> Option<i64> {
    match ack.id {
        Some(id) if id > 0 => Some(id),
        _ => {
            log::error!("{} save was acknowledged without an id", endpoint.name());
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sync::gateway::Envelope;
    use crate::sync::session::Session;
    use crate::sync::testing::ScriptedStore;
    use std::sync::Arc;

    pub(crate) fn board(store: &Arc<ScriptedStore>) -> Board {
        Board::new(Gateway::with_session(store.clone(), Session::new(1, "csrf")))
    }

    #[tokio::test]
    async fn fetch_populates_and_clears_loading() {
        let store = ScriptedStore::new();
        store.reply(Envelope::ok().with_data(vec![serde_json::json!({
            "id": "3", "date": "2024-02-01", "type": "収入", "category": "給与",
            "amount": "1000", "content": "pay"
        })]));
        let b = board(&store);
        assert!(b.money().is_loading());

        assert!(b.fetch(TableType::Money).await);

        assert!(!b.money().is_loading());
        assert_eq!(b.money().len(), 1);
        assert_eq!(store.last_request().unwrap().1.get("tableType"), Some("money"));
    }

    #[tokio::test]
    async fn failed_fetch_still_clears_loading() {
        let store = ScriptedStore::new();
        store.reply(Envelope::failed("Database error"));
        let b = board(&store);

        assert!(!b.fetch(TableType::Health).await);

        assert!(!b.health().is_loading());
        assert!(b.health().is_empty());
    }

    #[tokio::test]
    async fn fetch_all_reports_failures() {
        let store = ScriptedStore::new();
        let b = board(&store);
        store.reply(Envelope::ok().with_data(vec![]));
        store.reply(Envelope::failed("boom"));

        let failed = b.fetch_all().await;

        assert_eq!(store.request_count(), TableType::ALL.len());
        assert_eq!(failed.len(), 1);
        assert!(!b.is_loading());
    }

    #[tokio::test]
    async fn delete_uses_indexed_ids_for_bulk() {
        let store = ScriptedStore::new();
        let b = board(&store);

        assert!(b.send_delete(TableType::Money, &[4]).await);
        let (_, single) = store.last_request().unwrap();
        assert_eq!(single.get("id"), Some("4"));

        assert!(b.send_delete(TableType::Money, &[4, 5]).await);
        let (endpoint, bulk) = store.last_request().unwrap();
        assert_eq!(endpoint, Endpoint::Delete);
        assert_eq!(bulk.get("id"), None);
        assert_eq!(bulk.get("id[1]"), Some("5"));
        assert_eq!(bulk.get("tableType"), Some("money"));
    }
}
