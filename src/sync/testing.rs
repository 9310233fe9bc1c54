//! In-memory [`RemoteStore`] for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::form::FormPayload;
use super::gateway::{Endpoint, Envelope, RemoteStore};
use crate::error::{SyncError, SyncResult};

/// Records every request and answers from a queue of scripted replies.
/// An empty queue answers with a bare success.
#[derive(Default)]
pub(crate) struct ScriptedStore {
    requests: Mutex<Vec<(Endpoint, FormPayload)>>,
    replies: Mutex<VecDeque<SyncResult<Envelope>>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pub arrived: Notify,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, envelope: Envelope) {
        self.replies.lock().unwrap().push_back(Ok(envelope));
    }

    pub fn fail(&self, error: SyncError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Park every following request until the returned handle is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn release(&self) {
        *self.gate.lock().unwrap() = None;
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<(Endpoint, FormPayload)> {
        self.requests.lock().unwrap().last().cloned()
    }

    async fn answer(&self, endpoint: Endpoint, form: FormPayload) -> SyncResult<Envelope> {
        self.requests.lock().unwrap().push((endpoint, form));
        self.arrived.notify_one();
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Envelope::ok()))
    }
}

#[async_trait]
impl RemoteStore for ScriptedStore {
    async fn post(&self, endpoint: Endpoint, form: &FormPayload) -> SyncResult<Envelope> {
        self.answer(endpoint, form.clone()).await
    }

    async fn get(&self, endpoint: Endpoint) -> SyncResult<Envelope> {
        self.answer(endpoint, FormPayload::new()).await
    }
}
