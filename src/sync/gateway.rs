//! The remote store boundary.
//!
//! [`RemoteStore`] is the transport seam: one form-encoded request in, one
//! decoded envelope out. [`Gateway`] sits on top of it, attaches the session
//! to every mutating call and turns every failure into "no result" plus a log
//! line, so nothing above it ever handles a transport error.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, PoisonError, RwLock};

use super::codec;
use super::form::FormPayload;
use super::session::Session;
use super::wire;
use crate::config::BoardConfig;
use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Todo,
    Money,
    Health,
    Project,
    Section,
    Memo,
    MonthlyMemo,
    Delete,
    Sort,
    Completed,
    Fetch,
    Login,
    Auth,
    Logout,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Money => "money",
            Self::Health => "health",
            Self::Project => "project",
            Self::Section => "section",
            Self::Memo => "memo",
            Self::MonthlyMemo => "monthlyMemo",
            Self::Delete => "delete",
            Self::Sort => "sort",
            Self::Completed => "completed",
            Self::Fetch => "fetch",
            Self::Login => "login",
            Self::Auth => "auth",
            Self::Logout => "logout",
        }
    }
}

/// Entity kind as named by the fetch, delete and sort endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableType {
    Todo,
    TimeTaken,
    Section,
    Project,
    Money,
    Health,
    Memo,
    MonthlyMemo,
}

impl TableType {
    pub const ALL: [TableType; 8] = [
        TableType::Todo,
        TableType::TimeTaken,
        TableType::Section,
        TableType::Project,
        TableType::Money,
        TableType::Health,
        TableType::Memo,
        TableType::MonthlyMemo,
    ];

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::TimeTaken => "timeTaken",
            Self::Section => "section",
            Self::Project => "project",
            Self::Money => "money",
            Self::Health => "health",
            Self::Memo => "memo",
            Self::MonthlyMemo => "monthlyMemo",
        }
    }

    /// Kinds whose `memo` column is stored encoded.
    pub fn has_encoded_memo(&self) -> bool {
        matches!(self, Self::Project | Self::Memo | Self::MonthlyMemo)
    }
}

/// Response body shared by every endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(with = "wire::flag", default)]
    pub success: bool,
    #[serde(with = "wire::text", default)]
    pub error: String,
    #[serde(with = "wire::opt_int", default)]
    pub id: Option<i64>,
    #[serde(with = "wire::int_list", default)]
    pub time_taken_ids: Vec<i64>,
    #[serde(default)]
    pub data: Option<Vec<serde_json::Value>>,
    #[serde(with = "wire::opt_int", default)]
    pub user_id: Option<i64>,
    #[serde(with = "wire::text", default)]
    pub csrf_token: String,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_time_taken_ids(mut self, ids: Vec<i64>) -> Self {
        self.time_taken_ids = ids;
        self
    }

    pub fn with_data(mut self, rows: Vec<serde_json::Value>) -> Self {
        self.data = Some(rows);
        self
    }
}

/// What a successful mutation acknowledged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    pub id: Option<i64>,
    pub time_taken_ids: Vec<i64>,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn post(&self, endpoint: Endpoint, form: &FormPayload) -> SyncResult<Envelope>;

    async fn get(&self, endpoint: Endpoint) -> SyncResult<Envelope>;
}

/// [`RemoteStore`] over HTTP. Keeps the session cookie between requests.
#[derive(Clone)]
pub struct HttpStore {
    config: BoardConfig,
    http: Client,
}

impl HttpStore {
    pub fn new(config: &BoardConfig) -> SyncResult<Self> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            config: config.clone(),
            http,
        })
    }

    async fn decode(&self, endpoint: Endpoint, resp: reqwest::Response) -> SyncResult<Envelope> {
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Status(status.as_u16()));
        }
        let text = resp.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| SyncError::decode(format!("{} response: {}", endpoint.name(), e)))
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn post(&self, endpoint: Endpoint, form: &FormPayload) -> SyncResult<Envelope> {
        let url = self.config.endpoint_url(endpoint);
        log::debug!("POST {} ({} fields)", url, form.len());
        let resp = self.http.post(&url).form(form.pairs()).send().await?;
        self.decode(endpoint, resp).await
    }

    async fn get(&self, endpoint: Endpoint) -> SyncResult<Envelope> {
        let url = self.config.endpoint_url(endpoint);
        log::debug!("GET {}", url);
        let resp = self.http.get(&url).send().await?;
        self.decode(endpoint, resp).await
    }
}

pub struct Gateway {
    store: Arc<dyn RemoteStore>,
    session: RwLock<Option<Session>>,
}

impl Gateway {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            session: RwLock::new(None),
        }
    }

    pub fn with_session(store: Arc<dyn RemoteStore>, session: Session) -> Self {
        Self {
            store,
            session: RwLock::new(Some(session)),
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_session(&self, session: Option<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// One round trip; a `success: false` envelope becomes [`SyncError::Rejected`].
    pub(crate) async fn exchange(&self, endpoint: Endpoint, form: &FormPayload) -> SyncResult<Envelope> {
        accept(self.store.post(endpoint, form).await?)
    }

    pub(crate) async fn exchange_get(&self, endpoint: Endpoint) -> SyncResult<Envelope> {
        accept(self.store.get(endpoint).await?)
    }

    fn signed(&self, mut form: FormPayload) -> SyncResult<FormPayload> {
        let session = self
            .session()
            .ok_or_else(|| SyncError::rejected("not logged in"))?;
        form.push("userId", session.user_id)
            .push("csrfToken", &session.csrf_token);
        Ok(form)
    }

    /// Send a mutation. `None` means nothing was acknowledged; the cause is logged.
    pub async fn send(&self, endpoint: Endpoint, form: FormPayload) -> Option<Ack> {
        match self.try_send(endpoint, form).await {
            Ok(ack) => Some(ack),
            Err(e) => {
                log::error!("{} request failed: {}", endpoint.name(), e);
                None
            }
        }
    }

    async fn try_send(&self, endpoint: Endpoint, form: FormPayload) -> SyncResult<Ack> {
        let form = self.signed(form)?;
        let envelope = self.exchange(endpoint, &form).await?;
        Ok(Ack {
            id: envelope.id,
            time_taken_ids: envelope.time_taken_ids,
        })
    }

    /// All rows of one kind, memo columns decoded. `None` on any failure.
    pub async fn fetch<T: DeserializeOwned>(&self, table: TableType) -> Option<Vec<T>> {
        match self.try_fetch(table).await {
            Ok(rows) => Some(rows),
            Err(e) => {
                log::error!("fetching {} failed: {}", table.as_wire(), e);
                None
            }
        }
    }

    async fn try_fetch<T: DeserializeOwned>(&self, table: TableType) -> SyncResult<Vec<T>> {
        let form = self.signed(FormPayload::new().with("tableType", table.as_wire()))?;
        let envelope = self.exchange(Endpoint::Fetch, &form).await?;
        let mut rows = envelope.data.unwrap_or_default();
        if table.has_encoded_memo() {
            codec::decode_rows(&mut rows);
        }
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| SyncError::decode(format!("{} row: {}", table.as_wire(), e)))
            })
            .collect()
    }
}

fn accept(envelope: Envelope) -> SyncResult<Envelope> {
    if envelope.success {
        return Ok(envelope);
    }
    if envelope.error.is_empty() {
        Err(SyncError::rejected("no reason given"))
    } else {
        Err(SyncError::Rejected(envelope.error))
    }
}
