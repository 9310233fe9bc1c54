use super::form::FormPayload;
use super::gateway::{Endpoint, Envelope, Gateway};
use crate::core::validate;
use crate::error::{SyncError, SyncResult};

/// Identity attached to every mutating request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub csrf_token: String,
}

impl Session {
    pub fn new(user_id: i64, csrf_token: impl Into<String>) -> Self {
        Self {
            user_id,
            csrf_token: csrf_token.into(),
        }
    }

    fn from_envelope(envelope: &Envelope) -> SyncResult<Self> {
        let user_id = envelope
            .user_id
            .ok_or_else(|| SyncError::decode("session response has no userId"))?;
        if envelope.csrf_token.is_empty() {
            return Err(SyncError::decode("session response has no csrfToken"));
        }
        Ok(Self::new(user_id, envelope.csrf_token.clone()))
    }
}

impl Gateway {
    /// Log in and keep the resulting session for later requests.
    pub async fn login(&self, user_name: &str, password: &str) -> SyncResult<Session> {
        let user_name = user_name.trim();
        let password = password.trim();
        validate::credentials(user_name, password)?;
        let form = FormPayload::new()
            .with("userName", user_name)
            .with("password", password);
        let session = Session::from_envelope(&self.exchange(Endpoint::Login, &form).await?)?;
        log::info!("Logged in as user {}", session.user_id);
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    /// Restore the session from the login cookie held by the HTTP client.
    pub async fn authenticate(&self) -> SyncResult<Session> {
        let session = Session::from_envelope(&self.exchange_get(Endpoint::Auth).await?)?;
        log::info!("Session restored for user {}", session.user_id);
        self.set_session(Some(session.clone()));
        Ok(session)
    }

    /// End the session. The local session is dropped even if the store refuses.
    pub async fn logout(&self) -> SyncResult<()> {
        let result = self.exchange(Endpoint::Logout, &FormPayload::new()).await;
        self.set_session(None);
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::ScriptedStore;

    fn session_envelope() -> Envelope {
        Envelope {
            success: true,
            user_id: Some(4),
            csrf_token: "abc".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn login_stores_session() {
        let store = ScriptedStore::new();
        store.reply(session_envelope());
        let gw = Gateway::new(store.clone());

        let session = gw.login(" alice ", "pw1").await.unwrap();

        assert_eq!(session, Session::new(4, "abc"));
        assert_eq!(gw.session(), Some(session));
        let (_, form) = store.last_request().unwrap();
        assert_eq!(form.get("userName"), Some("alice"));
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials_before_sending() {
        let store = ScriptedStore::new();
        let gw = Gateway::new(store.clone());
        let err = gw.login("alice", "").await.unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn refused_login_keeps_no_session() {
        let store = ScriptedStore::new();
        store.reply(Envelope::failed("bad password"));
        let gw = Gateway::new(store.clone());
        assert!(matches!(gw.login("alice", "x1").await, Err(SyncError::Rejected(_))));
        assert!(gw.session().is_none());
    }

    #[tokio::test]
    async fn authenticate_uses_get_and_logout_clears() {
        let store = ScriptedStore::new();
        store.reply(session_envelope());
        store.reply(Envelope::ok());
        let gw = Gateway::new(store.clone());

        gw.authenticate().await.unwrap();
        assert_eq!(store.last_request().map(|(e, _)| e), Some(Endpoint::Auth));
        assert!(gw.session().is_some());

        gw.logout().await.unwrap();
        assert!(gw.session().is_none());
    }
}
