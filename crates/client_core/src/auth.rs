use std::sync::Arc;

use shared::protocol::User;
use tracing::{info, warn};

use crate::{error::ClientError, session::Session, TrackerApi};

pub struct AuthService {
    api: Arc<dyn TrackerApi>,
    session: Arc<Session>,
}

impl AuthService {
    pub fn new(api: Arc<dyn TrackerApi>, session: Arc<Session>) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Obtains and stores a token, then validates it by fetching the current
    /// user. A token that cannot be validated is dropped again.
    pub async fn login(&self, name: &str, password: &str) -> Result<User, ClientError> {
        let name = name.trim();
        if name.is_empty() || password.is_empty() {
            return Err(ClientError::validation(
                "Username and password are required",
            ));
        }

        let token = self.api.login(name, password).await?;
        self.session.store_token(&token)?;

        match self.api.current_user().await {
            Ok(user) => {
                info!(user = %user.name, admin = user.is_admin, "logged in");
                self.session.set_current_user(user.clone()).await;
                Ok(user)
            }
            Err(err) => {
                self.session.logout().await;
                Err(err)
            }
        }
    }

    /// Re-validates a previously stored token. Returns `None` when there is no
    /// usable token; network failures are returned without logging out.
    pub async fn restore(&self) -> Result<Option<User>, ClientError> {
        if self.session.token()?.is_none() {
            return Ok(None);
        }

        match self.api.current_user().await {
            Ok(user) => {
                self.session.set_current_user(user.clone()).await;
                Ok(Some(user))
            }
            Err(err) if err.requires_reauth() => {
                warn!(error = %err, "stored token rejected");
                self.session.logout().await;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn logout(&self) {
        self.session.logout().await;
        info!("logged out");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{session::MemoryTokenStore, test_support::FakeTrackerApi};

    #[tokio::test]
    async fn login_stores_token_and_user() {
        let api = Arc::new(FakeTrackerApi::default());
        let session = Session::in_memory();
        let auth = AuthService::new(api.clone(), Arc::clone(&session));

        let user = auth.login("alice", "secret").await.expect("login");

        assert_eq!(user.name, "alice");
        assert_eq!(session.token().expect("token").as_deref(), Some("token-alice"));
        assert!(session.is_authenticated().await);
    }

    #[tokio::test]
    async fn login_without_credentials_makes_no_call() {
        let api = Arc::new(FakeTrackerApi::default());
        let auth = AuthService::new(api.clone(), Session::in_memory());

        let err = auth.login("  ", "secret").await.expect_err("must fail");
        assert!(err.is_validation());
        assert_eq!(api.call_count().await, 0);
    }

    #[tokio::test]
    async fn login_drops_token_when_profile_fetch_fails() {
        let api = Arc::new(FakeTrackerApi::default());
        api.fail_current_user(ClientError::Auth("invalid token".into()))
            .await;
        let session = Session::in_memory();
        let auth = AuthService::new(api, Arc::clone(&session));

        auth.login("alice", "secret").await.expect_err("must fail");

        assert_eq!(session.token().expect("token"), None);
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn restore_without_token_is_offline() {
        let api = Arc::new(FakeTrackerApi::default());
        let auth = AuthService::new(api.clone(), Session::in_memory());

        assert_eq!(auth.restore().await.expect("restore"), None);
        assert_eq!(api.call_count().await, 0);
    }

    #[tokio::test]
    async fn restore_logs_out_on_rejected_token() {
        let api = Arc::new(FakeTrackerApi::default());
        api.fail_current_user(ClientError::Auth("session expired".into()))
            .await;
        let session = Session::new(Arc::new(MemoryTokenStore::with_token("stale")));
        let auth = AuthService::new(api, Arc::clone(&session));

        assert_eq!(auth.restore().await.expect("restore"), None);
        assert_eq!(session.token().expect("token"), None);
    }

    #[tokio::test]
    async fn restore_keeps_token_on_server_failure() {
        let api = Arc::new(FakeTrackerApi::default());
        api.fail_current_user(crate::RemoteError::from_response(502, b"").into())
            .await;
        let session = Session::new(Arc::new(MemoryTokenStore::with_token("tok")));
        let auth = AuthService::new(api, Arc::clone(&session));

        auth.restore().await.expect_err("server failure surfaces");
        assert_eq!(session.token().expect("token").as_deref(), Some("tok"));
    }
}
