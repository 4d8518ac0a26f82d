use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use shared::{
    domain::{BulkAction, NominationId, UserId},
    protocol::{
        AssignRequest, BulkUpdateRequest, ContentResponse, ListNominationsQuery, LoginRequest,
        LoginResponse, Nomination, NominationInput, NominationPage, NominationStats, User,
        UserInput,
    },
};
use tracing::{debug, warn};

use crate::{
    error::{ClientError, RemoteError},
    session::Session,
    TrackerApi,
};

pub struct HttpTrackerClient {
    http: Client,
    base_url: Url,
    session: Arc<Session>,
}

impl HttpTrackerClient {
    pub fn new(base_url: &str, session: Arc<Session>) -> Result<Self, ClientError> {
        Self::with_http_client(Client::new(), base_url, session)
    }

    pub fn with_timeout(
        base_url: &str,
        session: Arc<Session>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_http_client(http, base_url, session)
    }

    fn with_http_client(
        http: Client,
        base_url: &str,
        session: Arc<Session>,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.trim()).map_err(|err| {
            ClientError::validation(format!("invalid API base URL '{base_url}': {err}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::validation(format!(
                "API base URL '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authed(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let token = self.session.bearer_token()?;
        Ok(self
            .http
            .request(method, self.endpoint(segments))
            .bearer_auth(token))
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        authenticated: bool,
    ) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "tracker api response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let remote = RemoteError::from_response(status.as_u16(), &body);
        if authenticated && status == StatusCode::UNAUTHORIZED {
            warn!("token rejected by server; logging out");
            self.session.logout().await;
            let message = match &remote {
                RemoteError::Status {
                    message: Some(message),
                    ..
                } => message.clone(),
                _ => "session expired".to_string(),
            };
            return Err(ClientError::Auth(message));
        }
        Err(remote.into())
    }

    async fn send_authed(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<Response, ClientError> {
        let request = self.authed(method, segments)?;
        self.execute(request, true).await
    }

    async fn send_authed_json<B: serde::Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<Response, ClientError> {
        let request = self.authed(method, segments)?.json(body);
        self.execute(request, true).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| RemoteError::Decode(err.to_string()).into())
}

/// Endpoints whose response shape is not part of the contract: an empty body
/// reads as `null`, anything that is not JSON is kept as a string.
async fn decode_loose(response: Response) -> Result<serde_json::Value, ClientError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
    }))
}

#[async_trait]
impl TrackerApi for HttpTrackerClient {
    async fn login(&self, name: &str, password: &str) -> Result<String, ClientError> {
        let request = self
            .http
            .post(self.endpoint(&["auth", "login"]))
            .json(&LoginRequest {
                name: name.to_string(),
                password: password.to_string(),
            });
        let response = self.execute(request, false).await?;
        let body: LoginResponse = decode(response).await?;
        Ok(body.token)
    }

    async fn current_user(&self) -> Result<User, ClientError> {
        let response = self.send_authed(Method::GET, &["users", "me"]).await?;
        decode(response).await
    }

    async fn list_nominations(
        &self,
        query: &ListNominationsQuery,
    ) -> Result<NominationPage, ClientError> {
        let request = self.authed(Method::GET, &["nominations"])?.query(query);
        let response = self.execute(request, true).await?;
        decode(response).await
    }

    async fn nomination_stats(&self) -> Result<NominationStats, ClientError> {
        let response = self
            .send_authed(Method::GET, &["nominations", "stats", "summary"])
            .await?;
        decode(response).await
    }

    async fn get_nomination(&self, id: &NominationId) -> Result<Nomination, ClientError> {
        let response = self
            .send_authed(Method::GET, &["nominations", id.as_str()])
            .await?;
        decode(response).await
    }

    async fn create_nomination(&self, input: &NominationInput) -> Result<(), ClientError> {
        self.send_authed_json(Method::POST, &["nominations"], input)
            .await?;
        Ok(())
    }

    async fn update_nomination(
        &self,
        id: &NominationId,
        input: &NominationInput,
    ) -> Result<(), ClientError> {
        self.send_authed_json(Method::PUT, &["nominations", id.as_str()], input)
            .await?;
        Ok(())
    }

    async fn delete_nomination(&self, id: &NominationId) -> Result<(), ClientError> {
        self.send_authed(Method::DELETE, &["nominations", id.as_str()])
            .await?;
        Ok(())
    }

    async fn assign_nomination(
        &self,
        id: &NominationId,
        user_id: Option<&UserId>,
    ) -> Result<(), ClientError> {
        let body = AssignRequest {
            user_id: user_id.cloned(),
        };
        self.send_authed_json(Method::PUT, &["nominations", id.as_str(), "assign"], &body)
            .await?;
        Ok(())
    }

    async fn bulk_update_status(
        &self,
        ids: &[NominationId],
        action: BulkAction,
    ) -> Result<(), ClientError> {
        let body = BulkUpdateRequest {
            ids: ids.to_vec(),
            action,
        };
        self.send_authed_json(Method::PUT, &["nominations", "bulk-update-status"], &body)
            .await?;
        Ok(())
    }

    async fn send_content(&self, id: &NominationId) -> Result<String, ClientError> {
        let response = self
            .send_authed(Method::GET, &["nominations", id.as_str(), "send-content"])
            .await?;
        let body: ContentResponse = decode(response).await?;
        Ok(body.content)
    }

    async fn send_all_content(&self, id: &NominationId) -> Result<String, ClientError> {
        let response = self
            .send_authed(Method::GET, &["nominations", id.as_str(), "send-all-content"])
            .await?;
        let body: ContentResponse = decode(response).await?;
        Ok(body.content)
    }

    async fn scan_contracts(&self) -> Result<serde_json::Value, ClientError> {
        let response = self
            .send_authed(Method::POST, &["nominations", "scan"])
            .await?;
        decode_loose(response).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        let response = self.send_authed(Method::GET, &["users"]).await?;
        decode(response).await
    }

    async fn create_user(&self, input: &UserInput) -> Result<(), ClientError> {
        self.send_authed_json(Method::POST, &["users"], input)
            .await?;
        Ok(())
    }

    async fn update_user(&self, id: &UserId, input: &UserInput) -> Result<(), ClientError> {
        self.send_authed_json(Method::PUT, &["users", id.as_str()], input)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), ClientError> {
        self.send_authed(Method::DELETE, &["users", id.as_str()])
            .await?;
        Ok(())
    }

    async fn settings(&self) -> Result<serde_json::Value, ClientError> {
        let response = self.send_authed(Method::GET, &["settings"]).await?;
        decode_loose(response).await
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
