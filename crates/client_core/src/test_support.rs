use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use shared::{
    domain::{BulkAction, NominationId, Party, UserId},
    protocol::{
        ListNominationsQuery, Nomination, NominationInput, NominationPage, NominationStats, User,
        UserInput, UserRef,
    },
};
use tokio::sync::{oneshot, Mutex};

use crate::{
    error::{ClientError, RemoteError},
    list::bulk::{Confirmation, Confirmer},
    session::{MemoryTokenStore, Session},
    TrackerApi,
};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn sample_nomination(id: &str, date: NaiveDate) -> Nomination {
    Nomination {
        id: NominationId::from(id),
        contract_name: format!("contract-{id}"),
        buyer: "Acme".to_string(),
        seller: "Globex".to_string(),
        arrival_date: date,
        nomination_date: date,
        nomination_type: "DES".to_string(),
        nomination_keyword: String::new(),
        for_seller_or_buyer: Party::Seller,
        sent: false,
        received: false,
        assigned_user: None,
    }
}

pub async fn admin_session() -> Arc<Session> {
    let session = Session::new(Arc::new(MemoryTokenStore::with_token("admin-token")));
    session
        .set_current_user(User {
            id: UserId::from("u1"),
            name: "admin".to_string(),
            is_admin: true,
        })
        .await;
    session
}

/// Handle on a paused `list_nominations` call.
pub struct ListGate {
    pub started: oneshot::Receiver<()>,
    pub release: oneshot::Sender<()>,
}

struct PendingGate {
    started: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

#[derive(Default)]
struct FakeState {
    calls: usize,
    last_login: Option<String>,
    next_id: u32,
    nominations: Vec<Nomination>,
    users: Vec<User>,
    stats: NominationStats,
    list_queries: Vec<ListNominationsQuery>,
    bulk_calls: Vec<(Vec<NominationId>, BulkAction)>,
    fail_current_user: Option<ClientError>,
    fail_next_list: Option<ClientError>,
    fail_next_bulk: Option<ClientError>,
    list_gate: Option<PendingGate>,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn nomination_mut(&mut self, id: &NominationId) -> Result<&mut Nomination, ClientError> {
        self.nominations
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(not_found)
    }
}

fn not_found() -> ClientError {
    RemoteError::from_response(404, br#"{"message":"Not found"}"#).into()
}

/// In-memory backend with scripted failures, for exercising views without a
/// server.
#[derive(Default)]
pub struct FakeTrackerApi {
    state: Mutex<FakeState>,
}

impl FakeTrackerApi {
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls
    }

    pub async fn set_nominations(&self, nominations: Vec<Nomination>) {
        self.state.lock().await.nominations = nominations;
    }

    pub async fn nominations(&self) -> Vec<Nomination> {
        self.state.lock().await.nominations.clone()
    }

    pub async fn set_users(&self, users: Vec<User>) {
        self.state.lock().await.users = users;
    }

    pub async fn set_stats(&self, stats: NominationStats) {
        self.state.lock().await.stats = stats;
    }

    pub async fn list_queries(&self) -> Vec<ListNominationsQuery> {
        self.state.lock().await.list_queries.clone()
    }

    pub async fn bulk_calls(&self) -> Vec<(Vec<NominationId>, BulkAction)> {
        self.state.lock().await.bulk_calls.clone()
    }

    pub async fn fail_current_user(&self, err: ClientError) {
        self.state.lock().await.fail_current_user = Some(err);
    }

    pub async fn fail_next_list(&self, err: ClientError) {
        self.state.lock().await.fail_next_list = Some(err);
    }

    pub async fn fail_next_bulk(&self, err: ClientError) {
        self.state.lock().await.fail_next_bulk = Some(err);
    }

    /// Pauses the next `list_nominations` call until the returned gate is
    /// released or dropped.
    pub async fn pause_next_list(&self) -> ListGate {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.state.lock().await.list_gate = Some(PendingGate {
            started: started_tx,
            release: release_rx,
        });
        ListGate {
            started: started_rx,
            release: release_tx,
        }
    }

    async fn record(&self) -> tokio::sync::MutexGuard<'_, FakeState> {
        let mut state = self.state.lock().await;
        state.calls += 1;
        state
    }
}

#[async_trait]
impl TrackerApi for FakeTrackerApi {
    async fn login(&self, name: &str, _password: &str) -> Result<String, ClientError> {
        let mut state = self.record().await;
        state.last_login = Some(name.to_string());
        Ok(format!("token-{name}"))
    }

    async fn current_user(&self) -> Result<User, ClientError> {
        let mut state = self.record().await;
        if let Some(err) = state.fail_current_user.take() {
            return Err(err);
        }
        let name = state
            .last_login
            .clone()
            .unwrap_or_else(|| "admin".to_string());
        Ok(User {
            id: UserId::new(format!("user-{name}")),
            name,
            is_admin: true,
        })
    }

    async fn list_nominations(
        &self,
        query: &ListNominationsQuery,
    ) -> Result<NominationPage, ClientError> {
        let gate = {
            let mut state = self.record().await;
            state.list_queries.push(query.clone());
            if let Some(err) = state.fail_next_list.take() {
                return Err(err);
            }
            state.list_gate.take()
        };
        if let Some(gate) = gate {
            let _ = gate.started.send(());
            let _ = gate.release.await;
        }

        let state = self.state.lock().await;
        let filtered: Vec<&Nomination> = state
            .nominations
            .iter()
            .filter(|item| match &query.user_id {
                Some(user_id) => item
                    .assigned_user
                    .as_ref()
                    .is_some_and(|user| &user.id == user_id),
                None => true,
            })
            .collect();
        let limit = query.limit.max(1) as usize;
        let skip = (query.page.max(1) as usize - 1) * limit;
        Ok(NominationPage {
            total: filtered.len() as u64,
            nominations: filtered.into_iter().skip(skip).take(limit).cloned().collect(),
        })
    }

    async fn nomination_stats(&self) -> Result<NominationStats, ClientError> {
        Ok(self.record().await.stats.clone())
    }

    async fn get_nomination(&self, id: &NominationId) -> Result<Nomination, ClientError> {
        let mut state = self.record().await;
        state.nomination_mut(id).map(|item| item.clone())
    }

    async fn create_nomination(&self, input: &NominationInput) -> Result<(), ClientError> {
        let mut state = self.record().await;
        let id = state.next_id("n");
        let mut nomination = sample_nomination(&id, input.nomination_date);
        apply_input(&mut nomination, input);
        state.nominations.push(nomination);
        Ok(())
    }

    async fn update_nomination(
        &self,
        id: &NominationId,
        input: &NominationInput,
    ) -> Result<(), ClientError> {
        let mut state = self.record().await;
        apply_input(state.nomination_mut(id)?, input);
        Ok(())
    }

    async fn delete_nomination(&self, id: &NominationId) -> Result<(), ClientError> {
        let mut state = self.record().await;
        state.nominations.retain(|item| &item.id != id);
        Ok(())
    }

    async fn assign_nomination(
        &self,
        id: &NominationId,
        user_id: Option<&UserId>,
    ) -> Result<(), ClientError> {
        let mut state = self.record().await;
        let assigned = user_id.map(|user_id| UserRef {
            id: user_id.clone(),
            name: state
                .users
                .iter()
                .find(|user| &user.id == user_id)
                .map(|user| user.name.clone()),
        });
        state.nomination_mut(id)?.assigned_user = assigned;
        Ok(())
    }

    async fn bulk_update_status(
        &self,
        ids: &[NominationId],
        action: BulkAction,
    ) -> Result<(), ClientError> {
        let mut state = self.record().await;
        state.bulk_calls.push((ids.to_vec(), action));
        if let Some(err) = state.fail_next_bulk.take() {
            return Err(err);
        }
        match action {
            BulkAction::Delete => state.nominations.retain(|item| !ids.contains(&item.id)),
            BulkAction::Sent | BulkAction::Received => {
                for item in state.nominations.iter_mut().filter(|item| ids.contains(&item.id)) {
                    if action == BulkAction::Sent {
                        item.sent = true;
                    } else {
                        item.received = true;
                    }
                }
            }
        }
        Ok(())
    }

    async fn send_content(&self, id: &NominationId) -> Result<String, ClientError> {
        let mut state = self.record().await;
        let item = state.nomination_mut(id)?;
        Ok(format!("Nomination for {}", item.contract_name))
    }

    async fn send_all_content(&self, id: &NominationId) -> Result<String, ClientError> {
        let mut state = self.record().await;
        let item = state.nomination_mut(id)?;
        Ok(format!("All nominations for {}", item.contract_name))
    }

    async fn scan_contracts(&self) -> Result<serde_json::Value, ClientError> {
        let state = self.record().await;
        Ok(json!({ "scanned": state.nominations.len() }))
    }

    async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        Ok(self.record().await.users.clone())
    }

    async fn create_user(&self, input: &UserInput) -> Result<(), ClientError> {
        let mut state = self.record().await;
        let id = state.next_id("u");
        state.users.push(User {
            id: UserId::new(id),
            name: input.name.clone(),
            is_admin: input.is_admin,
        });
        Ok(())
    }

    async fn update_user(&self, id: &UserId, input: &UserInput) -> Result<(), ClientError> {
        let mut state = self.record().await;
        let user = state
            .users
            .iter_mut()
            .find(|user| &user.id == id)
            .ok_or_else(not_found)?;
        user.name = input.name.clone();
        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), ClientError> {
        let mut state = self.record().await;
        state.users.retain(|user| &user.id != id);
        Ok(())
    }

    async fn settings(&self) -> Result<serde_json::Value, ClientError> {
        let _ = self.record().await;
        Ok(json!({ "scan_interval_minutes": 30 }))
    }
}

fn apply_input(item: &mut Nomination, input: &NominationInput) {
    item.contract_name = input.contract_name.clone();
    item.buyer = input.buyer.clone();
    item.seller = input.seller.clone();
    item.arrival_date = input.arrival_period;
    item.nomination_date = input.nomination_date;
    item.nomination_type = input.nomination_type.clone();
    item.nomination_keyword = input.nomination_keyword.clone();
    item.for_seller_or_buyer = input.for_seller_or_buyer;
}

/// Confirmer that always gives the same answer and remembers what it was asked.
pub struct ScriptedConfirmer {
    answer: bool,
    prompts: Mutex<Vec<Confirmation>>,
}

impl ScriptedConfirmer {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub async fn asked(&self) -> usize {
        self.prompts.lock().await.len()
    }

    pub async fn last_prompt(&self) -> Option<Confirmation> {
        self.prompts.lock().await.last().cloned()
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, request: &Confirmation) -> bool {
        self.prompts.lock().await.push(request.clone());
        self.answer
    }
}
