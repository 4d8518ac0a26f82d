use async_trait::async_trait;
use shared::{
    domain::{BulkAction, NominationId, UserId},
    protocol::{
        ListNominationsQuery, Nomination, NominationInput, NominationPage, NominationStats, User,
        UserInput,
    },
};

pub mod auth;
pub mod error;
pub mod form;
pub mod http;
pub mod list;
pub mod notice;
pub mod session;
pub mod users;

pub use auth::AuthService;
pub use error::{ClientError, RemoteError};
pub use form::{FormOutcome, NominationForm};
pub use http::HttpTrackerClient;
pub use list::{
    bulk::{AutoConfirm, BulkActionExecutor, BulkOutcome, Confirmation, Confirmer},
    classify::{classify, RowCategory},
    fetch::{FetchCoordinator, FetchTicket, LoadOutcome, Loaded, PageResult},
    filter::{default_page_size, FilterCriteria, FilterState, DEFAULT_PAGE_SIZE},
    selection::{all_selected, SelectionSet},
    ListRow, NominationListView, NominationListing,
};
pub use notice::{Notice, NoticeLevel};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
pub use users::{UserDirectoryView, UserForm, UserSaveOutcome};

/// Every backend endpoint the client consumes. `HttpTrackerClient` is the
/// production implementation; views only see this trait.
#[async_trait]
pub trait TrackerApi: Send + Sync {
    /// Exchanges credentials for a bearer token. Does not touch the session.
    async fn login(&self, name: &str, password: &str) -> Result<String, ClientError>;
    async fn current_user(&self) -> Result<User, ClientError>;

    async fn list_nominations(
        &self,
        query: &ListNominationsQuery,
    ) -> Result<NominationPage, ClientError>;
    async fn nomination_stats(&self) -> Result<NominationStats, ClientError>;
    async fn get_nomination(&self, id: &NominationId) -> Result<Nomination, ClientError>;
    async fn create_nomination(&self, input: &NominationInput) -> Result<(), ClientError>;
    async fn update_nomination(
        &self,
        id: &NominationId,
        input: &NominationInput,
    ) -> Result<(), ClientError>;
    async fn delete_nomination(&self, id: &NominationId) -> Result<(), ClientError>;
    async fn assign_nomination(
        &self,
        id: &NominationId,
        user_id: Option<&UserId>,
    ) -> Result<(), ClientError>;
    async fn bulk_update_status(
        &self,
        ids: &[NominationId],
        action: BulkAction,
    ) -> Result<(), ClientError>;
    async fn send_content(&self, id: &NominationId) -> Result<String, ClientError>;
    async fn send_all_content(&self, id: &NominationId) -> Result<String, ClientError>;
    async fn scan_contracts(&self) -> Result<serde_json::Value, ClientError>;

    async fn list_users(&self) -> Result<Vec<User>, ClientError>;
    async fn create_user(&self, input: &UserInput) -> Result<(), ClientError>;
    async fn update_user(&self, id: &UserId, input: &UserInput) -> Result<(), ClientError>;
    async fn delete_user(&self, id: &UserId) -> Result<(), ClientError>;

    async fn settings(&self) -> Result<serde_json::Value, ClientError>;
}

#[cfg(test)]
mod test_support;
