//! Admin user directory.

use std::sync::Arc;

use shared::{
    domain::UserId,
    protocol::{User, UserInput},
};
use tracing::{info, warn};

use crate::{
    error::ClientError,
    list::{
        bulk::{Confirmation, Confirmer},
        fetch::{FetchCoordinator, LoadOutcome},
    },
    session::Session,
    TrackerApi,
};

/// Built-in account that can be edited but never deleted.
pub const RESERVED_ADMIN_NAME: &str = "admin";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    editing: Option<UserId>,
    pub name: String,
    pub password: String,
}

impl UserForm {
    pub fn create() -> Self {
        Self::default()
    }

    /// Password starts blank; submitting it blank keeps the current one.
    pub fn edit(user: &User) -> Self {
        Self {
            editing: Some(user.id.clone()),
            name: user.name.clone(),
            password: String::new(),
        }
    }

    pub fn editing(&self) -> Option<&UserId> {
        self.editing.as_ref()
    }

    pub fn validate(&self) -> Result<UserInput, ClientError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ClientError::validation("Username is required"));
        }
        if self.editing.is_none() && self.password.is_empty() {
            return Err(ClientError::validation("Password is required"));
        }
        Ok(UserInput {
            name: name.to_string(),
            password: self.password.clone(),
            is_admin: false,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSaveOutcome {
    Created,
    Updated,
}

pub struct UserDirectoryView {
    api: Arc<dyn TrackerApi>,
    session: Arc<Session>,
    fetch: FetchCoordinator<(), Vec<User>>,
}

impl UserDirectoryView {
    pub fn new(api: Arc<dyn TrackerApi>, session: Arc<Session>) -> Self {
        Self {
            api,
            session,
            fetch: FetchCoordinator::new("users"),
        }
    }

    pub async fn refresh(&self) -> Result<LoadOutcome<Vec<User>>, ClientError> {
        self.session.require_admin().await?;
        let api = Arc::clone(&self.api);
        self.fetch
            .load((), move |()| async move { api.list_users().await })
            .await
    }

    pub async fn users(&self) -> Vec<User> {
        self.fetch
            .data()
            .await
            .map(|users| users.as_ref().clone())
            .unwrap_or_default()
    }

    pub async fn find_by_name(&self, name: &str) -> Option<User> {
        self.users()
            .await
            .into_iter()
            .find(|user| user.name == name)
    }

    pub async fn is_loading(&self) -> bool {
        self.fetch.is_loading().await
    }

    pub async fn save(&self, form: &UserForm) -> Result<UserSaveOutcome, ClientError> {
        self.session.require_admin().await?;
        let input = form.validate()?;
        let outcome = match form.editing() {
            Some(id) => {
                self.api.update_user(id, &input).await?;
                info!(user = %input.name, "user updated");
                UserSaveOutcome::Updated
            }
            None => {
                self.api.create_user(&input).await?;
                info!(user = %input.name, "user created");
                UserSaveOutcome::Created
            }
        };
        self.reload_after_mutation().await;
        Ok(outcome)
    }

    /// Returns `false` when the user declined the confirmation.
    pub async fn delete(
        &self,
        id: &UserId,
        confirmer: &dyn Confirmer,
    ) -> Result<bool, ClientError> {
        self.session.require_admin().await?;
        let reserved = self
            .users()
            .await
            .iter()
            .any(|user| &user.id == id && user.name == RESERVED_ADMIN_NAME);
        if reserved {
            return Err(ClientError::validation(
                "The admin account cannot be deleted",
            ));
        }

        if !confirmer.confirm(&Confirmation::delete_user()).await {
            return Ok(false);
        }
        self.api.delete_user(id).await?;
        info!(user = %id, "user deleted");
        self.reload_after_mutation().await;
        Ok(true)
    }

    async fn reload_after_mutation(&self) {
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "reload of users failed; showing previous list");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin_session, FakeTrackerApi, ScriptedConfirmer};

    fn user(id: &str, name: &str) -> User {
        User {
            id: UserId::from(id),
            name: name.to_string(),
            is_admin: name == RESERVED_ADMIN_NAME,
        }
    }

    #[test]
    fn create_form_requires_name_and_password() {
        let mut form = UserForm::create();
        assert!(form.validate().expect_err("no name").is_validation());

        form.name = "bob".into();
        assert!(form.validate().expect_err("no password").is_validation());

        form.password = "pw".into();
        let input = form.validate().expect("valid");
        assert_eq!(input.name, "bob");
        assert!(!input.is_admin);
    }

    #[test]
    fn edit_form_allows_blank_password() {
        let form = UserForm::edit(&user("u2", "bob"));
        let input = form.validate().expect("valid");
        assert_eq!(input.password, "");
        assert_eq!(form.editing(), Some(&UserId::from("u2")));
    }

    #[tokio::test]
    async fn directory_requires_admin_session() {
        let api = Arc::new(FakeTrackerApi::default());
        let view = UserDirectoryView::new(api.clone(), Session::in_memory());

        let err = view.refresh().await.expect_err("not signed in");
        assert!(err.requires_reauth());
        assert_eq!(api.call_count().await, 0);
    }

    #[tokio::test]
    async fn save_creates_then_reloads() {
        let api = Arc::new(FakeTrackerApi::default());
        api.set_users(vec![user("u1", "admin")]).await;
        let view = UserDirectoryView::new(api.clone(), admin_session().await);
        view.refresh().await.expect("load");

        let mut form = UserForm::create();
        form.name = "carol".into();
        form.password = "pw".into();
        let outcome = view.save(&form).await.expect("save");

        assert_eq!(outcome, UserSaveOutcome::Created);
        assert!(view.find_by_name("carol").await.is_some());
    }

    #[tokio::test]
    async fn reserved_admin_cannot_be_deleted() {
        let api = Arc::new(FakeTrackerApi::default());
        api.set_users(vec![user("u1", "admin"), user("u2", "bob")]).await;
        let view = UserDirectoryView::new(api.clone(), admin_session().await);
        view.refresh().await.expect("load");
        let confirmer = ScriptedConfirmer::answering(true);

        let err = view
            .delete(&UserId::from("u1"), &confirmer)
            .await
            .expect_err("reserved");
        assert!(err.is_validation());
        assert_eq!(confirmer.asked().await, 0);

        assert!(view
            .delete(&UserId::from("u2"), &confirmer)
            .await
            .expect("delete"));
        assert!(view.find_by_name("bob").await.is_none());
    }

    #[tokio::test]
    async fn declined_delete_keeps_user() {
        let api = Arc::new(FakeTrackerApi::default());
        api.set_users(vec![user("u2", "bob")]).await;
        let view = UserDirectoryView::new(api.clone(), admin_session().await);
        view.refresh().await.expect("load");

        let deleted = view
            .delete(&UserId::from("u2"), &ScriptedConfirmer::answering(false))
            .await
            .expect("no error");
        assert!(!deleted);
        assert!(view.find_by_name("bob").await.is_some());
    }
}
