//! Token persistence and the signed-in user, shared by every component that
//! talks to the backend. Built once at the application root and passed down.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Context, Result};
use shared::protocol::User;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ClientError;

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| {
                format!("failed to read token file '{}'", self.path.display())
            }),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create token directory '{}'", parent.display())
            })?;
        }
        fs::write(&self.path, token)
            .with_context(|| format!("failed to write token file '{}'", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).with_context(
                || format!("failed to restrict token file '{}'", self.path.display()),
            )?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| {
                format!("failed to remove token file '{}'", self.path.display())
            }),
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let guard = self
            .token
            .lock()
            .map_err(|_| anyhow!("token store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| anyhow!("token store lock poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| anyhow!("token store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

pub struct Session {
    store: Arc<dyn TokenStore>,
    current_user: RwLock<Option<User>>,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            current_user: RwLock::new(None),
        })
    }

    pub fn in_memory() -> Arc<Self> {
        Self::new(Arc::new(MemoryTokenStore::default()))
    }

    pub fn token(&self) -> Result<Option<String>, ClientError> {
        self.store.load().map_err(ClientError::Session)
    }

    /// Token for an authenticated request; fails without touching the network
    /// when nobody is signed in.
    pub fn bearer_token(&self) -> Result<String, ClientError> {
        self.token()?
            .ok_or_else(|| ClientError::Auth("not logged in".to_string()))
    }

    pub fn store_token(&self, token: &str) -> Result<(), ClientError> {
        self.store.save(token).map_err(ClientError::Session)
    }

    pub async fn set_current_user(&self, user: User) {
        debug!(user = %user.name, "session user set");
        *self.current_user.write().await = Some(user);
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current_user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current_user.read().await.is_some()
    }

    pub async fn require_admin(&self) -> Result<User, ClientError> {
        match self.current_user().await {
            Some(user) if user.is_admin => Ok(user),
            Some(user) => Err(ClientError::Auth(format!(
                "user '{}' is not an administrator",
                user.name
            ))),
            None => Err(ClientError::Auth("not logged in".to_string())),
        }
    }

    pub async fn logout(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear stored token during logout");
        }
        *self.current_user.write().await = None;
    }
}
