//! Single writer of a view's remote result cache.
//!
//! Every load takes the next value of a monotonic generation counter. Only the
//! newest generation may replace the cached result; anything older that
//! completes later is discarded, whatever order the network answers in. Loads
//! driven through [`FetchCoordinator::load`] are also cancelled as soon as a
//! newer load begins.

use std::{future::Future, sync::Arc};

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::error::ClientError;

/// One page of a remote list. `total` counts the whole filtered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> PageResult<T> {
    /// Enforces `items <= page_size` and `items <= total` on what the server
    /// sent, so the displayed rows and count can never disagree.
    pub fn from_wire(mut items: Vec<T>, total: u64, page_size: u32) -> Self {
        let page_size = page_size as usize;
        if items.len() > page_size {
            warn!(
                received = items.len(),
                page_size, "server returned an oversized page; truncating"
            );
            items.truncate(page_size);
        }
        let total = total.max(items.len() as u64);
        Self { items, total }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug)]
pub struct Loaded<Q, T> {
    pub generation: u64,
    pub criteria: Q,
    pub data: Arc<T>,
}

impl<Q: Clone, T> Clone for Loaded<Q, T> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            criteria: self.criteria.clone(),
            data: Arc::clone(&self.data),
        }
    }
}

#[derive(Debug)]
pub enum LoadOutcome<T> {
    Applied(Arc<T>),
    /// A newer load was started before this one finished; nothing changed.
    Superseded { generation: u64, latest: u64 },
}

impl<T> LoadOutcome<T> {
    pub fn applied(&self) -> Option<&Arc<T>> {
        match self {
            LoadOutcome::Applied(data) => Some(data),
            LoadOutcome::Superseded { .. } => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied(_))
    }
}

#[derive(Debug, Clone)]
pub struct FetchTicket<Q> {
    generation: u64,
    criteria: Q,
}

impl<Q> FetchTicket<Q> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn criteria(&self) -> &Q {
        &self.criteria
    }
}

struct FetchState<Q, T> {
    loading: bool,
    current: Option<Loaded<Q, T>>,
}

pub struct FetchCoordinator<Q, T> {
    name: &'static str,
    generations: watch::Sender<u64>,
    state: Mutex<FetchState<Q, T>>,
}

impl<Q, T> FetchCoordinator<Q, T>
where
    Q: Clone + Send,
    T: Send + Sync,
{
    pub fn new(name: &'static str) -> Self {
        let (generations, _) = watch::channel(0);
        Self {
            name,
            generations,
            state: Mutex::new(FetchState {
                loading: false,
                current: None,
            }),
        }
    }

    pub fn latest_generation(&self) -> u64 {
        *self.generations.borrow()
    }

    /// Registers a new request as the current one and enters the loading state.
    pub async fn begin(&self, criteria: Q) -> FetchTicket<Q> {
        let mut state = self.state.lock().await;
        let mut generation = 0;
        self.generations.send_modify(|latest| {
            *latest += 1;
            generation = *latest;
        });
        state.loading = true;
        debug!(view = self.name, generation, "fetch started");
        FetchTicket {
            generation,
            criteria,
        }
    }

    /// Applies `result` only if `ticket` is still the newest request. A failed
    /// newest request ends the loading state but keeps the previous data.
    pub async fn complete(
        &self,
        ticket: FetchTicket<Q>,
        result: Result<T, ClientError>,
    ) -> Result<LoadOutcome<T>, ClientError> {
        let mut state = self.state.lock().await;
        let latest = self.latest_generation();
        if ticket.generation != latest {
            debug!(
                view = self.name,
                generation = ticket.generation,
                latest,
                "discarding stale fetch result"
            );
            return Ok(LoadOutcome::Superseded {
                generation: ticket.generation,
                latest,
            });
        }

        state.loading = false;
        match result {
            Ok(data) => {
                let data = Arc::new(data);
                state.current = Some(Loaded {
                    generation: ticket.generation,
                    criteria: ticket.criteria,
                    data: Arc::clone(&data),
                });
                debug!(view = self.name, generation = ticket.generation, "fetch applied");
                Ok(LoadOutcome::Applied(data))
            }
            Err(err) => {
                warn!(
                    view = self.name,
                    generation = ticket.generation,
                    error = %err,
                    "fetch failed; keeping previous data"
                );
                Err(err)
            }
        }
    }

    pub async fn load<F, Fut>(&self, criteria: Q, fetch: F) -> Result<LoadOutcome<T>, ClientError>
    where
        F: FnOnce(Q) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let ticket = self.begin(criteria).await;
        let generation = ticket.generation;
        let mut newer = self.generations.subscribe();
        let request = fetch(ticket.criteria.clone());

        tokio::select! {
            result = request => self.complete(ticket, result).await,
            latest = wait_until_superseded(&mut newer, generation) => {
                debug!(view = self.name, generation, latest, "cancelled superseded fetch");
                Ok(LoadOutcome::Superseded { generation, latest })
            }
        }
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    pub async fn current(&self) -> Option<Loaded<Q, T>> {
        self.state.lock().await.current.clone()
    }

    pub async fn data(&self) -> Option<Arc<T>> {
        self.state
            .lock()
            .await
            .current
            .as_ref()
            .map(|loaded| Arc::clone(&loaded.data))
    }
}

async fn wait_until_superseded(newer: &mut watch::Receiver<u64>, generation: u64) -> u64 {
    loop {
        let latest = *newer.borrow_and_update();
        if latest != generation {
            return latest;
        }
        if newer.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
