use tokio::sync::broadcast::{self, error::TryRecvError};

use super::{TablePage, Tabular};
use crate::api::{Resource, ResourceApi};
use crate::cache::{CacheEvent, QueryKey};
use crate::error::ClientError;
use crate::models::User;
use crate::policy::Policy;

/// Lifecycle of a query as seen by a view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    /// Previously loaded data went stale and must be fetched again before
    /// it is shown.
    Refetching,
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready(_))
    }
}

/// List screen for one resource. Subscribes to cache events so an
/// invalidation of its list query (from any mutation in the process) marks
/// the loaded rows stale.
pub struct ListView<R: Resource>
where
    R::Record: Tabular,
{
    api: ResourceApi<R>,
    events: broadcast::Receiver<CacheEvent>,
    state: ViewState<Vec<R::Record>>,
}

impl<R: Resource> ListView<R>
where
    R::Record: Tabular,
{
    pub fn new(api: ResourceApi<R>) -> Self {
        let events = api.cache().subscribe();
        Self {
            api,
            events,
            state: ViewState::Loading,
        }
    }

    pub fn state(&self) -> &ViewState<Vec<R::Record>> {
        &self.state
    }

    /// Apply pending cache events. Returns true when the shown rows went
    /// stale.
    pub fn sync(&mut self) -> bool {
        let own_list = QueryKey::List(R::kind());
        let mut stale = false;
        loop {
            match self.events.try_recv() {
                Ok(CacheEvent::Invalidated(key)) if key == own_list => stale = true,
                Ok(CacheEvent::Cleared) => stale = true,
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(resource = %R::kind(), skipped, "list view lagged behind cache events");
                    stale = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if stale && self.state.is_ready() {
            self.state = ViewState::Refetching;
        }
        stale
    }

    /// Bring the view up to date, fetching when nothing current is shown.
    pub async fn load(&mut self) -> &ViewState<Vec<R::Record>> {
        self.sync();
        if !self.state.is_ready() {
            let result = self.api.list().await;
            self.settle(result);
        }
        &self.state
    }

    /// Refetch from the server regardless of cached data.
    pub async fn refresh(&mut self) -> &ViewState<Vec<R::Record>> {
        self.sync();
        if self.state.is_ready() {
            self.state = ViewState::Refetching;
        }
        let result = self.api.refetch_list().await;
        self.settle(result);
        &self.state
    }

    fn settle(&mut self, result: Result<Vec<R::Record>, ClientError>) {
        self.state = match result {
            Ok(records) => ViewState::Ready(records),
            Err(e) => {
                tracing::warn!(resource = %R::kind(), "failed to load list: {}", e);
                ViewState::Failed(e.to_string())
            }
        };
    }

    pub fn render(&self, viewer: &User, policy: &dyn Policy) -> TablePage {
        let label = R::kind().label();
        match &self.state {
            ViewState::Loading | ViewState::Refetching => {
                TablePage::notice::<R::Record>(format!("Loading {}...", label))
            }
            ViewState::Failed(message) => {
                TablePage::notice::<R::Record>(format!("Error loading {}: {}", label, message))
            }
            ViewState::Ready(records) => TablePage::build(records, viewer, policy),
        }
    }
}
