//! Best-effort fetch of the recent generations list.
//!
//! A fetch is tied to an attach/detach cycle of the view showing the list.
//! Detaching cancels interest; a response that arrives afterwards is dropped
//! without touching the list. Failures are swallowed and leave the list empty.

use crate::gateway::HttpGateway;
use crate::models::GenerationSummary;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RecentState {
    /// No result applied yet.
    #[default]
    Pending,
    Loaded(Vec<GenerationSummary>),
}

/// Consumer-owned list state. Clones observe the same list.
#[derive(Debug, Clone, Default)]
pub struct RecentList {
    state: Arc<RwLock<RecentState>>,
}

impl RecentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecentState {
        self.state.read().clone()
    }

    /// Items to display; empty until loaded.
    pub fn items(&self) -> Vec<GenerationSummary> {
        match &*self.state.read() {
            RecentState::Loaded(items) => items.clone(),
            RecentState::Pending => Vec::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.state.read(), RecentState::Loaded(_))
    }

    /// Write `items` unless `cancel` has fired. The check and the write share
    /// one guard so a concurrent detach cannot slip in between.
    fn apply_unless_cancelled(
        &self,
        items: Vec<GenerationSummary>,
        cancel: &CancellationToken,
    ) -> bool {
        let mut state = self.state.write();
        if cancel.is_cancelled() {
            return false;
        }
        *state = RecentState::Loaded(items);
        true
    }
}

#[derive(Clone)]
pub struct RecentFetcher {
    gateway: Arc<dyn HttpGateway>,
}

impl RecentFetcher {
    pub fn new(gateway: Arc<dyn HttpGateway>) -> Self {
        Self { gateway }
    }

    /// Begin an attach cycle: issue the list call once, writing into `list`
    /// only while the returned [`Attachment`] is still attached.
    ///
    /// Must be called inside a tokio runtime.
    pub fn attach(&self, list: RecentList) -> Attachment {
        self.attach_with(list, CancellationToken::new())
    }

    /// Attach under an existing token, e.g. one shared with a parent view.
    pub fn attach_with(&self, list: RecentList, cancel: CancellationToken) -> Attachment {
        let task = tokio::spawn(fetch_into(self.gateway.clone(), list, cancel.clone()));
        Attachment {
            cancel,
            task: Some(task),
        }
    }
}

async fn fetch_into(gateway: Arc<dyn HttpGateway>, list: RecentList, cancel: CancellationToken) {
    let result = tokio::select! {
        _ = cancel.cancelled() => {
            debug!("recent list fetch abandoned on detach");
            return;
        }
        result = gateway.list_generations() => result,
    };
    let items = match result {
        Ok(items) => {
            debug!(count = items.len(), "recent list loaded");
            items
        }
        Err(err) => {
            debug!(%err, "recent list unavailable, showing nothing");
            Vec::new()
        }
    };
    if !list.apply_unless_cancelled(items, &cancel) {
        debug!("discarding recent list that arrived after detach");
    }
}

/// One attach cycle. Dropping it detaches.
pub struct Attachment {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Attachment {
    pub fn is_attached(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Wait until the fetch has either applied its result or given up.
    pub async fn settled(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                debug!(%err, "recent list task ended abnormally");
            }
        }
    }

    /// End the cycle and wait for the fetch task to wind down.
    pub async fn detach(mut self) {
        self.cancel.cancel();
        self.settled().await;
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
