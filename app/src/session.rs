use excelvision_core::auth::{self, AuthFlow};
use excelvision_core::download::DirectorySink;
use excelvision_core::error::ClientResult;
use excelvision_core::events::Notifier;
use excelvision_core::gateway::{HttpGateway, ReqwestGateway};
use excelvision_core::generation::{GenerationRequester, SavedArtifact};
use excelvision_core::models::{GenerationRequest, GenerationSummary};
use excelvision_core::recent::{RecentFetcher, RecentList};
use excelvision_core::token_store::{CredentialStorage, FileCredentialStorage, TokenStore};
use excelvision_core::ClientConfig;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Wires the core components together for one run of the client.
///
/// The session owns the only `TokenStore`; components get the credential
/// from it at call time.
pub struct ClientSession {
    config: ClientConfig,
    tokens: TokenStore,
    gateway: Arc<dyn HttpGateway>,
    notifier: Notifier,
}

impl ClientSession {
    pub fn open(config: ClientConfig, notifier: Notifier) -> ClientResult<Self> {
        let gateway = Arc::new(ReqwestGateway::from_config(&config)?);
        let storage = Arc::new(FileCredentialStorage::new(config.state_dir.clone()));
        Ok(Self::with_parts(config, gateway, storage, notifier))
    }

    pub fn with_parts(
        config: ClientConfig,
        gateway: Arc<dyn HttpGateway>,
        storage: Arc<dyn CredentialStorage>,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            tokens: TokenStore::open(storage),
            gateway,
            notifier,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Wake the backend up without waiting on it.
    pub fn warm_up(&self) -> JoinHandle<()> {
        let gateway = self.gateway.clone();
        tokio::spawn(async move {
            if let Err(err) = gateway.ping().await {
                debug!(%err, "backend warm-up failed");
            }
        })
    }

    pub fn requester(&self, download_dir: Option<&Path>) -> GenerationRequester {
        let dir = download_dir.unwrap_or(self.config.download_dir.as_path());
        GenerationRequester::new(
            self.gateway.clone(),
            Arc::new(DirectorySink::new(dir)),
            self.notifier.clone(),
            self.config.file_prefix.clone(),
        )
    }

    pub fn auth_flow(&self) -> AuthFlow {
        AuthFlow::new(self.gateway.clone(), self.tokens.clone(), self.notifier.clone())
            .retain_password(self.config.retain_password)
    }

    pub fn recent_fetcher(&self) -> RecentFetcher {
        RecentFetcher::new(self.gateway.clone())
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        download_dir: Option<&Path>,
    ) -> ClientResult<SavedArtifact> {
        let credential = self.tokens.get();
        self.requester(download_dir)
            .generate(request, credential.as_ref())
            .await
    }

    /// One attach cycle of the recent list, run to completion.
    pub async fn recent(&self) -> Vec<GenerationSummary> {
        let list = RecentList::new();
        let mut attachment = self.recent_fetcher().attach(list.clone());
        attachment.settled().await;
        list.items()
    }

    pub fn logout(&self) -> ClientResult<()> {
        auth::logout(&self.tokens, &self.notifier)
    }
}
