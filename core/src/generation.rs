use crate::download::{artifact_filename, Clock, DownloadSink, SpreadsheetBlob, SystemClock};
use crate::error::{ClientError, ClientResult};
use crate::events::{Action, Notifier};
use crate::gateway::HttpGateway;
use crate::models::GenerationRequest;
use crate::token_store::Credential;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const EMPTY_DESCRIPTION: &str = "Please describe the spreadsheet you want.";
const STARTED_MESSAGE: &str = "Generating .xlsx...";
const SUCCEEDED_MESSAGE: &str = "Download ready!";
const FAILED_FALLBACK: &str = "Try again";

/// A spreadsheet that has been written to its download location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: usize,
}

/// Runs the "generate a spreadsheet" use case end to end.
///
/// Callers are expected to keep one request in flight per instance and to
/// disable their trigger between `Started` and the terminal phase.
#[derive(Clone)]
pub struct GenerationRequester {
    gateway: Arc<dyn HttpGateway>,
    sink: Arc<dyn DownloadSink>,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    file_prefix: String,
}

impl GenerationRequester {
    pub fn new(
        gateway: Arc<dyn HttpGateway>,
        sink: Arc<dyn DownloadSink>,
        notifier: Notifier,
        file_prefix: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            sink,
            clock: Arc::new(SystemClock),
            notifier,
            file_prefix: file_prefix.into(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        credential: Option<&Credential>,
    ) -> ClientResult<SavedArtifact> {
        let action = self.notifier.begin(Action::Generate);
        if request.description.trim().is_empty() {
            action.rejected(EMPTY_DESCRIPTION);
            return Err(ClientError::validation(EMPTY_DESCRIPTION));
        }

        action.started(STARTED_MESSAGE);
        info!(
            provider = %request.provider,
            authenticated = credential.is_some(),
            "requesting spreadsheet generation"
        );
        match self.fetch_and_save(request, credential).await {
            Ok(artifact) => {
                action.succeeded(SUCCEEDED_MESSAGE);
                Ok(artifact)
            }
            Err(err) => {
                warn!(%err, "spreadsheet generation failed");
                action.failed(err.user_message(FAILED_FALLBACK));
                Err(err)
            }
        }
    }

    async fn fetch_and_save(
        &self,
        request: &GenerationRequest,
        credential: Option<&Credential>,
    ) -> ClientResult<SavedArtifact> {
        let bytes = self.gateway.generate(request, credential).await?;
        let blob = SpreadsheetBlob::new(bytes);
        let filename = artifact_filename(&self.file_prefix, self.clock.today());
        let path = self.sink.save(&blob, &filename)?;
        Ok(SavedArtifact {
            filename,
            path,
            size_bytes: blob.len(),
        })
    }
}
