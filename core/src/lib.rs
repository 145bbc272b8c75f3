pub mod auth;
pub mod config;
pub mod download;
pub mod error;
pub mod events;
pub mod gateway;
pub mod generation;
pub mod mock;
pub mod models;
pub mod recent;
pub mod telemetry;
pub mod token_store;

pub use auth::{AuthFlow, AuthFormState, AuthMode, AuthOutcome, AuthStatus};
pub use config::{ClientConfig, ConfigError};
pub use download::{DirectorySink, DownloadSink, SpreadsheetBlob};
pub use error::{ClientError, ClientResult};
pub use events::{Action, ActionEvent, Notifier, Phase};
pub use gateway::{HttpGateway, ReqwestGateway};
pub use generation::{GenerationRequester, SavedArtifact};
pub use mock::MockGateway;
pub use models::{FederatedProvider, GenerationRequest, GenerationSummary, Provider};
pub use recent::{Attachment, RecentFetcher, RecentList};
pub use token_store::{Credential, TokenStore};
