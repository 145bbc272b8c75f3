//! Contract with the remote spreadsheet service.
//!
//! Every call is attempted exactly once. Failures come back as
//! [`ClientError`] and are never retried here.

use crate::config::{api_base, ClientConfig};
use crate::error::{ClientError, ClientResult};
use crate::models::{
    AuthCredentials, FederatedProvider, GenerationRequest, GenerationSummary,
};
use crate::token_store::Credential;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const SPREADSHEET_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[async_trait]
pub trait HttpGateway: Send + Sync {
    /// `POST /generate`, returning the raw spreadsheet bytes.
    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: Option<&Credential>,
    ) -> ClientResult<Vec<u8>>;

    /// `GET /generations`, in the order the server returns them.
    async fn list_generations(&self) -> ClientResult<Vec<GenerationSummary>>;

    /// `POST /auth/login`.
    async fn login(&self, credentials: &AuthCredentials) -> ClientResult<Credential>;

    /// `POST /auth/register`.
    async fn register(&self, credentials: &AuthCredentials) -> ClientResult<()>;

    /// `GET /auth/{provider}/login`; `None` when the body carries no URL.
    async fn federated_login_url(&self, provider: FederatedProvider)
        -> ClientResult<Option<Url>>;

    /// `GET /` to wake the backend up.
    async fn ping(&self) -> ClientResult<()>;
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct AuthUrlResponse {
    #[serde(default)]
    auth_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// [`HttpGateway`] over reqwest.
#[derive(Clone)]
pub struct ReqwestGateway {
    client: Client,
    api_base: Url,
}

impl std::fmt::Debug for ReqwestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestGateway")
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}

impl ReqwestGateway {
    pub fn new(backend_url: &Url, timeout: Option<Duration>) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ClientError::Network(format!("failed to create HTTP client: {err}")))?;
        Ok(Self {
            client,
            api_base: api_base(backend_url),
        })
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(
            &config.backend_url,
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.api_base
            .join(path)
            .map_err(|err| ClientError::Network(format!("invalid endpoint `{path}`: {err}")))
    }
}

/// Pass 2xx responses through; turn anything else into `ClientError::Remote`
/// carrying the server's `detail` text when it is a string.
async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.detail)
        .and_then(|detail| match detail {
            serde_json::Value::String(text) => Some(text),
            _ => None,
        });
    warn!(status = status.as_u16(), detail = ?detail, "backend returned an error");
    Err(ClientError::remote(Some(status.as_u16()), detail))
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| {
        debug!(%err, "malformed response body");
        ClientError::remote(Some(status), None)
    })
}

#[async_trait]
impl HttpGateway for ReqwestGateway {
    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: Option<&Credential>,
    ) -> ClientResult<Vec<u8>> {
        let mut builder = self
            .client
            .post(self.endpoint("generate")?)
            .header(ACCEPT, SPREADSHEET_MIME)
            .json(request);
        if let Some(credential) = credential {
            builder = builder.header(AUTHORIZATION, credential.bearer());
        }
        let response = check_status(builder.send().await?).await?;
        let bytes = response.bytes().await?;
        debug!(size = bytes.len(), "received spreadsheet payload");
        Ok(bytes.to_vec())
    }

    async fn list_generations(&self) -> ClientResult<Vec<GenerationSummary>> {
        let response = self.client.get(self.endpoint("generations")?).send().await?;
        let response = check_status(response).await?;
        let items: Option<Vec<GenerationSummary>> = decode_json(response).await?;
        Ok(items.unwrap_or_default())
    }

    async fn login(&self, credentials: &AuthCredentials) -> ClientResult<Credential> {
        let response = self
            .client
            .post(self.endpoint("auth/login")?)
            .json(credentials)
            .send()
            .await?;
        let response = check_status(response).await?;
        let status = response.status().as_u16();
        let body: LoginResponse = decode_json(response).await?;
        Credential::new(body.access_token).ok_or_else(|| {
            ClientError::remote(Some(status), Some("Login returned an empty token".into()))
        })
    }

    async fn register(&self, credentials: &AuthCredentials) -> ClientResult<()> {
        let response = self
            .client
            .post(self.endpoint("auth/register")?)
            .json(credentials)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn federated_login_url(
        &self,
        provider: FederatedProvider,
    ) -> ClientResult<Option<Url>> {
        let path = format!("auth/{}/login", provider.path_segment());
        let response = self.client.get(self.endpoint(&path)?).send().await?;
        let response = check_status(response).await?;
        let status = response.status().as_u16();
        let body: AuthUrlResponse = decode_json(response).await?;
        match body.auth_url.filter(|raw| !raw.is_empty()) {
            Some(raw) => Url::parse(&raw).map(Some).map_err(|err| {
                ClientError::remote(Some(status), Some(format!("invalid auth_url: {err}")))
            }),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> ClientResult<()> {
        let response = self.client.get(self.api_base.clone()).send().await?;
        check_status(response).await?;
        Ok(())
    }
}
