use crate::error::{ClientError, ClientResult};
use crate::gateway::HttpGateway;
use crate::models::{
    AuthCredentials, FederatedProvider, GenerationRequest, GenerationSummary, Provider,
};
use crate::token_store::Credential;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;
use url::Url;

/// A request observed by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Generate {
        description: String,
        provider: Provider,
        bearer: Option<String>,
    },
    ListGenerations,
    Login {
        email: String,
    },
    Register {
        email: String,
    },
    FederatedLogin(FederatedProvider),
    Ping,
}

/// Holds `list_generations` until released.
#[derive(Clone, Default)]
pub struct ListGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl ListGate {
    /// Resolves once a list call is parked at the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

struct Script {
    spreadsheet: ClientResult<Vec<u8>>,
    generations: ClientResult<Vec<GenerationSummary>>,
    login: ClientResult<String>,
    register: ClientResult<()>,
    federated: HashMap<FederatedProvider, ClientResult<Option<Url>>>,
    list_gate: Option<ListGate>,
    calls: Vec<GatewayCall>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            spreadsheet: Ok(b"PK\x03\x04mock-spreadsheet".to_vec()),
            generations: Ok(Vec::new()),
            login: Ok("mock-token".to_string()),
            register: Ok(()),
            federated: HashMap::new(),
            list_gate: None,
            calls: Vec::new(),
        }
    }
}

/// Scripted in-memory stand-in for the spreadsheet service.
///
/// Clones share the script and the call log.
#[derive(Clone, Default)]
pub struct MockGateway {
    script: Arc<Mutex<Script>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spreadsheet(self, bytes: Vec<u8>) -> Self {
        self.script.lock().spreadsheet = Ok(bytes);
        self
    }

    pub fn fail_generate(self, err: ClientError) -> Self {
        self.script.lock().spreadsheet = Err(err);
        self
    }

    pub fn with_generations(self, items: Vec<GenerationSummary>) -> Self {
        self.script.lock().generations = Ok(items);
        self
    }

    pub fn fail_generations(self, err: ClientError) -> Self {
        self.script.lock().generations = Err(err);
        self
    }

    pub fn with_login_token(self, token: impl Into<String>) -> Self {
        self.script.lock().login = Ok(token.into());
        self
    }

    pub fn fail_login(self, err: ClientError) -> Self {
        self.script.lock().login = Err(err);
        self
    }

    pub fn fail_register(self, err: ClientError) -> Self {
        self.script.lock().register = Err(err);
        self
    }

    pub fn with_federated_url(self, provider: FederatedProvider, url: Option<Url>) -> Self {
        self.script.lock().federated.insert(provider, Ok(url));
        self
    }

    /// Park every `list_generations` call behind the returned gate.
    pub fn gate_generations(&self) -> ListGate {
        let gate = ListGate::default();
        self.script.lock().list_gate = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.script.lock().calls.clone()
    }

    fn record(&self, call: GatewayCall) {
        self.script.lock().calls.push(call);
    }
}

#[async_trait]
impl HttpGateway for MockGateway {
    async fn generate(
        &self,
        request: &GenerationRequest,
        credential: Option<&Credential>,
    ) -> ClientResult<Vec<u8>> {
        self.record(GatewayCall::Generate {
            description: request.description.clone(),
            provider: request.provider,
            bearer: credential.map(|c| c.as_str().to_string()),
        });
        self.script.lock().spreadsheet.clone()
    }

    async fn list_generations(&self) -> ClientResult<Vec<GenerationSummary>> {
        self.record(GatewayCall::ListGenerations);
        let gate = self.script.lock().list_gate.clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.script.lock().generations.clone()
    }

    async fn login(&self, credentials: &AuthCredentials) -> ClientResult<Credential> {
        self.record(GatewayCall::Login {
            email: credentials.email.clone(),
        });
        let token = self.script.lock().login.clone()?;
        Credential::new(token)
            .ok_or_else(|| ClientError::remote(Some(200), Some("empty token".into())))
    }

    async fn register(&self, credentials: &AuthCredentials) -> ClientResult<()> {
        self.record(GatewayCall::Register {
            email: credentials.email.clone(),
        });
        self.script.lock().register.clone()
    }

    async fn federated_login_url(
        &self,
        provider: FederatedProvider,
    ) -> ClientResult<Option<Url>> {
        self.record(GatewayCall::FederatedLogin(provider));
        self.script
            .lock()
            .federated
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| {
                Err(ClientError::remote(
                    Some(400),
                    Some(format!("{} OAuth not configured", provider.display_name())),
                ))
            })
    }

    async fn ping(&self) -> ClientResult<()> {
        self.record(GatewayCall::Ping);
        Ok(())
    }
}
