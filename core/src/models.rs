use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generation backends the service can be asked for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Let the backend pick.
    #[default]
    Auto,
    OpenAi,
    Anthropic,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Auto,
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Gemini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Auto => "Auto (recommended)",
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Gemini => "Google Gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown provider `{0}` (expected auto, openai, anthropic or gemini)")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| UnknownProvider(value.to_string()))
    }
}

/// Body of `POST /generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub description: String,
    #[serde(default)]
    pub provider: Provider,
}

impl GenerationRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            provider: Provider::Auto,
        }
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }
}

/// Entry of the recent generations list. Read-only on the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationSummary {
    pub id: String,
    pub description: String,
    pub created_at: String,
    pub size_bytes: u64,
    pub provider: String,
    #[serde(default)]
    pub filename: Option<String>,
}

impl GenerationSummary {
    /// Size rounded to the nearest KiB.
    pub fn size_kb(&self) -> u64 {
        self.size_bytes.saturating_add(512) / 1024
    }

    pub fn created_at_local(&self) -> Option<DateTime<Local>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|ts| ts.with_timezone(&Local))
    }

    /// Local time for display, or the raw server value if it does not parse.
    pub fn created_at_display(&self) -> String {
        self.created_at_local()
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.created_at.clone())
    }
}

/// Email and password pair sent to the auth endpoints.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct AuthCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Identity providers offering redirect-based sign-in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FederatedProvider {
    Google,
    Microsoft,
}

impl FederatedProvider {
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Microsoft => "microsoft",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Microsoft => "Microsoft",
        }
    }
}

impl fmt::Display for FederatedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown sign-in provider `{0}` (expected google or microsoft)")]
pub struct UnknownFederatedProvider(pub String);

impl FromStr for FederatedProvider {
    type Err = UnknownFederatedProvider;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "microsoft" => Ok(Self::Microsoft),
            _ => Err(UnknownFederatedProvider(value.to_string())),
        }
    }
}
