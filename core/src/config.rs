use directories::{BaseDirs, ProjectDirs, UserDirs};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_FILE_PREFIX: &str = "excelvision";

const ENV_BACKEND_URL: &str = "EXCELVISION_BACKEND_URL";
const ENV_DOWNLOAD_DIR: &str = "EXCELVISION_DOWNLOAD_DIR";
const ENV_STATE_DIR: &str = "EXCELVISION_STATE_DIR";

/// Resolved client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend_url: Url,
    pub download_dir: PathBuf,
    /// Directory holding the persisted credential.
    pub state_dir: PathBuf,
    /// Unset means the client waits for the backend however long it takes.
    pub request_timeout_secs: Option<u64>,
    pub file_prefix: String,
    /// Keep the typed password in the form after a failed sign-in.
    pub retain_password: bool,
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    #[error("configuration invalid: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(detail) => {
                format!("{detail}. Update excelvision.yaml or the environment.")
            }
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            download_dir: default_download_dir(),
            state_dir: default_state_dir(),
            request_timeout_secs: None,
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            retain_password: true,
        }
    }
}

impl ClientConfig {
    /// Defaults, then `excelvision.yaml`, then the environment (`.env` included).
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let file = match locate_config_file() {
            Some(path) => Some(read_config_file(&path)?),
            None => None,
        };
        let mut config = Self::default();
        if let Some(file) = file {
            config.apply_file(file)?;
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Root of every API path: `<backend>/api/`.
    pub fn api_base(&self) -> Url {
        api_base(&self.backend_url)
    }

    pub fn with_backend_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.backend_url = parse_backend_url(raw)?;
        Ok(self)
    }

    fn apply_file(&mut self, file: ConfigFile) -> Result<(), ConfigError> {
        if let Some(raw) = file.backend_url {
            self.backend_url = parse_backend_url(&raw)?;
        }
        if let Some(dir) = file.download_dir {
            self.download_dir = dir;
        }
        if let Some(dir) = file.state_dir {
            self.state_dir = dir;
        }
        if let Some(secs) = file.request_timeout_secs {
            if secs == 0 {
                return Err(ConfigError::Invalid(
                    "request_timeout_secs must be greater than zero".to_string(),
                ));
            }
            self.request_timeout_secs = Some(secs);
        }
        if let Some(prefix) = file.file_prefix {
            let prefix = prefix.trim().to_string();
            if prefix.is_empty() {
                return Err(ConfigError::Invalid("file_prefix must not be empty".to_string()));
            }
            self.file_prefix = prefix;
        }
        if let Some(retain) = file.retain_password {
            self.retain_password = retain;
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            self.backend_url = parse_backend_url(&raw)?;
        }
        if let Some(dir) = lookup(ENV_DOWNLOAD_DIR).filter(|v| !v.trim().is_empty()) {
            self.download_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|v| !v.trim().is_empty()) {
            self.state_dir = PathBuf::from(dir);
        }
        Ok(())
    }
}

pub(crate) fn api_base(backend: &Url) -> Url {
    let mut base = backend.clone();
    let path = format!("{}/api/", backend.path().trim_end_matches('/'));
    base.set_path(&path);
    base
}

fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| ConfigError::Invalid(format!("invalid backend_url `{raw}`: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid(format!(
            "backend_url must use http or https, got `{other}`"
        ))),
    }
}

fn default_backend_url() -> Url {
    Url::parse(DEFAULT_BACKEND_URL).expect("default backend url")
}

fn default_download_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_state_dir() -> PathBuf {
    ProjectDirs::from("", "", "excelvision")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".excelvision"))
}

fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        ConfigError::Invalid(format!("failed to read {}: {err}", path.display()))
    })?;
    serde_yaml::from_str(&contents)
        .map_err(|err| ConfigError::Invalid(format!("invalid {}: {err}", path.display())))
}

fn locate_config_file() -> Option<PathBuf> {
    config_file_candidates()
        .into_iter()
        .find(|path| path.exists())
}

fn config_file_candidates() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("excelvision.yaml")];
    if let Some(base) = BaseDirs::new() {
        let config_dir = base.config_dir().join("excelvision");
        paths.push(config_dir.join("excelvision.yaml"));
        paths.push(config_dir.join("excelvision.yml"));
        paths.push(base.home_dir().join(".excelvision").join("excelvision.yaml"));
    }
    paths
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    backend_url: Option<String>,
    download_dir: Option<PathBuf>,
    state_dir: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
    file_prefix: Option<String>,
    retain_password: Option<bool>,
}
