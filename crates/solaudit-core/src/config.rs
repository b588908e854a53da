//! User configuration.
//!
//! Sources, lowest priority first:
//! - `~/.config/solaudit/config.toml` (or an explicit `--config` file)
//! - Environment variables
//! - Command-line flags (applied by the binary)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ai::{AiConfig, LlmBackend};
use crate::chain::registry::DEFAULT_PAGE_SIZE;

/// Seconds between two analyses.
pub const DEFAULT_COOLDOWN_SECS: u64 = 30;

/// EIP-1193 JSON-RPC endpoint of a local signer (Frame's default).
pub const DEFAULT_WALLET_URL: &str = "http://127.0.0.1:1248";

pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub ai: AiSection,
    #[serde(default)]
    pub wallet: WalletSection,
    #[serde(default)]
    pub audit: AuditSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AiSection {
    /// "gemini" (default), "openai" or "ollama"
    pub backend: Option<LlmBackend>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Overrides the backend endpoint, e.g. for a proxy.
    pub endpoint: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct WalletSection {
    pub url: Option<String>,
    pub receipt_poll_secs: Option<u64>,
    /// Give up waiting for a receipt after this many polls. Unset waits forever.
    pub max_receipt_polls: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuditSection {
    pub cooldown_secs: Option<u64>,
    pub page_size: Option<u64>,
    pub rpc_timeout_secs: Option<u64>,
    /// Where the session state (cooldown, last result) is kept.
    pub state_path: Option<PathBuf>,
}

impl Config {
    /// Load from `path`, or from the user config file when it exists, then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::user_config_path().filter(|p| p.exists()),
        };
        if let Some(file) = file {
            config.merge(Self::from_file(&file)?);
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config: {}", path.display()))
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("solaudit").join("config.toml"))
    }

    /// Apply environment overrides read through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(backend) = var("SOLAUDIT_BACKEND").and_then(|b| b.parse().ok()) {
            self.ai.backend = Some(backend);
        }
        if let Some(model) = var("SOLAUDIT_MODEL") {
            self.ai.model = Some(model);
        }
        let backend = self.backend();
        if backend.requires_api_key() {
            if let Some(key) = var(backend.env_key()) {
                self.ai.api_key = Some(key);
            }
        }
        if let Some(url) = var("SOLAUDIT_WALLET_URL") {
            self.wallet.url = Some(url);
        }
        if let Some(secs) = var("SOLAUDIT_COOLDOWN_SECS").and_then(|s| s.parse().ok()) {
            self.audit.cooldown_secs = Some(secs);
        }
    }

    /// Merge another config into this one (other takes priority).
    pub fn merge(&mut self, other: Config) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.ai.backend, other.ai.backend);
        take(&mut self.ai.model, other.ai.model);
        take(&mut self.ai.api_key, other.ai.api_key);
        take(&mut self.ai.endpoint, other.ai.endpoint);
        take(&mut self.ai.temperature, other.ai.temperature);
        take(&mut self.ai.max_tokens, other.ai.max_tokens);
        take(&mut self.ai.timeout_secs, other.ai.timeout_secs);
        take(&mut self.wallet.url, other.wallet.url);
        take(&mut self.wallet.receipt_poll_secs, other.wallet.receipt_poll_secs);
        take(&mut self.wallet.max_receipt_polls, other.wallet.max_receipt_polls);
        take(&mut self.audit.cooldown_secs, other.audit.cooldown_secs);
        take(&mut self.audit.page_size, other.audit.page_size);
        take(&mut self.audit.rpc_timeout_secs, other.audit.rpc_timeout_secs);
        take(&mut self.audit.state_path, other.audit.state_path);
    }

    pub fn backend(&self) -> LlmBackend {
        self.ai.backend.unwrap_or_default()
    }

    pub fn ai_config(&self) -> AiConfig {
        let defaults = AiConfig::default();
        AiConfig {
            backend: self.backend(),
            model: self.ai.model.clone(),
            endpoint: self.ai.endpoint.clone(),
            max_tokens: self.ai.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.ai.temperature.unwrap_or(defaults.temperature),
            timeout_secs: self.ai.timeout_secs.unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn api_key(&self) -> Option<String> {
        self.ai.api_key.clone()
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.audit.cooldown_secs.unwrap_or(DEFAULT_COOLDOWN_SECS)
    }

    pub fn page_size(&self) -> u64 {
        self.audit.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }

    pub fn rpc_timeout_secs(&self) -> u64 {
        self.audit.rpc_timeout_secs.unwrap_or(DEFAULT_RPC_TIMEOUT_SECS)
    }

    pub fn wallet_url(&self) -> &str {
        self.wallet.url.as_deref().unwrap_or(DEFAULT_WALLET_URL)
    }

    pub fn receipt_poll_secs(&self) -> u64 {
        self.wallet.receipt_poll_secs.unwrap_or(2)
    }

    pub fn state_path(&self) -> Option<PathBuf> {
        self.audit.state_path.clone().or_else(|| {
            dirs::data_local_dir().map(|p| p.join("solaudit").join("state.json"))
        })
    }
}
