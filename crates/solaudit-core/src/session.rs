//! Audit session state: cooldown, last result and its registration.
//!
//! The state is plain data so the binary can persist it between runs; the
//! cooldown window therefore spans invocations.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::ai::Generator;
use crate::audit::{self, AuditOutcome};
use crate::chain::ChainError;
use crate::chain::registry;
use crate::chain::wallet::WalletProvider;
use crate::error::{AnalysisError, AnalysisResult};
use crate::report::model::{RegistrationInfo, SourceInfo};
use crate::source::SourceContext;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationState {
    #[default]
    NotRegistered,
    Registered {
        info: RegistrationInfo,
    },
}

/// The most recent successful audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAudit {
    pub source: SourceInfo,
    pub outcome: AuditOutcome,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub registration: RegistrationState,
    /// Message of the last failed registration attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl StoredAudit {
    pub fn is_registered(&self) -> bool {
        matches!(self.registration, RegistrationState::Registered { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    pub last_completed_at: Option<DateTime<Utc>>,
    pub last_audit: Option<StoredAudit>,
}

impl SessionState {
    /// Load saved state; a missing file is a fresh session.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session state: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("corrupt session state: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write session state: {}", path.display()))
    }
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("no audit result to register, run an audit first")]
    NoResult,

    #[error("source {actual} was not the audited contract ({expected})")]
    SourceMismatch { expected: String, actual: String },

    #[error("audit is already registered: {0}")]
    AlreadyRegistered(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

pub struct AuditSession {
    state: SessionState,
    cooldown: Duration,
}

impl AuditSession {
    pub fn new(state: SessionState, cooldown_secs: u64) -> Self {
        Self {
            state,
            cooldown: Duration::seconds(cooldown_secs.min(u32::MAX as u64) as i64),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whole seconds until another analysis may start, rounded up.
    pub fn remaining_cooldown(&self, now: DateTime<Utc>) -> u64 {
        let Some(last) = self.state.last_completed_at else {
            return 0;
        };
        let elapsed = (now - last).max(Duration::zero());
        let remaining_ms = (self.cooldown - elapsed).num_milliseconds();
        if remaining_ms <= 0 {
            0
        } else {
            (remaining_ms as u64).div_ceil(1000)
        }
    }

    /// Run one audit. Only a successful run starts the cooldown and replaces
    /// the stored result.
    pub fn analyze(
        &mut self,
        generator: &dyn Generator,
        source: &SourceContext,
        now: DateTime<Utc>,
    ) -> AnalysisResult<&StoredAudit> {
        let remaining_secs = self.remaining_cooldown(now);
        if remaining_secs > 0 {
            return Err(AnalysisError::CooldownActive { remaining_secs });
        }

        let outcome = audit::analyze(generator, &source.code)?;
        self.state.last_completed_at = Some(now);
        Ok(self.state.last_audit.insert(StoredAudit {
            source: source.source_info(),
            outcome,
            completed_at: now,
            registration: RegistrationState::NotRegistered,
            last_error: None,
        }))
    }

    /// Register the stored result for `source` through `wallet`.
    ///
    /// A failed attempt leaves the audit unregistered and records the error.
    pub fn register(
        &mut self,
        wallet: &dyn WalletProvider,
        source: &SourceContext,
    ) -> Result<RegistrationInfo, RegistrationError> {
        let stored = self
            .state
            .last_audit
            .as_mut()
            .ok_or(RegistrationError::NoResult)?;
        let actual = source.contract_hash_hex();
        if stored.source.contract_hash != actual {
            return Err(RegistrationError::SourceMismatch {
                expected: stored.source.contract_hash.clone(),
                actual,
            });
        }
        if let RegistrationState::Registered { info } = &stored.registration {
            return Err(RegistrationError::AlreadyRegistered(info.transaction_hash.clone()));
        }

        match registry::register_audit(wallet, source, &stored.outcome.result) {
            Ok(info) => {
                stored.registration = RegistrationState::Registered { info: info.clone() };
                stored.last_error = None;
                Ok(info)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to register audit");
                stored.registration = RegistrationState::NotRegistered;
                stored.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}
