use crate::events::EventSink;
use crate::recorder::StatusRecorder;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use uptime_core::config::{env_override, parse_address, read_config_file, resolve_env_ref};
use uptime_core::{Address, SimpleAccessController};
use uptime_storage::AnyBackend;

/// Recorder deployment settings, loaded from TOML.
///
/// ```toml
/// [recorder]
/// l1_sender = "env:UPTIME_L1_VALIDATOR"
/// description = "Arbitrum One uptime"
///
/// [access]
/// deployer = "0x..."
/// check_enabled = true
/// readers = ["0x..."]
///
/// [storage]
/// path = "data/uptime-feed"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RecorderConfig {
    pub recorder: RecorderSection,
    pub access: AccessSection,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecorderSection {
    /// Raw L1 address of the validator; the recorder trusts its alias.
    pub l1_sender: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessSection {
    pub deployer: String,
    #[serde(default = "default_true")]
    pub check_enabled: bool,
    #[serde(default)]
    pub readers: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSection {
    /// sled directory; in-memory when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl RecorderConfig {
    pub fn from_toml(path: &Path) -> Result<Self> {
        let raw = read_config_file(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut cfg: RecorderConfig = toml::from_str(raw).context("failed parsing config toml")?;

        // Env overrides (explicit) first.
        if let Some(v) = env_override("UPTIME_TRUSTED_L1_SENDER") {
            cfg.recorder.l1_sender = v;
        }
        if let Some(v) = env_override("UPTIME_STORE_PATH") {
            cfg.storage.path = Some(PathBuf::from(v));
        }

        // Resolve env:VAR references.
        cfg.recorder.l1_sender = resolve_env_ref(&cfg.recorder.l1_sender)?;
        cfg.access.deployer = resolve_env_ref(&cfg.access.deployer)?;
        for reader in cfg.access.readers.iter_mut() {
            *reader = resolve_env_ref(reader)?;
        }

        // Validate eagerly so a bad file fails at load, not at first use.
        cfg.l1_sender()?;
        cfg.deployer()?;
        cfg.readers()?;
        if let Some(d) = &cfg.recorder.description {
            if d.trim().is_empty() {
                return Err(anyhow!("recorder.description must not be empty when set"));
            }
        }
        Ok(cfg)
    }

    pub fn l1_sender(&self) -> Result<Address> {
        parse_address("recorder.l1_sender", &self.recorder.l1_sender)
    }

    /// The address the recorder authenticates reports against.
    pub fn trusted_sender(&self) -> Result<Address> {
        Ok(self.l1_sender()?.alias())
    }

    pub fn deployer(&self) -> Result<Address> {
        parse_address("access.deployer", &self.access.deployer)
    }

    pub fn readers(&self) -> Result<Vec<Address>> {
        self.access
            .readers
            .iter()
            .map(|r| parse_address("access.readers", r))
            .collect()
    }

    /// Allow-list gate holding the deployer and the configured readers.
    pub fn build_gate(&self) -> Result<SimpleAccessController> {
        let mut holders = vec![self.deployer()?];
        holders.extend(self.readers()?);
        Ok(SimpleAccessController::with_holders(holders).with_check(self.access.check_enabled))
    }

    /// Recorder wired from this config: gate from `[access]`, sled store at
    /// `storage.path` (in-memory when unset), optional description.
    pub fn build_recorder<E: EventSink>(
        &self,
        events: E,
    ) -> Result<StatusRecorder<SimpleAccessController, AnyBackend, E>> {
        let backend = AnyBackend::open(self.storage.path.as_deref())
            .context("failed opening round store")?;
        let persistent = backend.is_persistent();
        let recorder =
            StatusRecorder::new(self.trusted_sender()?, self.build_gate()?, backend, events)
                .context("failed building recorder")?;
        info!(
            trusted_sender = %recorder.trusted_sender(),
            persistent,
            "recorder built from config"
        );
        Ok(match &self.recorder.description {
            Some(d) => recorder.with_description(d.clone()),
            None => recorder,
        })
    }
}
