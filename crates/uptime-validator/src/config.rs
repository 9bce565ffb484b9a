use crate::condition::StalenessCondition;
use crate::fees::{GasConfig, PaymentStrategy, Wei};
use crate::validator::ValidatorParams;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use uptime_core::config::{env_override_uint, parse_address, read_config_file};
use uptime_core::{Address, Aggregator};

/// Validator deployment settings, loaded from TOML.
///
/// ```toml
/// [validator]
/// address = "env:VALIDATOR_ADDRESS"
/// owner = "0x..."
/// recorder = "0x..."
///
/// [gas]
/// max_gas = 1000000
/// # integer, or a decimal string for bids past i64::MAX
/// gas_price_bid = "1000000"
/// payment_strategy = "l1"
///
/// [condition]
/// staleness_threshold_secs = 3600
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorConfig {
    pub validator: ValidatorSection,
    pub gas: GasSection,
    #[serde(default)]
    pub condition: ConditionSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorSection {
    pub address: String,
    pub owner: String,
    pub recorder: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GasSection {
    pub max_gas: u64,
    #[serde(deserialize_with = "deserialize_wei")]
    pub gas_price_bid: Wei,
    #[serde(default)]
    pub payment_strategy: PaymentStrategy,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConditionSection {
    /// Enables the staleness condition when set.
    #[serde(default)]
    pub staleness_threshold_secs: Option<u64>,
}

/// TOML integers stop at `i64::MAX`; larger bids are written as strings.
fn deserialize_wei<'de, D>(deserializer: D) -> std::result::Result<Wei, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(Wei::from(v)),
        Raw::Str(s) => s
            .trim()
            .parse::<Wei>()
            .map_err(|e| serde::de::Error::custom(format!("invalid wei amount {s:?}: {e}"))),
    }
}

impl ValidatorConfig {
    pub fn from_toml(path: &Path) -> Result<Self> {
        let raw = read_config_file(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: ValidatorConfig = toml::from_str(raw).context("failed parsing config toml")?;
        let cfg = cfg.with_gas_overrides(
            env_override_uint("VALIDATOR_MAX_GAS")?,
            env_override_uint("VALIDATOR_GAS_PRICE_BID")?,
        );
        cfg.params()?;
        if cfg.condition.staleness_threshold_secs == Some(0) {
            return Err(anyhow!("condition.staleness_threshold_secs must be non-zero"));
        }
        Ok(cfg)
    }

    fn with_gas_overrides(mut self, max_gas: Option<u64>, gas_price_bid: Option<Wei>) -> Self {
        if let Some(v) = max_gas {
            self.gas.max_gas = v;
        }
        if let Some(v) = gas_price_bid {
            self.gas.gas_price_bid = v;
        }
        self
    }

    pub fn address(&self) -> Result<Address> {
        parse_address("validator.address", &self.validator.address)
    }

    pub fn owner(&self) -> Result<Address> {
        parse_address("validator.owner", &self.validator.owner)
    }

    pub fn recorder(&self) -> Result<Address> {
        parse_address("validator.recorder", &self.validator.recorder)
    }

    pub fn gas_config(&self) -> Result<GasConfig> {
        let gas = GasConfig::new(self.gas.max_gas, self.gas.gas_price_bid);
        gas.validate().map_err(|e| anyhow!("gas: {e}"))?;
        Ok(gas)
    }

    /// Everything [`crate::CrossDomainValidator::new`] needs, validated.
    pub fn params(&self) -> Result<ValidatorParams> {
        Ok(ValidatorParams {
            address: self.address()?,
            owner: self.owner()?,
            recorder: self.recorder()?,
            gas: self.gas_config()?,
            payment: self.gas.payment_strategy,
        })
    }

    /// Staleness condition over `feed`, when `[condition]` enables one.
    pub fn staleness_condition<F: Aggregator>(&self, feed: F) -> Option<StalenessCondition<F>> {
        self.condition
            .staleness_threshold_secs
            .map(|threshold| StalenessCondition::new(feed, threshold))
    }
}
