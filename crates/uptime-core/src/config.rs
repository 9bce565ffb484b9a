//! Helpers shared by the component configuration loaders.
//!
//! Config values may be literal or `env:VAR` references; explicit environment
//! overrides are applied by each loader before references are resolved.

use crate::Address;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::Path;
use std::str::FromStr;

pub fn read_config_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed reading config file: {}", path.display()))
}

pub fn resolve_env_ref(value: &str) -> Result<String> {
    const PREFIX: &str = "env:";
    if let Some(var) = value.strip_prefix(PREFIX) {
        let var = var.trim();
        if var.is_empty() {
            return Err(anyhow!("invalid env ref: {value}"));
        }
        return env::var(var).with_context(|| format!("missing env var {var} for {value}"));
    }
    Ok(value.to_string())
}

/// Non-empty value of `name`, if set.
pub fn env_override(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Non-empty value of `name` parsed as an unsigned integer, if set.
pub fn env_override_uint<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_override(name)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .with_context(|| format!("{name} must be an unsigned integer, got {v:?}"))
        })
        .transpose()
}

/// Resolve `value` and parse it as a non-zero address.
pub fn parse_address(field: &str, value: &str) -> Result<Address> {
    let resolved = resolve_env_ref(value)?;
    let addr: Address = resolved
        .parse()
        .with_context(|| format!("invalid {field}: {resolved}"))?;
    if addr.is_zero() {
        return Err(anyhow!("{field} is the zero address"));
    }
    Ok(addr)
}
