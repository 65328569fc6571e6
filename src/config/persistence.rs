//! Config file load, save, and validation.

use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::types::{AgentConfig, DeviceKind};

/// Default config location: `config.json` next to the executable.
pub fn default_config_path() -> Result<PathBuf> {
    let exe_dir = std::env::current_exe()?
        .parent()
        .ok_or_else(|| anyhow!("Cannot determine executable directory"))?
        .to_path_buf();
    Ok(exe_dir.join("config.json"))
}

/// Reject configs the device layer cannot act on.
pub fn validate_config(config: &AgentConfig) -> Result<()> {
    let mut seen = HashSet::new();

    for host in &config.hosts {
        if host.hostname.trim().is_empty() {
            bail!("Host entry with empty hostname");
        }
        if !seen.insert(host.hostname.as_str()) {
            bail!("Duplicate host entry: {}", host.hostname);
        }
        if host.speed_zones.is_some() && !host.kind.is_controller() {
            bail!("{}: speed_zones only apply to BMC hosts", host.hostname);
        }
        if host.drives.is_some() && host.kind != DeviceKind::Smart {
            bail!("{}: drives only apply to smart hosts", host.hostname);
        }
        let senses_cpu = matches!(host.kind, DeviceKind::X9 | DeviceKind::X10 | DeviceKind::X11);
        if host.cpu_core.is_some() && !senses_cpu {
            bail!("{}: cpu_core only applies to CPU sensing hosts", host.hostname);
        }
    }

    Ok(())
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// No file at this path; defaults were used.
    Defaults(PathBuf),
}

/// Load and validate the config. Does not log; pass the origin to
/// `log_config_origin` once tracing is initialised.
pub async fn load_config(path: Option<&Path>) -> Result<(AgentConfig, ConfigOrigin)> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if !config_path.exists() {
        return Ok((AgentConfig::default(), ConfigOrigin::Defaults(config_path)));
    }

    let content = tokio::fs::read_to_string(&config_path)
        .await
        .with_context(|| format!("Failed to read config: {:?}", config_path))?;
    let config: AgentConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config JSON: {:?}", config_path))?;

    validate_config(&config)?;
    Ok((config, ConfigOrigin::File(config_path)))
}

pub fn log_config_origin(config: &AgentConfig, origin: &ConfigOrigin) {
    match origin {
        ConfigOrigin::File(path) => {
            info!("Loaded configuration from: {:?} ({} hosts)", path, config.hosts.len())
        }
        ConfigOrigin::Defaults(path) => {
            info!("Config file {:?} not found, using defaults", path)
        }
    }
}

pub async fn save_config(config: &AgentConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!("Configuration saved to: {:?}", path);
    Ok(())
}
