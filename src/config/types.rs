//! Configuration structs and defaults.

use serde::{Deserialize, Serialize};

use crate::config::credentials::HostCredentials;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub drives: DriveSettings,
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Unset defers to `RUST_LOG`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveSettings {
    /// Reported for drives that are asleep or unreadable.
    #[serde(default = "default_fallback_temp")]
    pub fallback_temp: f64,
}

pub fn default_fallback_temp() -> f64 { 30.0 }

/// Which kind of hardware a host entry manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Drive temperatures over ssh (smartctl/hdparm).
    Smart,
    X9,
    X10,
    X11,
    /// GPU sensors on an X9-dialect BMC.
    Gpu,
}

impl DeviceKind {
    pub fn is_controller(self) -> bool {
        !matches!(self, DeviceKind::Smart)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub hostname: String,
    pub kind: DeviceKind,
    /// Drive paths to poll; discovered via `fdisk -l` when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drives: Option<Vec<String>>,
    /// Fan zone tokens; generation defaults apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_zones: Option<Vec<String>>,
    /// Report a single CPU sensor instead of the hottest one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_core: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<HostCredentials>,
}

impl HostConfig {
    pub fn new(hostname: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            hostname: hostname.into(),
            kind,
            drives: None,
            speed_zones: None,
            cpu_core: None,
            fallback_temp: None,
            credentials: None,
        }
    }
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self { fallback_temp: default_fallback_temp() }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent: AgentSettings::default(),
            drives: DriveSettings::default(),
            hosts: Vec::new(),
        }
    }
}
