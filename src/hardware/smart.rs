//! Drive temperature sensing over ssh: fdisk for discovery, hdparm for power
//! state, smartctl for readings.
//!
//! Per-drive failures never abort a poll. `read_drive_temp` and `query_standby`
//! surface them as `Result`s; `drive_temp` and `is_standby` apply the fallback
//! policy and log it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::hardware::error::{DeviceError, Result};
use crate::hardware::types::{max_reading, TemperatureReading};
use crate::hardware::Device;
use crate::system::executor::CommandExecutor;
use crate::system::parser;

pub const DRIVE_LIST_COMMAND: &str = "fdisk -l";

pub fn standby_command(drive_path: &str) -> String {
    format!("hdparm -C {}", drive_path)
}

pub fn smart_command(drive_path: &str) -> String {
    format!("smartctl -x {} | grep -E \"Temperature|temperature\"", drive_path)
}

pub struct SmartDevice {
    hostname: String,
    shell: Arc<dyn CommandExecutor>,
    fallback_temp: f64,
    /// Configured drive paths, or the discovered list once resolved.
    drives: Mutex<Option<Vec<String>>>,
}

impl SmartDevice {
    pub fn new(
        hostname: impl Into<String>,
        shell: Arc<dyn CommandExecutor>,
        drives: Option<Vec<String>>,
        fallback_temp: f64,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            shell,
            fallback_temp,
            drives: Mutex::new(drives.filter(|d| !d.is_empty())),
        }
    }

    pub fn fallback_temp(&self) -> f64 {
        self.fallback_temp
    }

    /// Enumerate SATA and NVMe drives from the partition table listing.
    /// Transport failures are fatal: nothing can be polled without a drive list.
    pub async fn list_drives(&self) -> Result<Vec<String>> {
        let result = self
            .shell
            .run(DRIVE_LIST_COMMAND)
            .await
            .map_err(|e| {
                info!("{} failed to get drive list: {}", self.hostname, e);
                DeviceError::transport(&self.hostname, e)
            })?;

        let drives = parser::parse_drive_list(&result.stdout);
        debug!("{} drives: {:?}", self.hostname, drives);
        Ok(drives)
    }

    /// Drive list to poll, discovering it on first use when none was configured.
    pub async fn drives(&self) -> Result<Vec<String>> {
        let mut drives = self.drives.lock().await;
        if let Some(known) = drives.as_ref() {
            return Ok(known.clone());
        }

        let discovered = self.list_drives().await?;
        if !discovered.is_empty() {
            *drives = Some(discovered.clone());
        }
        Ok(discovered)
    }

    /// Raw power-state query. NVMe paths have no standby state and are never queried.
    pub async fn query_standby(&self, drive_path: &str) -> Result<bool> {
        if !parser::is_sata_path(drive_path) {
            return Ok(false);
        }

        let result = self
            .shell
            .run(&standby_command(drive_path))
            .await
            .map_err(|e| DeviceError::transport(&self.hostname, e))?;
        Ok(parser::reports_standby(&result.stdout))
    }

    /// Fail-open standby check: a failed query reports "not standby".
    pub async fn is_standby(&self, drive_path: &str) -> bool {
        match self.query_standby(drive_path).await {
            Ok(true) => {
                info!("{} {} is in standby mode.", self.hostname, drive_path);
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("hdparm check failed for {}: {}", drive_path, e);
                false
            }
        }
    }

    /// Read one drive's temperature. `Ok(None)` means smartctl answered but no
    /// temperature line was recognised.
    pub async fn read_drive_temp(&self, drive_path: &str) -> Result<Option<f64>> {
        let result = self
            .shell
            .run(&smart_command(drive_path))
            .await
            .map_err(|e| DeviceError::transport(&self.hostname, e))?;

        let temp = parser::parse_drive_temperature(&result.stdout);
        if temp.is_none() {
            info!("{} could not extract drive temperature {}:", self.hostname, drive_path);
            info!("result = {:?}", result.stdout);
        }
        Ok(temp)
    }

    /// Temperature of one drive, or `fallback` when it is asleep or unreadable.
    /// Standby drives are not touched by smartctl so they stay spun down.
    pub async fn drive_temp(&self, drive_path: &str, fallback: f64) -> f64 {
        if self.is_standby(drive_path).await {
            return fallback;
        }

        match self.read_drive_temp(drive_path).await {
            Ok(Some(temp)) => temp,
            Ok(None) => fallback,
            Err(e) => {
                info!("{} failed to get drive temperature {}: {}", self.hostname, drive_path, e);
                fallback
            }
        }
    }

    /// Per-drive readings for the whole host.
    pub async fn drive_readings(&self, fallback: f64) -> Result<Vec<TemperatureReading>> {
        let drives = self.drives().await?;

        let mut readings = Vec::with_capacity(drives.len());
        for drive_path in drives {
            let value = self.drive_temp(&drive_path, fallback).await;
            readings.push(TemperatureReading { value, source: drive_path });
        }
        Ok(readings)
    }

    /// Hottest drive, truncated to whole degrees. An empty drive list is an error.
    pub async fn aggregate_temp(&self, fallback: f64) -> Result<i64> {
        let readings = self.drive_readings(fallback).await?;

        match max_reading(&readings) {
            Some(max) => {
                debug!("{} drive temps: {:?}", self.hostname, readings);
                Ok(max.trunc() as i64)
            }
            None => {
                info!("{} drive_temps = {:?}", self.hostname, readings);
                Err(DeviceError::EmptyDriveList { host: self.hostname.clone() })
            }
        }
    }
}

#[async_trait]
impl Device for SmartDevice {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    async fn get_temp(&self) -> Result<i64> {
        self.aggregate_temp(self.fallback_temp).await
    }
}
