//! Fan mode and speed actuation.
//!
//! Commands are only sent when the requested mode or speed differs from the
//! cached state, except on teardown where STANDARD is always re-asserted.
//! Changing mode forgets the cached speed since the BMC may have re-driven
//! the fans on its own.

use tracing::{debug, info, warn};

use crate::hardware::error::{DeviceError, Result};
use crate::hardware::types::{percent_to_pwm, FanMode};
use crate::system::parser;

use super::generation::FAN_MODE_QUERY;
use super::supermicro::{BmcState, SupermicroBmc};

impl SupermicroBmc {
    async fn query_fan_mode_locked(&self, state: &mut BmcState) -> Result<FanMode> {
        let result = self
            .ipmi
            .execute(FAN_MODE_QUERY)
            .await
            .map_err(|e| DeviceError::transport(&self.hostname, e))?;

        let mode = parser::parse_raw_byte(&result.stdout)
            .and_then(FanMode::from_value)
            .ok_or_else(|| DeviceError::UnexpectedResponse {
                host: self.hostname.clone(),
                command: FAN_MODE_QUERY.to_string(),
                output: result.stdout.clone(),
            })?;

        if state.fan.mode != Some(mode) {
            state.fan.speed_percent = None;
        }
        state.fan.mode = Some(mode);
        Ok(mode)
    }

    /// Issue the mode command unless the cache already says `target` (or `force`).
    async fn set_fan_mode_locked(
        &self,
        state: &mut BmcState,
        target: FanMode,
        force: bool,
    ) -> Result<()> {
        if !force && state.fan.mode == Some(target) {
            debug!("{} fan mode already {}", self.hostname, target);
            return Ok(());
        }

        self.ipmi
            .execute(&self.generation.fan_mode_command(target))
            .await
            .map_err(|e| DeviceError::transport(&self.hostname, e))?;

        info!("{} fan mode {:?} -> {}", self.hostname, state.fan.mode, target);
        state.fan.mode = Some(target);
        state.fan.speed_percent = None;
        Ok(())
    }

    /// Read the current mode from the controller and cache it.
    pub async fn query_fan_mode(&self) -> Result<FanMode> {
        let mut state = self.state.lock().await;
        self.query_fan_mode_locked(&mut state).await
    }

    pub async fn apply_fan_mode(&self, target: FanMode) -> Result<()> {
        let mut state = self.state.lock().await;
        self.set_fan_mode_locked(&mut state, target, false).await
    }

    /// Set all zones to `percent`. FULL mode is established first; nothing is
    /// sent to the zones if that fails.
    pub async fn apply_speed(&self, percent: u8) -> Result<()> {
        if percent > 100 {
            return Err(DeviceError::InvalidSpeed { host: self.hostname.clone(), percent });
        }

        let mut state = self.state.lock().await;

        self.set_fan_mode_locked(&mut state, FanMode::Full, false)
            .await
            .map_err(|e| DeviceError::Precondition {
                host: self.hostname.clone(),
                required: FanMode::Full,
                source: Box::new(e),
            })?;

        if state.fan.speed_percent == Some(percent) {
            debug!("{} fan speed already {}%", self.hostname, percent);
            return Ok(());
        }

        let zones = self.speed_zones_locked(&mut state).await?;
        let pwm = percent_to_pwm(percent);

        for zone in &zones {
            let command = self.generation.speed_command(zone, pwm);
            debug!("{} zone {} -> {}% -> ipmitool {}", self.hostname, zone, percent, command);
            self.ipmi
                .execute(&command)
                .await
                .map_err(|e| DeviceError::transport(&self.hostname, e))?;
        }

        info!("{} fan speed {}% (pwm {:#x}) on {} zones", self.hostname, percent, pwm, zones.len());
        state.fan.speed_percent = Some(percent);
        Ok(())
    }

    /// Hand fan control back to the BMC regardless of what the cache says.
    pub async fn restore_standard(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.set_fan_mode_locked(&mut state, FanMode::Standard, true)
            .await
            .map_err(|e| {
                warn!("{} failed to restore STANDARD fan mode: {}", self.hostname, e);
                e
            })
    }
}
