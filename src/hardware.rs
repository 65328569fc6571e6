//! Device trait and the hardware implementations behind it.

use async_trait::async_trait;

pub mod error;
pub mod factory;
pub mod ipmi;
pub mod smart;
pub mod types;

pub use error::{DeviceError, Result};
pub use ipmi::supermicro::SupermicroBmc;
pub use smart::SmartDevice;

use types::FanMode;

/// A managed host that reports one representative temperature and may drive fans.
/// Calls on the same device are serialized internally; separate devices are independent.
#[async_trait]
pub trait Device: Send + Sync {
    fn hostname(&self) -> &str;

    /// Representative temperature in whole degrees Celsius (hottest reading, truncated).
    async fn get_temp(&self) -> Result<i64>;

    /// Set fan speed (0-100%).
    async fn set_speed(&self, _percent: u8) -> Result<()> {
        Err(DeviceError::Unsupported {
            host: self.hostname().to_string(),
            operation: "fan speed control",
        })
    }

    /// Query the controller for its current fan mode.
    async fn get_fan_mode(&self) -> Result<FanMode> {
        Err(DeviceError::Unsupported {
            host: self.hostname().to_string(),
            operation: "fan mode query",
        })
    }

    async fn set_fan_mode(&self, _mode: FanMode) -> Result<()> {
        Err(DeviceError::Unsupported {
            host: self.hostname().to_string(),
            operation: "fan mode control",
        })
    }

    /// Session teardown. Controllers hand fan control back to the BMC.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
