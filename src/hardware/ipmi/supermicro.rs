//! Supermicro BMC device: one type for every board generation, with the
//! generation tag selecting zone layout, raw dialect and transport.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::hardware::error::Result;
use crate::hardware::types::{FanMode, FanState, FruInventory, SpeedZone};
use crate::hardware::Device;
use crate::system::executor::IpmiTool;

use super::generation::Generation;
use super::sensors::SensorSource;

/// Controller state cached for the life of the device. Fan state is only
/// written after a command succeeds; FRU is fetched at most once.
#[derive(Debug, Default)]
pub struct BmcState {
    pub fan: FanState,
    pub fru: Option<FruInventory>,
}

pub struct SupermicroBmc {
    pub(crate) hostname: String,
    pub(crate) generation: Generation,
    pub(crate) source: SensorSource,
    pub(crate) ipmi: IpmiTool,
    pub(crate) configured_zones: Option<Vec<SpeedZone>>,
    /// Held for the whole of each operation so mode/speed changes never interleave.
    pub(crate) state: Mutex<BmcState>,
}

impl SupermicroBmc {
    pub fn new(
        hostname: impl Into<String>,
        generation: Generation,
        source: SensorSource,
        ipmi: IpmiTool,
        configured_zones: Option<Vec<SpeedZone>>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            generation,
            source,
            ipmi,
            configured_zones,
            state: Mutex::new(BmcState::default()),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn source(&self) -> SensorSource {
        self.source
    }

    /// Snapshot of the cached fan state.
    pub async fn fan_state(&self) -> FanState {
        self.state.lock().await.fan
    }
}

#[async_trait]
impl Device for SupermicroBmc {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    async fn get_temp(&self) -> Result<i64> {
        match self.source {
            SensorSource::Cpu { core } => self.cpu_temp(core).await,
            SensorSource::Gpu => self.gpu_temp().await,
        }
    }

    async fn set_speed(&self, percent: u8) -> Result<()> {
        self.apply_speed(percent).await
    }

    async fn get_fan_mode(&self) -> Result<FanMode> {
        self.query_fan_mode().await
    }

    async fn set_fan_mode(&self, mode: FanMode) -> Result<()> {
        self.apply_fan_mode(mode).await
    }

    async fn close(&self) -> Result<()> {
        self.restore_standard().await
    }
}
