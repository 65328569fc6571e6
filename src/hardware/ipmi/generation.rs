//! Per-generation capabilities: fan zone layout, raw command dialect, and how
//! the controller is reached.

use tracing::info;

use crate::hardware::error::{DeviceError, Result};
use crate::hardware::types::{FanMode, FruInventory, SpeedZone};
use crate::system::parser;

use super::supermicro::{BmcState, SupermicroBmc};

pub const FAN_MODE_QUERY: &str = "raw 0x30 0x45 0";
pub const FRU_QUERY: &str = "fru";

/// Boards with this part number prefix carry four fan zones.
const FOUR_ZONE_BOARD: &str = "X10DRG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    X9,
    X10,
    /// X10 dialect, reached over the network instead of in-band.
    X11,
}

impl Generation {
    /// Zones used when none are configured and none are derived from the FRU.
    pub fn default_zones(self) -> Vec<SpeedZone> {
        match self {
            Generation::X9 => vec![SpeedZone::new("0x10"), SpeedZone::new("0x11")],
            Generation::X10 | Generation::X11 => zones_for_board(""),
        }
    }

    pub fn derives_zones_from_fru(self) -> bool {
        !matches!(self, Generation::X9)
    }

    /// True when ipmitool talks to the BMC over the LAN rather than in-band.
    pub fn uses_lan(self) -> bool {
        matches!(self, Generation::X11)
    }

    pub fn fan_mode_command(self, mode: FanMode) -> String {
        format!("raw 0x30 0x45 0x01 {}", mode.value())
    }

    /// Raw command setting one zone's duty cycle. PWM is rendered like `0x0`, `0xff`.
    pub fn speed_command(self, zone: &SpeedZone, pwm: u8) -> String {
        match self {
            Generation::X9 => format!("raw 0x30 0x91 0x5A 0x03 {} {:#x}", zone, pwm),
            Generation::X10 | Generation::X11 => {
                format!("raw 0x30 0x70 0x66 0x01 0x{} {:#x}", zone, pwm)
            }
        }
    }
}

/// Zone layout implied by a board part number.
pub fn zones_for_board(board_part_number: &str) -> Vec<SpeedZone> {
    let count = if board_part_number.contains(FOUR_ZONE_BOARD) { 4 } else { 2 };
    (0..count).map(|i| SpeedZone::new(format!("{:02}", i))).collect()
}

impl SupermicroBmc {
    /// FRU inventory, fetched on first use and kept for the life of the device.
    pub(crate) async fn fru_locked(&self, state: &mut BmcState) -> Result<FruInventory> {
        if let Some(fru) = &state.fru {
            return Ok(fru.clone());
        }

        let result = self
            .ipmi
            .execute(FRU_QUERY)
            .await
            .map_err(|e| DeviceError::transport(&self.hostname, e))?;
        let fru = parser::parse_fru(&result.stdout);
        info!("{} fru = {:?}", self.hostname, fru);

        state.fru = Some(fru.clone());
        Ok(fru)
    }

    pub async fn board_part_number(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        let fru = self.fru_locked(&mut state).await?;
        Ok(fru.board_part_number().to_string())
    }

    /// Zones to address: configured ones, else derived from the board, else the
    /// generation default.
    pub(crate) async fn speed_zones_locked(&self, state: &mut BmcState) -> Result<Vec<SpeedZone>> {
        if let Some(zones) = self.configured_zones.as_ref().filter(|z| !z.is_empty()) {
            return Ok(zones.clone());
        }

        if self.generation.derives_zones_from_fru() {
            let fru = self.fru_locked(state).await?;
            return Ok(zones_for_board(fru.board_part_number()));
        }

        Ok(self.generation.default_zones())
    }

    pub async fn speed_zones(&self) -> Result<Vec<SpeedZone>> {
        let mut state = self.state.lock().await;
        self.speed_zones_locked(&mut state).await
    }
}
