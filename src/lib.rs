//! Hush: thermal sensing and fan actuation for remote servers.
//!
//! Drive temperatures come from smartctl/hdparm over ssh; CPU/GPU temperatures and
//! fan control go through ipmitool against Supermicro BMCs (X9, X10, X11 boards).
//! Everything speaks to hardware via [`system::executor::CommandExecutor`], so the
//! device layer only ever deals with command strings and their text output.

pub mod app;
pub mod config;
pub mod hardware;
pub mod system;
pub mod test_utils;

pub use hardware::{Device, DeviceError, SmartDevice, SupermicroBmc};
