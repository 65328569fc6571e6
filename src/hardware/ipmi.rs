//! Supermicro BMC devices reached through ipmitool.
//! `supermicro` holds the device and its cached state; the sibling modules add
//! sensing, fan actuation and per-generation dialect resolution to it.

pub mod fan_control;
pub mod generation;
pub mod sensors;
pub mod supermicro;
