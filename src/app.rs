//! Application edge: CLI definitions and logging setup.

pub mod cli;
pub mod logging;
