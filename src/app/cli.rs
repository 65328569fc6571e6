//! Command-line argument definitions (clap).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hush")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Remote drive/BMC temperature sensing and Supermicro fan control",
    long_about = None
)]
pub struct Args {
    /// Config file (default: config.json next to the executable)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Only act on this host (repeatable)
    #[arg(short = 'H', long = "host", global = true)]
    pub hosts: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print each host's representative temperature
    Temp,
    /// List the drives found on drive hosts
    Drives,
    /// Print the current fan mode of BMC hosts
    FanMode,
    /// Set fan speed on BMC hosts, then hand control back to the BMC on exit
    SetSpeed {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
        /// Keep the speed instead of restoring STANDARD mode when done
        #[arg(long)]
        hold: bool,
    },
    /// Restore STANDARD fan mode on BMC hosts
    Reset,
}
