//! Hush entry point: CLI dispatch over the configured hosts.

use anyhow::{bail, Result};
use clap::Parser;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use hush::app::cli::{Args, Command};
use hush::app::logging::{init_tracing, resolve_filter};
use hush::config::persistence::{load_config, log_config_origin};
use hush::config::types::{AgentConfig, HostConfig};
use hush::hardware::factory::{build_bmc, build_device, build_smart};
use hush::hardware::Device;

/// Hosts selected with `--host`, or every configured host.
fn select_hosts<'a>(config: &'a AgentConfig, wanted: &[String]) -> Result<Vec<&'a HostConfig>> {
    if wanted.is_empty() {
        return Ok(config.hosts.iter().collect());
    }

    let mut selected = Vec::new();
    for name in wanted {
        match config.hosts.iter().find(|h| &h.hostname == name) {
            Some(host) => selected.push(host),
            None => bail!("Host {} is not in the configuration", name),
        }
    }
    Ok(selected)
}

/// Set speed on one controller and, unless held, restore STANDARD afterwards.
/// Restoration runs even when setting the speed failed.
async fn set_speed_and_close(device: Arc<dyn Device>, percent: u8, hold: bool) -> Result<String> {
    let outcome = device.set_speed(percent).await;

    if !hold {
        if let Err(e) = device.close().await {
            error!("{}: failed to restore fan control: {}", device.hostname(), e);
        }
    }

    outcome?;
    Ok(if hold {
        format!("{}%", percent)
    } else {
        format!("{}% (restored STANDARD)", percent)
    })
}

async fn run_on_host(
    command: Command,
    host: &HostConfig,
    config: &AgentConfig,
) -> Option<Result<String>> {
    match command {
        Command::Temp => {
            let device = build_device(host, &config.drives);
            Some(device.get_temp().await.map(|t| format!("{}°C", t)).map_err(Into::into))
        }
        Command::Drives => {
            if host.kind.is_controller() {
                return None;
            }
            let device = build_smart(host, &config.drives);
            Some(device.drives().await.map(|d| d.join(" ")).map_err(Into::into))
        }
        Command::FanMode => {
            let device = build_bmc(host)?;
            Some(device.get_fan_mode().await.map(|m| m.to_string()).map_err(Into::into))
        }
        Command::SetSpeed { percent, hold } => {
            let device: Arc<dyn Device> = Arc::new(build_bmc(host)?);
            Some(set_speed_and_close(device, percent, hold).await)
        }
        Command::Reset => {
            let device = build_bmc(host)?;
            Some(device.close().await.map(|_| "STANDARD".to_string()).map_err(Into::into))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, origin) = load_config(args.config.as_deref()).await?;
    init_tracing(resolve_filter(args.log_level.as_deref(), config.agent.log_level.as_deref()));
    log_config_origin(&config, &origin);

    let hosts = select_hosts(&config, &args.hosts)?;
    if hosts.is_empty() {
        warn!("No hosts configured");
        return Ok(());
    }
    debug!("Running {:?} on {} hosts", args.command, hosts.len());

    // Devices are independent, so hosts run concurrently.
    let command = args.command;
    let config = &config;
    let outcomes = join_all(hosts.iter().copied().map(|host| async move {
        (host.hostname.as_str(), run_on_host(command, host, config).await)
    }))
    .await;

    let mut failures = 0;
    for (hostname, outcome) in outcomes {
        match outcome {
            Some(Ok(line)) => println!("{}: {}", hostname, line),
            Some(Err(e)) => {
                error!("{:#}", e);
                failures += 1;
            }
            None => debug!("{}: not applicable", hostname),
        }
    }

    if failures > 0 {
        bail!("{} host(s) failed", failures);
    }
    info!("Done");
    Ok(())
}
