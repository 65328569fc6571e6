//! Builds devices from host config entries, wiring up credentials and transports.

use std::sync::Arc;

use tracing::debug;

use crate::config::credentials::{self, CredentialScope};
use crate::config::types::{DeviceKind, DriveSettings, HostConfig};
use crate::hardware::ipmi::generation::Generation;
use crate::hardware::ipmi::sensors::SensorSource;
use crate::hardware::types::SpeedZone;
use crate::hardware::{Device, SmartDevice, SupermicroBmc};
use crate::system::executor::{CommandExecutor, IpmiInterface, IpmiTool, LocalShell, SshShell};

pub fn generation_for(kind: DeviceKind) -> Option<Generation> {
    match kind {
        DeviceKind::Smart => None,
        DeviceKind::X9 | DeviceKind::Gpu => Some(Generation::X9),
        DeviceKind::X10 => Some(Generation::X10),
        DeviceKind::X11 => Some(Generation::X11),
    }
}

fn ssh_shell(host: &HostConfig) -> Arc<dyn CommandExecutor> {
    let configured = host.credentials.as_ref();
    let creds = credentials::resolve(&host.hostname, configured, CredentialScope::Os);
    Arc::new(SshShell::new(&host.hostname, creds))
}

/// ipmitool in-band over ssh for older boards, over the LAN for X11.
fn ipmi_tool(host: &HostConfig, generation: Generation) -> IpmiTool {
    if generation.uses_lan() {
        let configured = host.credentials.as_ref();
        let creds = credentials::resolve(&host.hostname, configured, CredentialScope::Oob);
        let interface = IpmiInterface::Lan {
            host: host.hostname.clone(),
            username: creds.username.unwrap_or_default(),
            password: creds.password.unwrap_or_default(),
        };
        IpmiTool::new(Arc::new(LocalShell), interface)
    } else {
        IpmiTool::new(ssh_shell(host), IpmiInterface::Local)
    }
}

pub fn build_smart(host: &HostConfig, defaults: &DriveSettings) -> SmartDevice {
    SmartDevice::new(
        &host.hostname,
        ssh_shell(host),
        host.drives.clone(),
        host.fallback_temp.unwrap_or(defaults.fallback_temp),
    )
}

/// Returns `None` for drive-only hosts.
pub fn build_bmc(host: &HostConfig) -> Option<SupermicroBmc> {
    let generation = generation_for(host.kind)?;
    let source = match host.kind {
        DeviceKind::Gpu => SensorSource::Gpu,
        _ => SensorSource::Cpu { core: host.cpu_core },
    };
    let zones = host
        .speed_zones
        .as_ref()
        .map(|z| z.iter().map(SpeedZone::new).collect());

    Some(SupermicroBmc::new(&host.hostname, generation, source, ipmi_tool(host, generation), zones))
}

pub fn build_device(host: &HostConfig, defaults: &DriveSettings) -> Arc<dyn Device> {
    debug!("Building {:?} device for {}", host.kind, host.hostname);
    match build_bmc(host) {
        Some(bmc) => Arc::new(bmc),
        None => Arc::new(build_smart(host, defaults)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::credentials::{Credentials, HostCredentials};

    #[test]
    fn test_generation_for_kind() {
        assert_eq!(generation_for(DeviceKind::Smart), None);
        assert_eq!(generation_for(DeviceKind::Gpu), Some(Generation::X9));
        assert_eq!(generation_for(DeviceKind::X11), Some(Generation::X11));
    }

    #[test]
    fn test_gpu_host_builds_x9_gpu_device() {
        let mut host = HostConfig::new("gpu1", DeviceKind::Gpu);
        host.speed_zones = Some(vec!["0x10".to_string()]);

        let bmc = build_bmc(&host).unwrap();
        assert_eq!(bmc.generation(), Generation::X9);
        assert_eq!(bmc.source(), SensorSource::Gpu);
    }

    #[test]
    fn test_cpu_core_is_passed_through() {
        let mut host = HostConfig::new("bmc1", DeviceKind::X10);
        host.cpu_core = Some(1);

        let bmc = build_bmc(&host).unwrap();
        assert_eq!(bmc.source(), SensorSource::Cpu { core: Some(1) });
    }

    #[test]
    fn test_x11_reaches_bmc_over_lan() {
        let mut host = HostConfig::new("bmc3", DeviceKind::X11);
        host.credentials = Some(HostCredentials {
            os: None,
            oob: Some(Credentials {
                username: Some("ADMIN".to_string()),
                password: Some("pw".to_string()),
            }),
        });

        let bmc = build_bmc(&host).unwrap();
        assert_eq!(
            bmc.ipmi.command_line("-c sdr"),
            "ipmitool -I lan -H 'bmc3' -U 'ADMIN' -P 'pw' -c sdr"
        );
    }

    #[test]
    fn test_x10_is_in_band() {
        let bmc = build_bmc(&HostConfig::new("bmc2", DeviceKind::X10)).unwrap();
        assert!(matches!(bmc.ipmi.interface(), IpmiInterface::Local));
    }

    #[test]
    fn test_smart_host_uses_fallback_default() {
        let host = HostConfig::new("nas1", DeviceKind::Smart);
        assert!(build_bmc(&host).is_none());

        let dev = build_smart(&host, &DriveSettings { fallback_temp: 28.0 });
        assert_eq!(dev.fallback_temp(), 28.0);
        assert_eq!(build_device(&host, &DriveSettings::default()).hostname(), "nas1");
    }
}
