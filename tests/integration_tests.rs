/*
 * Integration tests for Hush
 *
 * Drive devices through the public API against a fake executor that plays
 * back canned tool output and records every command line.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use hush::hardware::ipmi::generation::Generation;
use hush::hardware::ipmi::sensors::SensorSource;
use hush::hardware::types::{FanMode, SpeedZone};
use hush::system::executor::{CommandExecutor, CommandOutput, ExecError, IpmiInterface, IpmiTool};
use hush::{Device, DeviceError, SmartDevice, SupermicroBmc};

/// Replies by exact command line; anything else fails like a missing binary.
#[derive(Default)]
struct FakeHost {
    replies: HashMap<String, String>,
    log: Mutex<Vec<String>>,
}

impl FakeHost {
    fn with(replies: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            replies: replies.iter().map(|(c, o)| (c.to_string(), o.to_string())).collect(),
            log: Mutex::new(Vec::new()),
        })
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn count(&self, command: &str) -> usize {
        self.log().iter().filter(|c| *c == command).count()
    }
}

#[async_trait]
impl CommandExecutor for FakeHost {
    async fn run(&self, command: &str) -> Result<CommandOutput, ExecError> {
        self.log.lock().unwrap().push(command.to_string());
        match self.replies.get(command) {
            Some(out) => Ok(CommandOutput::new(out.clone())),
            None => Err(ExecError::Failed {
                command: command.to_string(),
                code: Some(127),
                stderr: "command not found".to_string(),
            }),
        }
    }
}

const SDR: &str = "CPU1 Temp,45,degrees C,ok\nCPU2 Temp,52,degrees C,ok\nFAN1,1200,RPM,ok\n";

fn bmc(host: &Arc<FakeHost>, generation: Generation, zones: Option<Vec<&str>>) -> SupermicroBmc {
    SupermicroBmc::new(
        "bmc1",
        generation,
        SensorSource::cpu(),
        IpmiTool::new(host.clone(), IpmiInterface::Local),
        zones.map(|z| z.into_iter().map(SpeedZone::new).collect()),
    )
}

#[tokio::test]
async fn test_standby_drive_and_hot_drive() {
    let host = FakeHost::with(&[
        ("hdparm -C /dev/sda", "\n/dev/sda:\n drive state is:  standby\n"),
        ("hdparm -C /dev/sdb", "\n/dev/sdb:\n drive state is:  active/idle\n"),
        (
            "smartctl -x /dev/sdb | grep -E \"Temperature|temperature\"",
            "194 Temperature_Celsius     -O---K   042   052   ---    -    42 (Min/Max 19/52)\n\
             Current Temperature:                    42 Celsius\n",
        ),
    ]);
    let nas = SmartDevice::new(
        "nas1",
        host.clone(),
        Some(vec!["/dev/sda".to_string(), "/dev/sdb".to_string()]),
        30.0,
    );

    assert_eq!(nas.aggregate_temp(30.0).await.unwrap(), 42);
    assert!(host.log().iter().all(|c| !c.contains("smartctl -x /dev/sda")));
}

#[tokio::test]
async fn test_discovered_nvme_and_sata_mix() {
    let host = FakeHost::with(&[
        (
            "fdisk -l",
            "Disk /dev/sda: 1.82 TiB\nDisk /dev/nvme0n1: 931.51 GiB\nDisk /dev/nvme1n1: 931.51 GiB\n",
        ),
        ("hdparm -C /dev/sda", " drive state is:  active/idle\n"),
        (
            "smartctl -x /dev/sda | grep -E \"Temperature|temperature\"",
            "194 Temperature_Celsius     0x0022   033   045   000    Old_age   Always       -       33\n",
        ),
        (
            "smartctl -x /dev/nvme0n1 | grep -E \"Temperature|temperature\"",
            "Temperature:                        48 Celsius\nTemperature Sensor 1:               60 Celsius\n",
        ),
    ]);
    let nas = SmartDevice::new("nas1", host.clone(), None, 30.0);

    // nvme1n1 has no scripted smartctl reply and falls back to 30
    assert_eq!(nas.get_temp().await.unwrap(), 48);
    assert_eq!(host.count("hdparm -C /dev/nvme0n1"), 0);
    assert_eq!(host.count("fdisk -l"), 1);
}

#[tokio::test]
async fn test_cpu_temperature_reduction() {
    let host = FakeHost::with(&[("ipmitool -c sdr", SDR)]);
    let dev = bmc(&host, Generation::X10, None);

    assert_eq!(dev.get_temp().await.unwrap(), 52);
    assert_eq!(dev.cpu_temp(Some(0)).await.unwrap(), 45);
    assert!(matches!(dev.cpu_temp(Some(5)).await, Err(DeviceError::InvalidIndex { .. })));
}

#[tokio::test]
async fn test_fan_session_lifecycle() {
    let host = FakeHost::with(&[
        ("ipmitool raw 0x30 0x45 0", " 00\n"),
        ("ipmitool raw 0x30 0x45 0x01 0", ""),
        ("ipmitool raw 0x30 0x45 0x01 1", ""),
        ("ipmitool fru", " Board Part Number     : X10DRG-Q\n"),
        ("ipmitool raw 0x30 0x70 0x66 0x01 0x00 0xff", ""),
        ("ipmitool raw 0x30 0x70 0x66 0x01 0x01 0xff", ""),
        ("ipmitool raw 0x30 0x70 0x66 0x01 0x02 0xff", ""),
        ("ipmitool raw 0x30 0x70 0x66 0x01 0x03 0xff", ""),
        ("ipmitool raw 0x30 0x70 0x66 0x01 0x00 0x80", ""),
        ("ipmitool raw 0x30 0x70 0x66 0x01 0x01 0x80", ""),
        ("ipmitool raw 0x30 0x70 0x66 0x01 0x02 0x80", ""),
        ("ipmitool raw 0x30 0x70 0x66 0x01 0x03 0x80", ""),
    ]);
    let dev = bmc(&host, Generation::X10, None);

    assert_eq!(dev.get_fan_mode().await.unwrap(), FanMode::Standard);

    dev.set_speed(100).await.unwrap();
    dev.set_speed(100).await.unwrap();
    dev.set_speed(50).await.unwrap();

    assert_eq!(host.count("ipmitool raw 0x30 0x45 0x01 1"), 1);
    assert_eq!(host.count("ipmitool fru"), 1);
    assert_eq!(host.log().iter().filter(|c| c.ends_with(" 0xff")).count(), 4);
    assert_eq!(host.log().iter().filter(|c| c.ends_with(" 0x80")).count(), 4);

    dev.close().await.unwrap();
    dev.close().await.unwrap();
    assert_eq!(host.count("ipmitool raw 0x30 0x45 0x01 0"), 2);
}

#[tokio::test]
async fn test_devices_behind_trait_objects() {
    let drives = FakeHost::with(&[
        ("hdparm -C /dev/sda", " drive state is:  standby\n"),
    ]);
    let controller = FakeHost::with(&[
        ("ipmitool -c sdr", "GPU1 Temp,66,degrees C,ok\nGPU2 Temp,71,degrees C,ok\n"),
    ]);

    let devices: Vec<Arc<dyn Device>> = vec![
        Arc::new(SmartDevice::new("nas1", drives, Some(vec!["/dev/sda".to_string()]), 31.0)),
        Arc::new(SupermicroBmc::new(
            "gpu1",
            Generation::X9,
            SensorSource::Gpu,
            IpmiTool::new(controller, IpmiInterface::Local),
            None,
        )),
    ];

    let temps = futures_util::future::join_all(devices.iter().map(|d| d.get_temp())).await;
    let temps: Vec<i64> = temps.into_iter().map(Result::unwrap).collect();
    assert_eq!(temps, vec![31, 71]);
}
