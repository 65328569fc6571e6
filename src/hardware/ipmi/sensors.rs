//! CPU and GPU temperature from the BMC sensor table (`ipmitool -c sdr`).
//! Unlike drive sensing there is no fallback: a failed or empty read is an error.

use tracing::{debug, error};

use crate::hardware::error::{DeviceError, Result};
use crate::hardware::types::max_reading;
use crate::system::parser;

use super::supermicro::SupermicroBmc;

pub const SDR_QUERY: &str = "-c sdr";

/// Overall sensor first, then per socket.
pub const CPU_SENSORS: [&str; 3] = ["CPU Temp", "CPU1 Temp", "CPU2 Temp"];

pub const GPU_SENSORS: [&str; 7] = [
    "GPU Temp", "GPU1 Temp", "GPU2 Temp", "GPU3 Temp", "GPU4 Temp", "GPU5 Temp", "GPU6 Temp",
];

/// Which sensor family a controller device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorSource {
    /// Hottest CPU sensor, or the `core`-th match in sensor order.
    Cpu { core: Option<usize> },
    /// Hottest GPU sensor.
    Gpu,
}

impl SensorSource {
    pub fn cpu() -> Self {
        SensorSource::Cpu { core: None }
    }
}

/// Reduce an SDR dump to one temperature, truncated to whole degrees.
pub fn reduce_sdr(host: &str, output: &str, source: SensorSource) -> Result<i64> {
    let (labels, what): (&[&str], &'static str) = match source {
        SensorSource::Cpu { .. } => (&CPU_SENSORS[..], "CPU temperature"),
        SensorSource::Gpu => (&GPU_SENSORS[..], "GPU temperature"),
    };
    let readings = parser::parse_sdr_readings(output, labels);
    debug!("{} {} readings: {:?}", host, what, readings);

    let value = match source {
        SensorSource::Cpu { core: Some(index) } => match readings.get(index) {
            Some(reading) => reading.value,
            None => {
                return Err(DeviceError::InvalidIndex {
                    host: host.to_string(),
                    index,
                    available: readings.len(),
                    output: output.to_string(),
                })
            }
        },
        _ => max_reading(&readings).ok_or_else(|| DeviceError::NoReadings {
            host: host.to_string(),
            what,
            output: output.to_string(),
        })?,
    };

    Ok(value.trunc() as i64)
}

impl SupermicroBmc {
    async fn read_sdr(&self, source: SensorSource) -> Result<i64> {
        let result = self.ipmi.execute(SDR_QUERY).await.map_err(|e| {
            error!("{} failed to read sensor table: {}", self.hostname, e);
            DeviceError::transport(&self.hostname, e)
        })?;

        reduce_sdr(&self.hostname, &result.stdout, source).map_err(|e| {
            error!("{} failed to get temperature from: {:?}", self.hostname, result.stdout);
            e
        })
    }

    /// Hottest CPU sensor, or a specific one by position among the matched sensors.
    pub async fn cpu_temp(&self, core: Option<usize>) -> Result<i64> {
        self.read_sdr(SensorSource::Cpu { core }).await
    }

    pub async fn gpu_temp(&self) -> Result<i64> {
        self.read_sdr(SensorSource::Gpu).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::ipmi::generation::Generation;
    use crate::hardware::Device;
    use crate::test_utils::test_utils::{local_ipmi, ScriptedExecutor};

    const SDR: &str = "\
CPU1 Temp,45,degrees C,ok
CPU2 Temp,52,degrees C,ok
System Temp,31,degrees C,ok
Peripheral Temp,40,degrees C,ok
FAN1,1500,RPM,ok
";

    const GPU_SDR: &str = "\
CPU1 Temp,45,degrees C,ok
GPU1 Temp,61,degrees C,ok
GPU2 Temp,,degrees C,ns
GPU3 Temp,73.5,degrees C,ok
";

    #[test]
    fn test_cpu_max_and_index() {
        assert_eq!(reduce_sdr("h", SDR, SensorSource::cpu()).unwrap(), 52);
        assert_eq!(reduce_sdr("h", SDR, SensorSource::Cpu { core: Some(0) }).unwrap(), 45);
        assert_eq!(reduce_sdr("h", SDR, SensorSource::Cpu { core: Some(1) }).unwrap(), 52);
    }

    #[test]
    fn test_cpu_index_out_of_range() {
        let err = reduce_sdr("h", SDR, SensorSource::Cpu { core: Some(2) }).unwrap_err();
        match err {
            DeviceError::InvalidIndex { index, available, output, .. } => {
                assert_eq!(index, 2);
                assert_eq!(available, 2);
                assert!(output.contains("CPU2 Temp"));
            }
            other => panic!("expected InvalidIndex, got {:?}", other),
        }
    }

    #[test]
    fn test_single_socket_overall_sensor() {
        let sdr = "CPU Temp,38,degrees C,ok\nPCH Temp,50,degrees C,ok";
        assert_eq!(reduce_sdr("h", sdr, SensorSource::cpu()).unwrap(), 38);
    }

    #[test]
    fn test_gpu_max_skips_empty() {
        assert_eq!(reduce_sdr("h", GPU_SDR, SensorSource::Gpu).unwrap(), 73);
    }

    #[test]
    fn test_missing_sensors_are_fatal_with_output() {
        let err = reduce_sdr("h", "FAN1,1500,RPM,ok", SensorSource::Gpu).unwrap_err();
        assert!(matches!(err, DeviceError::NoReadings { .. }));
        assert!(err.to_string().contains("FAN1,1500,RPM,ok"));
    }

    #[tokio::test]
    async fn test_cpu_temp_via_ipmitool() {
        let shell = ScriptedExecutor::new().on("ipmitool -c sdr", SDR);
        let ipmi = local_ipmi(&shell);
        let bmc = SupermicroBmc::new("bmc1", Generation::X9, SensorSource::cpu(), ipmi, None);

        assert_eq!(bmc.get_temp().await.unwrap(), 52);
        assert_eq!(bmc.cpu_temp(Some(0)).await.unwrap(), 45);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let shell = ScriptedExecutor::new()
            .fail("sdr", "Error: Unable to establish IPMI v2 / RMCP+ session");
        let ipmi = local_ipmi(&shell);
        let bmc = SupermicroBmc::new("bmc1", Generation::X11, SensorSource::Gpu, ipmi, None);

        let err = bmc.get_temp().await.unwrap_err();
        assert!(err.is_transport());
    }
}
