//! Text parsers for vendor tool output.
//! Covers smartctl temperature lines (SATA attribute table, NVMe report, generic
//! labels), fdisk drive listings, hdparm power state, ipmitool CSV SDR rows and
//! FRU inventory. Nothing here returns an error: malformed lines are skipped and
//! a miss is `None` / empty.

use std::sync::LazyLock;

use regex::Regex;

use crate::hardware::types::{FruInventory, TemperatureReading};

static DRIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Disk (/dev/sd[a-z]+|/dev/nvme[0-9]+n[0-9]+)").unwrap());

static SATA_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/dev/sd[a-z]+$").unwrap());

// ID NAME FLAG VALUE WORST THRESH TYPE UPDATED WHEN_FAILED RAW   (smartctl -A)
// ID NAME FLAGS VALUE WORST THRESH FAIL RAW                       (smartctl -x)
static SATA_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(194|190)\s+\S+\s+(?:0x[0-9a-fA-F]+\s+\d+\s+\d+\s+\S+\s+\S+\s+\S+\s+\S+|[-A-Za-z]+\s+\d+\s+\d+\s+\S+\s+\S+)\s+(-?\d+)(?:\s|$)",
    )
    .unwrap()
});

static NVME_TEMPERATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Temperature:\s*(-?\d+)\s+Celsius").unwrap());

static GENERIC_TEMPERATURE: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"^(?:Current(?:\sDrive)?\s)?Temperature:\s*(-?\d+)").unwrap(),
        Regex::new(r"(-?\d+)\s+---\s+(?:Current\s+)?Temperature$").unwrap(),
    ]
});

/// Line grammars understood by the drive temperature parser, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempFormat {
    /// ATA attribute 194 (Temperature_Celsius) or 190 (Airflow_Temperature_Cel).
    SataAttribute,
    /// `Temperature: 35 Celsius` from the NVMe health log.
    Nvme,
    /// `Current Temperature:`, `Current Drive Temperature:`, or a device
    /// statistics row ending in `--- Current Temperature`.
    Generic,
}

impl TempFormat {
    pub const ORDER: [TempFormat; 3] =
        [TempFormat::SataAttribute, TempFormat::Nvme, TempFormat::Generic];
}

/// Extract the drive list from `fdisk -l` output, in listing order.
pub fn parse_drive_list(output: &str) -> Vec<String> {
    let mut drives: Vec<String> = Vec::new();
    for cap in DRIVE_PATH.captures_iter(output) {
        let path = cap[1].to_string();
        if !drives.contains(&path) {
            drives.push(path);
        }
    }
    drives
}

/// Only `/dev/sdX` drives support the hdparm power-state query.
pub fn is_sata_path(drive_path: &str) -> bool {
    SATA_PATH.is_match(drive_path)
}

/// `hdparm -C` reports e.g. ` drive state is:  standby`.
pub fn reports_standby(output: &str) -> bool {
    output.to_lowercase().contains("standby")
}

fn capture_number(re: &Regex, line: &str) -> Option<f64> {
    re.captures(line)?.get(1)?.as_str().parse().ok()
}

/// Try a single format against all lines; the first matching line wins.
pub fn parse_temperature_as<'a, I>(lines: I, format: TempFormat) -> Option<f64>
where
    I: IntoIterator<Item = &'a str>,
{
    let lines = lines.into_iter().map(str::trim);

    match format {
        TempFormat::SataAttribute => {
            let mut airflow = None;
            for line in lines {
                let Some(cap) = SATA_ATTRIBUTE.captures(line) else { continue };
                let Ok(value) = cap[2].parse::<f64>() else { continue };
                if &cap[1] == "194" {
                    return Some(value);
                }
                airflow.get_or_insert(value);
            }
            airflow
        }
        TempFormat::Nvme => lines.filter_map(|l| capture_number(&NVME_TEMPERATURE, l)).next(),
        TempFormat::Generic => lines
            .filter_map(|l| GENERIC_TEMPERATURE.iter().find_map(|re| capture_number(re, l)))
            .next(),
    }
}

/// Resolve a drive temperature from smartctl output: protocol-specific formats
/// first, generic labels last.
pub fn parse_drive_temperature(output: &str) -> Option<f64> {
    TempFormat::ORDER
        .iter()
        .find_map(|format| parse_temperature_as(output.lines(), *format))
}

/// Scan `ipmitool -c sdr` rows for the given sensor labels.
/// Readings are ordered by label first, then by line, so index 0 is the first
/// label that produced a value. Empty or non-numeric reading columns are skipped.
pub fn parse_sdr_readings(output: &str, labels: &[&str]) -> Vec<TemperatureReading> {
    let mut readings = Vec::new();

    for label in labels {
        for line in output.lines() {
            if !line.contains(label) {
                continue;
            }
            let cols: Vec<&str> = line.split(',').collect();
            if cols.len() < 2 || cols[0].trim() != *label {
                continue;
            }
            let raw = cols[1].trim();
            if raw.is_empty() {
                continue;
            }
            if let Ok(value) = raw.parse::<f64>() {
                readings.push(TemperatureReading { value, source: label.to_string() });
            }
        }
    }

    readings
}

/// Parse `ipmitool fru` output into key/value pairs split at the first `:`.
/// The first occurrence of a key (the builtin board FRU) wins.
pub fn parse_fru(output: &str) -> FruInventory {
    let mut fru = FruInventory::default();
    for line in output.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                fru.insert_if_absent(key, value.trim());
            }
        }
    }
    fru
}

/// Parse the single hex byte returned by `raw 0x30 0x45 0`.
pub fn parse_raw_byte(output: &str) -> Option<u8> {
    let token = output.split_whitespace().next()?;
    let token = token.strip_prefix("0x").unwrap_or(token);
    u8::from_str_radix(token, 16).ok()
}
