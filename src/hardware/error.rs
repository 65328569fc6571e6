//! Error taxonomy for the device layer.

use thiserror::Error;

use crate::hardware::types::FanMode;
use crate::system::executor::ExecError;

pub type Result<T> = std::result::Result<T, DeviceError>;

#[derive(Debug, Error)]
pub enum DeviceError {
    /// The command could not be run or exited unsuccessfully.
    #[error("{host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: ExecError,
    },

    /// The command ran but none of the expected readings were present.
    #[error("{host}: no {what} readings found in output:\n{output}")]
    NoReadings {
        host: String,
        what: &'static str,
        output: String,
    },

    #[error("{host}: core index {index} out of range ({available} CPU sensors found) in output:\n{output}")]
    InvalidIndex {
        host: String,
        index: usize,
        available: usize,
        output: String,
    },

    /// Actuation cannot go ahead because the required fan mode was not confirmed.
    #[error("{host}: could not establish {required} fan mode: {source}")]
    Precondition {
        host: String,
        required: FanMode,
        #[source]
        source: Box<DeviceError>,
    },

    #[error("{host}: unexpected response to `{command}`: {output:?}")]
    UnexpectedResponse {
        host: String,
        command: String,
        output: String,
    },

    #[error("{host}: fan speed {percent}% is outside 0-100")]
    InvalidSpeed { host: String, percent: u8 },

    #[error("{host}: no drives to poll")]
    EmptyDriveList { host: String },

    #[error("{host}: {operation} is not supported by this device")]
    Unsupported {
        host: String,
        operation: &'static str,
    },
}

impl DeviceError {
    pub fn transport(host: &str, source: ExecError) -> Self {
        Self::Transport { host: host.to_string(), source }
    }

    /// True for failures that came from the executor rather than the output.
    pub fn is_transport(&self) -> bool {
        match self {
            DeviceError::Transport { .. } => true,
            DeviceError::Precondition { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}
