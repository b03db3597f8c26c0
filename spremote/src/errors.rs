use std::str::Utf8Error;
use std::time::Duration;

use log::error;
use snafu::Snafu;

pub use crate::errors::Error::*;
use crate::errors::ProtocolError::IoException;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Protocol error: {source}.
    ProtocolError { source: ProtocolError },
    /// Hardware error: {source}.
    HardwareError { source: HardwareError },
    /// Unknown error: {info}.
    Unknown { info: String },
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        error!("std::io error {:?}", error);
        let info = match error.kind() {
            std::io::ErrorKind::NotFound => String::from("Hub not found or already in use"),
            std::io::ErrorKind::PermissionDenied => String::from("Hub connection lost"),
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof => {
                String::from("Hub connection closed")
            }
            _ => error.to_string(),
        };
        Self::ProtocolError {
            source: IoException { info },
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(value: ProtocolError) -> Self {
        Self::ProtocolError { source: value }
    }
}

impl From<HardwareError> for Error {
    fn from(value: HardwareError) -> Self {
        Self::HardwareError { source: value }
    }
}

impl From<Utf8Error> for Error {
    fn from(value: Utf8Error) -> Self {
        Self::Unknown {
            info: value.to_string(),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProtocolError {
    /// {info}
    IoException { info: String },
    /// Connection has not been initialized
    NotInitialized,
    /// The hub answer could not be understood.
    #[snafu(display("Malformed response - '{operation}' could not parse {response:?}"))]
    MalformedResponse {
        operation: &'static str,
        response: String,
    },
    /// The hub did not complete the command in time.
    #[snafu(display("Execution timed out after {}ms", timeout.as_millis()))]
    ExecutionTimeout { timeout: Duration },
    /// Execution cancelled
    ExecutionCancelled,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum HardwareError {
    /// Unknown port {port}
    UnknownPort { port: String },
    /// Invalid argument for '{operation}': {info}
    InvalidArgument {
        operation: &'static str,
        info: String,
    },
}
