//! Defines the devices of the hub (builtin or attached to a port) that can be remotely controlled.
//!
//! Every device holds its own handle on the hub session and drives it by executing short Python
//! statements. Queries parse the last line printed by the hub.

use std::fmt::{Debug, Display};

use dyn_clone::DynClone;

use crate::errors::Error;
use crate::hardware::Port;
use crate::io::IoProtocol;

pub use crate::devices::input::button::{Button, ButtonId};
pub use crate::devices::input::color_sensor::ColorSensor;
pub use crate::devices::input::distance_sensor::DistanceSensor;
pub use crate::devices::input::force_sensor::ForceSensor;
pub use crate::devices::input::motion_sensor::{Face, MotionSensor};
pub use crate::devices::output::light_matrix::LightMatrix;
pub use crate::devices::output::motor::{Motor, MotorConfig};

pub mod input;
pub mod output;

/// A device reachable through the hub.
pub trait Device: Debug + Display + DynClone + Send + Sync {
    /// The port the device is plugged in, `None` for devices built into the hub.
    fn get_port(&self) -> Option<Port> {
        None
    }
}
dyn_clone::clone_trait_object!(Device);

/// Executes `code` and logs the raw response on the session diagnostics.
pub(crate) fn query(
    protocol: &mut dyn IoProtocol,
    operation: &'static str,
    code: &str,
) -> Result<Vec<String>, Error> {
    let response = protocol.execute(code)?;
    protocol
        .get_diagnostics()
        .debug(format_args!("{} returned {:?}", operation, response));
    Ok(response)
}
