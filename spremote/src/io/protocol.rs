//! Defines the capability every hub protocol offers to the devices.

use std::any::type_name;
use std::fmt::{Debug, Display};
use std::sync::Arc;

use dyn_clone::DynClone;
use parking_lot::RwLock;

use crate::errors::*;
use crate::hardware::{DeviceMap, Port};
use crate::io::{Diagnostics, ExecuteOptions, IoData, ReplIo};
use crate::utils::response::parse_first;

// Makes a Box<dyn IoProtocol> clone (used for Hub cloning).
dyn_clone::clone_trait_object!(IoProtocol);

/// Defines the trait all protocols must implement.
///
/// Clones of a protocol share the same session: commands issued through any clone are serialized, one
/// complete request/response at a time.
#[cfg_attr(feature = "serde", typetag::serde(tag = "type"))]
pub trait IoProtocol: DynClone + Send + Sync + Debug + Display {
    // ########################################
    // Inner data related functions

    fn get_data(&self) -> &Arc<RwLock<IoData>>;

    /// Returns the diagnostic sink of the session.
    fn get_diagnostics(&self) -> &Diagnostics;

    /// Returns the protocol name (used for Display only)
    fn get_protocol_name(&self) -> &'static str {
        let name = type_name::<Self>();
        name.rsplit("::").next().unwrap_or(name)
    }

    /// Checks if the communication is opened using the underlying protocol.
    fn is_connected(&self) -> bool {
        self.get_data().read().connected
    }

    // ########################################
    // Functions specifically bound to the protocol.

    /// Opens the communication and brings the interpreter to a fresh prompt.
    fn open(&mut self) -> Result<(), Error>;
    /// Releases the communication. Nothing is sent to the hub beforehand.
    fn close(&mut self) -> Result<(), Error>;

    // ########################################
    // Raw line access

    /// Sends text (almost) as is: a trailing line break is ensured and line breaks are translated to
    /// the hub convention.
    ///
    /// Due to the interpreter auto-indentation, this is not suitable for indented code blocks: use
    /// [`IoProtocol::execute`] for those.
    fn write(&mut self, text: &str) -> Result<(), Error>;
    /// Reads one line, without its line break. An empty string means nothing arrived in time.
    fn readline(&mut self) -> Result<String, Error>;
    /// Reads everything currently available, with line breaks normalized to `\n`.
    fn read_available(&mut self) -> Result<String, Error>;

    // ########################################
    // Remote execution

    /// Executes code on the hub and returns the lines it printed, bounded by the session defaults.
    fn execute(&mut self, code: &str) -> Result<Vec<String>, Error>;
    /// Executes code on the hub and returns the lines it printed, bounded by `options`.
    fn execute_with(&mut self, code: &str, options: &ExecuteOptions) -> Result<Vec<String>, Error>;

    /// Lists the ids of the devices attached to each port: 0 means no device.
    fn list_devices(&mut self) -> Result<DeviceMap, Error> {
        let mut devices = DeviceMap::new();
        for port in Port::ALL {
            let response = self.execute(&format!(
                "try:\n    print(device.id({}))\nexcept:\n    print(0)\n",
                port.index()
            ))?;
            devices.insert(port, parse_first("list devices", &response)?);
        }
        self.get_diagnostics()
            .debug(format_args!("Devices attached: {:?}", devices));
        Ok(devices)
    }
}

#[cfg(not(tarpaulin_include))]
impl Default for Box<dyn IoProtocol> {
    fn default() -> Self {
        Box::new(ReplIo::default())
    }
}
