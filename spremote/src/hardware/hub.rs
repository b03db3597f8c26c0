use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};

use crate::errors::Error;
use crate::io::{IoProtocol, ReplIo};

/// Represents a physical hub block on which [`crate::devices::Device`]s are attached and controlled
/// through this API.
///
/// The hub gives access to the remote interpreter through an [`IoProtocol`]: all protocol methods
/// (`execute`, `list_devices`, ...) are reachable directly on the hub.
///
/// Cloning a hub is cheap: clones share the same session, and their commands are serialized one
/// complete request/response at a time.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Hub {
    /// The inner protocol used by this hub.
    protocol: Box<dyn IoProtocol>,
}

impl Default for Hub {
    /// Creates a hub using the [`ReplIo`] protocol on the first available serial port.
    ///
    /// **_/!\ The hub will NOT be connected until the [`Hub::blocking_open`] method is called._**
    fn default() -> Self {
        Self::new(ReplIo::default())
    }
}

impl Hub {
    /// Creates a hub on the given serial port and connects to it.
    ///
    /// # Example
    /// ```no_run
    /// use spremote::hardware::Hub;
    ///
    /// let mut hub = Hub::connect("/dev/ttyACM0").unwrap();
    /// let response = hub.execute("print(6 * 7)").unwrap();
    /// assert_eq!(response, vec!["42"]);
    /// ```
    pub fn connect<P: Into<String>>(port: P) -> Result<Self, Error> {
        Self::new(ReplIo::new(port)).blocking_open()
    }

    /// Creates a hub using a given protocol. The hub is not connected yet.
    pub fn new<P: IoProtocol + 'static>(protocol: P) -> Self {
        Self {
            protocol: Box::new(protocol),
        }
    }

    /// Returns the protocol used.
    ///
    /// Only used internally by the devices to hold their own handle on the session.
    pub(crate) fn get_protocol(&self) -> Box<dyn IoProtocol> {
        self.protocol.clone()
    }

    /// Opens the connection and performs the interpreter handshake.
    pub fn blocking_open(mut self) -> Result<Self, Error> {
        self.protocol.open()?;
        self.protocol
            .get_diagnostics()
            .trace(format_args!("Hub is ready: {}", self.protocol));
        Ok(self)
    }

    /// Releases the connection. No command is sent to the hub beforehand.
    pub fn disconnect(&mut self) -> Result<(), Error> {
        self.protocol.close()?;
        self.protocol
            .get_diagnostics()
            .trace(format_args!("Hub is closed: {}", self.protocol));
        Ok(())
    }
}

impl<P: IoProtocol + 'static> From<P> for Hub {
    fn from(protocol: P) -> Self {
        Self::new(protocol)
    }
}

impl Display for Hub {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hub({})", self.protocol)
    }
}

impl Deref for Hub {
    type Target = Box<dyn IoProtocol>;

    fn deref(&self) -> &Self::Target {
        &self.protocol
    }
}

impl DerefMut for Hub {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.protocol
    }
}
