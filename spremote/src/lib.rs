#![doc(html_root_url = "https://docs.rs/spremote/0.1.0")]

//! <h1 align="center">SPREMOTE - Remote control of a programmable hub block</h1>
//!
//! # Documentation
//!
//! This is the API documentation.<br/>
//! To see the code in action, visit the [examples](https://github.com/spremote/spremote/tree/develop/spremote/examples) directory.
//!
//! # Features
//!
//! **Spremote** drives a programmable hub block (and the motors and sensors attached to it) from a host
//! computer, through the interactive Python interpreter the hub exposes on its serial port.
//!
//! - Connect to a [`Hub`](hardware::Hub) through an [`IoProtocol`](io::IoProtocol) connection
//!   ([`ReplIo`](io::ReplIo) over a [`Serial`](io::Serial) port)
//! - Execute arbitrary Python code on the hub and get back the printed lines
//! - Remote control all types of [`Device`](devices::Device)s: [`Motor`](devices::Motor),
//!   [`LightMatrix`](devices::LightMatrix), [`Button`](devices::Button), sensors, etc.
//!
//! # Prerequisites
//!
//! - A hub block attached via a serial port (USB or bluetooth) of your computer.
//! - No program should hold the hub interpreter: any program running on the hub is interrupted on
//!   connection.
//!
//! # Getting Started
//!
//! - Add the following to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! spremote = "0.1.0"
//! ```
//!
//! The following code demonstrates the simplest program we could imagine: print something on the hub
//! and read it back.
//! ```no_run
//! use spremote::hardware::Hub;
//!
//! fn main() -> Result<(), spremote::errors::Error> {
//!     // Connects to the hub (interrupting any running program).
//!     let mut hub = Hub::connect("/dev/ttyACM0")?;
//!
//!     // Executes some code and gets the printed lines.
//!     let lines = hub.execute("for i in range(3):\n    print(i * i)")?;
//!     assert_eq!(lines, vec!["0", "1", "4"]);
//!
//!     hub.disconnect()
//! }
//! ```
//!
//! # Feature flags
//!
//! - **libudev** -- (enabled by default) Activates `serialport` crate _libudev_ feature under-the-hood (required on Linux only for port listing).
//! - **serde** -- Enables serialize/deserialize capabilities for the configuration and most entities.
//! - **mocks** -- Provides mocked entities of all kinds (useful for tests mostly).

#[cfg(test)]
extern crate self as spremote;

pub mod devices;
pub mod errors;
pub mod hardware;
pub mod io;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod utils;
