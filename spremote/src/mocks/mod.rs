//! Test doubles: a byte-level fake hub, a recording protocol and an in-memory serial port.

pub mod fake_hub;
pub mod protocol;
pub mod serial_port;
