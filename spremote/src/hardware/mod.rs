//! Defines the hub block and its ports.

mod hub;
mod port;

pub use hub::Hub;
pub use port::{DeviceMap, Port};
