//! Devices reading the world: buttons and sensors.

pub mod button;
pub mod color_sensor;
pub mod distance_sensor;
pub mod force_sensor;
pub mod motion_sensor;
