//! Devices acting on the world: the light matrix and motors.

pub mod light_matrix;
pub mod motor;
