use std::fmt::{Display, Formatter};

use crate::devices::{query, Device};
use crate::errors::Error;
use crate::hardware::Hub;
use crate::io::IoProtocol;
use crate::utils::response::parse_tuple;

/// A side of the hub block.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Face {
    /// The side carrying the buttons and the light matrix.
    #[default]
    Buttons,
    Usb,
    /// The side of ports A, C and E.
    Ace,
    /// The side of ports B, D and F.
    Bdf,
    Speaker,
    Battery,
}

impl Face {
    /// Name of the face constant in the hub `motion_sensor` module.
    pub fn yaw_face(&self) -> &'static str {
        match self {
            Face::Buttons => "TOP",
            Face::Usb => "BACK",
            Face::Ace => "LEFT",
            Face::Bdf => "RIGHT",
            Face::Speaker => "FRONT",
            Face::Battery => "BOTTOM",
        }
    }
}

/// The motion sensor built into the hub.
///
/// Angles are measured relative to the face declared as facing upwards at the last
/// [`MotionSensor::reset`]: yaw turns around the axis normal to that face, pitch and roll tilt it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct MotionSensor {
    up: Face,

    // ########################################
    // # Volatile utility data.
    #[cfg_attr(feature = "serde", serde(skip))]
    protocol: Box<dyn IoProtocol>,
}

impl MotionSensor {
    /// Prepares the hub for the motion sensor usage, with `up` facing upwards.
    pub fn new(hub: &Hub, up: Face) -> Result<Self, Error> {
        let mut protocol = hub.get_protocol();
        protocol.execute("from hub import motion_sensor")?;
        let mut sensor = Self { up, protocol };
        sensor.reset(up)?;
        Ok(sensor)
    }

    /// Declares which face points upwards, and that the current yaw angle is zero.
    pub fn reset(&mut self, up: Face) -> Result<(), Error> {
        query(
            self.protocol.as_mut(),
            "motion sensor set yaw face",
            &format!("motion_sensor.set_yaw_face(motion_sensor.{})", up.yaw_face()),
        )?;
        query(
            self.protocol.as_mut(),
            "motion sensor reset yaw",
            "motion_sensor.reset_yaw(0)",
        )?;
        self.up = up;
        Ok(())
    }

    pub fn get_up(&self) -> Face {
        self.up
    }

    /// Reads the `(yaw, pitch, roll)` angles in degrees, from -180 to 180.
    pub fn get_orientation(&mut self) -> Result<(f64, f64, f64), Error> {
        self.read_scaled("motion sensor tilt angles", "motion_sensor.tilt_angles()", 10.0)
    }

    /// Reads the angular velocities around the roll, pitch and yaw axes in degrees per second.
    pub fn get_angular_velocity(&mut self) -> Result<(f64, f64, f64), Error> {
        self.read_scaled(
            "motion sensor angular velocity",
            "motion_sensor.angular_velocity(True)",
            10.0,
        )
    }

    /// Reads the accelerations along the roll, pitch and yaw axes in G (gravity included).
    pub fn get_acceleration(&mut self) -> Result<(f64, f64, f64), Error> {
        self.read_scaled(
            "motion sensor acceleration",
            "motion_sensor.acceleration(True)",
            1000.0,
        )
    }

    fn read_scaled(
        &mut self,
        operation: &'static str,
        code: &str,
        divider: f64,
    ) -> Result<(f64, f64, f64), Error> {
        let response = query(self.protocol.as_mut(), operation, code)?;
        let [x, y, z] = parse_tuple::<i32, 3>(operation, &response)?;
        Ok((x as f64 / divider, y as f64 / divider, z as f64 / divider))
    }
}

impl Display for MotionSensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MotionSensor (up={:?})", self.up)
    }
}

impl Device for MotionSensor {}
