use std::fmt::{Display, Formatter};

use crate::devices::{query, Device};
use crate::errors::{Error, HardwareError};
use crate::hardware::{Hub, Port};
use crate::io::IoProtocol;
use crate::utils::response::parse_value;

/// A distance sensor attached to a port of the hub.
///
/// The sensor carries four lights around its eyes, numbered 0 to 3: left top, left bottom, right
/// top and right bottom.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct DistanceSensor {
    port: Port,

    // ########################################
    // # Volatile utility data.
    #[cfg_attr(feature = "serde", serde(skip))]
    protocol: Box<dyn IoProtocol>,
}

impl DistanceSensor {
    /// Prepares the hub for the sensor usage, and turns the sensor lights off.
    pub fn new(hub: &Hub, port: Port) -> Result<Self, Error> {
        let mut protocol = hub.get_protocol();
        protocol.execute("import distance_sensor")?;
        let mut sensor = Self { port, protocol };
        sensor.lights_off()?;
        Ok(sensor)
    }

    /// Turns all lights of the sensor off.
    pub fn lights_off(&mut self) -> Result<(), Error> {
        query(
            self.protocol.as_mut(),
            "distance sensor clear",
            &format!("distance_sensor.clear({})", self.port.index()),
        )?;
        Ok(())
    }

    /// Reads the distance in millimeters: -1 indicates an invalid measurement.
    pub fn get_distance(&mut self) -> Result<i32, Error> {
        let response = query(
            self.protocol.as_mut(),
            "distance sensor distance",
            &format!("distance_sensor.distance({})", self.port.index()),
        )?;
        parse_value("distance sensor distance", &response)
    }

    /// Sets the intensity (0-100) of the light at `position` (0-3).
    pub fn set_pixel(&mut self, position: u8, intensity: u8) -> Result<(), Error> {
        if position > 3 {
            return Err(HardwareError::InvalidArgument {
                operation: "distance sensor set pixel",
                info: format!("light position must be within 0-3, got {}", position),
            }
            .into());
        }
        query(
            self.protocol.as_mut(),
            "distance sensor set pixel",
            &format!(
                "distance_sensor.set_pixel({}, {}, {}, {})",
                self.port.index(),
                position / 2,
                position % 2,
                intensity
            ),
        )?;
        Ok(())
    }
}

impl Display for DistanceSensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DistanceSensor (port={})", self.port)
    }
}

impl Device for DistanceSensor {
    fn get_port(&self) -> Option<Port> {
        Some(self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::protocol::MockProtocol;

    #[test]
    fn test_distance_sensor() {
        let protocol = MockProtocol::new().with_responder(|code| match code {
            "distance_sensor.distance(4)" => vec![String::from("-1")],
            _ => vec![],
        });
        let mut sensor = DistanceSensor::new(&Hub::new(protocol.clone()), Port::E).unwrap();
        assert_eq!(
            protocol.commands(),
            vec!["import distance_sensor", "distance_sensor.clear(4)"]
        );

        assert_eq!(sensor.get_distance().unwrap(), -1);
        sensor.set_pixel(3, 100).unwrap();
        sensor.set_pixel(0, 50).unwrap();
        assert_eq!(
            protocol.commands()[2..],
            [
                "distance_sensor.distance(4)",
                "distance_sensor.set_pixel(4, 1, 1, 100)",
                "distance_sensor.set_pixel(4, 0, 0, 50)"
            ]
        );
        assert_eq!(sensor.to_string(), "DistanceSensor (port=E)");
    }

    #[test]
    fn test_distance_sensor_invalid_pixel() {
        let protocol = MockProtocol::new();
        let mut sensor = DistanceSensor::new(&Hub::new(protocol.clone()), Port::A).unwrap();
        protocol.clear();

        let error = sensor.set_pixel(4, 100).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Hardware error: Invalid argument for 'distance sensor set pixel': light position must be within 0-3, got 4."
        );
        assert!(protocol.commands().is_empty());
    }
}
