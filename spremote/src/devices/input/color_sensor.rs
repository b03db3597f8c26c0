use std::fmt::{Display, Formatter};

use crate::devices::{query, Device};
use crate::errors::Error;
use crate::hardware::{Hub, Port};
use crate::io::IoProtocol;
use crate::utils::response::parse_tuple;
use crate::utils::Scalable;

/// A color sensor attached to a port of the hub.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct ColorSensor {
    port: Port,

    // ########################################
    // # Volatile utility data.
    #[cfg_attr(feature = "serde", serde(skip))]
    protocol: Box<dyn IoProtocol>,
}

impl ColorSensor {
    pub fn new(hub: &Hub, port: Port) -> Result<Self, Error> {
        let mut protocol = hub.get_protocol();
        protocol.execute("import color_sensor")?;
        Ok(Self { port, protocol })
    }

    /// Reads `(red, green, blue, intensity)`, each within 0-1023.
    pub fn get_raw_color(&mut self) -> Result<(u16, u16, u16, u16), Error> {
        let response = query(
            self.protocol.as_mut(),
            "color sensor rgbi",
            &format!("color_sensor.rgbi({})", self.port.index()),
        )?;
        let [red, green, blue, intensity] = parse_tuple::<u16, 4>("color sensor rgbi", &response)?;
        Ok((red, green, blue, intensity))
    }

    /// Reads `(red, green, blue, intensity)`, each scaled to 0-255.
    pub fn get_color(&mut self) -> Result<(u8, u8, u8, u8), Error> {
        let (red, green, blue, intensity) = self.get_raw_color()?;
        let scale = |value: u16| value.scale(0, 1024, 0, 255) as u8;
        Ok((scale(red), scale(green), scale(blue), scale(intensity)))
    }
}

impl Display for ColorSensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ColorSensor (port={})", self.port)
    }
}

impl Device for ColorSensor {
    fn get_port(&self) -> Option<Port> {
        Some(self.port)
    }
}
