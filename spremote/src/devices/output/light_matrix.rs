use std::fmt::{Display, Formatter};

use crate::devices::{query, Device};
use crate::errors::{Error, HardwareError};
use crate::hardware::Hub;
use crate::io::IoProtocol;

/// The 5x5 light matrix of the hub.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct LightMatrix {
    #[cfg_attr(feature = "serde", serde(skip))]
    protocol: Box<dyn IoProtocol>,
}

impl LightMatrix {
    /// Prepares the light matrix usage: all pixels are turned off.
    pub fn new(hub: &Hub) -> Result<Self, Error> {
        let mut matrix = Self {
            protocol: hub.get_protocol(),
        };
        matrix.clear()?;
        Ok(matrix)
    }

    /// Turns all pixels off.
    pub fn clear(&mut self) -> Result<(), Error> {
        query(
            self.protocol.as_mut(),
            "light matrix clear",
            "hub.light_matrix.clear()",
        )?;
        Ok(())
    }

    /// Shows an image made of 25 pixels, given row after row.
    ///
    /// Characters `0` to `9` set the pixel brightness from 0% to 90%, `X` sets it to 100%. Any other
    /// character is ignored, so the image may be laid out on several lines.
    ///
    /// # Example
    /// ```no_run
    /// use spremote::devices::LightMatrix;
    /// use spremote::hardware::Hub;
    ///
    /// let hub = Hub::connect("/dev/ttyACM0").unwrap();
    /// let mut matrix = LightMatrix::new(&hub).unwrap();
    /// matrix.show_image("
    ///     09090
    ///     99999
    ///     99999
    ///     09990
    ///     00900
    /// ").unwrap();
    /// ```
    ///
    /// # Errors
    /// * `InvalidArgument`: the image does not describe exactly 25 pixels (nothing is sent).
    pub fn show_image(&mut self, image: &str) -> Result<(), Error> {
        let pixels: Vec<String> = image
            .chars()
            .filter_map(|pixel| match pixel {
                'X' => Some(100),
                digit => digit.to_digit(10).map(|level| level * 10),
            })
            .map(|brightness| brightness.to_string())
            .collect();
        if pixels.len() != 25 {
            return Err(HardwareError::InvalidArgument {
                operation: "light matrix show image",
                info: format!("expected 25 pixels, got {}", pixels.len()),
            }
            .into());
        }
        query(
            self.protocol.as_mut(),
            "light matrix show image",
            &format!("hub.light_matrix.show([{}])", pixels.join(", ")),
        )?;
        Ok(())
    }

    /// Sets the brightness (0-100) of the pixel at column `x` and row `y`.
    pub fn set_pixel(&mut self, x: u8, y: u8, brightness: u8) -> Result<(), Error> {
        query(
            self.protocol.as_mut(),
            "light matrix set pixel",
            &format!("hub.light_matrix.set_pixel({}, {}, {})", x, y, brightness),
        )?;
        Ok(())
    }
}

impl Display for LightMatrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "LightMatrix")
    }
}

impl Device for LightMatrix {}
