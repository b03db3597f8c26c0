use std::fmt::{Display, Formatter};

use crate::devices::{query, Device};
use crate::errors::Error;
use crate::hardware::Hub;
use crate::io::IoProtocol;
use crate::utils::response::parse_value;

/// Identifies one of the buttons of the hub.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonId {
    Power,
    Connect,
    Left,
    Right,
}

impl ButtonId {
    /// Name of the button in the hub `button` and `light` modules.
    pub fn name(&self) -> &'static str {
        match self {
            ButtonId::Power => "POWER",
            ButtonId::Connect => "CONNECT",
            ButtonId::Left => "LEFT",
            ButtonId::Right => "RIGHT",
        }
    }
}

/// A button of the hub, including its light.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct Button {
    which: ButtonId,

    // ########################################
    // # Volatile utility data.
    #[cfg_attr(feature = "serde", serde(skip))]
    protocol: Box<dyn IoProtocol>,
}

impl Button {
    /// Prepares the hub for button usage.
    ///
    /// # Errors
    /// Any protocol error raised while importing the `light` and `button` hub modules.
    pub fn new(hub: &Hub, which: ButtonId) -> Result<Self, Error> {
        let mut protocol = hub.get_protocol();
        protocol.execute("from hub import light")?;
        protocol.execute("from hub import button")?;
        Ok(Self { which, protocol })
    }

    pub fn get_id(&self) -> ButtonId {
        self.which
    }

    /// Sets the button light color: 0 turns the light off, 1 to 10 select a predefined color.
    pub fn set_color(&mut self, color: u8) -> Result<(), Error> {
        query(
            self.protocol.as_mut(),
            "button set color",
            &format!("light.color(light.{}, {})", self.which.name(), color),
        )?;
        Ok(())
    }

    /// Returns for how many milliseconds the button has been held down (0 when released).
    pub fn is_down(&mut self) -> Result<u32, Error> {
        let response = query(
            self.protocol.as_mut(),
            "button pressed",
            &format!("button.pressed(button.{})", self.which.name()),
        )?;
        parse_value("button pressed", &response)
    }
}

impl Display for Button {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Button ({})", self.which.name())
    }
}

impl Device for Button {}
