use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::errors::{Error, HardwareError};

/// Ids of the devices attached to each port (0 when nothing is attached).
pub type DeviceMap = BTreeMap<Port, i64>;

/// One of the six connectors of the hub, labelled `A` to `F`.
///
/// # Example
/// ```
/// use spremote::hardware::Port;
///
/// let port: Port = "c".parse().unwrap();
/// assert_eq!(port, Port::C);
/// assert_eq!(port.index(), 2);
/// assert_eq!(port.to_string(), "C");
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Port {
    /// All ports, in index order.
    pub const ALL: [Port; 6] = [Port::A, Port::B, Port::C, Port::D, Port::E, Port::F];

    /// Zero-based index used by the hub firmware to designate the port.
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Single letter label of the port.
    pub fn label(&self) -> char {
        (b'A' + self.index()) as char
    }
}

impl Display for Port {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl TryFrom<u8> for Port {
    type Error = Error;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Port::ALL
            .get(index as usize)
            .copied()
            .ok_or_else(|| {
                HardwareError::UnknownPort {
                    port: index.to_string(),
                }
                .into()
            })
    }
}

impl TryFrom<char> for Port {
    type Error = Error;

    fn try_from(label: char) -> Result<Self, Self::Error> {
        let upper = label.to_ascii_uppercase();
        match upper {
            'A'..='F' => Port::try_from(upper as u8 - b'A'),
            _ => Err(HardwareError::UnknownPort {
                port: label.to_string(),
            }
            .into()),
        }
    }
}

impl FromStr for Port {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let mut chars = label.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Port::try_from(letter),
            _ => Err(HardwareError::UnknownPort {
                port: label.to_string(),
            }
            .into()),
        }
    }
}
