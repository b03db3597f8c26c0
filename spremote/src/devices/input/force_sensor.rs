use std::fmt::{Display, Formatter};

use crate::devices::{query, Device};
use crate::errors::Error;
use crate::hardware::{Hub, Port};
use crate::io::IoProtocol;
use crate::utils::response::parse_value;

/// A force sensor attached to a port of the hub.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct ForceSensor {
    port: Port,

    // ########################################
    // # Volatile utility data.
    #[cfg_attr(feature = "serde", serde(skip))]
    protocol: Box<dyn IoProtocol>,
}

impl ForceSensor {
    pub fn new(hub: &Hub, port: Port) -> Result<Self, Error> {
        let mut protocol = hub.get_protocol();
        protocol.execute("import force_sensor")?;
        Ok(Self { port, protocol })
    }

    /// Reads the raw force value.
    pub fn get_raw(&mut self) -> Result<i32, Error> {
        let response = query(
            self.protocol.as_mut(),
            "force sensor raw",
            &format!("force_sensor.raw({})", self.port.index()),
        )?;
        parse_value("force sensor raw", &response)
    }
}

impl Display for ForceSensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ForceSensor (port={})", self.port)
    }
}

impl Device for ForceSensor {
    fn get_port(&self) -> Option<Port> {
        Some(self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProtocolError;
    use crate::mocks::protocol::MockProtocol;

    #[test]
    fn test_force_sensor() {
        let protocol = MockProtocol::new().with_responder(|code| match code {
            "force_sensor.raw(1)" => vec![String::from("384")],
            _ => vec![],
        });
        let mut sensor = ForceSensor::new(&Hub::new(protocol.clone()), Port::B).unwrap();
        assert_eq!(sensor.get_raw().unwrap(), 384);
        assert_eq!(
            protocol.commands(),
            vec!["import force_sensor", "force_sensor.raw(1)"]
        );
    }

    #[test]
    fn test_force_sensor_remote_fault() {
        let protocol = MockProtocol::new().with_responder(|code| match code {
            "force_sensor.raw(1)" => vec![
                String::from("Traceback (most recent call last):"),
                String::from("  File \"<stdin>\", line 1, in <module>"),
                String::from("OSError: [Errno 19] ENODEV"),
            ],
            _ => vec![],
        });
        let mut sensor = ForceSensor::new(&Hub::new(protocol), Port::B).unwrap();
        let error = sensor.get_raw().unwrap_err();
        assert!(matches!(
            error,
            Error::ProtocolError {
                source: ProtocolError::MalformedResponse {
                    operation: "force sensor raw",
                    ..
                }
            }
        ));
    }
}
