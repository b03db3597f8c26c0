use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::errors::Error;
use crate::errors::ProtocolError::NotInitialized;
use crate::io::{Diagnostics, ExecuteOptions, IoData, IoProtocol};
use crate::mocks::fake_hub::Responder;

/// Mock implementation of [`IoProtocol`]: records the executed code and answers it through a responder.
///
/// The mock starts connected, so devices can be created right away. Clones share their records.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone)]
pub struct MockProtocol {
    #[cfg_attr(feature = "serde", serde(skip))]
    data: Arc<RwLock<IoData>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    diagnostics: Diagnostics,
    #[cfg_attr(feature = "serde", serde(skip))]
    commands: Arc<Mutex<Vec<String>>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    written: Arc<Mutex<Vec<String>>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    responder: Arc<Mutex<Option<Responder>>>,
}

impl Default for MockProtocol {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(IoData {
                connected: true,
                ready: true,
                ..Default::default()
            })),
            diagnostics: Diagnostics::default(),
            commands: Default::default(),
            written: Default::default(),
            responder: Default::default(),
        }
    }
}

impl MockProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responder<F: FnMut(&str) -> Vec<String> + Send + 'static>(self, responder: F) -> Self {
        *self.responder.lock() = Some(Box::new(responder));
        self
    }

    /// Code executed so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    /// Text written through [`IoProtocol::write`] so far.
    pub fn written(&self) -> Vec<String> {
        self.written.lock().clone()
    }

    pub fn clear(&self) {
        self.commands.lock().clear();
        self.written.lock().clear();
    }
}

impl Debug for MockProtocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProtocol")
            .field("data", &self.data.read())
            .field("commands", &self.commands.lock().len())
            .finish()
    }
}

impl Display for MockProtocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockProtocol [{}]", self.data.read())
    }
}

#[cfg_attr(feature = "serde", typetag::serde)]
impl IoProtocol for MockProtocol {
    fn get_data(&self) -> &Arc<RwLock<IoData>> {
        &self.data
    }

    fn get_diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn open(&mut self) -> Result<(), Error> {
        self.data.write().connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.data.write().connected = false;
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<(), Error> {
        self.written.lock().push(text.to_string());
        Ok(())
    }

    fn readline(&mut self) -> Result<String, Error> {
        Ok(String::new())
    }

    fn read_available(&mut self) -> Result<String, Error> {
        Ok(String::new())
    }

    fn execute(&mut self, code: &str) -> Result<Vec<String>, Error> {
        self.execute_with(code, &ExecuteOptions::default())
    }

    fn execute_with(&mut self, code: &str, _: &ExecuteOptions) -> Result<Vec<String>, Error> {
        if !self.is_connected() {
            return Err(NotInitialized.into());
        }
        self.commands.lock().push(code.to_string());
        self.data.write().commands += 1;
        let response = match self.responder.lock().as_mut() {
            Some(responder) => responder(code),
            None => vec![],
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_protocol_records_and_answers() {
        let mut protocol = MockProtocol::new().with_responder(|code| match code {
            "print(1)" => vec![String::from("1")],
            _ => vec![],
        });
        assert!(protocol.is_connected());
        assert_eq!(protocol.execute("print(1)").unwrap(), vec!["1"]);
        assert!(protocol.execute("x = 2").unwrap().is_empty());
        protocol.write("raw").unwrap();
        assert_eq!(protocol.commands(), vec!["print(1)", "x = 2"]);
        assert_eq!(protocol.written(), vec!["raw"]);
        assert_eq!(protocol.get_data().read().commands, 2);
        assert_eq!(protocol.get_protocol_name(), "MockProtocol");
    }

    #[test]
    fn test_mock_protocol_closed() {
        let mut protocol = MockProtocol::new();
        let clone = protocol.clone();
        protocol.close().unwrap();
        assert!(!clone.is_connected());
        assert!(protocol.execute("print(1)").is_err());
        assert!(protocol.list_devices().is_err());
    }
}
