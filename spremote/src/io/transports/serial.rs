use crate::errors::Error;
use crate::errors::ProtocolError::NotInitialized;
use crate::io::repl::constants::{BAUD_RATE, READ_TIMEOUT};
use crate::io::IoTransport;
use log::trace;
use parking_lot::Mutex;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::fmt::{Display, Formatter};
use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;
use std::time::Duration;

/// Serial transport to the hub (USB CDC or bluetooth serial device).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct Serial {
    /// The connection port.
    port: String,
    /// The symbol rate used to open the port.
    baud_rate: u32,
    /// The per-read timeout.
    timeout: Duration,
    /// A Read/Write io object.
    #[cfg_attr(feature = "serde", serde(skip))]
    io: Arc<Mutex<Option<Box<dyn SerialPort>>>>,
}

impl Serial {
    /// Constructs a new `Serial` transport layer instance for communication through the specified port.
    ///
    /// # Arguments
    /// * `port` - The serial port to use for communication.
    ///
    /// # Example
    /// ```no_run
    /// use spremote::hardware::Hub;
    /// use spremote::io::{ReplIo, Serial};
    ///
    /// let hub = Hub::new(ReplIo::from(Serial::new("/dev/ttyACM0"))).blocking_open();
    /// ```
    pub fn new<P: Into<String>>(port: P) -> Self {
        Self {
            port: port.into(),
            baud_rate: BAUD_RATE,
            timeout: READ_TIMEOUT,
            io: Arc::new(Mutex::new(None)),
        }
    }

    /// Overrides the symbol rate (the hub uses 115200 bauds).
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Retrieves the configured port.
    pub fn get_port(&self) -> String {
        self.port.clone()
    }
}

impl Default for Serial {
    /// Creates a new serial transport connection with the first available port or an empty string if no ports are available.
    ///
    /// # Notes
    /// The first available port will be used, None otherwise, which will probably lead to an error
    /// during the open phase.
    #[cfg(not(tarpaulin_include))]
    fn default() -> Self {
        let ports = serialport::available_ports().unwrap_or_else(|_| vec![]);
        match ports.first() {
            Some(port) => Self::new(&port.port_name),
            None => Self::new(""),
        }
    }
}

impl Display for Serial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Serial({})", self.port)
    }
}

#[cfg_attr(feature = "serde", typetag::serde)]
impl IoTransport for Serial {
    fn open(&mut self) -> Result<(), Error> {
        let connexion = serialport::new(self.port.clone(), self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.timeout)
            .open()?;
        trace!("Serial port is now opened: {:?}", connexion.name());

        *self.io.lock() = Some(connexion);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        *self.io.lock() = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.io.lock().is_some()
    }

    fn set_timeout(&mut self, duration: Duration) -> Result<(), Error> {
        self.timeout = duration;
        if let Some(io) = self.io.lock().as_mut() {
            io.set_timeout(duration)?;
        }
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), Error> {
        let mut lock = self.io.lock();
        let io = lock.as_mut().ok_or(NotInitialized)?;
        io.write_all(buf)?;
        io.flush()?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut lock = self.io.lock();
        match lock.as_mut().ok_or(NotInitialized)?.read(buf) {
            Ok(size) => Ok(size),
            Err(error) if error.kind() == ErrorKind::TimedOut => Ok(0),
            Err(error) if error.kind() == ErrorKind::Interrupted => Ok(0),
            Err(error) => Err(error.into()),
        }
    }
}

impl From<serialport::Error> for Error {
    fn from(value: serialport::Error) -> Self {
        std::io::Error::from(value).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::serial_port::SerialPortMock;
    use serialport::ErrorKind;

    fn get_test_successful_transport(mock: &SerialPortMock) -> Serial {
        let transport = Serial::new("/dev/ttyACM0");
        *transport.io.lock() = Some(Box::new(mock.clone()));
        transport
    }

    fn get_test_failing_transport() -> Serial {
        let transport = Serial::new("/dev/ttyACM0");
        *transport.io.lock() = Some(Box::new(SerialPortMock::new(ErrorKind::InvalidInput)));
        transport
    }

    #[test]
    fn test_new_serial_transport() {
        let transport = Serial::new("/dev/ttyACM0");
        assert_eq!(transport.get_port(), "/dev/ttyACM0");
        assert_eq!(transport.baud_rate, 115_200);
        assert_eq!(transport.timeout, Duration::from_millis(100));
        assert!(!transport.is_open());

        let transport = Serial::new("COM3").with_baud_rate(9600);
        assert_eq!(transport.baud_rate, 9600);
    }

    #[test]
    fn test_open_unknown_port() {
        let mut transport = Serial::new("/dev/this-port-does-not-exist");
        assert!(transport.open().is_err());
        assert!(!transport.is_open());
    }

    #[test]
    fn test_close_serial_transport() {
        let mut transport = get_test_successful_transport(&SerialPortMock::default());
        assert!(transport.is_open());
        assert!(transport.close().is_ok());
        assert!(!transport.is_open());
        assert!(transport.io.lock().is_none());
    }

    #[test]
    fn test_not_initialized() {
        let mut transport = Serial::new("/dev/ttyACM0");
        let error = transport.write(b"print(1)\r\n").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Protocol error: Connection has not been initialized."
        );
        let mut buf = [0; 8];
        assert!(transport.read(&mut buf).is_err());
        // Setting the timeout of a closed port only records it for the next open.
        assert!(transport.set_timeout(Duration::from_millis(50)).is_ok());
        assert_eq!(transport.timeout, Duration::from_millis(50));
    }

    #[test]
    fn test_write_data() {
        let mock = SerialPortMock::default();
        let mut transport = get_test_successful_transport(&mock);
        assert!(transport.write(b"import device\r\n").is_ok());
        assert!(transport.write(&[]).is_ok());
        assert_eq!(mock.written(), b"import device\r\n".to_vec());

        let mut transport = get_test_failing_transport();
        assert!(transport.write(b"x").is_err());
    }

    #[test]
    fn test_read_data() {
        let mock = SerialPortMock::default();
        mock.feed(b">>> ");
        let mut transport = get_test_successful_transport(&mock);

        let mut buf = [0; 16];
        assert_eq!(transport.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b">>> ");

        // Nothing left: the mock reports a timeout which is not an error.
        assert_eq!(transport.read(&mut buf).unwrap(), 0);

        let mut transport = get_test_failing_transport();
        assert!(transport.read(&mut buf).is_err());
    }

    #[test]
    fn test_from_serial_error() {
        let serial_error = serialport::Error {
            kind: ErrorKind::Unknown,
            description: String::from("test error"),
        };
        let custom_error: Error = serial_error.into();
        assert_eq!(custom_error.to_string(), "Protocol error: test error.");

        let serial_error = serialport::Error {
            kind: ErrorKind::Io(std::io::ErrorKind::NotFound),
            description: String::from("IO error"),
        };
        let custom_error: Error = serial_error.into();
        assert_eq!(
            custom_error.to_string(),
            "Protocol error: Hub not found or already in use."
        );
    }

    #[test]
    fn test_display_serial_transport() {
        let transport = Serial::new("/dev/ttyACM0");
        assert_eq!(format!("{}", transport), "Serial(/dev/ttyACM0)");
    }
}
