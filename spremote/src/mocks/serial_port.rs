use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serialport::{
    ClearBuffer, DataBits, Error, ErrorKind, FlowControl, Parity, SerialPort, StopBits,
};

/// A [`SerialPort`] backed by in-memory buffers.
///
/// Bytes given to [`SerialPortMock::feed`] are served by `read()`; an empty receive buffer behaves
/// like an elapsed read timeout. Everything written is recorded for [`SerialPortMock::written`].
/// Clones share the same buffers.
#[derive(Debug, Default, Clone)]
pub struct SerialPortMock {
    error: Option<Error>,
    rx: Arc<Mutex<VecDeque<u8>>>,
    tx: Arc<Mutex<Vec<u8>>>,
}

impl SerialPortMock {
    /// Creates a mock for which every operation fails with the given error kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            error: Some(Error::new(kind, "Mock error reason")),
            ..Default::default()
        }
    }

    /// Queues bytes to be read.
    pub fn feed(&self, bytes: &[u8]) {
        self.rx.lock().extend(bytes);
    }

    /// Returns everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.tx.lock().clone()
    }

    fn check(&self) -> serialport::Result<()> {
        match &self.error {
            None => Ok(()),
            Some(error) => Err(error.clone()),
        }
    }
}

impl SerialPort for SerialPortMock {
    fn name(&self) -> Option<String> {
        Some(String::from("SerialPortMock"))
    }

    fn baud_rate(&self) -> serialport::Result<u32> {
        self.check().map(|_| 115_200)
    }

    fn data_bits(&self) -> serialport::Result<DataBits> {
        self.check().map(|_| DataBits::Eight)
    }

    fn flow_control(&self) -> serialport::Result<FlowControl> {
        self.check().map(|_| FlowControl::None)
    }

    fn parity(&self) -> serialport::Result<Parity> {
        self.check().map(|_| Parity::None)
    }

    fn stop_bits(&self) -> serialport::Result<StopBits> {
        self.check().map(|_| StopBits::One)
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(100)
    }

    fn set_baud_rate(&mut self, _: u32) -> serialport::Result<()> {
        self.check()
    }

    fn set_data_bits(&mut self, _: DataBits) -> serialport::Result<()> {
        self.check()
    }

    fn set_flow_control(&mut self, _: FlowControl) -> serialport::Result<()> {
        self.check()
    }

    fn set_parity(&mut self, _: Parity) -> serialport::Result<()> {
        self.check()
    }

    fn set_stop_bits(&mut self, _: StopBits) -> serialport::Result<()> {
        self.check()
    }

    fn set_timeout(&mut self, _: Duration) -> serialport::Result<()> {
        self.check()
    }

    fn write_request_to_send(&mut self, _: bool) -> serialport::Result<()> {
        self.check()
    }

    fn write_data_terminal_ready(&mut self, _: bool) -> serialport::Result<()> {
        self.check()
    }

    fn read_clear_to_send(&mut self) -> serialport::Result<bool> {
        self.check().map(|_| true)
    }

    fn read_data_set_ready(&mut self) -> serialport::Result<bool> {
        self.check().map(|_| true)
    }

    fn read_ring_indicator(&mut self) -> serialport::Result<bool> {
        self.check().map(|_| false)
    }

    fn read_carrier_detect(&mut self) -> serialport::Result<bool> {
        self.check().map(|_| true)
    }

    fn bytes_to_read(&self) -> serialport::Result<u32> {
        self.check().map(|_| self.rx.lock().len() as u32)
    }

    fn bytes_to_write(&self) -> serialport::Result<u32> {
        self.check().map(|_| 0)
    }

    fn clear(&self, buffer: ClearBuffer) -> serialport::Result<()> {
        self.check()?;
        match buffer {
            ClearBuffer::Input | ClearBuffer::All => self.rx.lock().clear(),
            ClearBuffer::Output => {}
        }
        Ok(())
    }

    fn try_clone(&self) -> serialport::Result<Box<dyn SerialPort>> {
        self.check().map(|_| Box::new(self.clone()) as Box<dyn SerialPort>)
    }

    fn set_break(&self) -> serialport::Result<()> {
        self.check()
    }

    fn clear_break(&self) -> serialport::Result<()> {
        self.check()
    }
}

impl Read for SerialPortMock {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.error.is_some() {
            return Err(std::io::Error::from(std::io::ErrorKind::InvalidData));
        }
        let mut rx = self.rx.lock();
        if rx.is_empty() {
            return Err(std::io::Error::from(std::io::ErrorKind::TimedOut));
        }
        let size = buf.len().min(rx.len());
        for (slot, byte) in buf.iter_mut().zip(rx.drain(..size)) {
            *slot = byte;
        }
        Ok(size)
    }
}

impl Write for SerialPortMock {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.error {
            None => {
                self.tx.lock().extend_from_slice(buf);
                Ok(buf.len())
            }
            Some(_) => Err(std::io::Error::from(std::io::ErrorKind::InvalidData)),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.error {
            None => Ok(()),
            Some(_) => Err(std::io::Error::from(std::io::ErrorKind::InvalidData)),
        }
    }
}
