//! Turns the interactive Python REPL of the hub into a synchronous remote execution channel.
//!
//! The REPL echoes what is typed, shows a prompt between statements and auto-indents continuation
//! lines. [`ReplIo`] defeats the auto-indentation by padding indented code with blank lines, appends a
//! comment carrying a completion marker after each command, and collects printed lines until the
//! echo of that comment comes back.

pub(crate) mod constants;
pub(crate) mod framing;

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::errors::{Error, ProtocolError};
use crate::io::protocol::IoProtocol;
use crate::io::repl::constants::{INTERRUPT, PROMPT, REMOTE_EOL};
use crate::io::repl::framing::{decode_frame, encode, frame_code, is_echo, sentinel_line};
use crate::io::{Diagnostics, ExecuteOptions, IoData, IoTransport, ReplConfig, SentinelMode, Serial};

/// One frame read from the transport.
enum Frame {
    /// Bytes up to and including a line feed.
    Line(Vec<u8>),
    /// Whatever was buffered when a read timed out (possibly nothing).
    Partial(Vec<u8>),
}

/// Implements the hub REPL session within an [`IoProtocol`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ReplIo {
    /// Transport layer used to communicate with the hub.
    transport: Box<dyn IoTransport>,
    /// Session configuration.
    config: ReplConfig,

    // ########################################
    // # Volatile utility data.
    #[cfg_attr(feature = "serde", serde(skip))]
    data: Arc<RwLock<IoData>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    diagnostics: Diagnostics,
    /// Bytes received but not consumed yet.
    #[cfg_attr(feature = "serde", serde(skip))]
    rx: Arc<Mutex<Vec<u8>>>,
    /// Held for a whole request/response: only one command in flight per session.
    #[cfg_attr(feature = "serde", serde(skip))]
    session: Arc<Mutex<()>>,
}

impl Default for ReplIo {
    fn default() -> Self {
        Self::from(Serial::default())
    }
}

impl ReplIo {
    /// Creates a session on the given serial port (e.g. `/dev/ttyACM0`).
    pub fn new<P: Into<String>>(port: P) -> Self {
        Self::from(Serial::new(port))
    }

    /// Replaces the session configuration. Takes effect at the next [`IoProtocol::open`].
    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.diagnostics = Diagnostics::from(&config);
        self.config = config;
        self
    }

    pub fn get_config(&self) -> &ReplConfig {
        &self.config
    }

    pub fn get_transport(&self) -> &dyn IoTransport {
        self.transport.as_ref()
    }

    /// Interrupts whatever runs on the hub and checks that the interpreter shows its prompt.
    fn handshake(&mut self) -> Result<(), Error> {
        self.rx.lock().clear();
        self.transport.write(&[INTERRUPT])?;

        let text = self.read_available_unlocked()?;
        let greeting: Vec<String> = text
            .split_inclusive('\n')
            .map(|line| line.trim_end_matches('\n').to_owned())
            .collect();
        self.diagnostics
            .debug(format_args!("Python interpreter greeting: {:?}", greeting));

        let prompt = self.keep_prompt(&text);
        if !prompt {
            self.diagnostics
                .warn(format_args!("Python interpreter does not show {}", PROMPT.trim_end()));
        }

        {
            let mut data = self.data.write();
            data.greeting = greeting;
            data.ready = prompt;
            data.connected = true;
        }

        // Prepare for device listing.
        let options = self.config.execute_options();
        self.execute_unlocked("import device", &options)?;
        Ok(())
    }

    /// Puts the prompt ending `text` back in the receive buffer: the next echo comes right after it
    /// and must still be recognized as such.
    fn keep_prompt(&self, text: &str) -> bool {
        let prompt = text.rsplit('\n').next() == Some(PROMPT);
        if prompt {
            self.rx.lock().extend_from_slice(PROMPT.as_bytes());
        }
        prompt
    }

    /// Gives up on the running command: the hub is interrupted and the session is no longer ready.
    fn abort(&mut self, error: Error) -> Error {
        self.data.write().ready = false;
        if let Err(interrupt_error) = self.transport.write(&[INTERRUPT]) {
            self.diagnostics
                .warn(format_args!("Interrupting {} failed: {}", self.transport, interrupt_error));
        }
        error
    }

    /// Reads one frame (see [`Frame`]).
    fn read_frame(&mut self) -> Result<Frame, Error> {
        let mut rx = self.rx.lock();
        loop {
            if let Some(position) = rx.iter().position(|&byte| byte == b'\n') {
                return Ok(Frame::Line(rx.drain(..=position).collect()));
            }
            let mut chunk = [0u8; 256];
            let size = self.transport.read(&mut chunk)?;
            if size == 0 {
                return Ok(Frame::Partial(std::mem::take(&mut *rx)));
            }
            rx.extend_from_slice(&chunk[..size]);
        }
    }

    fn write_unlocked(&mut self, text: &str) -> Result<(), Error> {
        self.transport.write(&encode(text))
    }

    fn readline_unlocked(&mut self) -> Result<String, Error> {
        match self.read_frame()? {
            Frame::Line(raw) | Frame::Partial(raw) => decode_frame(&raw),
        }
    }

    fn read_available_unlocked(&mut self) -> Result<String, Error> {
        let mut text = String::new();
        loop {
            match self.read_frame()? {
                Frame::Line(raw) => {
                    text.push_str(&decode_frame(&raw)?);
                    if raw.ends_with(REMOTE_EOL.as_bytes()) {
                        text.push('\n');
                    }
                }
                Frame::Partial(raw) => {
                    text.push_str(&decode_frame(&raw)?);
                    return Ok(text);
                }
            }
        }
    }

    /// Builds the completion marker of the next command.
    fn next_marker(&self) -> String {
        let sequence = {
            let mut data = self.data.write();
            data.commands += 1;
            data.commands
        };
        match self.config.sentinel_mode {
            SentinelMode::Fixed => self.config.sentinel.clone(),
            SentinelMode::Sequenced => format!("{}:{}:", self.config.sentinel, sequence),
        }
    }

    fn execute_unlocked(
        &mut self,
        code: &str,
        options: &ExecuteOptions,
    ) -> Result<Vec<String>, Error> {
        if !self.data.read().connected {
            return Err(ProtocolError::NotInitialized.into());
        }

        // Leftovers of an interrupted command would be mistaken for this command output.
        if !self.data.read().ready {
            let stale = self.read_available_unlocked()?;
            if !stale.is_empty() {
                self.diagnostics
                    .debug(format_args!("Discarding stale output: {:?}", stale));
            }
            self.keep_prompt(&stale);
        }

        let marker = self.next_marker();
        let output = match self.request(code, &marker, options) {
            Ok(output) => output,
            // The rest of the answer (and its marker) may still be on its way.
            Err(error) => return Err(self.abort(error)),
        };

        self.data.write().ready = true;
        self.diagnostics
            .debug(format_args!("{:?} returned {:?}", code, output));
        Ok(output)
    }

    /// Sends `code` followed by the `marker` comment and collects the printed lines up to the echo of
    /// that comment.
    fn request(
        &mut self,
        code: &str,
        marker: &str,
        options: &ExecuteOptions,
    ) -> Result<Vec<String>, Error> {
        let payload = frame_code(code);
        self.diagnostics
            .trace(format_args!("Execute {:?} [{}]", payload, options));
        self.write_unlocked(&payload)?;
        self.write_unlocked(&sentinel_line(marker))?;

        let started = Instant::now();
        let mut output = vec![];
        loop {
            if options.is_cancelled() {
                self.diagnostics
                    .debug(format_args!("Execution of {:?} cancelled", code));
                return Err(ProtocolError::ExecutionCancelled.into());
            }
            if let Some(timeout) = options.timeout {
                if started.elapsed() >= timeout {
                    self.diagnostics
                        .warn(format_args!("No answer to {:?} after {:?}", code, timeout));
                    return Err(ProtocolError::ExecutionTimeout { timeout }.into());
                }
            }

            let line = self.readline_unlocked()?;
            if line.is_empty() {
                continue;
            }
            if line.contains(marker) {
                return Ok(output);
            }
            if !is_echo(&line) {
                output.push(line);
            }
        }
    }
}

impl<T: IoTransport + 'static> From<T> for ReplIo {
    fn from(transport: T) -> Self {
        Self {
            transport: Box::new(transport),
            config: ReplConfig::default(),
            data: Arc::new(Default::default()),
            diagnostics: Diagnostics::default(),
            rx: Arc::new(Mutex::new(vec![])),
            session: Arc::new(Mutex::new(())),
        }
    }
}

impl Display for ReplIo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} via {} [{}]",
            self.get_protocol_name(),
            self.transport,
            self.data.read()
        )
    }
}

#[cfg_attr(feature = "serde", typetag::serde)]
impl IoProtocol for ReplIo {
    fn get_data(&self) -> &Arc<RwLock<IoData>> {
        &self.data
    }

    fn get_diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn open(&mut self) -> Result<(), Error> {
        let session = self.session.clone();
        let _guard = session.lock();

        self.diagnostics = Diagnostics::from(&self.config);
        {
            let mut data = self.data.write();
            data.connected = false;
            data.ready = false;
        }

        self.diagnostics
            .debug(format_args!("Trying to connect to {}.", self.transport));
        self.transport.set_timeout(self.config.read_timeout)?;
        self.transport.open()?;

        if let Err(error) = self.handshake() {
            self.diagnostics
                .error(format_args!("Handshake with {} failed: {}", self.transport, error));
            self.data.write().connected = false;
            if let Err(close_error) = self.transport.close() {
                self.diagnostics
                    .warn(format_args!("Closing {} failed: {}", self.transport, close_error));
            }
            return Err(error);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        let session = self.session.clone();
        let _guard = session.lock();

        {
            let mut data = self.data.write();
            data.connected = false;
            data.ready = false;
        }
        self.rx.lock().clear();
        self.transport.close()?;
        self.diagnostics
            .debug(format_args!("Disconnected from {}.", self.transport));
        Ok(())
    }

    fn write(&mut self, text: &str) -> Result<(), Error> {
        let session = self.session.clone();
        let _guard = session.lock();
        self.write_unlocked(text)
    }

    fn readline(&mut self) -> Result<String, Error> {
        let session = self.session.clone();
        let _guard = session.lock();
        self.readline_unlocked()
    }

    fn read_available(&mut self) -> Result<String, Error> {
        let session = self.session.clone();
        let _guard = session.lock();
        self.read_available_unlocked()
    }

    fn execute(&mut self, code: &str) -> Result<Vec<String>, Error> {
        let options = self.config.execute_options();
        self.execute_with(code, &options)
    }

    fn execute_with(&mut self, code: &str, options: &ExecuteOptions) -> Result<Vec<String>, Error> {
        let session = self.session.clone();
        let _guard = session.lock();
        self.execute_unlocked(code, options)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::io::repl::constants::SENTINEL;
    use crate::io::CancellationToken;
    use crate::mocks::fake_hub::FakeHub;

    fn connected(fake: &FakeHub) -> ReplIo {
        let mut protocol = ReplIo::from(fake.clone());
        protocol.open().unwrap();
        protocol
    }

    fn is_protocol_error(error: &Error, expected: fn(&ProtocolError) -> bool) -> bool {
        match error {
            Error::ProtocolError { source } => expected(source),
            _ => false,
        }
    }

    #[test]
    fn test_connect_interrupts_running_program() {
        let fake = FakeHub::new().running();
        let protocol = connected(&fake);

        assert!(protocol.is_connected());
        assert!(protocol.get_data().read().ready);
        assert!(!fake.is_running());
        let greeting = protocol.get_data().read().greeting.clone();
        assert_eq!(greeting.first().unwrap(), "tick");
        assert!(greeting.contains(&String::from("KeyboardInterrupt: ")));
        assert_eq!(greeting.last().unwrap(), ">>> ");

        let written = fake.written();
        assert_eq!(written[0], INTERRUPT);
        assert_eq!(&written[1..], b"import device\r\n#<<<done>>>\r\n");
    }

    #[test]
    fn test_connect_is_idempotent() {
        let fake = FakeHub::new().with_responder(|command| match command {
            "print('ok')" => vec![String::from("ok")],
            _ => vec![],
        });
        let mut protocol = connected(&fake);
        protocol.open().unwrap();
        assert!(protocol.is_connected());
        assert_eq!(protocol.execute("print('ok')").unwrap(), vec!["ok"]);
    }

    #[test]
    fn test_connect_without_prompt() {
        let fake = FakeHub::new()
            .without_prompt()
            .with_responder(|command| match command {
                "print(2)" => vec![String::from("2")],
                _ => vec![],
            });
        let mut protocol = connected(&fake);
        assert!(protocol.is_connected());
        assert_eq!(protocol.get_data().read().greeting, vec![""]);
        assert_eq!(protocol.execute("print(2)").unwrap(), vec!["2"]);
    }

    #[test]
    fn test_handshake_failure_releases_stream() {
        let fake = FakeHub::new().broken();
        let mut protocol = ReplIo::from(fake.clone());
        let error = protocol.open().unwrap_err();
        assert_eq!(error.to_string(), "Protocol error: Hub connection closed.");
        assert!(!protocol.is_connected());
        assert!(!fake.is_opened());
    }

    #[test]
    fn test_execute_requires_connection() {
        let mut protocol = ReplIo::from(FakeHub::new());
        let error = protocol.execute("print(1)").unwrap_err();
        assert!(is_protocol_error(&error, |error| matches!(
            error,
            ProtocolError::NotInitialized
        )));
    }

    #[test]
    fn test_close() {
        let fake = FakeHub::new();
        let mut protocol = connected(&fake);
        protocol.close().unwrap();
        assert!(!protocol.is_connected());
        assert!(!fake.is_opened());
        assert!(protocol.execute("print(1)").is_err());
    }

    #[test]
    fn test_execute_pads_indented_code() {
        let fake = FakeHub::new().with_responder(|command| match command.contains("print(x)") {
            true => vec![String::from("1"), String::from("end")],
            false => vec![],
        });
        let mut protocol = connected(&fake);
        fake.clear_written();

        let response = protocol
            .execute("if True:\n    x = 1\n    print(x)\nprint('end')")
            .unwrap();
        assert_eq!(response, vec!["1", "end"]);
        assert_eq!(
            fake.written(),
            b"if True:\r\n\r\n\r\n    x = 1\r\n\r\n\r\n    print(x)\r\n\r\n\r\nprint('end')\r\n#<<<done>>>\r\n"
                .to_vec()
        );
    }

    #[test]
    fn test_execute_excludes_echo_and_sentinel() {
        let fake = FakeHub::new().with_responder(|command| match command {
            "for i in range(3):\n    print(i)" => vec!["0", "1", "2"].into_iter().map(String::from).collect(),
            _ => vec![],
        });
        let mut protocol = connected(&fake);

        let response = protocol.execute("x = 5").unwrap();
        assert!(response.is_empty());

        let response = protocol.execute("for i in range(3):\n    print(i)").unwrap();
        assert_eq!(response, vec!["0", "1", "2"]);
        assert!(response
            .iter()
            .all(|line| !line.contains(SENTINEL) && !is_echo(line)));
    }

    #[test]
    fn test_execute_reports_remote_faults_as_text() {
        let fake = FakeHub::new().with_responder(|command| match command {
            "1 / 0" => vec![
                String::from("Traceback (most recent call last):"),
                String::from("  File \"<stdin>\", line 1, in <module>"),
                String::from("ZeroDivisionError: divide by zero"),
            ],
            _ => vec![],
        });
        let mut protocol = connected(&fake);
        let response = protocol.execute("1 / 0").unwrap();
        assert_eq!(response.len(), 3);
        assert_eq!(response[2], "ZeroDivisionError: divide by zero");
    }

    #[test]
    fn test_execute_waits_through_empty_reads() {
        let fake = FakeHub::new().with_stalls(3);
        let mut protocol = connected(&fake);
        fake.reset_counters();

        let response = protocol.execute("x = 1").unwrap();
        assert!(response.is_empty());
        assert_eq!(fake.empty_reads(), 3);
    }

    #[test]
    fn test_raw_write_and_read() {
        let fake = FakeHub::new();
        let mut protocol = connected(&fake);
        fake.clear_written();

        protocol.write("a = 1\nb = 2").unwrap();
        assert_eq!(fake.written(), b"a = 1\r\nb = 2\r\n".to_vec());
        assert_eq!(protocol.readline().unwrap(), ">>> a = 1");
        assert_eq!(protocol.readline().unwrap(), ">>> b = 2");
        assert_eq!(protocol.readline().unwrap(), "");

        protocol.write("c = 3\n").unwrap();
        assert_eq!(protocol.read_available().unwrap(), ">>> c = 3\n");
        assert_eq!(protocol.read_available().unwrap(), "");
    }

    #[serial_test::serial]
    #[test]
    fn test_execute_timeout_interrupts_hub() {
        let fake = FakeHub::new()
            .hanging_on("while True")
            .with_responder(|command| match command {
                "print(1)" => vec![String::from("1")],
                _ => vec![],
            });
        let mut protocol = connected(&fake);

        let options = ExecuteOptions::default().with_timeout(Duration::from_millis(200));
        let error = protocol
            .execute_with("while True:\n    pass", &options)
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Protocol error: Execution timed out after 200ms."
        );
        assert!(!protocol.get_data().read().ready);
        assert!(!fake.is_running());
        assert_eq!(fake.written().last(), Some(&INTERRUPT));

        // The session recovers on the next command.
        assert_eq!(protocol.execute("print(1)").unwrap(), vec!["1"]);
        assert!(protocol.get_data().read().ready);
    }

    #[serial_test::serial]
    #[test]
    fn test_execute_cancelled() {
        let fake = FakeHub::new().hanging_on("while True");
        let mut protocol = connected(&fake);

        let token = CancellationToken::new();
        let canceller = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            canceller.cancel();
        });
        let options = ExecuteOptions::unbounded().with_cancel(token);
        let error = protocol
            .execute_with("while True:\n    pass", &options)
            .unwrap_err();
        handle.join().unwrap();

        assert!(is_protocol_error(&error, |error| matches!(
            error,
            ProtocolError::ExecutionCancelled
        )));
        assert!(!fake.is_running());
        assert!(protocol.execute("x = 1").unwrap().is_empty());
    }

    #[test]
    fn test_cancelled_before_answer_drains_stale_output() {
        let fake = FakeHub::new().with_responder(|command| vec![format!("-> {}", command)]);
        let mut protocol = connected(&fake);

        let token = CancellationToken::new();
        token.cancel();
        let options = ExecuteOptions::unbounded().with_cancel(token);
        assert!(protocol.execute_with("print('first')", &options).is_err());

        // The stale answer of the cancelled command is not mistaken for this one.
        assert_eq!(
            protocol.execute("print('second')").unwrap(),
            vec!["-> print('second')"]
        );
    }

    #[test]
    fn test_undecodable_answer_resyncs_session() {
        let fake = FakeHub::new()
            .corrupting("print(x)")
            .with_responder(|command| match command {
                "print(x)" => vec![String::from("one")],
                "print('two')" => vec![String::from("two")],
                _ => vec![],
            });
        let mut protocol = connected(&fake);

        assert!(protocol.execute("print(x)").is_err());
        assert!(!protocol.get_data().read().ready);
        assert_eq!(fake.written().last(), Some(&INTERRUPT));

        // The rest of the broken answer is not mistaken for this one.
        assert_eq!(protocol.execute("print('two')").unwrap(), vec!["two"]);
        assert_eq!(protocol.execute("print('two')").unwrap(), vec!["two"]);
        assert!(protocol.get_data().read().ready);
    }

    #[test]
    fn test_sequenced_sentinel() {
        let fake = FakeHub::new().with_responder(|command| match command {
            "print(3)" => vec![String::from("3")],
            _ => vec![],
        });
        let mut protocol = ReplIo::from(fake.clone())
            .with_config(ReplConfig::default().with_sentinel_mode(SentinelMode::Sequenced));
        protocol.open().unwrap();
        assert_eq!(protocol.execute("print(3)").unwrap(), vec!["3"]);

        let written = String::from_utf8(fake.written()).unwrap();
        assert!(written.contains("import device\r\n#<<<done>>>:1:\r\n"));
        assert!(written.ends_with("print(3)\r\n#<<<done>>>:2:\r\n"));
        assert_eq!(protocol.get_data().read().commands, 2);
    }

    #[test]
    fn test_repl_display() {
        let fake = FakeHub::new();
        let protocol = connected(&fake);
        assert_eq!(
            protocol.to_string(),
            "ReplIo via FakeHub [connected=true, ready=true, commands=1]"
        );
        assert_eq!(protocol.get_config(), &ReplConfig::default());
        assert_eq!(protocol.get_transport().to_string(), "FakeHub");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_repl_serialize() {
        let protocol = ReplIo::new("/dev/ttyACM0");
        let json = serde_json::to_string(&protocol).unwrap();
        assert!(json.contains(r#""type":"Serial""#));
        assert!(json.contains(r#""port":"/dev/ttyACM0""#));
    }
}
