use std::collections::VecDeque;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::errors::Error;
use crate::errors::ProtocolError::NotInitialized;
use crate::io::repl::constants::{COMMENT, CONTINUATION_PROMPT, INTERRUPT, PROMPT, REMOTE_EOL};
use crate::io::IoTransport;
use crate::pause_sync;

/// Computes the lines printed by a command (the lines typed since the previous comment line).
pub type Responder = Box<dyn FnMut(&str) -> Vec<String> + Send>;

const BANNER: &str = "MicroPython v1.14-893-g8f4ff9a0c on 2021-06-30; LEGO Technic Large Hub with STM32F413xx";

struct FakeHubState {
    opened: bool,
    running: bool,
    prompt: bool,
    pending_prompt: Option<&'static str>,
    outbox: VecDeque<u8>,
    deferred: Vec<u8>,
    written: Vec<u8>,
    line: Vec<u8>,
    command: Vec<String>,
    responder: Responder,
    stalls: usize,
    remaining_stalls: usize,
    empty_reads: usize,
    sentinels: usize,
    overlaps: usize,
    unread: bool,
    read_delay: Duration,
    broken: bool,
    hang_on: Option<String>,
    corrupt_on: Option<String>,
}

impl Default for FakeHubState {
    fn default() -> Self {
        Self {
            opened: false,
            running: false,
            prompt: true,
            pending_prompt: None,
            outbox: VecDeque::new(),
            deferred: vec![],
            written: vec![],
            line: vec![],
            command: vec![],
            responder: Box::new(|_| vec![]),
            stalls: 0,
            remaining_stalls: 0,
            empty_reads: 0,
            sentinels: 0,
            overlaps: 0,
            unread: false,
            read_delay: Duration::ZERO,
            broken: false,
            hang_on: None,
            corrupt_on: None,
        }
    }
}

impl FakeHubState {
    fn emit(&mut self, text: &str) {
        self.outbox.extend(text.as_bytes());
    }

    fn interrupt(&mut self) {
        self.line.clear();
        self.command.clear();
        self.deferred.clear();
        self.remaining_stalls = 0;
        if self.running {
            self.running = false;
            self.emit("Traceback (most recent call last):\r\n");
            self.emit("  File \"<stdin>\", line 1, in <module>\r\n");
            self.emit("KeyboardInterrupt: \r\n");
            self.emit(&format!("{}\r\n", BANNER));
            self.emit("Type \"help()\" for more information.\r\n");
        } else {
            self.emit(REMOTE_EOL);
        }
        if self.prompt {
            self.emit(PROMPT);
        }
        self.pending_prompt = None;
    }

    fn receive(&mut self, line: &str) {
        if self.unread {
            self.overlaps += 1;
        }
        let echo = format!("{}{}{}", self.pending_prompt.unwrap_or(""), line, REMOTE_EOL);

        if !line.starts_with(COMMENT) {
            self.emit(&echo);
            if !line.trim().is_empty() {
                self.command.push(line.to_string());
            }
            self.pending_prompt = match line.ends_with(':') || line.starts_with(char::is_whitespace) {
                true => Some(CONTINUATION_PROMPT),
                false => Some(PROMPT),
            };
            return;
        }

        let command = self.command.join("\n");
        self.command.clear();
        self.sentinels += 1;
        if let Some(hang) = &self.hang_on {
            if command.contains(hang.as_str()) {
                self.running = true;
                return;
            }
        }

        let mut reply = vec![];
        if let Some(corrupt) = &self.corrupt_on {
            if command.contains(corrupt.as_str()) {
                reply.extend_from_slice(&[0xFF, b'\r', b'\n']);
            }
        }
        for output in (self.responder)(&command) {
            reply.extend_from_slice(output.as_bytes());
            reply.extend_from_slice(REMOTE_EOL.as_bytes());
        }
        reply.extend_from_slice(echo.as_bytes());
        self.pending_prompt = Some(PROMPT);

        if self.stalls > 0 {
            self.deferred.extend_from_slice(&reply);
            self.remaining_stalls = self.stalls;
        } else {
            self.outbox.extend(reply);
        }
        self.unread = true;
    }
}

/// A byte-level simulation of the hub interpreter, used as an [`IoTransport`].
///
/// Typed lines are echoed behind the current prompt. A comment line completes the command made of
/// the lines typed before it: the responder output is emitted, followed by the echo of the comment.
/// Clones share the same simulated hub.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Default)]
pub struct FakeHub {
    #[cfg_attr(feature = "serde", serde(skip))]
    state: Arc<Mutex<FakeHubState>>,
}

impl FakeHub {
    /// A hub sitting at its prompt, printing nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The hub is busy running a program: input is ignored until the interrupt.
    pub fn running(self) -> Self {
        self.state.lock().running = true;
        self
    }

    /// The hub never shows its prompt after the interrupt.
    pub fn without_prompt(self) -> Self {
        self.state.lock().prompt = false;
        self
    }

    pub fn with_responder<F: FnMut(&str) -> Vec<String> + Send + 'static>(self, responder: F) -> Self {
        self.state.lock().responder = Box::new(responder);
        self
    }

    /// Each command answer is withheld for `stalls` reads.
    pub fn with_stalls(self, stalls: usize) -> Self {
        self.state.lock().stalls = stalls;
        self
    }

    /// Each read takes at least `delay`.
    pub fn with_read_delay(self, delay: Duration) -> Self {
        self.state.lock().read_delay = delay;
        self
    }

    /// Commands containing `code` never complete (until interrupted).
    pub fn hanging_on<S: Into<String>>(self, code: S) -> Self {
        self.state.lock().hang_on = Some(code.into());
        self
    }

    /// Answers of commands containing `code` start with a line that is not valid UTF-8.
    pub fn corrupting<S: Into<String>>(self, code: S) -> Self {
        self.state.lock().corrupt_on = Some(code.into());
        self
    }

    /// The connection opens but every transfer fails.
    pub fn broken(self) -> Self {
        self.state.lock().broken = true;
        self
    }

    pub fn is_opened(&self) -> bool {
        self.state.lock().opened
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Everything written to the hub so far.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    pub fn clear_written(&self) {
        self.state.lock().written.clear();
    }

    /// Number of reads that returned nothing.
    pub fn empty_reads(&self) -> usize {
        self.state.lock().empty_reads
    }

    /// Number of completed (or hanging) commands.
    pub fn sentinels(&self) -> usize {
        self.state.lock().sentinels
    }

    /// Number of lines received while the answer of a previous command was still unread.
    pub fn overlaps(&self) -> usize {
        self.state.lock().overlaps
    }

    pub fn reset_counters(&self) {
        let mut state = self.state.lock();
        state.empty_reads = 0;
        state.sentinels = 0;
        state.overlaps = 0;
    }
}

impl Debug for FakeHub {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("FakeHub")
            .field("opened", &state.opened)
            .field("running", &state.running)
            .field("pending", &state.outbox.len())
            .finish()
    }
}

impl Display for FakeHub {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "FakeHub")
    }
}

#[cfg_attr(feature = "serde", typetag::serde)]
impl IoTransport for FakeHub {
    fn open(&mut self) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.opened = true;
        if state.running {
            state.emit("tick\r\n");
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.state.lock().opened = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().opened
    }

    fn set_timeout(&mut self, _: Duration) -> Result<(), Error> {
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), Error> {
        let mut state = self.state.lock();
        if !state.opened {
            return Err(NotInitialized.into());
        }
        if state.broken {
            return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe).into());
        }

        state.written.extend_from_slice(buf);
        for &byte in buf {
            if byte == INTERRUPT {
                state.interrupt();
            } else if state.running {
                continue;
            } else if byte == b'\n' {
                let mut line = std::mem::take(&mut state.line);
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                state.receive(&String::from_utf8_lossy(&line));
            } else {
                state.line.push(byte);
            }
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let delay = self.state.lock().read_delay;
        if !delay.is_zero() {
            pause_sync!(delay.as_millis() as u64);
        }

        let mut state = self.state.lock();
        if !state.opened {
            return Err(NotInitialized.into());
        }
        if state.broken {
            return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe).into());
        }

        if state.remaining_stalls > 0 {
            state.remaining_stalls -= 1;
            state.empty_reads += 1;
            if state.remaining_stalls == 0 {
                let deferred = std::mem::take(&mut state.deferred);
                state.outbox.extend(deferred);
            }
            return Ok(0);
        }

        if state.outbox.is_empty() {
            state.empty_reads += 1;
            drop(state);
            pause_sync!(1);
            return Ok(0);
        }

        let size = buf.len().min(state.outbox.len());
        for (slot, byte) in buf.iter_mut().zip(state.outbox.drain(..size)) {
            *slot = byte;
        }
        if state.outbox.is_empty() && state.deferred.is_empty() {
            state.unread = false;
        }
        Ok(size)
    }
}
