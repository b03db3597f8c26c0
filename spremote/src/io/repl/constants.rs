use std::time::Duration;

/// Symbol rate of the hub serial REPL.
pub const BAUD_RATE: u32 = 115_200;
/// Maximum time a single read may block: used to tell "nothing right now" from "still executing".
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);
/// Default bound of a whole `execute()` call.
pub const EXECUTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Ctrl-C: interrupts the running program and gets back to the interactive prompt.
pub const INTERRUPT: u8 = 0x03;

/// Line terminator expected and emitted by the remote line editor.
pub const REMOTE_EOL: &str = "\r\n";
/// Primary prompt, shown when the interpreter waits for a new statement.
pub const PROMPT: &str = ">>> ";
/// Continuation prompt, shown inside an unfinished block.
pub const CONTINUATION_PROMPT: &str = "... ";
/// Any echoed line starting with one of these markers is editor noise.
pub const ECHO_MARKERS: [&str; 2] = [">>>", "..."];

/// Default completion marker.
pub const SENTINEL: &str = "<<<done>>>";
/// Prefix making the sentinel line an inert statement for the interpreter.
pub const COMMENT: &str = "#";
