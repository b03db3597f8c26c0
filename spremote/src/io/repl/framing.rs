//! Text munging between host-side strings and the hub line editor.

use crate::errors::Error;
use crate::io::repl::constants::{COMMENT, ECHO_MARKERS, REMOTE_EOL};

/// Prepares (possibly multi-line) code for the remote line editor.
///
/// The editor indents each new line based on the previous one. Whenever a line or its successor is
/// indented, two empty lines are inserted after it so the editor closes the current indentation level
/// before the next physical line arrives. An indented last line gets the same padding, and the result
/// always ends with a line break.
pub fn frame_code(code: &str) -> String {
    let mut lines: Vec<String> = code
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_owned())
        .collect();

    for i in 0..lines.len() - 1 {
        if is_indented(&lines[i]) || is_indented(&lines[i + 1]) {
            lines[i].push_str("\n\n");
        }
    }
    if let Some(last) = lines.last_mut() {
        if is_indented(last) {
            last.push_str("\n\n");
        }
        last.push('\n');
    }

    lines.join("\n")
}

/// Converts text to the bytes sent to the hub: a trailing line break is ensured and every `\n`
/// becomes `\r\n`.
pub fn encode(text: &str) -> Vec<u8> {
    let mut text = text.to_owned();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text.replace('\n', REMOTE_EOL).into_bytes()
}

/// Decodes one received frame, stripping its `\r\n` terminator if present.
pub fn decode_frame(raw: &[u8]) -> Result<String, Error> {
    let raw = raw.strip_suffix(REMOTE_EOL.as_bytes()).unwrap_or(raw);
    Ok(std::str::from_utf8(raw)?.to_owned())
}

/// Builds the inert statement carrying the completion marker.
pub fn sentinel_line(marker: &str) -> String {
    format!("{}{}", COMMENT, marker)
}

/// Indicates whether a received line is the editor echoing what was typed.
pub fn is_echo(line: &str) -> bool {
    ECHO_MARKERS.iter().any(|marker| line.starts_with(marker))
}

fn is_indented(line: &str) -> bool {
    line.starts_with(char::is_whitespace)
}
