use std::fmt::{Display, Formatter};

/// Represents the internal state a [`ReplIo`](crate::io::ReplIo) session handles.
///
/// This struct is hidden behind an `Arc<RwLock<IoData>>` so that all clones of a session observe the
/// same connection state.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IoData {
    /// Indicates whether the underlying stream is opened and the handshake done.
    pub connected: bool,
    /// Indicates whether the interpreter is known to sit at a fresh prompt.
    pub ready: bool,
    /// Lines received right after the interrupt of the handshake.
    pub greeting: Vec<String>,
    /// Number of commands sent during this session.
    pub commands: u64,
}

impl Display for IoData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "connected={}, ready={}, commands={}",
            self.connected, self.ready, self.commands
        )
    }
}
