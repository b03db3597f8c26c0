//! Defines the protocol turning the hub REPL into a remote execution channel.

mod config;
mod data;
mod diagnostics;
mod protocol;
pub mod repl;
mod transports;

pub use config::*;
pub use data::*;
pub use diagnostics::*;
pub use protocol::*;
pub use repl::ReplIo;
pub use transports::serial::*;
pub use transports::IoTransport;
