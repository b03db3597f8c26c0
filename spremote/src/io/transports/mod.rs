use crate::errors::Error;
use dyn_clone::DynClone;
use std::fmt::{Debug, Display};
use std::time::Duration;

pub mod serial;

dyn_clone::clone_trait_object!(IoTransport);

/// A raw duplex byte stream to the hub.
///
/// Clones of a transport share the same underlying connection.
#[cfg_attr(feature = "serde", typetag::serde(tag = "type"))]
pub trait IoTransport: Debug + Display + DynClone + Send + Sync {
    /// Opens communication (in a blocking way) using the transport layer.
    fn open(&mut self) -> Result<(), Error>;

    /// Releases the underlying connection.
    fn close(&mut self) -> Result<(), Error>;

    /// Indicates if the underlying connection is currently held.
    fn is_open(&self) -> bool;

    /// Sets the maximum time a single [`IoTransport::read`] call may block.
    fn set_timeout(&mut self, duration: Duration) -> Result<(), Error>;

    /// Writes all bytes to the internal connection. For more details see [`std::io::Write::write_all`].
    fn write(&mut self, buf: &[u8]) -> Result<(), Error>;

    /// Reads whatever is available into `buf` and returns the number of bytes read.
    ///
    /// # Notes
    /// `Ok(0)` means nothing arrived before the read timeout elapsed. This is not an error: the caller
    /// decides whether to try again.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error>;
}
