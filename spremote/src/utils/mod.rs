//! Various helpers shared by the protocol and the devices.

pub mod response;
mod scale;

pub use scale::Scalable;

/// Blocks the current thread for the given number of milliseconds.
#[macro_export]
macro_rules! pause_sync {
    ($ms:expr) => {
        std::thread::sleep(std::time::Duration::from_millis($ms as u64))
    };
}
