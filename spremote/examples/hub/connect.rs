//! This example shows the minimal requirement: a hub to control.
//!
//! A hub uses a 'protocol' defining how to talk to it. The default is [`ReplIo`], which drives the hub
//! Python interpreter through an [`IoTransport`] ([`Serial`] by default).

use spremote::hardware::Hub;
use spremote::io::{ReplConfig, ReplIo, Serial, SentinelMode};

fn main() -> anyhow::Result<()> {
    // The easiest way: the port is given, the connection is opened right away.
    // Any program running on the hub is interrupted.
    let mut hub = Hub::connect("/dev/ttyACM0")?;
    println!("Connected: {}", hub);
    hub.disconnect()?;

    // The equivalent would be:
    let _ = Hub::new(ReplIo::new("/dev/ttyACM0")).blocking_open()?;

    // The protocol may be customized before the connection.
    let protocol = ReplIo::from(Serial::new("/dev/ttyACM0").with_baud_rate(115_200)).with_config(
        ReplConfig::default()
            .with_sentinel_mode(SentinelMode::Sequenced)
            .with_log_target("left-hub"),
    );
    let hub = Hub::new(protocol).blocking_open()?;
    println!("Greeting: {:?}", hub.get_data().read().greeting);

    // Dropping the last handle on the hub releases the serial port.
    Ok(())
}
