use spremote::hardware::Hub;

fn main() -> anyhow::Result<()> {
    // Default hub: uses the first available serial port.
    let mut hub = Hub::default().blocking_open()?;

    for (port, id) in hub.list_devices()? {
        match id {
            0 => println!("Port {}: -", port),
            id => println!("Port {}: device #{}", port, id),
        }
    }
    Ok(())
}
