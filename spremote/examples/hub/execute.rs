use std::thread;
use std::time::Duration;

use spremote::hardware::Hub;
use spremote::io::{CancellationToken, ExecuteOptions};

fn main() -> anyhow::Result<()> {
    let mut hub = Hub::connect("/dev/ttyACM0")?;

    // Single statement.
    let lines = hub.execute("print(6 * 7)")?;
    println!("6 * 7 = {}", lines[0]);

    // Indented blocks are fine.
    let lines = hub.execute("for i in range(5):\n    if i % 2:\n        print(i)\nprint('done')")?;
    println!("Printed: {:?}", lines);

    // Remote errors are part of the printed lines.
    let lines = hub.execute("1 / 0")?;
    println!("Error: {:?}", lines.last());

    // Long commands can be bounded...
    let options = ExecuteOptions::default().with_timeout(Duration::from_secs(1));
    if let Err(error) = hub.execute_with("import time\ntime.sleep(5)", &options) {
        println!("Gave up: {}", error);
    }

    // ... or cancelled from another thread.
    let token = CancellationToken::new();
    let canceller = token.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(500));
        canceller.cancel();
    });
    let options = ExecuteOptions::unbounded().with_cancel(token);
    if let Err(error) = hub.execute_with("while True:\n    pass", &options) {
        println!("Gave up: {}", error);
    }

    // The session recovers: the hub was interrupted.
    println!("Still alive: {:?}", hub.execute("print('hello')")?);
    Ok(())
}
