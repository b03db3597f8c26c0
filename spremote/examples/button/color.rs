use spremote::devices::{Button, ButtonId};
use spremote::hardware::Hub;
use spremote::pause_sync;

fn main() -> anyhow::Result<()> {
    let hub = Hub::connect("/dev/ttyACM0")?;
    let mut left = Button::new(&hub, ButtonId::Left)?;
    let mut power = Button::new(&hub, ButtonId::Power)?;

    // Cycles the power button light colors while the left button is not held for a second.
    let mut color = 0;
    while left.is_down()? < 1000 {
        color = color % 10 + 1;
        power.set_color(color)?;
        pause_sync!(250);
    }
    power.set_color(0)?;
    Ok(())
}
