use spremote::devices::LightMatrix;
use spremote::hardware::Hub;
use spremote::pause_sync;

fn main() -> anyhow::Result<()> {
    let hub = Hub::connect("/dev/ttyACM0")?;
    let mut matrix = LightMatrix::new(&hub)?;

    // A heart: 0-9 set the brightness from 0% to 90%, X to 100%.
    matrix.show_image(
        "
        09090
        9X9X9
        99999
        09990
        00900
        ",
    )?;
    pause_sync!(2000);

    // A diagonal, pixel by pixel.
    matrix.clear()?;
    for i in 0..5 {
        matrix.set_pixel(i, i, 100)?;
        pause_sync!(200);
    }
    Ok(())
}
