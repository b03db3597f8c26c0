use spremote::devices::{ColorSensor, DistanceSensor, ForceSensor};
use spremote::hardware::{Hub, Port};
use spremote::pause_sync;

fn main() -> anyhow::Result<()> {
    let hub = Hub::connect("/dev/ttyACM0")?;
    let mut distance = DistanceSensor::new(&hub, Port::C)?;
    let mut color = ColorSensor::new(&hub, Port::E)?;
    let mut force = ForceSensor::new(&hub, Port::F)?;

    // Lights the distance sensor eyes while the force sensor is not pressed.
    while force.get_raw()? < 100 {
        let millimeters = distance.get_distance()?;
        let intensity = match millimeters {
            -1 => 0,
            mm => (100 - mm.clamp(0, 1000) / 10) as u8,
        };
        for position in 0..4 {
            distance.set_pixel(position, intensity)?;
        }
        println!("Distance: {}mm, color: {:?}", millimeters, color.get_color()?);
        pause_sync!(200);
    }
    distance.lights_off()?;
    Ok(())
}
