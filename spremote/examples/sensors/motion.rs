use spremote::devices::{Face, MotionSensor};
use spremote::hardware::Hub;
use spremote::pause_sync;

fn main() -> anyhow::Result<()> {
    let hub = Hub::connect("/dev/ttyACM0")?;
    let mut sensor = MotionSensor::new(&hub, Face::Buttons)?;

    for _ in 0..20 {
        let (yaw, pitch, roll) = sensor.get_orientation()?;
        let (x, y, z) = sensor.get_acceleration()?;
        println!(
            "yaw={:6.1} pitch={:6.1} roll={:6.1} | acceleration=({:.3}, {:.3}, {:.3})",
            yaw, pitch, roll, x, y, z
        );
        pause_sync!(500);
    }

    // Angles are now measured with the battery facing upwards.
    sensor.reset(Face::Battery)?;
    println!("Angular velocity: {:?}", sensor.get_angular_velocity()?);
    Ok(())
}
