use spremote::devices::{Motor, MotorConfig};
use spremote::hardware::{Hub, Port};
use spremote::pause_sync;

fn main() -> anyhow::Result<()> {
    let hub = Hub::connect("/dev/ttyACM0")?;
    let config = MotorConfig::default().with_speed(30.0).with_lock(true);
    let mut motor = Motor::new(&hub, Port::A, config)?;
    let position = motor.get_position()?;
    println!("{} at {}°", motor, position);

    // A quarter turn forward, then back (waiting for the motor each time).
    motor.run_degrees(90.0, None, None, None, None, true)?;
    motor.run_degrees(-90.0, Some(60.0), None, Some(20.0), None, true)?;

    // Free run for a second.
    motor.start(Some(-50.0), None)?;
    pause_sync!(1000);
    motor.stop(Some(false))?;
    Ok(())
}
