use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

use crate::devices::{query, Device};
use crate::errors::{Error, ProtocolError};
use crate::hardware::{Hub, Port};
use crate::io::IoProtocol;
use crate::pause_sync;
use crate::utils::response::parse_value;

/// Firmware value of a 100% acceleration (or deceleration).
const MAX_ACCELERATION: f64 = 10_000.0;
/// Interval between two position checks while waiting for a motor.
const POLL_INTERVAL: u64 = 100;
/// How close (in degrees) to the expected position a stopped motor must be.
const POSITION_TOLERANCE: i32 = 5;

/// Default settings of a [`Motor`]. Speeds and accelerations are percentages of their maximum.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct MotorConfig {
    /// Holds the position once stopped.
    pub lock: bool,
    pub speed: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    /// Bounds [`Motor::run_degrees`] waiting for the motor to stop (`None` waits forever).
    pub wait_timeout: Option<Duration>,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            lock: false,
            speed: 50.0,
            acceleration: 100.0,
            deceleration: 100.0,
            wait_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl MotorConfig {
    pub fn with_lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_deceleration(mut self, deceleration: f64) -> Self {
        self.deceleration = deceleration;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }
}

/// A motor attached to a port of the hub.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct Motor {
    // ########################################
    // # Basics
    port: Port,
    config: MotorConfig,
    /// Maximum speed reported by the motor.
    max_speed: i32,
    /// Default speed (firmware unit).
    speed: i32,
    /// Default acceleration (firmware unit).
    acceleration: i32,
    /// Default deceleration (firmware unit).
    deceleration: i32,

    // ########################################
    // # Volatile utility data.
    #[cfg_attr(feature = "serde", serde(skip))]
    protocol: Box<dyn IoProtocol>,
}

impl Motor {
    /// Prepares the hub for the motor usage: the motor maximum speed is retrieved, then the motor is
    /// stopped and (un)locked according to `config`.
    ///
    /// # Example
    /// ```no_run
    /// use spremote::devices::{Motor, MotorConfig};
    /// use spremote::hardware::{Hub, Port};
    ///
    /// let hub = Hub::connect("/dev/ttyACM0").unwrap();
    /// let mut motor = Motor::new(&hub, Port::A, MotorConfig::default().with_speed(30.0)).unwrap();
    /// motor.run_degrees(-90.0, None, None, None, None, true).unwrap();
    /// ```
    pub fn new(hub: &Hub, port: Port, config: MotorConfig) -> Result<Self, Error> {
        let mut protocol = hub.get_protocol();
        protocol.execute("import motor")?;
        let response = query(
            protocol.as_mut(),
            "motor max speed",
            &format!("motor.info({})[1]", port.index()),
        )?;
        let max_speed: i32 = parse_value("motor max speed", &response)?;

        let mut motor = Self {
            port,
            speed: to_speed(config.speed, max_speed),
            acceleration: to_acceleration(config.acceleration),
            deceleration: to_acceleration(config.deceleration),
            max_speed,
            config,
            protocol,
        };
        // Powers the motor at zero speed before the first stop.
        motor.start(Some(0.0), Some(0.0))?;
        motor.stop(None)?;
        Ok(motor)
    }

    pub fn get_config(&self) -> &MotorConfig {
        &self.config
    }

    pub fn get_max_speed(&self) -> i32 {
        self.max_speed
    }

    /// Starts the motor at `speed` (percentage, its sign gives the direction) with `acceleration`
    /// (percentage). `None` uses the configured defaults.
    pub fn start(&mut self, speed: Option<f64>, acceleration: Option<f64>) -> Result<(), Error> {
        let speed = speed.map_or(self.speed, |speed| to_speed(speed, self.max_speed));
        let acceleration = acceleration.map_or(self.acceleration, to_acceleration);
        query(
            self.protocol.as_mut(),
            "motor run",
            &format!(
                "motor.run({}, {}, acceleration={})",
                self.port.index(),
                speed,
                acceleration
            ),
        )?;
        Ok(())
    }

    /// Stops the motor by cutting its power (no controlled deceleration), then locks it (or not).
    pub fn stop(&mut self, lock: Option<bool>) -> Result<(), Error> {
        let lock = lock.unwrap_or(self.config.lock);
        query(
            self.protocol.as_mut(),
            "motor stop",
            &format!("motor.stop({}, stop={})", self.port.index(), lock as u8),
        )?;
        Ok(())
    }

    /// Runs the motor for a number of degrees.
    ///
    /// The direction is flipped by a negative `degrees` (or a negative `speed`). `None` arguments use
    /// the configured defaults. When `wait` is set, returns once the motor has started and stopped
    /// close to the expected position.
    ///
    /// # Errors
    /// * `ExecutionTimeout`: the motor did not stop within the configured wait timeout.
    pub fn run_degrees(
        &mut self,
        degrees: f64,
        speed: Option<f64>,
        acceleration: Option<f64>,
        deceleration: Option<f64>,
        lock: Option<bool>,
        wait: bool,
    ) -> Result<(), Error> {
        let mut speed = speed.map_or(self.speed, |speed| to_speed(speed, self.max_speed));
        let acceleration = acceleration.map_or(self.acceleration, to_acceleration);
        let deceleration = deceleration.map_or(self.deceleration, to_acceleration);
        let lock = lock.unwrap_or(self.config.lock);
        if degrees < 0.0 {
            speed = -speed;
        }
        let degrees = degrees.abs() as i32;

        query(
            self.protocol.as_mut(),
            "motor run for degrees",
            &format!(
                "motor.run_for_degrees({}, {}, {}, acceleration={}, deceleration={}, stop={})",
                self.port.index(),
                degrees,
                speed,
                acceleration,
                deceleration,
                lock as u8
            ),
        )?;

        if wait {
            self.wait_for(degrees * speed.signum())?;
        }
        Ok(())
    }

    /// Reads the current position in degrees, from -179 to 180.
    pub fn get_position(&mut self) -> Result<i32, Error> {
        let response = query(
            self.protocol.as_mut(),
            "motor position",
            &format!("motor.absolute_position({})", self.port.index()),
        )?;
        parse_value("motor position", &response)
    }

    /// Polls the position until the motor moved, then stopped close to `travel` degrees away.
    fn wait_for(&mut self, travel: i32) -> Result<(), Error> {
        let started_at = Instant::now();
        let mut position = self.get_position()?;
        let target = wrap_angle(position + travel);
        let mut started = false;

        loop {
            let previous = position;
            position = self.get_position()?;
            if position != previous {
                started = true;
            } else if started && angle_distance(position, target) < POSITION_TOLERANCE {
                return Ok(());
            }

            if let Some(timeout) = self.config.wait_timeout {
                if started_at.elapsed() >= timeout {
                    return Err(ProtocolError::ExecutionTimeout { timeout }.into());
                }
            }
            pause_sync!(POLL_INTERVAL);
        }
    }
}

impl Display for Motor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Motor (port={}) [speed={}/{}, lock={}]",
            self.port, self.speed, self.max_speed, self.config.lock
        )
    }
}

impl Device for Motor {
    fn get_port(&self) -> Option<Port> {
        Some(self.port)
    }
}

/// Converts a speed percentage to the firmware unit (truncated toward zero).
fn to_speed(percentage: f64, max_speed: i32) -> i32 {
    (percentage / 100.0 * max_speed as f64) as i32
}

/// Converts an acceleration percentage to the firmware unit (truncated toward zero).
fn to_acceleration(percentage: f64) -> i32 {
    (percentage / 100.0 * MAX_ACCELERATION) as i32
}

/// Brings an angle back within -180..180.
fn wrap_angle(angle: i32) -> i32 {
    (angle + 180).rem_euclid(360) - 180
}

/// Shortest distance between two angles.
fn angle_distance(a: i32, b: i32) -> i32 {
    let distance = (a - b).rem_euclid(360);
    distance.min(360 - distance)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::mocks::protocol::MockProtocol;

    fn mock(positions: &[i32]) -> MockProtocol {
        let positions = Arc::new(Mutex::new(positions.iter().copied().collect::<VecDeque<_>>()));
        MockProtocol::new().with_responder(move |code| match code {
            "motor.info(0)[1]" => vec![String::from("1050")],
            "motor.absolute_position(0)" => {
                let mut positions = positions.lock();
                let position = match positions.len() {
                    1 => positions[0],
                    _ => positions.pop_front().unwrap_or_default(),
                };
                vec![position.to_string()]
            }
            _ => vec![],
        })
    }

    #[test]
    fn test_motor_setup() {
        let protocol = mock(&[0]);
        let motor = Motor::new(&Hub::new(protocol.clone()), Port::A, MotorConfig::default()).unwrap();
        assert_eq!(motor.get_max_speed(), 1050);
        assert_eq!(
            protocol.commands(),
            vec![
                "import motor",
                "motor.info(0)[1]",
                "motor.run(0, 0, acceleration=0)",
                "motor.stop(0, stop=0)"
            ]
        );
        assert_eq!(motor.to_string(), "Motor (port=A) [speed=525/1050, lock=false]");
    }

    #[test]
    fn test_motor_start_and_stop() {
        let protocol = mock(&[0]);
        let config = MotorConfig::default()
            .with_lock(true)
            .with_speed(20.0)
            .with_acceleration(50.0);
        let mut motor = Motor::new(&Hub::new(protocol.clone()), Port::A, config).unwrap();
        protocol.clear();

        motor.start(None, None).unwrap();
        motor.start(Some(-33.0), Some(25.0)).unwrap();
        motor.start(Some(0.0), Some(0.0)).unwrap();
        motor.stop(None).unwrap();
        motor.stop(Some(false)).unwrap();
        assert_eq!(
            protocol.commands(),
            vec![
                "motor.run(0, 210, acceleration=5000)",
                "motor.run(0, -346, acceleration=2500)",
                "motor.run(0, 0, acceleration=0)",
                "motor.stop(0, stop=1)",
                "motor.stop(0, stop=0)"
            ]
        );
    }

    #[test]
    fn test_motor_run_degrees() {
        let protocol = mock(&[0]);
        let config = MotorConfig::default().with_deceleration(40.0).with_acceleration(80.0);
        let mut motor = Motor::new(&Hub::new(protocol.clone()), Port::A, config).unwrap();
        protocol.clear();

        motor.run_degrees(-90.5, None, None, None, None, false).unwrap();
        motor
            .run_degrees(360.0, Some(10.0), Some(100.0), Some(100.0), Some(true), false)
            .unwrap();
        assert_eq!(
            protocol.commands(),
            vec![
                "motor.run_for_degrees(0, 90, -525, acceleration=8000, deceleration=4000, stop=0)",
                "motor.run_for_degrees(0, 360, 105, acceleration=10000, deceleration=10000, stop=1)"
            ]
        );
    }

    #[test]
    fn test_motor_run_degrees_and_wait() {
        let protocol = mock(&[170, 170, -170, -120, -102, -100]);
        let mut motor = Motor::new(&Hub::new(protocol.clone()), Port::A, MotorConfig::default()).unwrap();
        protocol.clear();

        motor.run_degrees(90.0, None, None, None, None, true).unwrap();
        let polls = protocol
            .commands()
            .iter()
            .filter(|code| code.as_str() == "motor.absolute_position(0)")
            .count();
        assert_eq!(polls, 7);
    }

    #[test]
    fn test_motor_wait_timeout() {
        let protocol = mock(&[12]);
        let config = MotorConfig::default().with_wait_timeout(Some(Duration::from_millis(250)));
        let mut motor = Motor::new(&Hub::new(protocol), Port::A, config).unwrap();

        let error = motor.run_degrees(45.0, None, None, None, None, true).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Protocol error: Execution timed out after 250ms."
        );
    }

    #[test]
    fn test_angles() {
        assert_eq!(wrap_angle(260), -100);
        assert_eq!(wrap_angle(-190), 170);
        assert_eq!(wrap_angle(180), -180);
        assert_eq!(angle_distance(178, -179), 3);
        assert_eq!(angle_distance(-100, -102), 2);
        assert_eq!(angle_distance(0, 180), 180);
    }
}
