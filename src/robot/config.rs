use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Range detector trigger distance (millimeters)
pub const RANGE_TRIGGER_MM: f32 = 80.0;
/// Range detector polling interval
pub const RANGE_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Contact detectors poll fast enough to catch every press
pub const CONTACT_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Edge guard sampling interval
pub const EDGE_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Pause between two control cycles
pub const CONTROL_CYCLE_INTERVAL: Duration = Duration::from_millis(20);

/// Calibrated light value (0-100) below which the ring border is assumed
pub const EDGE_DARK_THRESHOLD: f32 = 30.0;

/// Rotation speed while searching (degrees per second)
pub const SEARCH_ROTATE_SPEED: f32 = 60.0;
/// Corrective turn issued once a target is found (degrees)
pub const FOUND_CORRECTION_DEG: f32 = -8.0;
/// Edge recovery: back off this far (millimeters, negative = backwards)
pub const EDGE_BACKOFF_MM: f32 = -100.0;
/// Edge recovery: then turn by this much (degrees)
pub const EDGE_TURN_DEG: f32 = 120.0;

/// Reference robot wheel diameter (millimeters)
pub const WHEEL_DIAMETER_MM: f32 = 56.0;
/// Reference robot distance between wheel contact points (millimeters)
pub const TRACK_WIDTH_MM: f32 = 160.0;

/// Sensor ports on the controller brick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorPort {
    S1,
    S2,
    S3,
    S4,
}

impl fmt::Display for SensorPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorPort::S1 => "S1",
            SensorPort::S2 => "S2",
            SensorPort::S3 => "S3",
            SensorPort::S4 => "S4",
        };
        write!(f, "{}", name)
    }
}

/// Motor ports on the controller brick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorPort {
    A,
    B,
    C,
}

#[derive(Debug, Error, PartialEq)]
pub enum BindingError {
    #[error("sensor port {0} is bound to more than one role")]
    SharedSensorPort(SensorPort),

    #[error("motor port {0:?} is bound to both wheels")]
    SharedMotorPort(MotorPort),
}

/// Maps each logical role of the robot onto a physical port.
///
/// Robots that differ only in wiring share one controller and differ only
/// in the binding they are assembled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareBinding {
    pub left_bumper: SensorPort,
    pub right_bumper: SensorPort,
    pub range: SensorPort,
    pub light: SensorPort,
    pub left_motor: MotorPort,
    pub right_motor: MotorPort,
}

impl HardwareBinding {
    /// Checks that no two sensor roles and no two motor roles share a port.
    pub fn validate(&self) -> Result<(), BindingError> {
        let sensors = [self.left_bumper, self.right_bumper, self.range, self.light];
        for (i, port) in sensors.iter().enumerate() {
            if sensors[i + 1..].contains(port) {
                return Err(BindingError::SharedSensorPort(*port));
            }
        }
        if self.left_motor == self.right_motor {
            return Err(BindingError::SharedMotorPort(self.left_motor));
        }
        Ok(())
    }
}

impl Default for HardwareBinding {
    fn default() -> Self {
        Self {
            left_bumper: SensorPort::S1,
            light: SensorPort::S2,
            range: SensorPort::S3,
            right_bumper: SensorPort::S4,
            left_motor: MotorPort::A,
            right_motor: MotorPort::C,
        }
    }
}

/// Tunables of the behavior controller
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub range_trigger_mm: f32,
    pub range_poll_interval: Duration,
    pub contact_poll_interval: Duration,
    pub edge_poll_interval: Duration,
    pub cycle_interval: Duration,
    pub edge_dark_threshold: f32,
    pub search_rotate_speed: f32,
    pub found_correction_deg: f32,
    pub edge_backoff_mm: f32,
    pub edge_turn_deg: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            range_trigger_mm: RANGE_TRIGGER_MM,
            range_poll_interval: RANGE_POLL_INTERVAL,
            contact_poll_interval: CONTACT_POLL_INTERVAL,
            edge_poll_interval: EDGE_POLL_INTERVAL,
            cycle_interval: CONTROL_CYCLE_INTERVAL,
            edge_dark_threshold: EDGE_DARK_THRESHOLD,
            search_rotate_speed: SEARCH_ROTATE_SPEED,
            found_correction_deg: FOUND_CORRECTION_DEG,
            edge_backoff_mm: EDGE_BACKOFF_MM,
            edge_turn_deg: EDGE_TURN_DEG,
        }
    }
}
