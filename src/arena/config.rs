use std::time::Duration;

use crate::communication::channels::Side;
use crate::drive::PilotGeometry;
use crate::robot::config::{MotorPort, SensorPort};

/// Standard mini-sumo ring radius (millimeters)
pub const RING_RADIUS_MM: f32 = 385.0;
/// Width of the dark edge band (millimeters)
pub const BORDER_WIDTH_MM: f32 = 25.0;
/// Robot footprint, approximated as a disc (millimeters)
pub const ROBOT_RADIUS_MM: f32 = 80.0;
pub const OPPONENT_RADIUS_MM: f32 = 70.0;

/// Wheel motor top speed (degrees per second)
pub const MAX_WHEEL_SPEED: f32 = 720.0;

/// Raw light readings of each surface
pub const WHITE_RAW: f32 = 560.0;
pub const BLACK_RAW: f32 = 280.0;
pub const FLOOR_RAW: f32 = 150.0;
pub const TEXTURE_AMPLITUDE: f32 = 12.0;

/// Ultrasonic reading when nothing echoes back (millimeters)
pub const RANGE_NO_ECHO_MM: f32 = 2550.0;

/// Physics tick of the threaded simulation
pub const PHYSICS_TICK: Duration = Duration::from_millis(10);

/// What is physically plugged into a sensor port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Touch(Side),
    Light,
    Ultrasonic,
}

/// How the simulated robot is physically wired
#[derive(Debug, Clone)]
pub struct Wiring {
    pub left_wheel: MotorPort,
    pub right_wheel: MotorPort,
    pub devices: Vec<(SensorPort, Device)>,
}

impl Wiring {
    pub fn device_on(&self, port: SensorPort) -> Option<Device> {
        self.devices
            .iter()
            .find(|(p, _)| *p == port)
            .map(|(_, device)| *device)
    }
}

impl Default for Wiring {
    fn default() -> Self {
        Self {
            left_wheel: MotorPort::A,
            right_wheel: MotorPort::C,
            devices: vec![
                (SensorPort::S1, Device::Touch(Side::Left)),
                (SensorPort::S2, Device::Light),
                (SensorPort::S3, Device::Ultrasonic),
                (SensorPort::S4, Device::Touch(Side::Right)),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub ring_radius_mm: f32,
    pub border_width_mm: f32,
    pub robot_radius_mm: f32,
    pub opponent_radius_mm: f32,
    pub geometry: PilotGeometry,
    pub max_wheel_speed: f32,
    pub white_raw: f32,
    pub black_raw: f32,
    pub floor_raw: f32,
    pub texture_amplitude: f32,
    /// Light sensor distance ahead of the robot center
    pub light_offset_mm: f32,
    /// Half-angle of the ultrasonic beam (degrees)
    pub range_cone_deg: f32,
    pub range_noise_mm: f32,
    /// Half-width of the arc each bumper covers (degrees)
    pub bumper_arc_deg: f32,
    /// Random drift speed of the opponent; zero keeps it still
    pub opponent_wander_mm_s: f32,
    /// Put a new opponent on the mat once one is pushed out
    pub respawn_opponent: bool,
    pub mat_seed: u32,
    pub wiring: Wiring,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            ring_radius_mm: RING_RADIUS_MM,
            border_width_mm: BORDER_WIDTH_MM,
            robot_radius_mm: ROBOT_RADIUS_MM,
            opponent_radius_mm: OPPONENT_RADIUS_MM,
            geometry: PilotGeometry::default(),
            max_wheel_speed: MAX_WHEEL_SPEED,
            white_raw: WHITE_RAW,
            black_raw: BLACK_RAW,
            floor_raw: FLOOR_RAW,
            texture_amplitude: TEXTURE_AMPLITUDE,
            light_offset_mm: 60.0,
            range_cone_deg: 15.0,
            range_noise_mm: 0.0,
            bumper_arc_deg: 60.0,
            opponent_wander_mm_s: 0.0,
            respawn_opponent: false,
            mat_seed: 34,
            wiring: Wiring::default(),
        }
    }
}
