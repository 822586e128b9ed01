use log::{debug, info};
use rand::{rng, Rng};
use std::f32::consts::PI;

use super::config::{ArenaConfig, RANGE_NO_ECHO_MM};
use super::ring::Ring;
use crate::communication::channels::Side;

/// Bumpers register a touch within this gap (millimeters)
const CONTACT_MARGIN_MM: f32 = 2.0;
/// A head-on touch presses both bumpers
const BUMPER_OVERLAP_RAD: f32 = 5.0 * PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    /// Radians, counter-clockwise from +x
    pub heading: f32,
}

impl Pose {
    pub fn new(x: f32, y: f32, heading_deg: f32) -> Self {
        Self {
            x,
            y,
            heading: heading_deg.to_radians(),
        }
    }

    /// World position of a point given in the robot frame
    pub fn offset(&self, forward: f32, left: f32) -> (f32, f32) {
        let (sin, cos) = self.heading.sin_cos();
        (
            self.x + forward * cos - left * sin,
            self.y + forward * sin + left * cos,
        )
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        ((x - self.x).powi(2) + (y - self.y).powi(2)).sqrt()
    }

    /// Angle of (x, y) relative to the heading, in [-PI, PI]
    pub fn bearing_to(&self, x: f32, y: f32) -> f32 {
        wrap_angle((y - self.y).atan2(x - self.x) - self.heading)
    }
}

fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wheel {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default)]
struct WheelState {
    /// Signed degrees per second
    speed: f32,
    /// Degrees still to turn for a finite rotation
    remaining: Option<f32>,
}

impl WheelState {
    /// Turns the wheel for `dt` seconds, returning the signed degrees turned
    fn advance(&mut self, dt: f32) -> f32 {
        let delta = self.speed * dt;
        match self.remaining {
            Some(left) if delta.abs() >= left => {
                let done = left * self.speed.signum();
                self.speed = 0.0;
                self.remaining = None;
                done
            }
            Some(left) => {
                self.remaining = Some(left - delta.abs());
                delta
            }
            None => delta,
        }
    }
}

/// The simulated ring with our robot and one opponent on it
pub struct Arena {
    pub config: ArenaConfig,
    pub ring: Ring,
    pub robot: Pose,
    pub opponent: Pose,
    pub pushed_out: u32,
    pub elapsed: f32,
    left: WheelState,
    right: WheelState,
}

impl Arena {
    pub fn new(config: ArenaConfig) -> Self {
        let ring = Ring::new(
            config.ring_radius_mm,
            config.border_width_mm,
            (config.white_raw, config.black_raw, config.floor_raw),
            config.texture_amplitude,
            config.mat_seed,
        );
        Self {
            config,
            ring,
            robot: Pose::new(0.0, 0.0, 0.0),
            opponent: Pose::new(200.0, 150.0, 180.0),
            pushed_out: 0,
            elapsed: 0.0,
            left: WheelState::default(),
            right: WheelState::default(),
        }
    }

    pub fn place_robot(&mut self, pose: Pose) {
        self.robot = pose;
        self.stop_wheels();
    }

    pub fn place_opponent(&mut self, x: f32, y: f32) {
        self.opponent = Pose::new(x, y, 0.0);
    }

    /// Drops the opponent somewhere on the mat, clear of the robot.
    pub fn respawn_opponent(&mut self) {
        let mut rng = rng();
        let reach = self.ring.radius - self.ring.border_width - self.config.opponent_radius_mm;
        let clearance = self.config.robot_radius_mm + self.config.opponent_radius_mm + 50.0;
        for _ in 0..20 {
            let r = reach * rng.random_range(0.0f32..1.0).sqrt();
            let theta = rng.random_range(-PI..PI);
            let (x, y) = (r * theta.cos(), r * theta.sin());
            if self.robot.distance_to(x, y) > clearance {
                self.place_opponent(x, y);
                return;
            }
        }
        let (x, y) = self.robot.offset(-clearance, 0.0);
        self.place_opponent(x, y);
    }

    /// Sets a wheel turning; with `remaining` it stops after that many degrees.
    pub fn set_wheel(&mut self, wheel: Wheel, speed: f32, remaining: Option<f32>) {
        let speed = speed.clamp(-self.config.max_wheel_speed, self.config.max_wheel_speed);
        let state = match wheel {
            Wheel::Left => &mut self.left,
            Wheel::Right => &mut self.right,
        };
        *state = match remaining {
            Some(degrees) if degrees <= 0.0 => WheelState::default(),
            _ => WheelState { speed, remaining },
        };
    }

    pub fn stop_wheels(&mut self) {
        self.left = WheelState::default();
        self.right = WheelState::default();
    }

    /// True while a finite wheel rotation is still running
    pub fn motion_pending(&self) -> bool {
        self.left.remaining.is_some() || self.right.remaining.is_some()
    }

    pub fn is_moving(&self) -> bool {
        self.left.speed != 0.0 || self.right.speed != 0.0
    }

    pub fn opponent_out(&self) -> bool {
        (self.opponent.x.powi(2) + self.opponent.y.powi(2)).sqrt() > self.ring.radius
    }

    /// Advances the world by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.elapsed += dt;
        let was_out = self.opponent_out();

        let geometry = self.config.geometry;
        let mm_per_deg = geometry.wheel_circumference() / 360.0;
        let dl = self.left.advance(dt) * mm_per_deg;
        let dr = self.right.advance(dt) * mm_per_deg;

        let forward = (dl + dr) / 2.0;
        let turn = (dr - dl) / geometry.track_width_mm;
        let mid_heading = self.robot.heading + turn / 2.0;
        self.robot.x += forward * mid_heading.cos();
        self.robot.y += forward * mid_heading.sin();
        self.robot.heading = wrap_angle(self.robot.heading + turn);

        self.wander(dt);
        self.resolve_contact();

        if !was_out && self.opponent_out() {
            self.pushed_out += 1;
            info!("Opponent pushed out of the ring! ({} so far)", self.pushed_out);
            if self.config.respawn_opponent {
                self.respawn_opponent();
            }
        }
    }

    fn wander(&mut self, dt: f32) {
        let speed = self.config.opponent_wander_mm_s;
        if speed <= 0.0 || self.opponent_out() {
            return;
        }
        let theta = rng().random_range(-PI..PI);
        self.opponent.x += speed * dt * theta.cos();
        self.opponent.y += speed * dt * theta.sin();
    }

    /// Shoves the opponent out of the robot's footprint
    fn resolve_contact(&mut self) {
        if self.opponent_out() {
            return;
        }
        let min_gap = self.config.robot_radius_mm + self.config.opponent_radius_mm;
        let dist = self.robot.distance_to(self.opponent.x, self.opponent.y);
        if dist < min_gap && dist > f32::EPSILON {
            let push = min_gap - dist;
            self.opponent.x += (self.opponent.x - self.robot.x) / dist * push;
            self.opponent.y += (self.opponent.y - self.robot.y) / dist * push;
            debug!("Arena: opponent shoved {:.1} mm", push);
        }
    }

    /// Raw reading of the downward light sensor
    pub fn light_raw(&self) -> f32 {
        let (x, y) = self.robot.offset(self.config.light_offset_mm, 0.0);
        self.ring.reflectance(x, y)
    }

    /// Ultrasonic distance from the robot's nose to the opponent
    pub fn range_reading(&self) -> f32 {
        if self.opponent_out() {
            return RANGE_NO_ECHO_MM;
        }
        let (sx, sy) = self.robot.offset(self.config.robot_radius_mm, 0.0);
        let nose = Pose {
            x: sx,
            y: sy,
            heading: self.robot.heading,
        };
        let bearing = nose.bearing_to(self.opponent.x, self.opponent.y);
        if bearing.abs() > self.config.range_cone_deg.to_radians() {
            return RANGE_NO_ECHO_MM;
        }
        let surface = nose.distance_to(self.opponent.x, self.opponent.y)
            - self.config.opponent_radius_mm;
        let noise = self.config.range_noise_mm;
        let jitter = if noise > 0.0 {
            rng().random_range(-noise..=noise)
        } else {
            0.0
        };
        (surface + jitter).clamp(0.0, RANGE_NO_ECHO_MM)
    }

    pub fn bumper_pressed(&self, side: Side) -> bool {
        let reach = self.config.robot_radius_mm + self.config.opponent_radius_mm + CONTACT_MARGIN_MM;
        if self.robot.distance_to(self.opponent.x, self.opponent.y) > reach {
            return false;
        }
        let bearing = self.robot.bearing_to(self.opponent.x, self.opponent.y);
        let arc = self.config.bumper_arc_deg.to_radians();
        match side {
            Side::Left => (-BUMPER_OVERLAP_RAD..=arc).contains(&bearing),
            Side::Right => (-arc..=BUMPER_OVERLAP_RAD).contains(&bearing),
        }
    }
}
