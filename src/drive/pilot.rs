use log::debug;
use std::f32::consts::PI;

use super::backend::MotorBackend;
use super::command::{Direction, DriveCommand};
use super::error::{check_finite, check_speed, DriveResult};
use crate::robot::config::{TRACK_WIDTH_MM, WHEEL_DIAMETER_MM};

/// Default speeds are this fraction of the maximum
const DEFAULT_SPEED_FRACTION: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PilotGeometry {
    pub wheel_diameter_mm: f32,
    pub track_width_mm: f32,
}

impl PilotGeometry {
    pub fn wheel_circumference(&self) -> f32 {
        PI * self.wheel_diameter_mm
    }

    /// Wheel degrees needed to roll `distance_mm`
    pub fn travel_to_wheel_deg(&self, distance_mm: f32) -> f32 {
        distance_mm * 360.0 / self.wheel_circumference()
    }

    /// Wheel degrees each wheel turns (in opposite directions) to spin the robot `angle_deg`
    pub fn rotation_to_wheel_deg(&self, angle_deg: f32) -> f32 {
        angle_deg * self.track_width_mm / self.wheel_diameter_mm
    }
}

impl Default for PilotGeometry {
    fn default() -> Self {
        Self {
            wheel_diameter_mm: WHEEL_DIAMETER_MM,
            track_width_mm: TRACK_WIDTH_MM,
        }
    }
}

/// Differential-drive pilot.
///
/// Travel speeds are in mm/s, rotate speeds in degrees/s of robot heading.
/// Positive angles turn counter-clockwise. A rejected call leaves the
/// previous command in effect.
pub struct DifferentialPilot<B: MotorBackend> {
    backend: B,
    geometry: PilotGeometry,
    travel_speed: f32,
    rotate_speed: f32,
    last_command: Option<DriveCommand>,
}

impl<B: MotorBackend> DifferentialPilot<B> {
    pub fn new(backend: B, geometry: PilotGeometry) -> Self {
        let mut pilot = Self {
            backend,
            geometry,
            travel_speed: 0.0,
            rotate_speed: 0.0,
            last_command: None,
        };
        pilot.travel_speed = pilot.max_travel_speed() * DEFAULT_SPEED_FRACTION;
        pilot.rotate_speed = pilot.max_rotate_speed() * DEFAULT_SPEED_FRACTION;
        pilot
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn current_command(&self) -> Option<DriveCommand> {
        self.last_command
    }

    pub fn max_travel_speed(&self) -> f32 {
        self.backend.max_wheel_speed() * self.geometry.wheel_circumference() / 360.0
    }

    pub fn max_rotate_speed(&self) -> f32 {
        self.backend.max_wheel_speed() * self.geometry.wheel_diameter_mm
            / self.geometry.track_width_mm
    }

    pub fn travel_speed(&self) -> f32 {
        self.travel_speed
    }

    pub fn rotate_speed(&self) -> f32 {
        self.rotate_speed
    }

    pub fn set_travel_speed(&mut self, speed: f32) -> DriveResult<()> {
        self.travel_speed = check_speed("travel speed", speed)?;
        Ok(())
    }

    pub fn set_rotate_speed(&mut self, speed: f32) -> DriveResult<()> {
        self.rotate_speed = check_speed("rotate speed", speed)?;
        Ok(())
    }

    /// Spins on the spot until another command replaces it
    pub fn rotate_in_place(&mut self, direction: Direction, speed: f32) -> DriveResult<()> {
        let speed = check_speed("rotate speed", speed)?;
        let wheel_speed = self.geometry.rotation_to_wheel_deg(speed);
        let (left, right) = match direction {
            Direction::Left => (-wheel_speed, wheel_speed),
            Direction::Right => (wheel_speed, -wheel_speed),
        };
        self.backend.run_wheels(left, right)?;
        self.issued(DriveCommand::RotateInPlace { direction, speed });
        Ok(())
    }

    pub fn rotate_by(&mut self, angle: f32, blocking: bool) -> DriveResult<()> {
        let angle = check_finite("rotation angle", angle)?;
        let wheel_deg = self.geometry.rotation_to_wheel_deg(angle);
        let wheel_speed = self.geometry.rotation_to_wheel_deg(self.rotate_speed);
        self.backend
            .rotate_wheels(-wheel_deg, wheel_deg, wheel_speed, blocking)?;
        self.issued(DriveCommand::RotateBy { angle, blocking });
        Ok(())
    }

    /// Drives straight; negative distances reverse
    pub fn translate_by(&mut self, distance: f32, blocking: bool) -> DriveResult<()> {
        let distance = check_finite("travel distance", distance)?;
        let wheel_deg = self.geometry.travel_to_wheel_deg(distance);
        let wheel_speed = self.geometry.travel_to_wheel_deg(self.travel_speed);
        self.backend
            .rotate_wheels(wheel_deg, wheel_deg, wheel_speed, blocking)?;
        self.issued(DriveCommand::TranslateBy { distance, blocking });
        Ok(())
    }

    /// Drives forward until another command replaces it
    pub fn move_forward(&mut self, speed: f32) -> DriveResult<()> {
        let speed = check_speed("travel speed", speed)?;
        let wheel_speed = self.geometry.travel_to_wheel_deg(speed);
        self.backend.run_wheels(wheel_speed, wheel_speed)?;
        self.issued(DriveCommand::MoveForward { speed });
        Ok(())
    }

    /// `move_forward` at the configured travel speed
    pub fn forward(&mut self) -> DriveResult<()> {
        self.move_forward(self.travel_speed)
    }

    pub fn stop(&mut self) -> DriveResult<()> {
        self.backend.stop()?;
        self.issued(DriveCommand::Stop);
        Ok(())
    }

    fn issued(&mut self, command: DriveCommand) {
        if self.last_command != Some(command) {
            debug!("Pilot: {}", command);
        }
        self.last_command = Some(command);
    }
}
