use super::error::{DriveError, DriveResult};
use crate::robot::config::MotorPort;

/// Physical side of the pilot: two wheel motors.
///
/// Wheel angles and speeds are in degrees and degrees per second of wheel
/// rotation. Positive turns drive the robot forward.
pub trait MotorBackend: Send {
    /// Turns both wheels by the given angles at `speed`.
    ///
    /// A blocking call returns only once both wheels have finished.
    fn rotate_wheels(
        &mut self,
        left_deg: f32,
        right_deg: f32,
        speed: f32,
        blocking: bool,
    ) -> DriveResult<()>;

    /// Keeps both wheels turning at the given signed speeds until superseded
    fn run_wheels(&mut self, left_speed: f32, right_speed: f32) -> DriveResult<()>;

    fn stop(&mut self) -> DriveResult<()>;

    fn max_wheel_speed(&self) -> f32;
}

/// Hands out a backend driving the motors on the given ports
pub trait MotorBus {
    type Backend: MotorBackend;

    fn connect(&self, left: MotorPort, right: MotorPort) -> Self::Backend;
}

#[derive(Debug, Clone, PartialEq)]
pub enum WheelCommand {
    Rotate {
        left_deg: f32,
        right_deg: f32,
        speed: f32,
        blocking: bool,
    },
    Run {
        left_speed: f32,
        right_speed: f32,
    },
    Stop,
}

/// Backend that only records what it was asked to do.
///
/// Lets a controller be exercised without motors attached.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub commands: Vec<WheelCommand>,
    max_wheel_speed: f32,
    fault: Option<String>,
}

impl RecordingBackend {
    pub fn new(max_wheel_speed: f32) -> Self {
        Self {
            commands: Vec::new(),
            max_wheel_speed,
            fault: None,
        }
    }

    /// Makes every following command fail with a backend fault
    pub fn fail_with(&mut self, reason: &str) {
        self.fault = Some(reason.to_string());
    }

    pub fn take_commands(&mut self) -> Vec<WheelCommand> {
        std::mem::take(&mut self.commands)
    }

    fn record(&mut self, command: WheelCommand) -> DriveResult<()> {
        if let Some(reason) = &self.fault {
            return Err(DriveError::Backend(reason.clone()));
        }
        self.commands.push(command);
        Ok(())
    }
}

impl MotorBackend for RecordingBackend {
    fn rotate_wheels(
        &mut self,
        left_deg: f32,
        right_deg: f32,
        speed: f32,
        blocking: bool,
    ) -> DriveResult<()> {
        self.record(WheelCommand::Rotate {
            left_deg,
            right_deg,
            speed,
            blocking,
        })
    }

    fn run_wheels(&mut self, left_speed: f32, right_speed: f32) -> DriveResult<()> {
        self.record(WheelCommand::Run {
            left_speed,
            right_speed,
        })
    }

    fn stop(&mut self) -> DriveResult<()> {
        self.record(WheelCommand::Stop)
    }

    fn max_wheel_speed(&self) -> f32 {
        self.max_wheel_speed
    }
}
