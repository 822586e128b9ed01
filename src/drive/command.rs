use std::fmt;

/// Direction of an in-place rotation. Left is counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

/// The last instruction accepted by the pilot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveCommand {
    RotateInPlace { direction: Direction, speed: f32 },
    RotateBy { angle: f32, blocking: bool },
    TranslateBy { distance: f32, blocking: bool },
    MoveForward { speed: f32 },
    Stop,
}

impl fmt::Display for DriveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveCommand::RotateInPlace { direction, speed } => {
                write!(f, "rotate {:?} at {:.0} deg/s", direction, speed)
            }
            DriveCommand::RotateBy { angle, .. } => write!(f, "rotate by {:.0} deg", angle),
            DriveCommand::TranslateBy { distance, .. } => {
                write!(f, "travel {:.0} mm", distance)
            }
            DriveCommand::MoveForward { speed } => write!(f, "forward at {:.0} mm/s", speed),
            DriveCommand::Stop => write!(f, "stop"),
        }
    }
}
