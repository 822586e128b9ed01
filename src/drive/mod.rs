pub mod backend;
pub mod command;
pub mod error;
pub mod pilot;

pub use backend::{MotorBackend, MotorBus, RecordingBackend};
pub use command::{Direction, DriveCommand};
pub use error::{DriveError, DriveResult};
pub use pilot::{DifferentialPilot, PilotGeometry};
