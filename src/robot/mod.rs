pub mod assembly;
pub mod config;
pub mod controller;
pub mod state;

pub use assembly::{Robot, SensorThreads};
pub use controller::{BehaviorController, ControllerError, ControllerStatus, SharedStatus};
pub use state::BehavioralState;
