use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::robot::config::SensorPort;

/// Which side of the robot a contact sensor sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// Logical role of the detector that raised an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorRole {
    Range,
    Contact(Side),
}

impl fmt::Display for DetectorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorRole::Range => write!(f, "range"),
            DetectorRole::Contact(Side::Left) => write!(f, "left bumper"),
            DetectorRole::Contact(Side::Right) => write!(f, "right bumper"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// Distance to the detected object in millimeters
    Range(f32),
    /// Presence only
    Contact,
}

/// A single trigger edge reported by a feature detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionEvent {
    pub source: DetectorRole,
    pub port: SensorPort,
    pub reading: Reading,
}

impl DetectionEvent {
    pub fn range(port: SensorPort, distance_mm: f32) -> Self {
        Self {
            source: DetectorRole::Range,
            port,
            reading: Reading::Range(distance_mm),
        }
    }

    pub fn contact(side: Side, port: SensorPort) -> Self {
        Self {
            source: DetectorRole::Contact(side),
            port,
            reading: Reading::Contact,
        }
    }
}

/// Creates the channel detectors use to hand events to the controller
pub fn create_channel() -> (Sender<DetectionEvent>, Receiver<DetectionEvent>) {
    channel()
}
