//! The simulated controller brick.
//!
//! Exposes the arena through the same port-level seams real hardware would:
//! sensor sources per [`SensorPort`], a motor backend per pair of
//! [`MotorPort`]s, and a calibration prompt that physically places the light
//! sensor.

use log::{info, warn};
use std::fmt::Display;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use super::config::Device;
use super::world::{Arena, Pose, Wheel};
use crate::communication::channels::Side;
use crate::drive::backend::{MotorBackend, MotorBus};
use crate::drive::error::{DriveError, DriveResult};
use crate::robot::config::{MotorPort, SensorPort};
use crate::sensors::calibration::{CalibrationError, CalibrationStep, PlacementPrompt};
use crate::sensors::source::{ContactSource, SensorBus, SensorSource};

fn poisoned<E: Display>(e: E) -> DriveError {
    DriveError::Backend(format!("arena lock poisoned: {}", e))
}

/// How blocking motions wait for completion
#[derive(Debug, Clone, Copy)]
pub enum Stepping {
    /// A physics thread advances the arena; poll until the motion ends
    Threaded { poll: Duration },
    /// Advance the arena from the calling thread in `dt` second steps
    Inline { dt: f32 },
}

pub struct SimBrick {
    arena: Arc<RwLock<Arena>>,
    stepping: Stepping,
}

impl SimBrick {
    pub fn new(arena: Arc<RwLock<Arena>>, stepping: Stepping) -> Self {
        Self { arena, stepping }
    }

    fn device_on(&self, port: SensorPort) -> Option<Device> {
        self.arena
            .read()
            .ok()
            .and_then(|arena| arena.config.wiring.device_on(port))
    }

    fn wheel_on(&self, port: MotorPort) -> Option<Wheel> {
        let arena = self.arena.read().ok()?;
        let wiring = &arena.config.wiring;
        if port == wiring.left_wheel {
            Some(Wheel::Left)
        } else if port == wiring.right_wheel {
            Some(Wheel::Right)
        } else {
            None
        }
    }
}

/// Stand-in for an empty or mismatched port
struct Unplugged;

impl SensorSource for Unplugged {
    fn sample(&self) -> Option<f32> {
        None
    }
}

impl ContactSource for Unplugged {
    fn is_active(&self) -> bool {
        false
    }
}

struct SimRange(Arc<RwLock<Arena>>);

impl SensorSource for SimRange {
    fn sample(&self) -> Option<f32> {
        self.0.read().ok().map(|arena| arena.range_reading())
    }
}

struct SimLight(Arc<RwLock<Arena>>);

impl SensorSource for SimLight {
    fn sample(&self) -> Option<f32> {
        self.0.read().ok().map(|arena| arena.light_raw())
    }
}

struct SimBumper {
    arena: Arc<RwLock<Arena>>,
    side: Side,
}

impl ContactSource for SimBumper {
    fn is_active(&self) -> bool {
        self.arena
            .read()
            .map(|arena| arena.bumper_pressed(self.side))
            .unwrap_or(false)
    }
}

impl SensorBus for SimBrick {
    fn range(&self, port: SensorPort) -> Arc<dyn SensorSource> {
        match self.device_on(port) {
            Some(Device::Ultrasonic) => Arc::new(SimRange(self.arena.clone())),
            other => {
                warn!("No ultrasonic sensor on {} (found {:?})", port, other);
                Arc::new(Unplugged)
            }
        }
    }

    fn light(&self, port: SensorPort) -> Arc<dyn SensorSource> {
        match self.device_on(port) {
            Some(Device::Light) => Arc::new(SimLight(self.arena.clone())),
            other => {
                warn!("No light sensor on {} (found {:?})", port, other);
                Arc::new(Unplugged)
            }
        }
    }

    fn contact(&self, port: SensorPort) -> Arc<dyn ContactSource> {
        match self.device_on(port) {
            Some(Device::Touch(side)) => Arc::new(SimBumper {
                arena: self.arena.clone(),
                side,
            }),
            other => {
                warn!("No touch sensor on {} (found {:?})", port, other);
                Arc::new(Unplugged)
            }
        }
    }
}

impl MotorBus for SimBrick {
    type Backend = SimDrive;

    fn connect(&self, left: MotorPort, right: MotorPort) -> SimDrive {
        let max_wheel_speed = self
            .arena
            .read()
            .map(|arena| arena.config.max_wheel_speed)
            .unwrap_or(0.0);
        SimDrive {
            arena: self.arena.clone(),
            left: (left, self.wheel_on(left)),
            right: (right, self.wheel_on(right)),
            stepping: self.stepping,
            max_wheel_speed,
        }
    }
}

/// Motor backend driving the arena's wheels
pub struct SimDrive {
    arena: Arc<RwLock<Arena>>,
    left: (MotorPort, Option<Wheel>),
    right: (MotorPort, Option<Wheel>),
    stepping: Stepping,
    max_wheel_speed: f32,
}

impl SimDrive {
    fn wheels(&self) -> DriveResult<(Wheel, Wheel)> {
        match (self.left, self.right) {
            ((_, Some(left)), (_, Some(right))) => Ok((left, right)),
            ((port, None), _) | (_, (port, None)) => Err(DriveError::Backend(format!(
                "no wheel connected to motor port {:?}",
                port
            ))),
        }
    }

    fn wait_for_motion(&self) -> DriveResult<()> {
        match self.stepping {
            Stepping::Threaded { poll } => loop {
                thread::sleep(poll);
                if !self.arena.read().map_err(poisoned)?.motion_pending() {
                    return Ok(());
                }
            },
            Stepping::Inline { dt } => {
                let mut arena = self.arena.write().map_err(poisoned)?;
                while arena.motion_pending() {
                    arena.step(dt);
                }
                Ok(())
            }
        }
    }
}

impl MotorBackend for SimDrive {
    fn rotate_wheels(
        &mut self,
        left_deg: f32,
        right_deg: f32,
        speed: f32,
        blocking: bool,
    ) -> DriveResult<()> {
        let (left, right) = self.wheels()?;
        if speed <= 0.0 && (left_deg != 0.0 || right_deg != 0.0) {
            return Err(DriveError::Backend(
                "cannot complete a rotation at zero speed".to_string(),
            ));
        }
        {
            let mut arena = self.arena.write().map_err(poisoned)?;
            arena.set_wheel(left, speed * left_deg.signum(), Some(left_deg.abs()));
            arena.set_wheel(right, speed * right_deg.signum(), Some(right_deg.abs()));
        }
        if blocking {
            self.wait_for_motion()?;
        }
        Ok(())
    }

    fn run_wheels(&mut self, left_speed: f32, right_speed: f32) -> DriveResult<()> {
        let (left, right) = self.wheels()?;
        let mut arena = self.arena.write().map_err(poisoned)?;
        arena.set_wheel(left, left_speed, None);
        arena.set_wheel(right, right_speed, None);
        Ok(())
    }

    fn stop(&mut self) -> DriveResult<()> {
        self.arena.write().map_err(poisoned)?.stop_wheels();
        Ok(())
    }

    fn max_wheel_speed(&self) -> f32 {
        self.max_wheel_speed
    }
}

/// Calibration prompt that moves the robot so its light sensor sits on the
/// requested surface.
pub struct ArenaPlacement {
    arena: Arc<RwLock<Arena>>,
}

impl ArenaPlacement {
    pub fn new(arena: Arc<RwLock<Arena>>) -> Self {
        Self { arena }
    }
}

impl PlacementPrompt for ArenaPlacement {
    fn await_placement(&mut self, step: CalibrationStep) -> Result<(), CalibrationError> {
        let mut arena = self
            .arena
            .write()
            .map_err(|e| CalibrationError::Aborted(e.to_string()))?;
        let offset = arena.config.light_offset_mm;
        let pose = match step {
            CalibrationStep::White => Pose::new(-offset, 0.0, 0.0),
            CalibrationStep::Black => Pose::new(arena.ring.border_center() - offset, 0.0, 0.0),
        };
        arena.place_robot(pose);
        info!("Light sensor placed on {}", step);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::config::ArenaConfig;
    use crate::sensors::calibration::{CalibrationProvider, GuidedCalibration};

    fn brick() -> (SimBrick, Arc<RwLock<Arena>>) {
        let arena = Arc::new(RwLock::new(Arena::new(ArenaConfig::default())));
        (
            SimBrick::new(arena.clone(), Stepping::Inline { dt: 0.01 }),
            arena,
        )
    }

    #[test]
    fn blocking_translation_completes_inline() {
        let (brick, arena) = brick();
        let mut drive = brick.connect(MotorPort::A, MotorPort::C);
        drive.rotate_wheels(360.0, 360.0, 360.0, true).unwrap();
        let arena = arena.read().unwrap();
        assert!(!arena.motion_pending());
        assert!((arena.robot.x - std::f32::consts::PI * 56.0).abs() < 0.01);
    }

    #[test]
    fn unwired_motor_port_is_a_backend_fault() {
        let (brick, _) = brick();
        let mut drive = brick.connect(MotorPort::A, MotorPort::B);
        assert!(matches!(
            drive.run_wheels(100.0, 100.0),
            Err(DriveError::Backend(_))
        ));
    }

    #[test]
    fn zero_speed_rotation_is_refused() {
        let (brick, _) = brick();
        let mut drive = brick.connect(MotorPort::A, MotorPort::C);
        assert!(drive.rotate_wheels(90.0, 90.0, 0.0, true).is_err());
    }

    #[test]
    fn wrong_device_on_port_reads_as_unplugged() {
        let (brick, _) = brick();
        assert_eq!(brick.range(SensorPort::S1).sample(), None);
        assert!(!brick.contact(SensorPort::S3).is_active());
        assert!(brick.light(SensorPort::S2).sample().is_some());
    }

    #[test]
    fn calibration_on_the_arena_separates_mat_and_border() {
        let (brick, arena) = brick();
        let light = brick.light(SensorPort::S2);
        let mut calibration = GuidedCalibration::new(light, ArenaPlacement::new(arena));
        let profile = calibration.calibrate().unwrap();
        assert!(profile.white_high > 500.0);
        assert!(profile.black_low < 320.0);
    }
}
