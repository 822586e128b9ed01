use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::config::{BindingError, ControllerConfig, HardwareBinding};
use super::controller::{BehaviorController, Bumpers, ControllerError};
use crate::communication::channels::{create_channel, Side};
use crate::drive::{DifferentialPilot, MotorBackend, MotorBus, PilotGeometry};
use crate::sensors::calibration::CalibrationProfile;
use crate::sensors::detector::FeatureDetector;
use crate::sensors::edge_guard::{EdgeFlag, EdgeGuard};
use crate::sensors::light::LightSensor;
use crate::sensors::source::SensorBus;

/// A fully wired robot: controller plus the sensors feeding it.
///
/// Sensors can either be ticked from the control loop (`step`) or moved onto
/// their own threads (`spawn_sensors`).
pub struct Robot<B: MotorBackend> {
    pub controller: BehaviorController<B>,
    detectors: Vec<FeatureDetector>,
    edge_guard: EdgeGuard,
}

impl<B: MotorBackend> Robot<B> {
    pub fn assemble<S, H>(
        binding: &HardwareBinding,
        sensors: &S,
        motors: &H,
        geometry: PilotGeometry,
        profile: CalibrationProfile,
        config: ControllerConfig,
    ) -> Result<Self, BindingError>
    where
        S: SensorBus + ?Sized,
        H: MotorBus<Backend = B> + ?Sized,
    {
        binding.validate()?;
        let (sender, events) = create_channel();

        let bumpers = Bumpers {
            left: sensors.contact(binding.left_bumper),
            right: sensors.contact(binding.right_bumper),
        };
        let detectors = vec![
            FeatureDetector::range(
                binding.range,
                sensors.range(binding.range),
                config.range_trigger_mm,
                config.range_poll_interval,
                sender.clone(),
            ),
            FeatureDetector::contact(
                Side::Left,
                binding.left_bumper,
                bumpers.left.clone(),
                config.contact_poll_interval,
                sender.clone(),
            ),
            FeatureDetector::contact(
                Side::Right,
                binding.right_bumper,
                bumpers.right.clone(),
                config.contact_poll_interval,
                sender,
            ),
        ];

        let edge = Arc::new(EdgeFlag::new());
        let edge_guard = EdgeGuard::new(
            LightSensor::new(sensors.light(binding.light), profile),
            config.edge_dark_threshold,
            edge.clone(),
            config.edge_poll_interval,
        );

        let pilot = DifferentialPilot::new(
            motors.connect(binding.left_motor, binding.right_motor),
            geometry,
        );
        let handles = detectors.iter().map(FeatureDetector::handle).collect();
        let controller = BehaviorController::new(pilot, events, edge, bumpers, config)
            .with_detectors(handles);

        info!(
            "Robot assembled: bumpers {}/{}, range {}, light {}, motors {:?}/{:?}",
            binding.left_bumper,
            binding.right_bumper,
            binding.range,
            binding.light,
            binding.left_motor,
            binding.right_motor
        );

        Ok(Self {
            controller,
            detectors,
            edge_guard,
        })
    }

    /// Ticks every detector and the edge guard once.
    pub fn poll_sensors(&mut self) {
        for detector in &mut self.detectors {
            detector.poll();
        }
        self.edge_guard.poll();
    }

    /// One cooperative cycle: sample everything, then run the controller.
    pub fn step(&mut self) -> Result<(), ControllerError> {
        self.poll_sensors();
        self.controller.step()
    }

    /// Moves every sensor onto its own thread and hands back the controller.
    pub fn spawn_sensors(self) -> (BehaviorController<B>, SensorThreads) {
        let running = Arc::new(AtomicBool::new(true));
        let mut handles: Vec<JoinHandle<()>> = self
            .detectors
            .into_iter()
            .map(|detector| detector.spawn(running.clone()))
            .collect();
        handles.push(self.edge_guard.spawn(running.clone()));
        (self.controller, SensorThreads { running, handles })
    }
}

pub struct SensorThreads {
    running: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl SensorThreads {
    pub fn stop(self) {
        self.running.store(false, Ordering::Release);
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}
