//! The behavior controller.
//!
//! Once per cycle the controller applies every detection event that has
//! arrived, services a pending edge flag, and otherwise issues the drive
//! command of its current state:
//!
//! | State       | Action                                   | Leaves when                    |
//! |-------------|------------------------------------------|--------------------------------|
//! | `Searching` | spin left at 60 deg/s                    | range event -> `Found`         |
//! | `Found`     | blocking -8 deg correction               | always -> `Seeking`            |
//! | `Seeking`   | forward at maximum speed                 | contact event -> `Pushing`     |
//! | `Pushing`   | forward at half speed while a bumper is pressed | no bumper pressed -> `Searching` |
//!
//! A contact event forces `Pushing` from any state. An edge flag pre-empts
//! all of the above: back off, turn, and start searching again. The flag is
//! cleared only once that maneuver has finished.

use log::{debug, error, info};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, RwLock};
use std::thread;
use thiserror::Error;

use super::config::ControllerConfig;
use super::state::BehavioralState;
use crate::communication::channels::{DetectionEvent, DetectorRole, Reading};
use crate::drive::{DifferentialPilot, Direction, DriveCommand, DriveError, MotorBackend};
use crate::feedback::{FeedbackSink, LogFeedback};
use crate::operator::OperatorControl;
use crate::sensors::detector::DetectorHandle;
use crate::sensors::edge_guard::EdgeFlag;
use crate::sensors::source::ContactSource;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("drive command failed: {0}")]
    Drive(#[from] DriveError),
}

/// Snapshot of the controller published for display
#[derive(Debug, Clone, Default)]
pub struct ControllerStatus {
    pub state: BehavioralState,
    pub cycles: u64,
    pub last_range_mm: Option<f32>,
    pub edge_recoveries: u64,
    pub last_command: Option<DriveCommand>,
    pub running: bool,
}

pub type SharedStatus = Arc<RwLock<ControllerStatus>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub edge_recoveries: u64,
}

/// The two bumper channels, polled directly while pushing
#[derive(Clone)]
pub struct Bumpers {
    pub left: Arc<dyn ContactSource>,
    pub right: Arc<dyn ContactSource>,
}

impl Bumpers {
    pub fn any_pressed(&self) -> bool {
        self.left.is_active() || self.right.is_active()
    }
}

pub struct BehaviorController<B: MotorBackend> {
    state: BehavioralState,
    pilot: DifferentialPilot<B>,
    events: Receiver<DetectionEvent>,
    edge: Arc<EdgeFlag>,
    bumpers: Bumpers,
    detectors: Vec<DetectorHandle>,
    feedback: Box<dyn FeedbackSink>,
    config: ControllerConfig,
    status: SharedStatus,
    cycles: u64,
    edge_recoveries: u64,
    last_range_mm: Option<f32>,
}

impl<B: MotorBackend> BehaviorController<B> {
    pub fn new(
        pilot: DifferentialPilot<B>,
        events: Receiver<DetectionEvent>,
        edge: Arc<EdgeFlag>,
        bumpers: Bumpers,
        config: ControllerConfig,
    ) -> Self {
        Self {
            state: BehavioralState::Searching,
            pilot,
            events,
            edge,
            bumpers,
            detectors: Vec::new(),
            feedback: Box::new(LogFeedback),
            config,
            status: SharedStatus::default(),
            cycles: 0,
            edge_recoveries: 0,
            last_range_mm: None,
        }
    }

    /// Detectors enabled on `start` and disabled on `shutdown`
    pub fn with_detectors(mut self, detectors: Vec<DetectorHandle>) -> Self {
        self.detectors = detectors;
        self
    }

    pub fn with_feedback(mut self, feedback: Box<dyn FeedbackSink>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_status(mut self, status: SharedStatus) -> Self {
        self.status = status;
        self
    }

    pub fn state(&self) -> BehavioralState {
        self.state
    }

    pub fn pilot(&self) -> &DifferentialPilot<B> {
        &self.pilot
    }

    pub fn pilot_mut(&mut self) -> &mut DifferentialPilot<B> {
        &mut self.pilot
    }

    pub fn status(&self) -> SharedStatus {
        self.status.clone()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            cycles: self.cycles,
            edge_recoveries: self.edge_recoveries,
        }
    }

    /// Resets the run state and arms every detector.
    pub fn start(&mut self) {
        self.state = BehavioralState::Searching;
        self.edge.take();
        let stale = self.events.try_iter().count();
        if stale > 0 {
            debug!("Controller: discarded {} stale events", stale);
        }
        for detector in &self.detectors {
            detector.enable();
        }
        info!("Controller: run started.");
        info!("{}...", self.state);
        self.publish(true);
    }

    /// Cycles until the operator says stop, then shuts down.
    pub fn run(&mut self, operator: &dyn OperatorControl) -> Result<RunSummary, ControllerError> {
        self.start();
        let outcome = self.cycle_until_stopped(operator);
        if let Err(e) = &outcome {
            error!("Controller: aborting run: {}", e);
        }
        let stopped = self.shutdown();
        outcome?;
        stopped?;
        Ok(self.summary())
    }

    fn cycle_until_stopped(&mut self, operator: &dyn OperatorControl) -> Result<(), ControllerError> {
        while operator.should_continue() {
            self.step()?;
            if !self.config.cycle_interval.is_zero() {
                thread::sleep(self.config.cycle_interval);
            }
        }
        Ok(())
    }

    /// Disarms every detector and stops the motors.
    pub fn shutdown(&mut self) -> Result<(), ControllerError> {
        for detector in &self.detectors {
            detector.disable();
        }
        let stopped = self.pilot.stop();
        self.publish(false);
        info!(
            "Controller: stopped after {} cycles, {} edge recoveries.",
            self.cycles, self.edge_recoveries
        );
        stopped.map_err(ControllerError::from)
    }

    /// Runs one control cycle.
    pub fn step(&mut self) -> Result<(), ControllerError> {
        self.cycles += 1;

        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }

        if self.edge.is_raised() {
            self.avoid_edge()?;
            // Sightings of the same border during the maneuver are spent
            self.edge.take();
        } else {
            self.act()?;
        }

        self.publish(true);
        Ok(())
    }

    /// Applies one detection event to the behavioral state.
    pub fn handle_event(&mut self, event: DetectionEvent) {
        match event.source {
            DetectorRole::Range => {
                if let Reading::Range(range_mm) = event.reading {
                    self.last_range_mm = Some(range_mm);
                    self.feedback.range_detected(range_mm);
                }
                if self.state == BehavioralState::Searching {
                    self.transition(BehavioralState::Found);
                }
            }
            DetectorRole::Contact(_) => {
                debug!("Controller: {} pressed on {}", event.source, event.port);
                self.transition(BehavioralState::Pushing);
            }
        }
    }

    fn avoid_edge(&mut self) -> Result<(), ControllerError> {
        info!("Avoiding edge...");
        self.pilot.translate_by(self.config.edge_backoff_mm, true)?;
        self.pilot.rotate_by(self.config.edge_turn_deg, true)?;
        self.edge_recoveries += 1;
        self.transition(BehavioralState::Searching);
        Ok(())
    }

    fn act(&mut self) -> Result<(), ControllerError> {
        match self.state {
            BehavioralState::Searching => {
                self.pilot.set_rotate_speed(self.config.search_rotate_speed)?;
                let speed = self.pilot.rotate_speed();
                self.pilot.rotate_in_place(Direction::Left, speed)?;
            }
            BehavioralState::Found => {
                self.pilot.rotate_by(self.config.found_correction_deg, true)?;
                self.transition(BehavioralState::Seeking);
            }
            BehavioralState::Seeking => {
                let max = self.pilot.max_travel_speed();
                self.pilot.set_travel_speed(max)?;
                self.pilot.forward()?;
            }
            BehavioralState::Pushing => {
                let half = self.pilot.max_travel_speed() / 2.0;
                self.pilot.set_travel_speed(half)?;
                if self.bumpers.any_pressed() {
                    debug!("Pushing...");
                    self.pilot.forward()?;
                } else {
                    self.transition(BehavioralState::Searching);
                }
            }
        }
        Ok(())
    }

    fn transition(&mut self, to: BehavioralState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        self.feedback.state_changed(from, to);
        info!("{}...", to);
    }

    fn publish(&self, running: bool) {
        match self.status.write() {
            Ok(mut status) => {
                status.state = self.state;
                status.cycles = self.cycles;
                status.last_range_mm = self.last_range_mm;
                status.edge_recoveries = self.edge_recoveries;
                status.last_command = self.pilot.current_command();
                status.running = running;
            }
            Err(e) => error!("Controller: status lock poisoned: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::channels::{create_channel, Side};
    use crate::drive::backend::{RecordingBackend, WheelCommand};
    use crate::drive::PilotGeometry;
    use crate::operator::CycleLimit;
    use crate::robot::config::SensorPort;
    use crate::sensors::detector::FeatureDetector;
    use crate::sensors::source::{ManualContact, ManualSource};
    use std::sync::mpsc::Sender;
    use std::time::Duration;

    struct Rig {
        controller: BehaviorController<RecordingBackend>,
        tx: Sender<DetectionEvent>,
        edge: Arc<EdgeFlag>,
        left: Arc<ManualContact>,
        right: Arc<ManualContact>,
    }

    fn rig() -> Rig {
        let (tx, rx) = create_channel();
        let edge = Arc::new(EdgeFlag::new());
        let left = Arc::new(ManualContact::new(false));
        let right = Arc::new(ManualContact::new(false));
        let pilot = DifferentialPilot::new(RecordingBackend::new(720.0), PilotGeometry::default());
        let config = ControllerConfig {
            cycle_interval: Duration::ZERO,
            ..ControllerConfig::default()
        };
        let controller = BehaviorController::new(
            pilot,
            rx,
            edge.clone(),
            Bumpers {
                left: left.clone(),
                right: right.clone(),
            },
            config,
        );
        Rig {
            controller,
            tx,
            edge,
            left,
            right,
        }
    }

    fn range(mm: f32) -> DetectionEvent {
        DetectionEvent::range(SensorPort::S3, mm)
    }

    fn left_contact() -> DetectionEvent {
        DetectionEvent::contact(Side::Left, SensorPort::S1)
    }

    impl Rig {
        fn commands(&mut self) -> Vec<WheelCommand> {
            self.controller.pilot_mut().backend_mut().take_commands()
        }

        fn into_seeking(&mut self) {
            self.controller.handle_event(range(40.0));
            self.controller.step().unwrap();
            assert_eq!(self.controller.state(), BehavioralState::Seeking);
            self.commands();
        }
    }

    #[test]
    fn searching_spins_left_at_search_speed() {
        let mut rig = rig();
        rig.controller.step().unwrap();
        assert_eq!(rig.controller.state(), BehavioralState::Searching);
        assert_eq!(
            rig.controller.pilot().current_command(),
            Some(DriveCommand::RotateInPlace {
                direction: Direction::Left,
                speed: 60.0
            })
        );
    }

    #[test]
    fn range_event_finds_then_seeks() {
        let mut rig = rig();
        rig.controller.handle_event(range(40.0));
        assert_eq!(rig.controller.state(), BehavioralState::Found);

        rig.controller.step().unwrap();
        assert_eq!(rig.controller.state(), BehavioralState::Seeking);
        assert_eq!(
            rig.controller.pilot().current_command(),
            Some(DriveCommand::RotateBy {
                angle: -8.0,
                blocking: true
            })
        );

        rig.controller.step().unwrap();
        assert_eq!(rig.controller.state(), BehavioralState::Seeking);
        assert_eq!(
            rig.controller.pilot().current_command(),
            Some(DriveCommand::MoveForward {
                speed: rig.controller.pilot().max_travel_speed()
            })
        );
    }

    #[test]
    fn range_event_is_ignored_unless_searching() {
        let mut rig = rig();
        rig.controller.handle_event(range(40.0));
        rig.controller.handle_event(range(30.0));
        assert_eq!(rig.controller.state(), BehavioralState::Found);

        rig.controller.step().unwrap();
        rig.controller.handle_event(range(20.0));
        assert_eq!(rig.controller.state(), BehavioralState::Seeking);

        rig.controller.handle_event(left_contact());
        rig.controller.handle_event(range(20.0));
        assert_eq!(rig.controller.state(), BehavioralState::Pushing);
    }

    #[test]
    fn contact_forces_pushing_from_any_state() {
        let mut rig = rig();
        rig.controller.handle_event(left_contact());
        assert_eq!(rig.controller.state(), BehavioralState::Pushing);

        let mut rig = self::rig();
        rig.controller.handle_event(range(40.0));
        rig.controller
            .handle_event(DetectionEvent::contact(Side::Right, SensorPort::S4));
        assert_eq!(rig.controller.state(), BehavioralState::Pushing);

        let mut rig = self::rig();
        rig.into_seeking();
        rig.controller.handle_event(left_contact());
        assert_eq!(rig.controller.state(), BehavioralState::Pushing);
    }

    #[test]
    fn pushing_continues_at_half_speed_while_bumper_pressed() {
        let mut rig = rig();
        rig.into_seeking();

        rig.left.press();
        rig.tx.send(left_contact()).unwrap();
        for _ in 0..3 {
            rig.controller.step().unwrap();
            assert_eq!(rig.controller.state(), BehavioralState::Pushing);
            assert_eq!(
                rig.controller.pilot().current_command(),
                Some(DriveCommand::MoveForward {
                    speed: rig.controller.pilot().max_travel_speed() / 2.0
                })
            );
        }
        assert_eq!(rig.commands().len(), 3);
    }

    #[test]
    fn pushing_returns_to_searching_once_bumpers_release() {
        let mut rig = rig();
        rig.right.press();
        rig.controller.handle_event(left_contact());
        rig.controller.step().unwrap();
        assert_eq!(rig.controller.state(), BehavioralState::Pushing);

        rig.right.release();
        rig.commands();
        rig.controller.step().unwrap();
        assert_eq!(rig.controller.state(), BehavioralState::Searching);
        assert!(rig.commands().is_empty());

        rig.controller.step().unwrap();
        assert!(matches!(
            rig.controller.pilot().current_command(),
            Some(DriveCommand::RotateInPlace { .. })
        ));
    }

    #[test]
    fn edge_flag_preempts_pushing_regardless_of_bumpers() {
        let mut rig = rig();
        rig.left.press();
        rig.controller.handle_event(left_contact());
        rig.controller.step().unwrap();
        rig.commands();

        rig.edge.raise();
        rig.controller.step().unwrap();

        let commands = rig.commands();
        assert_eq!(commands.len(), 2);
        assert!(matches!(
            commands[0],
            WheelCommand::Rotate { left_deg, right_deg, blocking: true, .. }
                if left_deg < 0.0 && left_deg == right_deg
        ));
        assert!(matches!(
            commands[1],
            WheelCommand::Rotate { left_deg, right_deg, blocking: true, .. }
                if left_deg < 0.0 && right_deg > 0.0
        ));
        assert_eq!(
            rig.controller.pilot().current_command(),
            Some(DriveCommand::RotateBy {
                angle: 120.0,
                blocking: true
            })
        );
        assert_eq!(rig.controller.state(), BehavioralState::Searching);
        assert!(!rig.edge.is_raised());
        assert_eq!(rig.controller.summary().edge_recoveries, 1);
    }

    /// Backend whose blocking moves happen while the border is still seen
    struct BorderBackend {
        inner: RecordingBackend,
        edge: Arc<EdgeFlag>,
    }

    impl MotorBackend for BorderBackend {
        fn rotate_wheels(
            &mut self,
            left_deg: f32,
            right_deg: f32,
            speed: f32,
            blocking: bool,
        ) -> Result<(), DriveError> {
            if blocking {
                self.edge.raise();
            }
            self.inner.rotate_wheels(left_deg, right_deg, speed, blocking)
        }

        fn run_wheels(&mut self, left_speed: f32, right_speed: f32) -> Result<(), DriveError> {
            self.inner.run_wheels(left_speed, right_speed)
        }

        fn stop(&mut self) -> Result<(), DriveError> {
            self.inner.stop()
        }

        fn max_wheel_speed(&self) -> f32 {
            self.inner.max_wheel_speed()
        }
    }

    #[test]
    fn edge_seen_again_during_recovery_is_serviced_once() {
        let (_tx, rx) = create_channel();
        let edge = Arc::new(EdgeFlag::new());
        let backend = BorderBackend {
            inner: RecordingBackend::new(720.0),
            edge: edge.clone(),
        };
        let mut controller = BehaviorController::new(
            DifferentialPilot::new(backend, PilotGeometry::default()),
            rx,
            edge.clone(),
            Bumpers {
                left: Arc::new(ManualContact::new(false)),
                right: Arc::new(ManualContact::new(false)),
            },
            ControllerConfig {
                cycle_interval: Duration::ZERO,
                ..ControllerConfig::default()
            },
        );

        edge.raise();
        controller.step().unwrap();
        assert!(!edge.is_raised());
        assert_eq!(controller.summary().edge_recoveries, 1);

        controller.step().unwrap();
        assert_eq!(controller.summary().edge_recoveries, 1);
        assert!(matches!(
            controller.pilot().current_command(),
            Some(DriveCommand::RotateInPlace { .. })
        ));
        assert_eq!(controller.pilot().backend().inner.commands.len(), 3);
    }

    #[test]
    fn edge_flag_stays_raised_when_recovery_fails() {
        let mut rig = rig();
        rig.controller.pilot_mut().backend_mut().fail_with("stalled");
        rig.edge.raise();
        assert!(rig.controller.step().is_err());
        assert!(rig.edge.is_raised());
        assert_eq!(rig.controller.summary().edge_recoveries, 0);
    }

    #[test]
    fn edge_flag_wins_over_queued_range_event() {
        let mut rig = rig();
        rig.tx.send(range(50.0)).unwrap();
        rig.edge.raise();
        rig.controller.step().unwrap();

        assert_eq!(rig.controller.state(), BehavioralState::Searching);
        assert_eq!(rig.commands().len(), 2);
    }

    #[test]
    fn contact_after_recovery_forces_pushing() {
        let mut rig = rig();
        rig.left.press();
        rig.edge.raise();
        rig.controller.step().unwrap();
        assert_eq!(rig.controller.state(), BehavioralState::Searching);

        rig.tx.send(left_contact()).unwrap();
        rig.controller.step().unwrap();
        assert_eq!(rig.controller.state(), BehavioralState::Pushing);
    }

    #[test]
    fn run_arms_detectors_and_shuts_down_cleanly() {
        let (tx, _rx) = create_channel();
        let detector = FeatureDetector::range(
            SensorPort::S3,
            Arc::new(ManualSource::new(None)),
            80.0,
            Duration::from_millis(500),
            tx,
        );
        let handle = detector.handle();

        let rig = rig();
        let mut controller = rig.controller.with_detectors(vec![handle.clone()]);
        let summary = controller.run(&CycleLimit::new(3)).unwrap();

        assert_eq!(summary.cycles, 3);
        assert!(!handle.is_enabled());
        assert_eq!(controller.pilot().current_command(), Some(DriveCommand::Stop));

        let status = controller.status();
        let status = status.read().unwrap();
        assert_eq!(status.cycles, 3);
        assert!(!status.running);
    }

    #[derive(Default)]
    struct Heard {
        ranges: Vec<f32>,
        changes: Vec<(BehavioralState, BehavioralState)>,
    }

    struct SharedSink(Arc<RwLock<Heard>>);

    impl FeedbackSink for SharedSink {
        fn range_detected(&mut self, range_mm: f32) {
            self.0.write().unwrap().ranges.push(range_mm);
        }

        fn state_changed(&mut self, from: BehavioralState, to: BehavioralState) {
            self.0.write().unwrap().changes.push((from, to));
        }
    }

    #[test]
    fn feedback_hears_ranges_and_transitions() {
        let heard = Arc::new(RwLock::new(Heard::default()));
        let status = SharedStatus::default();
        let rig = rig();
        let mut controller = rig
            .controller
            .with_feedback(Box::new(SharedSink(heard.clone())))
            .with_status(status.clone());

        rig.tx.send(range(42.0)).unwrap();
        controller.step().unwrap();

        let heard = heard.read().unwrap();
        assert_eq!(heard.ranges, vec![42.0]);
        assert_eq!(
            heard.changes,
            vec![
                (BehavioralState::Searching, BehavioralState::Found),
                (BehavioralState::Found, BehavioralState::Seeking),
            ]
        );
        let status = status.read().unwrap();
        assert_eq!(status.state, BehavioralState::Seeking);
        assert_eq!(status.last_range_mm, Some(42.0));
    }

    #[test]
    fn backend_fault_aborts_run() {
        let mut rig = rig();
        rig.controller.pilot_mut().backend_mut().fail_with("encoder lost");
        let err = rig.controller.run(&CycleLimit::new(5)).unwrap_err();
        assert!(matches!(err, ControllerError::Drive(DriveError::Backend(_))));
        assert_eq!(rig.controller.summary().cycles, 1);
    }
}
