use std::sync::{Arc, RwLock};
use std::time::Duration;

use sumo_bot::arena::config::{Device, Wiring};
use sumo_bot::arena::{Arena, ArenaConfig, ArenaPlacement, Pose, SimBrick, SimDrive, Stepping};
use sumo_bot::communication::channels::Side;
use sumo_bot::drive::PilotGeometry;
use sumo_bot::robot::config::{
    BindingError, ControllerConfig, HardwareBinding, MotorPort, SensorPort,
};
use sumo_bot::robot::{BehavioralState, ControllerError, Robot};
use sumo_bot::sensors::source::SensorBus;
use sumo_bot::sensors::{CalibrationProfile, CalibrationProvider, GuidedCalibration};

const DT: f32 = 0.02;

struct Bout {
    arena: Arc<RwLock<Arena>>,
    robot: Robot<SimDrive>,
}

fn calibrate(brick: &SimBrick, arena: &Arc<RwLock<Arena>>) -> CalibrationProfile {
    GuidedCalibration::new(
        brick.light(SensorPort::S2),
        ArenaPlacement::new(arena.clone()),
    )
    .calibrate()
    .unwrap()
}

fn try_bout(
    config: ArenaConfig,
    binding: HardwareBinding,
) -> (Arc<RwLock<Arena>>, Result<Robot<SimDrive>, BindingError>) {
    let arena = Arc::new(RwLock::new(Arena::new(config)));
    let brick = SimBrick::new(arena.clone(), Stepping::Inline { dt: 0.01 });
    let profile = calibrate(&brick, &arena);
    let controller_config = ControllerConfig {
        cycle_interval: Duration::ZERO,
        ..ControllerConfig::default()
    };
    let robot = Robot::assemble(
        &binding,
        &brick,
        &brick,
        PilotGeometry::default(),
        profile,
        controller_config,
    );
    (arena, robot)
}

fn bout(config: ArenaConfig, robot_at: Pose, opponent_at: (f32, f32)) -> Bout {
    let (arena, robot) = try_bout(config, HardwareBinding::default());
    {
        let mut arena = arena.write().unwrap();
        arena.place_robot(robot_at);
        arena.place_opponent(opponent_at.0, opponent_at.1);
    }
    let mut robot = robot.unwrap();
    robot.controller.start();
    Bout { arena, robot }
}

impl Bout {
    /// One control cycle followed by one cycle's worth of physics
    fn cycle(&mut self) -> BehavioralState {
        self.robot.step().unwrap();
        self.arena.write().unwrap().step(DT);
        self.robot.controller.state()
    }

    fn robot_pose(&self) -> Pose {
        self.arena.read().unwrap().robot
    }
}

#[test]
fn calibration_places_white_above_black() {
    let arena = Arc::new(RwLock::new(Arena::new(ArenaConfig::default())));
    let brick = SimBrick::new(arena.clone(), Stepping::Inline { dt: 0.01 });
    let profile = calibrate(&brick, &arena);
    assert!(profile.white_high > profile.black_low);
    assert!(profile.scale(profile.white_high) > 95.0);
    assert!(profile.scale(profile.black_low) < 5.0);
}

#[test]
fn opponent_ahead_is_found_seeked_and_pushed() {
    // 40 mm between the robot's nose and the opponent's surface
    let mut bout = bout(ArenaConfig::default(), Pose::new(0.0, 0.0, 0.0), (190.0, 0.0));

    let mut seen = Vec::new();
    for _ in 0..40 {
        let state = bout.cycle();
        if seen.last() != Some(&state) {
            seen.push(state);
        }
    }

    assert_eq!(seen.first(), Some(&BehavioralState::Seeking));
    assert!(seen.contains(&BehavioralState::Pushing));
    let arena = bout.arena.read().unwrap();
    assert!(arena.opponent.distance_to(0.0, 0.0) > 190.0);
    assert_eq!(bout.robot.controller.summary().edge_recoveries, 0);
}

#[test]
fn border_under_light_sensor_triggers_recovery() {
    let config = ArenaConfig::default();
    let start_x = config.ring_radius_mm - config.border_width_mm / 2.0 - config.light_offset_mm;
    let mut bout = bout(config, Pose::new(start_x, 0.0, 0.0), (-250.0, 200.0));

    assert_eq!(bout.cycle(), BehavioralState::Searching);
    assert_eq!(bout.robot.controller.summary().edge_recoveries, 1);

    let pose = bout.robot_pose();
    assert!(pose.x < start_x - 90.0);
    assert!(pose.heading.to_degrees() > 100.0);

    let ring_radius = bout.arena.read().unwrap().ring.radius;
    for _ in 0..100 {
        bout.cycle();
        assert!(bout.robot_pose().distance_to(0.0, 0.0) < ring_radius);
    }
}

#[test]
fn shared_port_binding_is_rejected() {
    let binding = HardwareBinding {
        range: SensorPort::S1,
        ..HardwareBinding::default()
    };
    let (_, robot) = try_bout(ArenaConfig::default(), binding);
    assert!(matches!(
        robot,
        Err(BindingError::SharedSensorPort(SensorPort::S1))
    ));
}

#[test]
fn missing_range_sensor_keeps_searching() {
    let config = ArenaConfig {
        wiring: Wiring {
            devices: vec![
                (SensorPort::S1, Device::Touch(Side::Left)),
                (SensorPort::S2, Device::Light),
                (SensorPort::S4, Device::Touch(Side::Right)),
            ],
            ..Wiring::default()
        },
        ..ArenaConfig::default()
    };
    let mut bout = bout(config, Pose::new(0.0, 0.0, 0.0), (250.0, 0.0));

    for _ in 0..50 {
        assert_eq!(bout.cycle(), BehavioralState::Searching);
    }
    assert!(bout.robot.controller.status().read().unwrap().last_range_mm.is_none());
}

#[test]
fn unwired_motor_port_aborts_the_cycle() {
    let binding = HardwareBinding {
        left_motor: MotorPort::B,
        ..HardwareBinding::default()
    };
    let (_, robot) = try_bout(ArenaConfig::default(), binding);
    let mut robot = robot.unwrap();
    robot.controller.start();
    assert!(matches!(robot.step(), Err(ControllerError::Drive(_))));
}
