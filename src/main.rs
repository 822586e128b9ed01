use sumo_bot::{
    app::App,
    arena::{self, config::PHYSICS_TICK, Arena, ArenaConfig, ArenaPlacement, Pose, SimBrick, Stepping},
    drive::PilotGeometry,
    logging,
    operator::{StartGate, StopSignal},
    robot::{config::ControllerConfig, config::HardwareBinding, Robot},
    sensors::{source::SensorBus, CalibrationProvider, GuidedCalibration},
    terminal::TerminalManager,
    ui::arena_renderer::render_app,
};

use color_eyre::{eyre::eyre, Result};
use crossterm::event::{self, Event, KeyCode};
use ratatui::{prelude::Backend, Terminal};
use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
    sync::{Arc, RwLock},
    thread::{self, JoinHandle},
    time::Duration,
};

fn main() -> Result<()> {
    color_eyre::install()?;
    logging::setup_logging()?;

    log::info!("Sumo bot starting...");

    let arena = Arc::new(RwLock::new(Arena::new(ArenaConfig {
        range_noise_mm: 5.0,
        opponent_wander_mm_s: 30.0,
        respawn_opponent: true,
        ..ArenaConfig::default()
    })));
    let brick = SimBrick::new(arena.clone(), Stepping::Threaded { poll: PHYSICS_TICK });
    let binding = HardwareBinding::default();

    let profile = GuidedCalibration::new(
        brick.light(binding.light),
        ArenaPlacement::new(arena.clone()),
    )
    .calibrate()?;

    {
        let mut arena = arena.write().map_err(|e| eyre!("arena lock poisoned: {}", e))?;
        arena.place_robot(Pose::new(0.0, 0.0, 90.0));
        arena.respawn_opponent();
    }

    let robot = Robot::assemble(
        &binding,
        &brick,
        &brick,
        PilotGeometry::default(),
        profile,
        ControllerConfig::default(),
    )?;

    let physics_running = Arc::new(AtomicBool::new(true));
    let physics = arena::spawn_physics(arena.clone(), physics_running.clone(), PHYSICS_TICK);
    let (mut controller, sensors) = robot.spawn_sensors();

    let stop = StopSignal::new();
    let gate = StartGate::new();
    let mut app = App::new(
        arena,
        controller.status(),
        binding,
        stop.clone(),
        gate.clone(),
    );

    log::info!("Press enter to start");
    let run_stop = stop.clone();
    let control = thread::spawn(move || {
        if !gate.wait(&run_stop, PHYSICS_TICK) {
            return Ok(None);
        }
        controller.run(&run_stop).map(Some)
    });

    let ui_result = match TerminalManager::new() {
        Ok(mut terminal_manager) => {
            run_app(&mut app, terminal_manager.get_terminal(), &control)
        }
        Err(e) => Err(e.into()),
    };

    // Everything is joined before any error is reported
    stop.stop();
    let outcome = control.join();
    sensors.stop();
    physics_running.store(false, Ordering::Release);
    let _ = physics.join();

    match outcome.map_err(|_| eyre!("controller thread panicked"))?? {
        Some(summary) => log::info!(
            "Bout over after {} cycles with {} edge recoveries.",
            summary.cycles,
            summary.edge_recoveries
        ),
        None => log::info!("Left before the bout started."),
    }
    ui_result
}

fn run_app<B: Backend, T>(
    app: &mut App,
    terminal: &mut Terminal<B>,
    control: &JoinHandle<T>,
) -> Result<()> {
    let frame_rate = Duration::from_millis(50);

    loop {
        terminal.draw(|frame| {
            render_app(frame, frame.area(), app);
        })?;

        match read_key(frame_rate)? {
            Some(KeyCode::Enter) => app.confirm(),
            Some(KeyCode::Char('q')) | Some(KeyCode::Esc) => app.quit(),
            _ => {}
        }
        if app.stopping() || control.is_finished() {
            break;
        }
    }
    Ok(())
}

fn read_key(timeout: Duration) -> io::Result<Option<KeyCode>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    if let Event::Key(key) = event::read()? {
        return Ok(Some(key.code));
    }
    Ok(None)
}
