pub mod brick;
pub mod config;
pub mod ring;
pub mod world;

pub use brick::{ArenaPlacement, SimBrick, SimDrive, Stepping};
pub use config::ArenaConfig;
pub use world::{Arena, Pose};

use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Advances the arena in real time on its own thread until `running` clears.
pub fn spawn_physics(
    arena: Arc<RwLock<Arena>>,
    running: Arc<AtomicBool>,
    tick: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        info!("Arena: physics running at {:?} per tick.", tick);
        while running.load(Ordering::Acquire) {
            match arena.write() {
                Ok(mut arena) => arena.step(tick.as_secs_f32()),
                Err(e) => {
                    error!("Arena: lock poisoned, stopping physics: {}", e);
                    break;
                }
            }
            thread::sleep(tick);
        }
        info!("Arena: physics stopped.");
    })
}
