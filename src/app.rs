use chrono::{DateTime, Local};
use std::sync::{Arc, RwLock};

use crate::arena::Arena;
use crate::operator::{StartGate, StopSignal};
use crate::robot::config::HardwareBinding;
use crate::robot::controller::{ControllerStatus, SharedStatus};

pub struct App {
    pub arena: Arc<RwLock<Arena>>,
    pub status: SharedStatus,
    pub binding: HardwareBinding,
    pub started_at: DateTime<Local>,
    stop: StopSignal,
    gate: StartGate,
}

impl App {
    pub fn new(
        arena: Arc<RwLock<Arena>>,
        status: SharedStatus,
        binding: HardwareBinding,
        stop: StopSignal,
        gate: StartGate,
    ) -> Self {
        Self {
            arena,
            status,
            binding,
            started_at: Local::now(),
            stop,
            gate,
        }
    }

    /// Enter starts the bout the first time and stops it afterwards
    pub fn confirm(&mut self) {
        if self.waiting() {
            self.started_at = Local::now();
            self.gate.open();
            log::info!("Bout started.");
        } else {
            self.quit();
        }
    }

    pub fn waiting(&self) -> bool {
        !self.gate.is_open()
    }

    /// Operator pressed stop
    pub fn quit(&self) {
        log::info!("Operator stop requested.");
        self.stop.stop();
    }

    pub fn stopping(&self) -> bool {
        self.stop.is_stopped()
    }

    pub fn status_snapshot(&self) -> ControllerStatus {
        self.status
            .read()
            .map(|status| status.clone())
            .unwrap_or_default()
    }

    /// Run time as mm:ss
    pub fn uptime(&self) -> String {
        let elapsed = Local::now().signed_duration_since(self.started_at);
        format!(
            "{:02}:{:02}",
            elapsed.num_minutes(),
            elapsed.num_seconds() % 60
        )
    }
}
