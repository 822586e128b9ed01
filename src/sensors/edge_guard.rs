use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::light::LightSensor;

/// Pending edge-avoidance request.
///
/// Raised by the edge guard, taken by the controller.
#[derive(Debug, Default)]
pub struct EdgeFlag {
    pending: AtomicBool,
}

impl EdgeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the flag was not already raised.
    pub fn raise(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Clears the flag, returning whether it was raised.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Watches the light channel for the dark ring border
pub struct EdgeGuard {
    light: LightSensor,
    threshold: f32,
    flag: Arc<EdgeFlag>,
    interval: Duration,
}

impl EdgeGuard {
    pub fn new(light: LightSensor, threshold: f32, flag: Arc<EdgeFlag>, interval: Duration) -> Self {
        Self {
            light,
            threshold,
            flag,
            interval,
        }
    }

    /// Samples once. Returns true when this sample raised the flag.
    pub fn poll(&self) -> bool {
        match self.light.light_value() {
            Some(value) if value < self.threshold => {
                let raised = self.flag.raise();
                if raised {
                    debug!("Edge guard: light {:.1} below {:.1}", value, self.threshold);
                }
                raised
            }
            Some(_) => false,
            None => {
                debug!("Edge guard: light sensor unavailable");
                false
            }
        }
    }

    pub fn spawn(self, running: Arc<AtomicBool>) -> JoinHandle<()> {
        thread::spawn(move || {
            info!("Edge guard: sampling every {:?}", self.interval);
            while running.load(Ordering::Acquire) {
                self.poll();
                thread::sleep(self.interval);
            }
            info!("Edge guard: stopped.");
        })
    }
}
