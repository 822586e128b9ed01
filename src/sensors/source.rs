use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::robot::config::SensorPort;

/// A channel that produces numeric readings.
///
/// `None` means the channel could not be sampled this time.
pub trait SensorSource: Send + Sync {
    fn sample(&self) -> Option<f32>;
}

/// A touch-style channel.
///
/// An unreachable contact reads as not pressed.
pub trait ContactSource: Send + Sync {
    fn is_active(&self) -> bool;
}

/// Resolves physical ports into sources for the role wired to them
pub trait SensorBus {
    fn range(&self, port: SensorPort) -> Arc<dyn SensorSource>;
    fn light(&self, port: SensorPort) -> Arc<dyn SensorSource>;
    fn contact(&self, port: SensorPort) -> Arc<dyn ContactSource>;
}

/// A source whose value is set by hand. Used for bench setups and tests.
#[derive(Debug, Default)]
pub struct ManualSource {
    value: RwLock<Option<f32>>,
}

impl ManualSource {
    pub fn new(value: Option<f32>) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    pub fn set(&self, value: Option<f32>) {
        if let Ok(mut guard) = self.value.write() {
            *guard = value;
        }
    }
}

impl SensorSource for ManualSource {
    fn sample(&self) -> Option<f32> {
        self.value.read().ok().and_then(|guard| *guard)
    }
}

/// A contact that is pressed and released by hand
#[derive(Debug, Default)]
pub struct ManualContact {
    pressed: AtomicBool,
}

impl ManualContact {
    pub fn new(pressed: bool) -> Self {
        Self {
            pressed: AtomicBool::new(pressed),
        }
    }

    pub fn press(&self) {
        self.pressed.store(true, Ordering::Release);
    }

    pub fn release(&self) {
        self.pressed.store(false, Ordering::Release);
    }
}

impl ContactSource for ManualContact {
    fn is_active(&self) -> bool {
        self.pressed.load(Ordering::Acquire)
    }
}
