//! Feature detectors.
//!
//! A detector samples one channel and turns a continuous signal into discrete
//! [`DetectionEvent`]s: one event each time its trigger condition goes from
//! false to true. Events go out through an mpsc channel so the controller can
//! consume them in its own cycle.

use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::source::{ContactSource, SensorSource};
use crate::communication::channels::{DetectionEvent, DetectorRole, Reading, Side};
use crate::robot::config::SensorPort;

/// Cloneable switch for a detector that may live on another thread
#[derive(Debug, Clone)]
pub struct DetectorHandle {
    role: DetectorRole,
    enabled: Arc<AtomicBool>,
}

impl DetectorHandle {
    fn new(role: DetectorRole) -> Self {
        Self {
            role,
            enabled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn enable(&self) {
        self.set_enabled(true);
    }

    pub fn disable(&self) {
        self.set_enabled(false);
    }

    pub fn set_enabled(&self, enabled: bool) {
        let was = self.enabled.swap(enabled, Ordering::AcqRel);
        if was != enabled {
            debug!(
                "Detector {}: {}",
                self.role,
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

enum Probe {
    Range {
        source: Arc<dyn SensorSource>,
        max_mm: f32,
    },
    Contact(Arc<dyn ContactSource>),
}

impl Probe {
    /// Reading to report if the trigger condition currently holds
    fn triggered(&self) -> Option<Reading> {
        match self {
            Probe::Range { source, max_mm } => match source.sample() {
                Some(distance) if distance >= 0.0 && distance <= *max_mm => {
                    Some(Reading::Range(distance))
                }
                Some(_) => None,
                None => {
                    debug!("Range detector: sensor unavailable");
                    None
                }
            },
            Probe::Contact(source) => source.is_active().then_some(Reading::Contact),
        }
    }
}

pub struct FeatureDetector {
    role: DetectorRole,
    port: SensorPort,
    probe: Probe,
    interval: Duration,
    handle: DetectorHandle,
    was_triggered: bool,
    sender: Sender<DetectionEvent>,
}

impl FeatureDetector {
    /// Fires when the measured distance is at most `max_mm`.
    pub fn range(
        port: SensorPort,
        source: Arc<dyn SensorSource>,
        max_mm: f32,
        interval: Duration,
        sender: Sender<DetectionEvent>,
    ) -> Self {
        Self::new(
            DetectorRole::Range,
            port,
            Probe::Range { source, max_mm },
            interval,
            sender,
        )
    }

    /// Fires when the contact becomes pressed.
    pub fn contact(
        side: Side,
        port: SensorPort,
        source: Arc<dyn ContactSource>,
        interval: Duration,
        sender: Sender<DetectionEvent>,
    ) -> Self {
        Self::new(
            DetectorRole::Contact(side),
            port,
            Probe::Contact(source),
            interval,
            sender,
        )
    }

    fn new(
        role: DetectorRole,
        port: SensorPort,
        probe: Probe,
        interval: Duration,
        sender: Sender<DetectionEvent>,
    ) -> Self {
        Self {
            role,
            port,
            probe,
            interval,
            handle: DetectorHandle::new(role),
            was_triggered: false,
            sender,
        }
    }

    pub fn handle(&self) -> DetectorHandle {
        self.handle.clone()
    }

    fn tick(&mut self) -> Option<DetectionEvent> {
        if !self.handle.is_enabled() {
            // Edge history restarts on the next enable
            self.was_triggered = false;
            return None;
        }

        let reading = self.probe.triggered();
        let rising = reading.is_some() && !self.was_triggered;
        self.was_triggered = reading.is_some();

        match (rising, reading) {
            (true, Some(reading)) => Some(DetectionEvent {
                source: self.role,
                port: self.port,
                reading,
            }),
            _ => None,
        }
    }

    /// Samples once and forwards an event on a rising edge.
    ///
    /// Returns false once the receiving side of the channel is gone.
    pub fn poll(&mut self) -> bool {
        if let Some(event) = self.tick() {
            debug!("Detector {}: {:?}", self.role, event.reading);
            if self.sender.send(event).is_err() {
                return false;
            }
        }
        true
    }

    pub fn spawn(mut self, running: Arc<AtomicBool>) -> JoinHandle<()> {
        thread::spawn(move || {
            info!(
                "Detector {} on {}: polling every {:?}",
                self.role, self.port, self.interval
            );
            while running.load(Ordering::Acquire) {
                if !self.poll() {
                    warn!("Detector {}: controller hung up, stopping.", self.role);
                    break;
                }
                thread::sleep(self.interval);
            }
            info!("Detector {}: stopped.", self.role);
        })
    }
}
