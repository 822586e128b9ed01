use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// The operator's continue/stop signal, polled once per control cycle.
pub trait OperatorControl {
    fn should_continue(&self) -> bool;
}

/// Stop signal shared between the operator input and the controller thread
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl OperatorControl for StopSignal {
    fn should_continue(&self) -> bool {
        !self.is_stopped()
    }
}

/// Holds a bout back until the operator says go.
#[derive(Debug, Clone, Default)]
pub struct StartGate {
    opened: Arc<AtomicBool>,
}

impl StartGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        self.opened.store(true, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Blocks until the gate opens. Returns false if `stop` fires first.
    pub fn wait(&self, stop: &StopSignal, poll: Duration) -> bool {
        loop {
            if stop.is_stopped() {
                return false;
            }
            if self.is_open() {
                return true;
            }
            thread::sleep(poll);
        }
    }
}

/// Lets a run go for a fixed number of cycles. Used for unattended runs.
#[derive(Debug)]
pub struct CycleLimit {
    remaining: std::cell::Cell<u64>,
}

impl CycleLimit {
    pub fn new(cycles: u64) -> Self {
        Self {
            remaining: std::cell::Cell::new(cycles),
        }
    }
}

impl OperatorControl for CycleLimit {
    fn should_continue(&self) -> bool {
        let left = self.remaining.get();
        if left == 0 {
            return false;
        }
        self.remaining.set(left - 1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_lets_the_bout_start_once_opened() {
        let gate = StartGate::new();
        let stop = StopSignal::new();
        let opener = gate.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            opener.open();
        });
        assert!(gate.wait(&stop, Duration::from_millis(1)));
        handle.join().unwrap();
    }

    #[test]
    fn stop_before_start_releases_the_gate() {
        let gate = StartGate::new();
        let stop = StopSignal::new();
        stop.stop();
        assert!(!gate.wait(&stop, Duration::from_millis(1)));
        assert!(!gate.is_open());
    }

    #[test]
    fn cycle_limit_counts_down() {
        let limit = CycleLimit::new(2);
        assert!(limit.should_continue());
        assert!(limit.should_continue());
        assert!(!limit.should_continue());
    }
}
