use log::{debug, info};

use crate::robot::state::BehavioralState;

/// Tone duration played for each range detection (milliseconds)
pub const RANGE_TONE_MS: u32 = 100;

/// Pitch of the range tone: closer targets sound higher.
pub fn range_tone_hz(range_mm: f32) -> u32 {
    (1200.0 - range_mm * 10.0).max(0.0) as u32
}

/// Audio/visual feedback. Fire-and-forget; never affects control flow.
pub trait FeedbackSink: Send {
    fn range_detected(&mut self, range_mm: f32);
    fn state_changed(&mut self, from: BehavioralState, to: BehavioralState);
}

/// Narrates feedback through the logger
#[derive(Debug, Default)]
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn range_detected(&mut self, range_mm: f32) {
        info!("Range: {:.0}", range_mm);
        debug!(
            "Tone {} Hz for {} ms",
            range_tone_hz(range_mm),
            RANGE_TONE_MS
        );
    }

    fn state_changed(&mut self, from: BehavioralState, to: BehavioralState) {
        debug!("State {} -> {}", from, to);
    }
}
