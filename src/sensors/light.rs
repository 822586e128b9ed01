use std::sync::Arc;

use super::calibration::CalibrationProfile;
use super::source::SensorSource;

/// Reflectance channel read on the calibrated 0-100 scale
#[derive(Clone)]
pub struct LightSensor {
    raw: Arc<dyn SensorSource>,
    profile: CalibrationProfile,
}

impl LightSensor {
    pub fn new(raw: Arc<dyn SensorSource>, profile: CalibrationProfile) -> Self {
        Self { raw, profile }
    }

    pub fn light_value(&self) -> Option<f32> {
        self.raw.sample().map(|raw| self.profile.scale(raw))
    }
}
