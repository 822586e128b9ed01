pub mod calibration;
pub mod detector;
pub mod edge_guard;
pub mod light;
pub mod source;

pub use calibration::{CalibrationProfile, CalibrationProvider, GuidedCalibration};
pub use detector::{DetectorHandle, FeatureDetector};
pub use edge_guard::{EdgeFlag, EdgeGuard};
pub use light::LightSensor;
