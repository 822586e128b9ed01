//! Light sensor calibration.
//!
//! A run starts by recording how bright the white mat and the black ring
//! border read under the current lighting. Every later light reading is
//! mapped onto a 0-100 scale between those two bounds.

use log::info;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::source::SensorSource;

/// Number of raw samples averaged per calibration step
pub const SAMPLES_PER_STEP: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStep {
    White,
    Black,
}

impl CalibrationStep {
    /// Operator instruction shown before the step is captured
    pub fn instruction(&self) -> &'static str {
        match self {
            CalibrationStep::White => "Place light sensor on white and press enter",
            CalibrationStep::Black => "Place light sensor on black and press enter",
        }
    }
}

impl fmt::Display for CalibrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationStep::White => write!(f, "white"),
            CalibrationStep::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    #[error("light sensor could not be read during the {0} step")]
    Unreadable(CalibrationStep),

    #[error("white reading {white} is not brighter than black reading {black}")]
    InvertedBounds { white: f32, black: f32 },

    #[error("calibration aborted: {0}")]
    Aborted(String),
}

/// Raw reflectance bounds recorded before a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationProfile {
    pub white_high: f32,
    pub black_low: f32,
}

impl CalibrationProfile {
    pub fn from_readings(white: f32, black: f32) -> Result<Self, CalibrationError> {
        if !white.is_finite() || !black.is_finite() || white <= black {
            return Err(CalibrationError::InvertedBounds { white, black });
        }
        Ok(Self {
            white_high: white,
            black_low: black,
        })
    }

    /// Maps a raw reading onto the calibrated 0-100 scale
    pub fn scale(&self, raw: f32) -> f32 {
        let span = self.white_high - self.black_low;
        (100.0 * (raw - self.black_low) / span).clamp(0.0, 100.0)
    }
}

/// Moves the light sensor over the surface a step needs, then returns.
pub trait PlacementPrompt {
    fn await_placement(&mut self, step: CalibrationStep) -> Result<(), CalibrationError>;
}

pub trait CalibrationProvider {
    fn calibrate(&mut self) -> Result<CalibrationProfile, CalibrationError>;
}

/// Two-step white-then-black capture guided by a prompt
pub struct GuidedCalibration<P: PlacementPrompt> {
    source: Arc<dyn SensorSource>,
    prompt: P,
    samples: usize,
}

impl<P: PlacementPrompt> GuidedCalibration<P> {
    pub fn new(source: Arc<dyn SensorSource>, prompt: P) -> Self {
        Self {
            source,
            prompt,
            samples: SAMPLES_PER_STEP,
        }
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples.max(1);
        self
    }

    fn capture(&mut self, step: CalibrationStep) -> Result<f32, CalibrationError> {
        info!("{}", step.instruction());
        self.prompt.await_placement(step)?;

        let readings: Vec<f32> = (0..self.samples)
            .filter_map(|_| self.source.sample())
            .collect();
        if readings.is_empty() {
            return Err(CalibrationError::Unreadable(step));
        }
        let mean = readings.iter().sum::<f32>() / readings.len() as f32;
        info!("Calibrated {} at raw {:.1}", step, mean);
        Ok(mean)
    }
}

impl<P: PlacementPrompt> CalibrationProvider for GuidedCalibration<P> {
    fn calibrate(&mut self) -> Result<CalibrationProfile, CalibrationError> {
        let white = self.capture(CalibrationStep::White)?;
        let black = self.capture(CalibrationStep::Black)?;
        CalibrationProfile::from_readings(white, black)
    }
}
