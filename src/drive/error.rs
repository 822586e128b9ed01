use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DriveError {
    #[error("{what} must not be negative (got {value})")]
    NegativeSpeed { what: &'static str, value: f32 },

    #[error("{what} must be a finite number (got {value})")]
    InvalidParameter { what: &'static str, value: f32 },

    #[error("motor backend fault: {0}")]
    Backend(String),
}

pub type DriveResult<T> = Result<T, DriveError>;

pub(crate) fn check_finite(what: &'static str, value: f32) -> DriveResult<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DriveError::InvalidParameter { what, value })
    }
}

pub(crate) fn check_speed(what: &'static str, value: f32) -> DriveResult<f32> {
    let value = check_finite(what, value)?;
    if value < 0.0 {
        return Err(DriveError::NegativeSpeed { what, value });
    }
    Ok(value)
}
