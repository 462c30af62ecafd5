//! Common validation utilities for tracker data.

use validator::ValidationError;

fn rejected(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        return Ok(());
    }
    Err(rejected("latitude_range", "Latitude must be between -90 and 90"))
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        return Ok(());
    }
    Err(rejected(
        "longitude_range",
        "Longitude must be between -180 and 180",
    ))
}

/// Validates that a fix accuracy (meters) is non-negative.
pub fn validate_accuracy(accuracy: f64) -> Result<(), ValidationError> {
    if accuracy >= 0.0 {
        return Ok(());
    }
    Err(rejected("accuracy_range", "Accuracy must be non-negative"))
}

/// Validates that bearing is within valid range (0 to 360).
pub fn validate_bearing(bearing: f64) -> Result<(), ValidationError> {
    if (0.0..=360.0).contains(&bearing) {
        return Ok(());
    }
    Err(rejected("bearing_range", "Bearing must be between 0 and 360"))
}

/// Validates that speed is non-negative.
pub fn validate_speed(speed: f64) -> Result<(), ValidationError> {
    if speed >= 0.0 {
        return Ok(());
    }
    Err(rejected("speed_range", "Speed must be non-negative"))
}
