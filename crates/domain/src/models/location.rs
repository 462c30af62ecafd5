//! Location domain model.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{
    validate_accuracy, validate_bearing, validate_latitude, validate_longitude, validate_speed,
};
use validator::{Validate, ValidationError, ValidationErrors};

/// A bare coordinate pair, as attached to chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLon {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A position fix reported by a tracked device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,

    /// Timestamp in milliseconds since epoch
    pub time: i64,

    pub accuracy: Option<f64>,
    pub altitude: Option<f64>,
    pub bearing: Option<f64>,
    pub speed: Option<f64>,
    pub provider: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, time: i64) -> Self {
        Self {
            latitude,
            longitude,
            time,
            accuracy: None,
            altitude: None,
            bearing: None,
            speed: None,
            provider: None,
        }
    }

    pub fn lat_lon(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }

    /// The fix time as a UTC timestamp, if it is representable.
    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.time).single()
    }
}

/// Range checks for a fix before the service pushes it into a group.
impl Validate for Location {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let checks: [(&'static str, Result<(), ValidationError>); 5] = [
            ("latitude", validate_latitude(self.latitude)),
            ("longitude", validate_longitude(self.longitude)),
            ("accuracy", self.accuracy.map_or(Ok(()), validate_accuracy)),
            ("bearing", self.bearing.map_or(Ok(()), validate_bearing)),
            ("speed", self.speed.map_or(Ok(()), validate_speed)),
        ];

        let mut errors = ValidationErrors::new();
        let mut failed = false;
        for (field, check) in checks {
            if let Err(err) = check {
                errors.add(field, err);
                failed = true;
            }
        }
        if failed {
            Err(errors)
        } else {
            Ok(())
        }
    }
}
