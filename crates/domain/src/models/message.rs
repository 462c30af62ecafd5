//! Chat message model.

use chrono::{DateTime, TimeZone, Utc};

use super::location::LatLon;

/// A timestamped text/location event sent by a device.
///
/// Messages are immutable; they are owned by the device buffer that received
/// them and name their author by tracker id.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    timestamp: i64,
    location: Option<LatLon>,
    text: Option<String>,
    tracker_id: String,
}

impl Message {
    pub fn new(
        tracker_id: impl Into<String>,
        timestamp: i64,
        text: Option<String>,
        location: Option<LatLon>,
    ) -> Self {
        Self {
            timestamp,
            location,
            text,
            tracker_id: tracker_id.into(),
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    pub fn location(&self) -> Option<LatLon> {
        self.location
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Tracker id of the authoring device.
    pub fn author(&self) -> &str {
        &self.tracker_id
    }
}
