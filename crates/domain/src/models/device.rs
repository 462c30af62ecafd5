//! Device domain model.
//!
//! A device is one tracked member of a group. Devices are shared between the
//! network thread that feeds locations and the UI thread that renders them, so
//! every mutable field sits behind a lock or an atomic.

use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use chrono::Utc;
use shared::sync::{read_lock, write_lock};

use super::group::Group;
use super::location::{LatLon, Location};
use super::message::Message;

/// Color code meaning "not assigned".
pub const NO_COLOR: i32 = 0;

/// Display attributes of a device that are persisted with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProfile {
    pub server_name: Option<String>,
    pub user_name: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Default)]
struct Presence {
    active: bool,
    last_online: i64,
    last_location: Option<Location>,
}

/// Represents a tracked device within a group.
#[derive(Debug)]
pub struct Device {
    tracker_id: String,
    group: Weak<Group>,
    profile: RwLock<DeviceProfile>,
    server_color: AtomicI32,
    user_color: AtomicI32,
    deleted: AtomicI64,
    presence: RwLock<Presence>,
    messages: RwLock<Vec<Message>>,
}

impl Device {
    pub fn new(tracker_id: impl Into<String>) -> Self {
        Self {
            tracker_id: tracker_id.into(),
            group: Weak::new(),
            profile: RwLock::new(DeviceProfile::default()),
            server_color: AtomicI32::new(NO_COLOR),
            user_color: AtomicI32::new(NO_COLOR),
            deleted: AtomicI64::new(0),
            presence: RwLock::new(Presence::default()),
            messages: RwLock::new(Vec::new()),
        }
    }

    pub fn tracker_id(&self) -> &str {
        &self.tracker_id
    }

    /// The owning group, while it is still alive.
    pub fn group(&self) -> Option<Arc<Group>> {
        self.group.upgrade()
    }

    pub(crate) fn attach_to(&mut self, group: Weak<Group>) {
        self.group = group;
    }

    // ------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------

    pub fn profile(&self) -> DeviceProfile {
        read_lock(&self.profile).clone()
    }

    pub fn update_profile(&self, update: impl FnOnce(&mut DeviceProfile)) {
        update(&mut *write_lock(&self.profile));
    }

    pub fn server_name(&self) -> Option<String> {
        read_lock(&self.profile).server_name.clone()
    }

    pub fn user_name(&self) -> Option<String> {
        read_lock(&self.profile).user_name.clone()
    }

    pub fn set_server_name(&self, name: Option<String>) {
        write_lock(&self.profile).server_name = name;
    }

    pub fn set_user_name(&self, name: Option<String>) {
        write_lock(&self.profile).user_name = name;
    }

    pub fn is_enabled(&self) -> bool {
        read_lock(&self.profile).enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        write_lock(&self.profile).enabled = enabled;
    }

    /// User-chosen name if set and non-empty, otherwise the server name.
    pub fn visible_name(&self) -> Option<String> {
        let profile = read_lock(&self.profile);
        match profile.user_name.as_deref() {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            _ => profile.server_name.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Colors
    // ------------------------------------------------------------------

    pub fn server_color(&self) -> i32 {
        self.server_color.load(Ordering::Acquire)
    }

    pub fn user_color(&self) -> i32 {
        self.user_color.load(Ordering::Acquire)
    }

    pub fn set_server_color(&self, color: i32) {
        self.server_color.store(color, Ordering::Release);
    }

    /// Overrides the user color. `NO_COLOR` is ignored: an assigned color
    /// never reverts to unset.
    pub fn set_user_color(&self, color: i32) {
        if color != NO_COLOR {
            self.user_color.store(color, Ordering::Release);
        }
    }

    /// Resolves the display color: user color, then server color, then
    /// `default_color`, which is cached into the user color.
    ///
    /// The assignment is a compare-and-set, so among concurrent first calls
    /// the earliest writer wins and every caller observes its color.
    pub fn color(&self, default_color: i32) -> i32 {
        let user = self.user_color.load(Ordering::Acquire);
        if user != NO_COLOR {
            return user;
        }
        let server = self.server_color.load(Ordering::Acquire);
        if server != NO_COLOR {
            return server;
        }
        match self.user_color.compare_exchange(
            NO_COLOR,
            default_color,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => default_color,
            Err(assigned) => assigned,
        }
    }

    // ------------------------------------------------------------------
    // Tombstone
    // ------------------------------------------------------------------

    /// Deletion timestamp, `0` while the device is visible.
    pub fn deleted_timestamp(&self) -> i64 {
        self.deleted.load(Ordering::Acquire)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_timestamp() != 0
    }

    /// Tombstones the device at `timestamp`. Only the first non-zero
    /// timestamp sticks; returns whether this call set it.
    pub fn mark_deleted(&self, timestamp: i64) -> bool {
        if timestamp == 0 {
            return false;
        }
        let stored = self
            .deleted
            .compare_exchange(0, timestamp, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if stored {
            tracing::debug!(tracker_id = %self.tracker_id, deleted = timestamp, "Device tombstoned");
        }
        stored
    }

    pub fn mark_deleted_now(&self) -> bool {
        self.mark_deleted(Utc::now().timestamp_millis())
    }

    // ------------------------------------------------------------------
    // Presence
    // ------------------------------------------------------------------

    pub fn is_active(&self) -> bool {
        read_lock(&self.presence).active
    }

    pub fn last_online(&self) -> i64 {
        read_lock(&self.presence).last_online
    }

    pub fn set_last_online(&self, timestamp: i64) {
        write_lock(&self.presence).last_online = timestamp;
    }

    pub fn last_location(&self) -> Option<Location> {
        read_lock(&self.presence).last_location.clone()
    }

    /// Replaces the last known location. A present fix marks the device
    /// active and advances `last_online` to the fix time; `None` marks it
    /// inactive.
    pub fn update_location(&self, location: Option<Location>) {
        let mut presence = write_lock(&self.presence);
        presence.active = location.is_some();
        if let Some(fix) = &location {
            presence.last_online = fix.time;
        }
        presence.last_location = location;
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    pub fn messages(&self) -> Vec<Message> {
        read_lock(&self.messages).clone()
    }

    pub fn message_count(&self) -> usize {
        read_lock(&self.messages).len()
    }

    /// Appends a message authored by this device.
    pub fn add_message(
        &self,
        timestamp: i64,
        text: Option<String>,
        location: Option<LatLon>,
    ) -> Message {
        let message = Message::new(self.tracker_id.clone(), timestamp, text, location);
        write_lock(&self.messages).push(message.clone());
        message
    }
}
