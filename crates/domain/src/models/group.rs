//! Group domain model for location sharing groups.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use shared::sync::{read_lock, write_lock};

use super::device::Device;
use super::location::Location;
use crate::services::labels::GroupLabels;

/// Registry key of the main group.
pub const MAIN_GROUP_KEY: &str = "";

/// Persisted metadata of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupInfo {
    pub name: Option<String>,
    pub user_name: Option<String>,
    pub description: Option<String>,
    pub policy: Option<String>,
    /// Expiry in milliseconds since epoch, `0` for never.
    pub expire_time: i64,
    pub enabled: bool,
}

/// A named collection of tracked devices.
///
/// The main group has no group id and holds the devices that are not part of
/// any shared group.
#[derive(Debug)]
pub struct Group {
    group_id: Option<String>,
    info: RwLock<GroupInfo>,
    active: AtomicBool,
    deleted: AtomicBool,
    users: RwLock<BTreeMap<String, Arc<Device>>>,
}

impl Group {
    /// Creates a shared group with the given id.
    pub fn new(group_id: impl Into<String>) -> Self {
        Self::with_id(Some(group_id.into()))
    }

    /// Creates the main group.
    pub fn main() -> Self {
        Self::with_id(None)
    }

    fn with_id(group_id: Option<String>) -> Self {
        Self {
            group_id,
            info: RwLock::new(GroupInfo::default()),
            active: AtomicBool::new(false),
            deleted: AtomicBool::new(false),
            users: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    /// Key under which the registry stores this group.
    pub fn key(&self) -> &str {
        self.group_id.as_deref().unwrap_or(MAIN_GROUP_KEY)
    }

    pub fn is_main_group(&self) -> bool {
        self.group_id.is_none()
    }

    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    pub fn info(&self) -> GroupInfo {
        read_lock(&self.info).clone()
    }

    pub fn update_info(&self, update: impl FnOnce(&mut GroupInfo)) {
        update(&mut *write_lock(&self.info));
    }

    pub fn name(&self) -> Option<String> {
        read_lock(&self.info).name.clone()
    }

    pub fn user_name(&self) -> Option<String> {
        read_lock(&self.info).user_name.clone()
    }

    pub fn description(&self) -> Option<String> {
        read_lock(&self.info).description.clone()
    }

    pub fn policy(&self) -> Option<String> {
        read_lock(&self.info).policy.clone()
    }

    pub fn expire_time(&self) -> i64 {
        read_lock(&self.info).expire_time
    }

    pub fn is_enabled(&self) -> bool {
        read_lock(&self.info).enabled
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    pub fn set_deleted(&self, deleted: bool) {
        self.deleted.store(deleted, Ordering::Release);
    }

    /// Display name: the fixed label for the main group, otherwise the
    /// non-empty user name, falling back to the server-provided name.
    pub fn visible_name(&self, labels: &dyn GroupLabels) -> Option<String> {
        if self.is_main_group() {
            return Some(labels.main_group_label());
        }
        let info = read_lock(&self.info);
        match info.user_name.as_deref() {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            _ => info.name.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    /// Inserts `device`, replacing any member with the same tracker id, and
    /// points its back-reference at this group.
    pub fn put_device(self: &Arc<Self>, mut device: Device) -> Arc<Device> {
        device.attach_to(Arc::downgrade(self));
        let device = Arc::new(device);
        write_lock(&self.users).insert(device.tracker_id().to_string(), Arc::clone(&device));
        device
    }

    pub fn device(&self, tracker_id: &str) -> Option<Arc<Device>> {
        read_lock(&self.users).get(tracker_id).cloned()
    }

    /// All members, tombstoned ones included.
    pub fn devices(&self) -> Vec<Arc<Device>> {
        read_lock(&self.users).values().cloned().collect()
    }

    pub fn device_count(&self) -> usize {
        read_lock(&self.users).len()
    }

    /// Members that have not been tombstoned.
    pub fn group_users(&self) -> Vec<Arc<Device>> {
        read_lock(&self.users)
            .values()
            .filter(|d| d.deleted_timestamp() == 0)
            .cloned()
            .collect()
    }

    /// Applies a location update to the member `tracker_id`. Returns `false`
    /// when no such member exists.
    pub fn update_last_location(&self, tracker_id: &str, location: Option<Location>) -> bool {
        match self.device(tracker_id) {
            Some(device) => {
                device.update_location(location);
                true
            }
            None => {
                tracing::debug!(
                    group_id = %self.key(),
                    tracker_id = %tracker_id,
                    "Location update for unknown device ignored"
                );
                false
            }
        }
    }
}
