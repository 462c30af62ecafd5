//! Stored document entities (serialized registry mapping).
//!
//! Optional fields are skipped while at their default so the stored blob only
//! carries what was actually set; absent fields deserialize to the same
//! defaults.

use std::sync::Arc;

use domain::models::{Device, Group, GroupInfo};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Root key holding the member list of a group.
pub const USERS: &str = "users";
/// Root key holding the shared groups.
pub const GROUPS: &str = "groups";

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Document mapping for one device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StoredDevice {
    #[validate(length(min = 1, message = "trackerId must not be empty"))]
    pub tracker_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,

    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub user_color: i32,

    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub server_color: i32,

    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub deleted: i64,

    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,
}

impl From<&Device> for StoredDevice {
    fn from(device: &Device) -> Self {
        let profile = device.profile();
        Self {
            tracker_id: device.tracker_id().to_string(),
            user_name: profile.user_name,
            server_name: profile.server_name,
            user_color: device.user_color(),
            server_color: device.server_color(),
            deleted: device.deleted_timestamp(),
            enabled: profile.enabled,
        }
    }
}

impl StoredDevice {
    /// Builds a fresh, detached device carrying the stored fields.
    pub fn into_device(self) -> Device {
        let device = Device::new(self.tracker_id);
        device.update_profile(|profile| {
            profile.user_name = self.user_name;
            profile.server_name = self.server_name;
            profile.enabled = self.enabled;
        });
        device.set_server_color(self.server_color);
        device.set_user_color(self.user_color);
        device.mark_deleted(self.deleted);
        device
    }
}

/// Document mapping for one shared group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StoredGroup {
    /// Empty ids are rejected: the empty key belongs to the main group.
    #[serde(rename = "group_id")]
    #[validate(length(min = 1, message = "group_id must not be empty"))]
    pub group_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "userName", default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,

    #[serde(rename = "expireTime", default, skip_serializing_if = "is_zero_i64")]
    pub expire_time: i64,

    #[serde(default, skip_serializing_if = "is_false")]
    pub enabled: bool,

    #[serde(default)]
    pub users: Vec<StoredDevice>,
}

impl StoredGroup {
    /// Snapshot of a shared group and all its members, tombstones included.
    ///
    /// The main group has no id and is stored at the document root instead.
    pub fn from_group(group: &Group) -> Option<Self> {
        let group_id = group.group_id()?.to_string();
        let info = group.info();
        Some(Self {
            group_id,
            name: info.name,
            user_name: info.user_name,
            description: info.description,
            policy: info.policy,
            expire_time: info.expire_time,
            enabled: info.enabled,
            users: group
                .devices()
                .iter()
                .map(|device| StoredDevice::from(&**device))
                .collect(),
        })
    }

    /// Split into the metadata-only group and its member entries.
    pub fn into_parts(self) -> (Arc<Group>, Vec<StoredDevice>) {
        let group = Arc::new(Group::new(self.group_id));
        let info = GroupInfo {
            name: self.name,
            user_name: self.user_name,
            description: self.description,
            policy: self.policy,
            expire_time: self.expire_time,
            enabled: self.enabled,
        };
        group.update_info(|current| *current = info);
        (group, self.users)
    }
}

/// The whole stored registry, as written on save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Members of the main group.
    #[serde(default)]
    pub users: Vec<StoredDevice>,

    #[serde(default)]
    pub groups: Vec<StoredGroup>,
}
