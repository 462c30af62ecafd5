//! In-memory group registry backed by a single stored document.
//!
//! The registry owns every group keyed by group id, with the main group under
//! the empty key. `load` merges the stored document into memory and `save`
//! writes the full state back. Persistence failures never reach the caller:
//! they are logged, counted and handed to the injected `ErrorReporter`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use domain::models::{Group, MAIN_GROUP_KEY};
use domain::services::ErrorReporter;
use serde_json::{Map, Value};
use shared::sync::{lock, read_lock, write_lock};
use validator::Validate;

use crate::entities::group_document::{GROUPS, USERS};
use crate::entities::{StoredDevice, StoredDocument, StoredGroup};
use crate::error::StorageError;
use crate::metrics::{record_group_count, record_persistence_error, StorageOperation, StorageTimer};
use crate::preference::Preference;

/// Registry of location sharing groups.
pub struct GroupRegistry {
    preference: Arc<dyn Preference>,
    reporter: Arc<dyn ErrorReporter>,
    groups: RwLock<BTreeMap<String, Arc<Group>>>,
    main_group: Arc<Group>,
    /// Serializes `load` against `save`.
    io_lock: Mutex<()>,
}

impl GroupRegistry {
    /// Creates a registry holding only the main group.
    pub fn new(preference: Arc<dyn Preference>, reporter: Arc<dyn ErrorReporter>) -> Self {
        let main_group = Arc::new(Group::main());
        let mut groups = BTreeMap::new();
        groups.insert(MAIN_GROUP_KEY.to_string(), Arc::clone(&main_group));

        Self {
            preference,
            reporter,
            groups: RwLock::new(groups),
            main_group,
            io_lock: Mutex::new(()),
        }
    }

    /// The main group. The same instance for the registry's whole lifetime.
    pub fn main_group(&self) -> &Arc<Group> {
        &self.main_group
    }

    /// Snapshot of all groups, main group included.
    pub fn groups(&self) -> Vec<Arc<Group>> {
        read_lock(&self.groups).values().cloned().collect()
    }

    pub fn group_count(&self) -> usize {
        read_lock(&self.groups).len()
    }

    /// Looks up a group; `MAIN_GROUP_KEY` resolves to the main group.
    pub fn group(&self, group_id: &str) -> Option<Arc<Group>> {
        read_lock(&self.groups).get(group_id).cloned()
    }

    /// Inserts or replaces `group` under its id and clears its deleted flag.
    ///
    /// A group without an id other than the registry's own main group is
    /// ignored.
    pub fn add_group(&self, group: Arc<Group>) {
        if group.is_main_group() && !Arc::ptr_eq(&group, &self.main_group) {
            tracing::warn!("Refusing to replace the main group");
            return;
        }
        group.set_deleted(false);

        let count = {
            let mut groups = write_lock(&self.groups);
            groups.insert(group.key().to_string(), Arc::clone(&group));
            groups.len()
        };
        record_group_count(count);
        tracing::debug!(group_id = %group.key(), "Group added");
    }

    /// Removes `group` from the registry by its id and flags it deleted. Its
    /// devices are left as they are. The main group cannot be deleted.
    pub fn delete_group(&self, group: &Group) {
        if group.is_main_group() {
            tracing::warn!("Refusing to delete the main group");
            return;
        }

        let count = {
            let mut groups = write_lock(&self.groups);
            groups.remove(group.key());
            groups.len()
        };
        group.set_deleted(true);
        record_group_count(count);
        tracing::debug!(group_id = %group.key(), "Group deleted");
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Merges the stored document into the registry.
    ///
    /// Errors are reported, not returned; whatever was applied before the
    /// error stays applied.
    pub fn load(&self) {
        if let Err(err) = self.try_load() {
            self.report(StorageOperation::Load, &err);
        }
    }

    /// Writes the full registry to the preference.
    ///
    /// Errors are reported, not returned; the preference is left untouched.
    pub fn save(&self) {
        if let Err(err) = self.try_save() {
            self.report(StorageOperation::Save, &err);
        }
    }

    /// `load` with the failure surfaced instead of reported.
    pub fn try_load(&self) -> Result<(), StorageError> {
        let _io = lock(&self.io_lock);
        let timer = StorageTimer::new(StorageOperation::Load);

        let raw = self.preference.get();
        if raw.trim().is_empty() {
            tracing::debug!("No stored groups, keeping registry as is");
            timer.record();
            return Ok(());
        }

        let result = self.merge_document(&raw);
        timer.record();
        record_group_count(self.group_count());
        result
    }

    /// `save` with the failure surfaced instead of reported.
    pub fn try_save(&self) -> Result<(), StorageError> {
        let _io = lock(&self.io_lock);
        let timer = StorageTimer::new(StorageOperation::Save);

        let document = self.to_document();
        let serialized = serde_json::to_string(&document).map_err(StorageError::Serialize);
        timer.record();

        let serialized = serialized?;
        self.preference.set(serialized);
        tracing::info!(
            groups = document.groups.len(),
            main_users = document.users.len(),
            "Group registry saved"
        );
        Ok(())
    }

    /// Snapshot of the registry in stored form. Groups and members are in
    /// ascending id order.
    pub fn to_document(&self) -> StoredDocument {
        let users = self
            .main_group
            .devices()
            .iter()
            .map(|device| StoredDevice::from(&**device))
            .collect();
        let groups = self
            .groups()
            .iter()
            .filter_map(|group| StoredGroup::from_group(group))
            .collect();

        StoredDocument { users, groups }
    }

    fn merge_document(&self, raw: &str) -> Result<(), StorageError> {
        let mut root: Map<String, Value> = serde_json::from_str(raw)?;

        let main_users = match root.remove(USERS) {
            Some(users) => self.merge_main_users(users)?,
            None => 0,
        };

        let Some(groups) = root.remove(GROUPS) else {
            tracing::info!(main_users, "Group registry loaded without shared groups");
            return Ok(());
        };

        let entries: Vec<Value> = serde_json::from_value(groups)?;
        let group_count = entries.len();
        for entry in entries {
            let stored: StoredGroup = serde_json::from_value(entry)?;
            stored
                .validate()
                .map_err(|e| StorageError::invalid("group", e))?;
            self.insert_stored_group(stored)?;
        }

        tracing::info!(main_users, groups = group_count, "Group registry loaded");
        Ok(())
    }

    /// Entries are applied one by one so a malformed entry keeps the ones
    /// before it.
    fn merge_main_users(&self, users: Value) -> Result<usize, StorageError> {
        let entries: Vec<Value> = serde_json::from_value(users)?;
        let count = entries.len();
        for entry in entries {
            let stored: StoredDevice = serde_json::from_value(entry)?;
            stored
                .validate()
                .map_err(|e| StorageError::invalid("device", e))?;
            self.main_group.put_device(stored.into_device());
        }
        Ok(count)
    }

    /// Builds the group with all its members first; the registry only sees
    /// it once every member parsed.
    fn insert_stored_group(&self, stored: StoredGroup) -> Result<(), StorageError> {
        let (group, users) = stored.into_parts();
        for user in users {
            user.validate()
                .map_err(|e| StorageError::invalid("device", e))?;
            group.put_device(user.into_device());
        }

        tracing::debug!(
            group_id = %group.key(),
            devices = group.device_count(),
            "Stored group restored"
        );
        write_lock(&self.groups).insert(group.key().to_string(), group);
        Ok(())
    }

    fn report(&self, operation: StorageOperation, err: &StorageError) {
        tracing::error!(operation = operation.as_str(), error = %err, "Group storage failed");
        record_persistence_error(operation);
        self.reporter.show_error_message(&err.to_string());
    }
}
