//! Integration tests for the group registry load/save contract.

use std::sync::Arc;
use std::thread;

use domain::models::{Device, Group, Location, MAIN_GROUP_KEY, NO_COLOR};
use domain::services::{GroupLabels, RecordingErrorReporter};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, Name};
use fake::Fake;
use persistence::{
    GroupRegistry, KeyValueStore, MemoryPreference, MemoryStore, Preference, PreferenceEntry,
};

// ============================================================================
// Helpers
// ============================================================================

struct Fixture {
    preference: Arc<MemoryPreference>,
    reporter: Arc<RecordingErrorReporter>,
    registry: GroupRegistry,
}

impl Fixture {
    fn new(stored: &str) -> Self {
        let preference = Arc::new(MemoryPreference::new(stored));
        let reporter = Arc::new(RecordingErrorReporter::new());
        let registry = GroupRegistry::new(preference.clone(), reporter.clone());
        Self {
            preference,
            reporter,
            registry,
        }
    }

    /// A second registry reading what this one saved.
    fn reload(&self) -> Fixture {
        let fresh = Fixture::new(&self.preference.get());
        fresh.registry.load();
        fresh
    }
}

fn tracker_ids(group: &Group) -> Vec<String> {
    let mut ids: Vec<String> = group
        .devices()
        .iter()
        .map(|d| d.tracker_id().to_string())
        .collect();
    ids.sort();
    ids
}

/// Populates `group` with `count` devices; every other device gets the
/// optional fields set so both omitted and emitted fields are exercised.
fn populate(group: &Arc<Group>, count: usize) {
    for i in 0..count {
        let device = group.put_device(Device::new(format!("{}-tr{}", group.key(), i)));
        if i % 2 == 0 {
            device.set_server_name(Some(Name().fake()));
            device.set_user_name(Some(FirstName().fake()));
            device.set_server_color((1..0x00FF_FFFF).fake::<i32>());
            device.set_enabled(true);
        }
        if i % 3 == 0 {
            device.color((1..0x00FF_FFFF).fake::<i32>());
        }
        if i == count - 1 {
            device.mark_deleted(1_700_000_000_000 + i as i64);
        }
    }
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_fresh_registry_has_single_main_group() {
    let fx = Fixture::new("");
    let groups = fx.registry.groups();

    assert_eq!(groups.len(), 1);
    assert!(groups[0].is_main_group());
    assert!(Arc::ptr_eq(&groups[0], fx.registry.main_group()));
    assert!(Arc::ptr_eq(
        &fx.registry.group(MAIN_GROUP_KEY).unwrap(),
        fx.registry.main_group()
    ));
    assert!(fx.registry.group("unknown").is_none());
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_round_trip_preserves_groups_devices_and_fields() {
    let fx = Fixture::new("");
    populate(fx.registry.main_group(), 3);

    for i in 0..3 {
        let group = Arc::new(Group::new(format!("G{}", i)));
        group.update_info(|info| {
            info.name = Some(Name().fake());
            if i != 0 {
                info.user_name = Some(FirstName().fake());
                info.description = Some(Sentence(3..6).fake());
                info.policy = Some("open".into());
                info.expire_time = 1_800_000_000_000 + i;
                info.enabled = true;
            }
        });
        populate(&group, 4);
        fx.registry.add_group(group);
    }

    fx.registry.save();
    assert_eq!(fx.reporter.count(), 0);
    assert_eq!(fx.preference.write_count(), 1);

    let loaded = fx.reload();
    assert_eq!(loaded.reporter.count(), 0);
    assert_eq!(loaded.registry.group_count(), 4);
    assert_eq!(loaded.registry.to_document(), fx.registry.to_document());

    for original in fx.registry.groups() {
        let restored = loaded.registry.group(original.key()).unwrap();
        assert_eq!(restored.is_main_group(), original.is_main_group());
        assert_eq!(tracker_ids(&restored), tracker_ids(&original));
        if !original.is_main_group() {
            assert_eq!(restored.info(), original.info());
        }

        for device in original.devices() {
            let copy = restored.device(device.tracker_id()).unwrap();
            assert_eq!(copy.profile(), device.profile());
            assert_eq!(copy.user_color(), device.user_color());
            assert_eq!(copy.server_color(), device.server_color());
            assert_eq!(copy.deleted_timestamp(), device.deleted_timestamp());
            assert!(Arc::ptr_eq(&copy.group().unwrap(), &restored));
        }
    }
}

#[test]
fn test_round_trip_keeps_tombstones_out_of_visible_members() {
    let fx = Fixture::new("");
    let group = Arc::new(Group::new("family"));
    group.put_device(Device::new("kept"));
    group.put_device(Device::new("gone")).mark_deleted(123);
    fx.registry.add_group(group);
    fx.registry.save();

    let loaded = fx.reload();
    let restored = loaded.registry.group("family").unwrap();
    assert_eq!(restored.device_count(), 2);

    let visible = restored.group_users();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].tracker_id(), "kept");
    assert_eq!(restored.device("gone").unwrap().deleted_timestamp(), 123);
}

#[test]
fn test_defaults_are_omitted_from_stored_document() {
    let fx = Fixture::new("");
    fx.registry.main_group().put_device(Device::new("plain"));
    fx.registry.add_group(Arc::new(Group::new("bare")));
    fx.registry.save();

    let json: serde_json::Value = serde_json::from_str(&fx.preference.get()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "users": [{ "trackerId": "plain" }],
            "groups": [{ "group_id": "bare", "users": [] }]
        })
    );
}

#[test]
fn test_round_trip_through_key_value_store() {
    let store = Arc::new(MemoryStore::new());
    let reporter = Arc::new(RecordingErrorReporter::new());

    let registry = GroupRegistry::new(
        Arc::new(PreferenceEntry::new(Arc::clone(&store), "tracker_groups")),
        reporter.clone(),
    );
    let group = Arc::new(Group::new("hike"));
    group.put_device(Device::new("t1")).set_user_color(0x00AA00);
    registry.add_group(group);
    registry.save();
    assert!(store.get_string("tracker_groups").is_some());

    let restored = GroupRegistry::new(
        Arc::new(PreferenceEntry::new(Arc::clone(&store), "tracker_groups")),
        reporter.clone(),
    );
    restored.load();
    let device = restored.group("hike").unwrap().device("t1").unwrap();
    assert_eq!(device.color(1), 0x00AA00);
    assert_eq!(reporter.count(), 0);
}

// ============================================================================
// CRUD
// ============================================================================

#[test]
fn test_delete_then_add_group() {
    let fx = Fixture::new("");
    let group = Arc::new(Group::new("g1"));
    group.put_device(Device::new("a"));
    group.put_device(Device::new("b"));
    fx.registry.add_group(Arc::clone(&group));

    fx.registry.delete_group(&group);
    assert!(fx.registry.group("g1").is_none());
    assert!(group.is_deleted());
    assert_eq!(group.device_count(), 2);
    assert!(group.devices().iter().all(|d| !d.is_deleted()));

    fx.registry.add_group(Arc::clone(&group));
    let back = fx.registry.group("g1").unwrap();
    assert!(Arc::ptr_eq(&back, &group));
    assert!(!back.is_deleted());
}

#[test]
fn test_deleted_group_is_not_saved() {
    let fx = Fixture::new("");
    let group = Arc::new(Group::new("temp"));
    fx.registry.add_group(Arc::clone(&group));
    fx.registry.delete_group(&group);
    fx.registry.save();

    let loaded = fx.reload();
    assert_eq!(loaded.registry.group_count(), 1);
}

#[test]
fn test_visible_names_follow_labels() {
    let labels = domain::services::StaticLabels::new("Connected devices");
    let fx = Fixture::new(r#"{"groups": [{"group_id": "g", "name": "Server", "userName": ""}]}"#);
    fx.registry.load();

    assert_eq!(
        fx.registry.main_group().visible_name(&labels),
        Some(labels.main_group_label())
    );
    assert_eq!(
        fx.registry.group("g").unwrap().visible_name(&labels).as_deref(),
        Some("Server")
    );
}

// ============================================================================
// Colors
// ============================================================================

#[test]
fn test_lazy_color_assignment_is_persisted() {
    let fx = Fixture::new("");
    let device = fx.registry.main_group().put_device(Device::new("c1"));
    assert_eq!(device.color(7), 7);
    assert_eq!(device.color(9), 7);

    let served = fx.registry.main_group().put_device(Device::new("c2"));
    served.set_server_color(3);
    assert_eq!(served.color(7), 3);
    assert_eq!(served.user_color(), NO_COLOR);

    fx.registry.save();
    let loaded = fx.reload();
    let main = loaded.registry.main_group();
    assert_eq!(main.device("c1").unwrap().user_color(), 7);
    assert_eq!(main.device("c2").unwrap().user_color(), NO_COLOR);
    assert_eq!(main.device("c2").unwrap().color(5), 3);
}

// ============================================================================
// Load edge cases
// ============================================================================

#[test]
fn test_load_without_groups_key_populates_main_group_only() {
    let fx = Fixture::new(r#"{"users": [{"trackerId": "a"}, {"trackerId": "b", "enabled": true}]}"#);
    fx.registry.load();

    assert_eq!(fx.reporter.count(), 0);
    assert_eq!(fx.registry.group_count(), 1);
    assert_eq!(tracker_ids(fx.registry.main_group()), vec!["a", "b"]);
    assert!(fx.registry.main_group().device("b").unwrap().is_enabled());
}

#[test]
fn test_missing_group_id_aborts_remaining_groups() {
    let fx = Fixture::new(
        r#"{
            "users": [{"trackerId": "m1"}],
            "groups": [
                {"group_id": "first", "name": "First", "users": [{"trackerId": "x"}]},
                {"name": "No id"},
                {"group_id": "third"}
            ]
        }"#,
    );
    fx.registry.load();

    assert_eq!(fx.reporter.count(), 1);
    assert!(fx.reporter.messages()[0].contains("group_id"));
    assert!(fx.registry.main_group().device("m1").is_some());

    let first = fx.registry.group("first").unwrap();
    assert_eq!(first.name().as_deref(), Some("First"));
    assert!(first.device("x").is_some());
    assert!(fx.registry.group("third").is_none());
    assert_eq!(fx.registry.group_count(), 2);
}

#[test]
fn test_absent_fields_keep_defaults() {
    let fx = Fixture::new(r#"{"groups": [{"group_id": "g", "enabled": false}]}"#);
    fx.registry.load();

    let group = fx.registry.group("g").unwrap();
    assert_eq!(group.name(), None);
    assert_eq!(group.description(), None);
    assert_eq!(group.policy(), None);
    assert_eq!(group.expire_time(), 0);
    assert!(!group.is_enabled());
    assert_eq!(group.device_count(), 0);
}

#[test]
fn test_load_replaces_live_group_with_same_id() {
    let fx = Fixture::new(r#"{"groups": [{"group_id": "g", "users": [{"trackerId": "stored"}]}]}"#);
    let live = Arc::new(Group::new("g"));
    live.put_device(Device::new("live"));
    fx.registry.add_group(Arc::clone(&live));

    fx.registry.load();
    let current = fx.registry.group("g").unwrap();
    assert!(!Arc::ptr_eq(&current, &live));
    assert_eq!(tracker_ids(&current), vec!["stored"]);
}

#[test]
fn test_malformed_blob_is_reported_not_raised() {
    let fx = Fixture::new("{not json");
    fx.registry.load();
    assert_eq!(fx.reporter.count(), 1);
    assert_eq!(fx.registry.group_count(), 1);
    assert!(fx.registry.try_load().is_err());
}

#[test]
fn test_malformed_main_user_keeps_earlier_entries() {
    let fx = Fixture::new(r#"{"users": [{"trackerId": "ok"}, {"serverName": "no id"}, {"trackerId": "late"}]}"#);
    fx.registry.load();

    assert_eq!(fx.reporter.count(), 1);
    assert!(fx.registry.main_group().device("ok").is_some());
    assert!(fx.registry.main_group().device("late").is_none());
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_mutation_and_persistence() {
    let fx = Fixture::new("");
    let registry = &fx.registry;

    thread::scope(|scope| {
        for worker in 0..4 {
            scope.spawn(move || {
                for i in 0..25 {
                    let group = Arc::new(Group::new(format!("w{}-g{}", worker, i)));
                    let device = group.put_device(Device::new(format!("t{}", i)));
                    registry.add_group(Arc::clone(&group));
                    group.update_last_location(device.tracker_id(), Some(Location::new(1.0, 2.0, i)));
                    device.color(worker + 1);
                }
            });
        }
        scope.spawn(move || {
            for _ in 0..20 {
                registry.save();
                registry.group_count();
            }
        });
    });

    assert_eq!(registry.group_count(), 101);
    registry.save();
    assert_eq!(fx.reporter.count(), 0);

    let loaded = fx.reload();
    assert_eq!(loaded.registry.group_count(), 101);
    assert_eq!(loaded.registry.to_document(), registry.to_document());
}

#[test]
fn test_concurrent_first_color_requests_agree() {
    let fx = Fixture::new("");
    let device = fx.registry.main_group().put_device(Device::new("shared"));

    let seen: Vec<i32> = thread::scope(|scope| {
        let handles: Vec<_> = (1..=8)
            .map(|default| {
                let device = Arc::clone(&device);
                scope.spawn(move || device.color(default * 10))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let assigned = device.user_color();
    assert!(seen.iter().all(|c| *c == assigned));
}
