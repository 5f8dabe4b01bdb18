//! Graph-wide properties: coldplug determinism, deduplication, hole
//! conservation, change suppression, and the basic partition scenario.

mod common;

use common::{
    adapter, drive, expander, luks_cleartext, luks_container, md_component, partition, pv,
};
use storage_graph::events::PoolEvent;
use storage_graph::pool::Pool;
use storage_graph_types::DeviceRecord;

/// Snapshot of a pool's structure for equality comparison: (id, parent)
/// pairs in display order.
fn structure(pool: &Pool) -> Vec<(String, Option<String>)> {
    pool.sorted_presentables()
        .iter()
        .map(|p| (p.id().to_string(), p.enclosing_id().map(str::to_string)))
        .collect()
}

fn fixture() -> Vec<DeviceRecord> {
    vec![
        drive("/devices/sda", 100),
        partition("/devices/sda1", "/devices/sda", 1, 0, 40),
        partition("/devices/sda2", "/devices/sda", 2, 40, 30),
        md_component("/devices/sdb1", "array-1", "raid1", 2, 500),
        md_component("/devices/sdc1", "array-1", "raid1", 2, 500),
        pv(
            "/devices/sdd1",
            "vg-1",
            "vg0",
            3,
            1000,
            0,
            &["uuid=lv-1;name=root;size=600", "uuid=lv-2;name=home;size=400"],
        ),
    ]
}

#[test]
fn coldplug_converges_regardless_of_order() {
    let records = fixture();

    let mut forward = Pool::new();
    forward.coldplug(records.clone());

    let mut reverse = Pool::new();
    let mut reversed = records.clone();
    reversed.reverse();
    reverse.coldplug(reversed);

    // One event at a time, children before parents.
    let mut one_by_one = Pool::new();
    let mut shuffled = records;
    shuffled.rotate_left(3);
    for record in shuffled {
        one_by_one.device_added(record);
    }

    let expected = structure(&forward);
    assert_eq!(structure(&reverse), expected);
    assert_eq!(structure(&one_by_one), expected);
}

#[test]
fn duplicate_adds_never_duplicate_presentables() {
    let mut pool = Pool::new();
    pool.device_added(drive("/devices/sda", 100));
    pool.device_added(drive("/devices/sda", 100));

    let drives = pool
        .presentables()
        .filter(|p| p.id() == "drive:/devices/sda")
        .count();
    assert_eq!(drives, 1);
}

#[test]
fn hole_tracks_uncovered_space_exactly() {
    let mut pool = Pool::new();
    pool.device_added(drive("/devices/sda", 100));
    pool.device_added(partition("/devices/sda1", "/devices/sda", 1, 0, 40));

    let holes: Vec<_> = pool
        .presentables()
        .filter(|p| !p.is_allocated())
        .collect();
    assert_eq!(holes.len(), 1);
    assert_eq!(holes[0].offset(), 40);
    assert_eq!(holes[0].size(), 60);
    assert_eq!(holes[0].enclosing_id(), Some("drive:/devices/sda"));

    // Consume the space; the hole must be removed, not hidden.
    pool.device_added(partition("/devices/sda2", "/devices/sda", 2, 40, 60));
    assert_eq!(pool.presentables().filter(|p| !p.is_allocated()).count(), 0);
}

#[test]
fn end_to_end_partition_scenario() {
    let mut pool = Pool::new();
    let mut events = pool.subscribe();

    pool.device_added(drive("/devices/sda", 100));
    pool.device_added(partition("/devices/sda1", "/devices/sda", 1, 0, 40));

    let mut ids: Vec<String> = pool
        .presentables()
        .map(|p| p.id().to_string())
        .filter(|id| id != "machine:root")
        .collect();
    ids.sort();
    assert_eq!(
        ids,
        vec![
            "drive:/devices/sda",
            "hole:drive:/devices/sda@40+60",
            "volume:/devices/sda1",
        ]
    );

    events.drain();
    pool.device_added(partition("/devices/sda2", "/devices/sda", 2, 40, 60));

    let seen = events.drain();
    assert!(seen.iter().any(
        |e| matches!(e, PoolEvent::Removed(id) if id == "hole:drive:/devices/sda@40+60")
    ));
    assert!(
        seen.iter()
            .any(|e| matches!(e, PoolEvent::Added(p) if p.id() == "volume:/devices/sda2"))
    );

    let mut ids: Vec<String> = pool
        .presentables()
        .map(|p| p.id().to_string())
        .filter(|id| id != "machine:root")
        .collect();
    ids.sort();
    assert_eq!(
        ids,
        vec![
            "drive:/devices/sda",
            "volume:/devices/sda1",
            "volume:/devices/sda2",
        ]
    );
}

#[test]
fn unchanged_records_emit_nothing() {
    let mut pool = Pool::new();
    pool.coldplug(fixture());

    let mut events = pool.subscribe();
    for record in fixture() {
        pool.device_changed(record);
    }

    assert_eq!(events.drain(), Vec::new());
}

#[test]
fn added_events_announce_parents_before_children() {
    let mut pool = Pool::new();
    let mut events = pool.subscribe();

    // Child first on purpose; the pass still announces parent-first.
    pool.coldplug(vec![
        partition("/devices/sda1", "/devices/sda", 1, 0, 100),
        drive("/devices/sda", 100),
    ]);

    let order: Vec<String> = events
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            PoolEvent::Added(p) => Some(p.id().to_string()),
            _ => None,
        })
        .collect();

    let drive_at = order.iter().position(|id| id == "drive:/devices/sda");
    let volume_at = order.iter().position(|id| id == "volume:/devices/sda1");
    assert!(drive_at.unwrap() < volume_at.unwrap());
}

#[test]
fn luks_cleartext_nests_under_its_container_volume() {
    let mut pool = Pool::new();
    pool.device_added(drive("/devices/sda", 100));
    pool.device_added(luks_container("/devices/sda1", "/devices/sda", 1, 0, 100));
    pool.device_added(luks_cleartext("/devices/dm-1", "/devices/sda1", 98));

    let container = pool
        .get_by_id("volume:/devices/sda1")
        .expect("container volume");
    assert!(container.is_recognized());

    let cleartext = pool
        .get_by_id("volume:/devices/dm-1")
        .expect("cleartext volume");
    assert_eq!(cleartext.enclosing_id(), Some("volume:/devices/sda1"));
    assert!(pool.encloses("drive:/devices/sda", "volume:/devices/dm-1"));
}

#[test]
fn luks_cleartext_without_its_container_parks_then_heals() {
    let mut pool = Pool::new();
    pool.device_added(luks_cleartext("/devices/dm-1", "/devices/sda1", 98));

    let cleartext = pool.get_by_id("volume:/devices/dm-1").expect("exists");
    assert_eq!(cleartext.enclosing_id(), Some("machine:root"));

    let mut events = pool.subscribe();
    pool.device_added(drive("/devices/sda", 100));
    pool.device_added(luks_container("/devices/sda1", "/devices/sda", 1, 0, 100));

    let cleartext = pool.get_by_id("volume:/devices/dm-1").expect("exists");
    assert_eq!(cleartext.enclosing_id(), Some("volume:/devices/sda1"));
    assert!(events.drain().iter().any(
        |e| matches!(e, PoolEvent::Changed(p) if p.id() == "volume:/devices/dm-1")
    ));
}

#[test]
fn drives_prefer_their_expander_hub_over_the_adapter() {
    let mut sda = drive("/devices/sda", 100);
    {
        let detail = sda.drive.as_mut().unwrap();
        detail.adapter = Some("/devices/host0".to_string());
        detail.expander = Some("/devices/expander0".to_string());
    }

    let mut pool = Pool::new();
    pool.coldplug(vec![
        adapter("/devices/host0", "ata_sata"),
        expander("/devices/expander0", "scsi_sas", "/devices/host0"),
        sda,
    ]);

    let drive_node = pool.get_by_id("drive:/devices/sda").expect("drive");
    assert_eq!(drive_node.enclosing_id(), Some("hub:/devices/expander0"));
    assert_eq!(
        pool.get_by_id("hub:/devices/expander0").unwrap().enclosing_id(),
        Some("hub:/devices/host0")
    );
    assert_eq!(
        pool.get_by_id("hub:/devices/host0").unwrap().enclosing_id(),
        Some("machine:root")
    );

    // Expander vanishes: the drive falls back to the adapter hub.
    pool.device_removed("/devices/expander0");
    assert!(pool.get_by_id("hub:/devices/expander0").is_none());
    let drive_node = pool.get_by_id("drive:/devices/sda").expect("drive");
    assert_eq!(drive_node.enclosing_id(), Some("hub:/devices/host0"));

    // Adapter too: machine root is the last resort.
    pool.device_removed("/devices/host0");
    let drive_node = pool.get_by_id("drive:/devices/sda").expect("drive");
    assert_eq!(drive_node.enclosing_id(), Some("machine:root"));
}

#[test]
fn orphaned_partition_heals_when_its_drive_arrives() {
    let mut pool = Pool::new();
    pool.device_added(partition("/devices/sda1", "/devices/sda", 1, 0, 40));

    let volume = pool.get_by_id("volume:/devices/sda1").expect("exists");
    assert_eq!(volume.enclosing_id(), Some("machine:root"));

    let mut events = pool.subscribe();
    pool.device_added(drive("/devices/sda", 100));

    let volume = pool.get_by_id("volume:/devices/sda1").expect("exists");
    assert_eq!(volume.enclosing_id(), Some("drive:/devices/sda"));
    assert!(events.drain().iter().any(
        |e| matches!(e, PoolEvent::Changed(p) if p.id() == "volume:/devices/sda1")
    ));
}
