//! Synthesis rules: pure derivation of the desired presentable set from
//! the current device record cache.
//!
//! Each rule answers "should this presentable exist, and with what derived
//! attributes" for one kind. The whole set is rebuilt on every cache
//! mutation and diffed against the live graph by the pool; because the
//! rules are pure functions of the cache, replaying device events in any
//! order converges to the same graph, and re-running a rule against an
//! unchanged cache is attribute-identical (which is what makes change
//! suppression safe).

use std::collections::{BTreeMap, BTreeSet};

use storage_graph_types::DeviceRecord;
use tracing::{debug, error, warn};

use crate::cache::DeviceRecordCache;
use crate::presentable::{
    Drive, Hub, LinuxMdDrive, Lvm2Volume, Machine, Presentable, Volume, VolumeHole,
    lvm::synthesize_vg,
    machine::MACHINE_ID,
};

/// Builds the full desired presentable set, keyed by presentable id.
pub(crate) fn desired_set(cache: &DeviceRecordCache) -> BTreeMap<String, Presentable> {
    let mut desired = BTreeMap::new();

    insert(&mut desired, Presentable::Machine(Machine::new()));

    synthesize_hubs(cache, &mut desired);
    synthesize_drives(cache, &mut desired);
    synthesize_md_arrays(cache, &mut desired);
    synthesize_volume_groups(cache, &mut desired);
    synthesize_volumes(cache, &mut desired);
    synthesize_holes(cache, &mut desired);

    desired
}

/// Duplicate ids are a synthesis-rule bug: fail fast in development,
/// coalesce loudly to the first-seen instance in release.
fn insert(desired: &mut BTreeMap<String, Presentable>, presentable: Presentable) {
    let id = presentable.id().to_string();
    if desired.contains_key(&id) {
        debug_assert!(false, "duplicate presentable id: {id}");
        error!(%id, "synthesis produced a duplicate presentable id; keeping first instance");
        return;
    }
    desired.insert(id, presentable);
}

fn synthesize_hubs(cache: &DeviceRecordCache, desired: &mut BTreeMap<String, Presentable>) {
    for record in cache.all() {
        if let Some(hub) = Hub::from_adapter(record) {
            insert(desired, Presentable::Hub(hub));
        } else if let Some(hub) = Hub::from_expander(record) {
            insert(desired, Presentable::Hub(hub));
        }
    }
}

fn synthesize_drives(cache: &DeviceRecordCache, desired: &mut BTreeMap<String, Presentable>) {
    for record in cache.all() {
        if !record.is_drive || record.is_hub() {
            continue;
        }
        // Assembled MD arrays and activated LVs present as their synthetic
        // kinds, not as plain drives.
        if record.is_linux_md || record.is_linux_lvm2_lv {
            continue;
        }

        let enclosing_id = drive_enclosure(cache, record);
        insert(
            desired,
            Presentable::Drive(Drive::from_record(record, enclosing_id)),
        );
    }
}

/// A drive hangs off its expander's hub when one is known, else its
/// adapter's hub, else the machine root.
fn drive_enclosure(cache: &DeviceRecordCache, record: &DeviceRecord) -> String {
    let detail = match &record.drive {
        Some(detail) => detail,
        None => return MACHINE_ID.to_string(),
    };

    if let Some(expander_id) = &detail.expander
        && cache.get(expander_id).is_some_and(DeviceRecord::is_hub)
    {
        return Hub::id_for_device(expander_id);
    }
    if let Some(adapter_id) = &detail.adapter
        && cache.get(adapter_id).is_some_and(DeviceRecord::is_hub)
    {
        return Hub::id_for_device(adapter_id);
    }

    MACHINE_ID.to_string()
}

fn synthesize_md_arrays(cache: &DeviceRecordCache, desired: &mut BTreeMap<String, Presentable>) {
    // An array presentable exists as soon as anything references its UUID:
    // a component superblock or the assembled array device itself.
    let mut uuids = BTreeSet::new();
    for record in cache.all() {
        if let Some(component) = record.md_component.as_ref()
            && record.is_linux_md_component
            && !component.uuid.is_empty()
        {
            uuids.insert(component.uuid.clone());
        }
        if let Some(array) = record.md_array.as_ref()
            && record.is_linux_md
            && !array.uuid.is_empty()
        {
            uuids.insert(array.uuid.clone());
        }
    }

    for uuid in uuids {
        let components: Vec<&DeviceRecord> = cache
            .all()
            .filter(|record| {
                record.is_linux_md_component
                    && record
                        .md_component
                        .as_ref()
                        .is_some_and(|component| component.uuid == uuid)
            })
            .collect();
        let array = cache.all().find(|record| {
            record.is_linux_md
                && record
                    .md_array
                    .as_ref()
                    .is_some_and(|detail| detail.uuid == uuid)
        });

        debug!(%uuid, components = components.len(), assembled = array.is_some(), "synthesizing md array");
        insert(
            desired,
            Presentable::LinuxMdDrive(LinuxMdDrive::synthesize(&uuid, &components, array)),
        );
    }
}

fn synthesize_volume_groups(
    cache: &DeviceRecordCache,
    desired: &mut BTreeMap<String, Presentable>,
) {
    // LV uuid -> backing device id, for VG run-state derivation.
    let mut lv_devices = BTreeMap::new();
    for record in cache.all() {
        if record.is_linux_lvm2_lv
            && let Some(lv) = record.lvm2_lv.as_ref()
        {
            lv_devices.insert(lv.uuid.clone(), record.id.clone());
        }
    }

    let mut group_uuids = BTreeSet::new();
    for record in cache.all() {
        if record.is_linux_lvm2_pv
            && let Some(pv) = record.lvm2_pv.as_ref()
            && !pv.group_uuid.is_empty()
        {
            group_uuids.insert(pv.group_uuid.clone());
        }
    }

    for group_uuid in group_uuids {
        let pvs: Vec<&DeviceRecord> = cache
            .all()
            .filter(|record| {
                record.is_linux_lvm2_pv
                    && record
                        .lvm2_pv
                        .as_ref()
                        .is_some_and(|pv| pv.group_uuid == group_uuid)
            })
            .collect();

        let Some(synthesis) = synthesize_vg(
            &group_uuid,
            &pvs,
            |lv_uuid| lv_devices.get(lv_uuid).cloned(),
            |device_id| cache.get(device_id).and_then(|record| record.job.clone()),
        ) else {
            continue;
        };

        debug!(group = %synthesis.group.name, state = ?synthesis.group.state, "synthesizing volume group");
        insert(desired, Presentable::Lvm2VolumeGroup(synthesis.group));
        for volume in synthesis.volumes {
            insert(desired, Presentable::Lvm2Volume(volume));
        }
        if let Some(hole) = synthesis.hole {
            insert(desired, Presentable::Lvm2VolumeHole(hole));
        }
    }
}

fn synthesize_volumes(cache: &DeviceRecordCache, desired: &mut BTreeMap<String, Presentable>) {
    for record in cache.all() {
        // Activated LV block devices are already presented as Lvm2Volume.
        if record.is_linux_lvm2_lv || record.is_hub() {
            continue;
        }

        if record.is_partition {
            let enclosing_id = match &record.partition {
                Some(partition) => enclosure_for_slave(cache, &partition.slave, &record.id),
                None => orphan_enclosure(&record.id, "partition record missing geometry"),
            };
            insert(
                desired,
                Presentable::Volume(Volume::from_record(record, enclosing_id)),
            );
            continue;
        }

        if record.is_luks_cleartext {
            let enclosing_id = match &record.luks_cleartext_slave {
                Some(slave) if cache.contains(slave) => Volume::id_for_device(slave),
                _ => orphan_enclosure(&record.id, "LUKS container not in cache"),
            };
            insert(
                desired,
                Presentable::Volume(Volume::from_record(record, enclosing_id)),
            );
            continue;
        }

        // Whole-device content: a filesystem, LUKS container, PV or RAID
        // component living directly on an unpartitioned device.
        let has_content = record.is_recognized
            || record.is_luks
            || record.is_linux_lvm2_pv
            || record.is_linux_md_component;
        if has_content && !record.is_partition_table && record.is_media_available {
            if record.is_drive {
                let enclosing_id = Drive::id_for_device(&record.id);
                insert(
                    desired,
                    Presentable::Volume(Volume::from_record(record, enclosing_id)),
                );
            } else if record.is_linux_md {
                // Filesystem directly on an assembled array.
                let enclosing_id = record
                    .md_array
                    .as_ref()
                    .map(|detail| LinuxMdDrive::id_for_uuid(&detail.uuid))
                    .unwrap_or_else(|| orphan_enclosure(&record.id, "array record incomplete"));
                insert(
                    desired,
                    Presentable::Volume(Volume::from_record(record, enclosing_id)),
                );
            }
        }
    }
}

/// Resolves the id of the presentable wrapping the device `record` itself.
/// Used both for the parent of partitions on the device and for the parent
/// of its free-space holes, so the two can never diverge. `None` when the
/// record claims a synthetic kind but lacks the detail to name it.
fn wrapper_id_for_record(record: &DeviceRecord) -> Option<String> {
    if record.is_linux_md {
        return record
            .md_array
            .as_ref()
            .map(|detail| LinuxMdDrive::id_for_uuid(&detail.uuid));
    }
    if record.is_linux_lvm2_lv {
        return record
            .lvm2_lv
            .as_ref()
            .map(|lv| Lvm2Volume::id_for_uuid(&lv.uuid));
    }
    if record.is_drive {
        return Some(Drive::id_for_device(&record.id));
    }

    // Partition table nested inside another volume (e.g. a loop device or
    // an unlocked LUKS device carrying a table).
    Some(Volume::id_for_device(&record.id))
}

/// Resolves the presentable id wrapping `slave`, the device a partition
/// lives on.
fn enclosure_for_slave(cache: &DeviceRecordCache, slave: &str, orphan: &str) -> String {
    match cache.get(slave).and_then(wrapper_id_for_record) {
        Some(id) => id,
        None => orphan_enclosure(orphan, "parent device not resolvable"),
    }
}

/// Transient inconsistency: park the node under the machine root and let a
/// later pass re-point it once the missing parent arrives.
fn orphan_enclosure(device_id: &str, reason: &str) -> String {
    warn!(device = %device_id, reason, "presentable temporarily orphaned; will re-resolve");
    MACHINE_ID.to_string()
}

fn synthesize_holes(cache: &DeviceRecordCache, desired: &mut BTreeMap<String, Presentable>) {
    for record in cache.all() {
        if !record.is_partition_table || !record.is_media_available || record.size == 0 {
            continue;
        }

        let Some(parent_id) = wrapper_id_for_record(record) else {
            continue;
        };

        for hole in holes_for_table(cache, record) {
            insert(
                desired,
                Presentable::VolumeHole(VolumeHole::new(&parent_id, hole.0, hole.1)),
            );
        }
    }
}

/// Gaps not covered by any partition on `table`, as (offset, size) pairs.
fn holes_for_table(cache: &DeviceRecordCache, table: &DeviceRecord) -> Vec<(u64, u64)> {
    let mut partitions: Vec<(u64, u64)> = cache
        .all()
        .filter_map(|record| {
            let partition = record.partition.as_ref()?;
            (record.is_partition && partition.slave == table.id)
                .then_some((partition.offset, partition.size))
        })
        .collect();
    partitions.sort_unstable();

    let mut holes = Vec::new();
    let mut cursor = 0u64;
    for (offset, size) in partitions {
        if offset > cursor {
            holes.push((cursor, offset - cursor));
        }
        cursor = cursor.max(offset.saturating_add(size));
    }
    if cursor < table.size {
        holes.push((cursor, table.size - cursor));
    }

    holes
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_graph_types::{
        Lvm2LvRecord, Lvm2PvRecord, PartitionRecord, PartitionTableRecord,
    };

    fn drive(id: &str, size: u64) -> DeviceRecord {
        DeviceRecord {
            id: id.to_string(),
            device_file: format!("/dev/{}", id.rsplit('/').next().unwrap_or(id)),
            size,
            is_drive: true,
            is_partition_table: true,
            is_media_available: true,
            partition_table: Some(PartitionTableRecord {
                scheme: "gpt".to_string(),
                count: 0,
            }),
            ..Default::default()
        }
    }

    fn partition(id: &str, slave: &str, number: u32, offset: u64, size: u64) -> DeviceRecord {
        DeviceRecord {
            id: id.to_string(),
            size,
            is_partition: true,
            is_recognized: true,
            is_media_available: true,
            partition: Some(PartitionRecord {
                slave: slave.to_string(),
                number,
                offset,
                size,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn empty_cache_yields_only_the_machine() {
        let cache = DeviceRecordCache::new();
        let desired = desired_set(&cache);
        assert_eq!(desired.len(), 1);
        assert!(desired.contains_key(MACHINE_ID));
    }

    #[test]
    fn gap_math_covers_leading_middle_and_trailing_holes() {
        let mut cache = DeviceRecordCache::new();
        cache.upsert(drive("/devices/sda", 100));
        cache.upsert(partition("/devices/sda2", "/devices/sda", 2, 50, 20));

        let holes = holes_for_table(&cache, cache.get("/devices/sda").unwrap());
        assert_eq!(holes, vec![(0, 50), (70, 30)]);
    }

    #[test]
    fn fully_covered_table_has_no_holes() {
        let mut cache = DeviceRecordCache::new();
        cache.upsert(drive("/devices/sda", 100));
        cache.upsert(partition("/devices/sda1", "/devices/sda", 1, 0, 40));
        cache.upsert(partition("/devices/sda2", "/devices/sda", 2, 40, 60));

        let holes = holes_for_table(&cache, cache.get("/devices/sda").unwrap());
        assert!(holes.is_empty());
    }

    #[test]
    fn lv_table_holes_nest_under_the_lv_presentable() {
        let mut cache = DeviceRecordCache::new();
        cache.upsert(DeviceRecord {
            id: "/devices/sdb1".to_string(),
            is_linux_lvm2_pv: true,
            lvm2_pv: Some(Lvm2PvRecord {
                group_uuid: "vg-1".to_string(),
                group_name: "vg0".to_string(),
                group_size: 1000,
                group_sequence_number: 3,
                group_logical_volumes: vec!["uuid=lv-1;name=root;size=600".to_string()],
                ..Default::default()
            }),
            ..Default::default()
        });
        // Activated LV carrying its own (empty) partition table.
        cache.upsert(DeviceRecord {
            id: "/devices/dm-0".to_string(),
            device_file: "/dev/dm-0".to_string(),
            size: 600,
            is_linux_lvm2_lv: true,
            is_partition_table: true,
            is_media_available: true,
            partition_table: Some(PartitionTableRecord {
                scheme: "gpt".to_string(),
                count: 0,
            }),
            lvm2_lv: Some(Lvm2LvRecord {
                uuid: "lv-1".to_string(),
                group_uuid: "vg-1".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });

        let desired = desired_set(&cache);
        // The hole's parent is the Lvm2Volume node, the same parent a
        // partition on this table would get, and it exists in the set.
        let hole = desired
            .get("hole:lvm2-lv:lv-1@0+600")
            .expect("hole under the lv");
        assert_eq!(hole.enclosing_id(), Some("lvm2-lv:lv-1"));
        assert!(desired.contains_key("lvm2-lv:lv-1"));
    }

    #[test]
    fn partition_with_missing_parent_is_parked_under_machine() {
        let mut cache = DeviceRecordCache::new();
        cache.upsert(partition("/devices/sda1", "/devices/sda", 1, 0, 40));

        let desired = desired_set(&cache);
        let volume = desired
            .get("volume:/devices/sda1")
            .expect("volume synthesized despite missing parent");
        assert_eq!(volume.enclosing_id(), Some(MACHINE_ID));

        // Parent arrives; the orphan is re-pointed on the next pass.
        cache.upsert(drive("/devices/sda", 100));
        let desired = desired_set(&cache);
        let volume = desired.get("volume:/devices/sda1").unwrap();
        assert_eq!(volume.enclosing_id(), Some("drive:/devices/sda"));
    }
}
