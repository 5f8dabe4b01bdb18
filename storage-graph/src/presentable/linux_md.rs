//! Linux MD (software RAID) array nodes.
//!
//! A [`LinuxMdDrive`] is synthesized from the set of component records
//! sharing an array UUID plus, when the array is assembled, the record of
//! the array device itself. It exists as soon as any component referencing
//! the UUID is known, even with zero activatable members, and disappears
//! only when the last one does.

use serde::{Deserialize, Serialize};
use storage_graph_types::{DeviceRecord, JobRecord, RaidLevel};

use super::machine::MACHINE_ID;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinuxMdDrive {
    pub id: String,
    pub enclosing_id: String,
    pub uuid: String,
    pub level: RaidLevel,
    pub array_name: String,
    /// Number of devices the array was configured with.
    pub num_raid_devices: u32,
    /// Component device ids currently known, id-sorted.
    pub component_ids: Vec<String>,
    /// Device id of the assembled array device, absent while stopped.
    pub array_device_id: Option<String>,
    pub size: u64,
    pub is_running: bool,
    pub is_degraded: bool,
    pub can_activate: bool,
    pub sync_action: String,
    pub job: Option<JobRecord>,
}

impl LinuxMdDrive {
    pub fn id_for_uuid(uuid: &str) -> String {
        format!("mdraid:{uuid}")
    }

    /// Synthesizes the array presentable from its component records and the
    /// assembled array record, if any. `components` must all share `uuid`;
    /// at least one of `components`/`array` must be non-empty, which is the
    /// existence rule for the presentable itself.
    pub fn synthesize(
        uuid: &str,
        components: &[&DeviceRecord],
        array: Option<&DeviceRecord>,
    ) -> Self {
        let array_detail = array.and_then(|record| record.md_array.as_ref());

        let level_str = array_detail
            .map(|detail| detail.level.clone())
            .or_else(|| {
                components
                    .iter()
                    .filter_map(|record| record.md_component.as_ref())
                    .map(|component| component.level.clone())
                    .next()
            })
            .unwrap_or_default();
        let level = RaidLevel::parse(&level_str);

        let array_name = array_detail
            .map(|detail| detail.name.clone())
            .or_else(|| {
                components
                    .iter()
                    .filter_map(|record| record.md_component.as_ref())
                    .map(|component| component.name.clone())
                    .find(|name| !name.is_empty())
            })
            .unwrap_or_default();

        let num_raid_devices = array_detail
            .map(|detail| detail.num_raid_devices)
            .or_else(|| {
                components
                    .iter()
                    .filter_map(|record| record.md_component.as_ref())
                    .map(|component| component.num_raid_devices)
                    .max()
            })
            .unwrap_or(0);

        let mut component_ids: Vec<String> =
            components.iter().map(|record| record.id.clone()).collect();
        component_ids.sort();

        let surviving = component_ids.len() as u32;
        let can_activate = num_raid_devices > 0
            && surviving >= level.min_members_to_activate(num_raid_devices);
        let is_degraded = array_detail
            .map(|detail| detail.is_degraded)
            .unwrap_or(surviving < num_raid_devices);

        // Assembled arrays report their real size; otherwise estimate from
        // a component, which is unknowable (zero) for striped levels.
        let size = match array {
            Some(record) => record.size,
            None => {
                let component_size = components.first().map(|record| record.size).unwrap_or(0);
                level.array_size(component_size, num_raid_devices)
            }
        };

        let job = array
            .and_then(|record| record.job.clone())
            .or_else(|| components.iter().find_map(|record| record.job.clone()));

        Self {
            id: Self::id_for_uuid(uuid),
            enclosing_id: MACHINE_ID.to_string(),
            uuid: uuid.to_string(),
            level,
            array_name,
            num_raid_devices,
            component_ids,
            array_device_id: array.map(|record| record.id.clone()),
            size,
            is_running: array.is_some(),
            is_degraded,
            can_activate,
            sync_action: array_detail
                .map(|detail| detail.sync_action.clone())
                .unwrap_or_default(),
            job,
        }
    }

    pub fn name(&self) -> String {
        if self.array_name.is_empty() {
            self.level.describe()
        } else {
            self.array_name.clone()
        }
    }

    pub fn vpd_name(&self) -> String {
        format!("Linux MD {}", self.uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_graph_types::{MdArrayRecord, MdComponentRecord};

    fn component(id: &str, uuid: &str, level: &str, num: u32, size: u64) -> DeviceRecord {
        DeviceRecord {
            id: id.to_string(),
            size,
            is_linux_md_component: true,
            md_component: Some(MdComponentRecord {
                level: level.to_string(),
                uuid: uuid.to_string(),
                num_raid_devices: num,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn raid5_with_one_missing_member_is_degraded_but_startable() {
        let a = component("/devices/sdb1", "u1", "raid5", 4, 1000);
        let b = component("/devices/sdc1", "u1", "raid5", 4, 1000);
        let c = component("/devices/sdd1", "u1", "raid5", 4, 1000);

        let array = LinuxMdDrive::synthesize("u1", &[&a, &b, &c], None);
        assert!(array.can_activate);
        assert!(array.is_degraded);
        assert_eq!(array.size, 750);
    }

    #[test]
    fn raid5_with_two_missing_members_cannot_start() {
        let a = component("/devices/sdb1", "u1", "raid5", 4, 1000);
        let b = component("/devices/sdc1", "u1", "raid5", 4, 1000);

        let array = LinuxMdDrive::synthesize("u1", &[&a, &b], None);
        assert!(!array.can_activate);
        assert!(array.is_degraded);
    }

    #[test]
    fn striped_levels_have_unknown_size_until_assembled() {
        let a = component("/devices/sdb1", "u2", "raid0", 2, 1000);
        let b = component("/devices/sdc1", "u2", "raid0", 2, 1000);

        let stopped = LinuxMdDrive::synthesize("u2", &[&a, &b], None);
        assert_eq!(stopped.size, 0);
        assert!(stopped.can_activate);

        let array_record = DeviceRecord {
            id: "/devices/md0".to_string(),
            size: 2000,
            is_linux_md: true,
            md_array: Some(MdArrayRecord {
                uuid: "u2".to_string(),
                level: "raid0".to_string(),
                num_raid_devices: 2,
                ..Default::default()
            }),
            ..Default::default()
        };

        let running = LinuxMdDrive::synthesize("u2", &[&a, &b], Some(&array_record));
        assert_eq!(running.size, 2000);
        assert!(running.is_running);
        assert_eq!(running.array_device_id.as_deref(), Some("/devices/md0"));
    }

    #[test]
    fn array_exists_from_a_single_component() {
        let a = component("/devices/sdb1", "u3", "raid1", 2, 500);
        let array = LinuxMdDrive::synthesize("u3", &[&a], None);

        assert_eq!(array.component_ids, vec!["/devices/sdb1"]);
        assert!(array.can_activate); // raid1 starts with one member
        assert!(array.is_degraded);
        assert_eq!(array.size, 500);
    }

    #[test]
    fn raid10_threshold_is_the_half_count_heuristic() {
        let a = component("/devices/sdb1", "u4", "raid10", 4, 1000);
        let b = component("/devices/sdc1", "u4", "raid10", 4, 1000);

        let array = LinuxMdDrive::synthesize("u4", &[&a, &b], None);
        assert!(array.can_activate);

        let alone = LinuxMdDrive::synthesize("u4", &[&a], None);
        assert!(!alone.can_activate);
    }
}
