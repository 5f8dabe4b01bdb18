//! LVM2 volume group, logical volume and free-space nodes.
//!
//! Everything here is synthesized from the VG metadata replicated onto the
//! group's physical volumes. LVM writes the whole group description to
//! every PV with a monotonically increasing sequence number; the PV
//! carrying the highest sequence number is the authoritative source and
//! everything else is ignored until it vanishes.

use serde::{Deserialize, Serialize};
use storage_graph_types::{DeviceRecord, JobRecord, LvRecord, VgState};
use tracing::warn;

use super::machine::MACHINE_ID;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lvm2VolumeGroup {
    pub id: String,
    pub enclosing_id: String,
    pub uuid: String,
    pub name: String,
    pub size: u64,
    pub unallocated_size: u64,
    pub sequence_number: u64,
    /// Device id of the PV whose metadata snapshot we trusted. Part of the
    /// comparable state: switching authority must notify consumers even
    /// when nothing visible changed, because the LVs underneath were
    /// re-derived from a different snapshot.
    pub authoritative_pv_id: String,
    /// Device ids of all PVs referencing this group, id-sorted.
    pub pv_device_ids: Vec<String>,
    pub state: VgState,
}

impl Lvm2VolumeGroup {
    pub fn id_for_uuid(uuid: &str) -> String {
        format!("lvm2-vg:{uuid}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lvm2Volume {
    pub id: String,
    pub enclosing_id: String,
    pub uuid: String,
    pub name: String,
    pub size: u64,
    /// Ordering position within the group, from the metadata `position`
    /// key or accumulated from the sizes of preceding LVs.
    pub position: u64,
    /// Whether the metadata marks the LV active.
    pub active: bool,
    /// Backing block device, present only for an activated LV.
    pub device_id: Option<String>,
    pub job: Option<JobRecord>,
}

impl Lvm2Volume {
    pub fn id_for_uuid(uuid: &str) -> String {
        format!("lvm2-lv:{uuid}")
    }
}

/// Unallocated space in a volume group. LVM exposes only a single
/// unallocated total, so the id is derived from the parent alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lvm2VolumeHole {
    pub id: String,
    pub enclosing_id: String,
    pub size: u64,
}

impl Lvm2VolumeHole {
    pub fn new(vg_id: &str, size: u64) -> Self {
        Self {
            id: format!("lvm2-hole:{vg_id}"),
            enclosing_id: vg_id.to_string(),
            size,
        }
    }
}

/// Everything derived for one volume group in one synthesis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct VgSynthesis {
    pub group: Lvm2VolumeGroup,
    pub volumes: Vec<Lvm2Volume>,
    pub hole: Option<Lvm2VolumeHole>,
}

/// Synthesizes a volume group and its logical volumes from the PV records
/// referencing `group_uuid`.
///
/// `lv_device` resolves an LV uuid to the id of its backing block device,
/// when one exists; inactive LVs have none. Returns `None` when `pvs` is
/// empty (the group no longer has any justification to exist) or when no
/// PV carries usable metadata.
pub fn synthesize_vg(
    group_uuid: &str,
    pvs: &[&DeviceRecord],
    lv_device: impl Fn(&str) -> Option<String>,
    job_for_device: impl Fn(&str) -> Option<JobRecord>,
) -> Option<VgSynthesis> {
    // Highest sequence number wins; ties break on device id so replays in
    // any order pick the same authority.
    let (authoritative, metadata) = pvs
        .iter()
        .filter_map(|record| record.lvm2_pv.as_ref().map(|pv| (*record, pv)))
        .min_by_key(|(record, pv)| {
            (std::cmp::Reverse(pv.group_sequence_number), record.id.clone())
        })?;

    let vg_id = Lvm2VolumeGroup::id_for_uuid(group_uuid);

    let mut volumes = Vec::new();
    let mut accumulated = 0u64;
    for serialized in &metadata.group_logical_volumes {
        let Some(lv) = LvRecord::parse(serialized) else {
            warn!(group = %metadata.group_name, record = %serialized, "skipping malformed LV record");
            continue;
        };

        let device_id = lv_device(&lv.uuid);
        let job = device_id.as_deref().and_then(&job_for_device);
        volumes.push(Lvm2Volume {
            id: Lvm2Volume::id_for_uuid(&lv.uuid),
            enclosing_id: vg_id.clone(),
            uuid: lv.uuid,
            name: lv.name,
            size: lv.size,
            position: lv.position.unwrap_or(accumulated),
            active: lv.active,
            device_id,
            job,
        });
        accumulated += lv.size;
    }

    let backed = volumes.iter().filter(|lv| lv.device_id.is_some()).count();
    let state = if backed == 0 {
        VgState::NotRunning
    } else if backed == volumes.len() {
        VgState::Running
    } else {
        VgState::PartiallyRunning
    };

    let mut pv_device_ids: Vec<String> = pvs.iter().map(|record| record.id.clone()).collect();
    pv_device_ids.sort();

    let group = Lvm2VolumeGroup {
        id: vg_id.clone(),
        enclosing_id: MACHINE_ID.to_string(),
        uuid: group_uuid.to_string(),
        name: metadata.group_name.clone(),
        size: metadata.group_size,
        unallocated_size: metadata.group_unallocated_size,
        sequence_number: metadata.group_sequence_number,
        authoritative_pv_id: authoritative.id.clone(),
        pv_device_ids,
        state,
    };

    let hole = if metadata.group_unallocated_size > 0 {
        Some(Lvm2VolumeHole::new(&vg_id, metadata.group_unallocated_size))
    } else {
        None
    };

    Some(VgSynthesis {
        group,
        volumes,
        hole,
    })
}
