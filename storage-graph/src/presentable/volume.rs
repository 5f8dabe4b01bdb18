//! Volume and free-space hole nodes.

use serde::{Deserialize, Serialize};
use storage_graph_types::{DeviceRecord, JobRecord};

/// What the content of a volume was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeUsage {
    Filesystem,
    LuksContainer,
    MdComponent,
    Lvm2PhysicalVolume,
    Unrecognized,
}

/// A concrete block of allocated space backed by a device: a partition, a
/// whole-disk filesystem, a LUKS container or its cleartext device, a RAID
/// component, or an LVM PV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub enclosing_id: String,
    pub device_id: String,
    pub name: String,
    pub vpd_name: String,
    pub description: String,
    pub icon_name: String,
    pub usage: VolumeUsage,
    pub offset: u64,
    pub size: u64,
    pub partition_number: Option<u32>,
    pub is_recognized: bool,
    pub job: Option<JobRecord>,
}

impl Volume {
    pub fn id_for_device(device_id: &str) -> String {
        format!("volume:{device_id}")
    }

    /// Builds the volume presentable wrapping `record`, enclosed by the
    /// presentable wrapping its parent device.
    pub fn from_record(record: &DeviceRecord, enclosing_id: String) -> Self {
        let usage = classify(record);
        let (offset, size, partition_number, label) = match &record.partition {
            Some(partition) => (
                partition.offset,
                partition.size,
                Some(partition.number),
                partition.label.clone(),
            ),
            None => (0, record.size, None, None),
        };

        let name = record
            .presentation_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| label.filter(|l| !l.is_empty()))
            .unwrap_or_else(|| match partition_number {
                Some(number) => format!("Partition {number}"),
                None => "Filesystem".to_string(),
            });

        let description = match usage {
            VolumeUsage::Filesystem => "Filesystem".to_string(),
            VolumeUsage::LuksContainer => "LUKS Encrypted".to_string(),
            VolumeUsage::MdComponent => match &record.md_component {
                Some(component) if !component.name.is_empty() => {
                    format!("RAID Component of {}", component.name)
                }
                _ => "RAID Component".to_string(),
            },
            VolumeUsage::Lvm2PhysicalVolume => match &record.lvm2_pv {
                Some(pv) if !pv.group_name.is_empty() => {
                    format!("LVM2 Physical Volume of {}", pv.group_name)
                }
                _ => "LVM2 Physical Volume".to_string(),
            },
            VolumeUsage::Unrecognized => "Unrecognized".to_string(),
        };

        let icon_name = record
            .presentation_icon_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                match usage {
                    VolumeUsage::LuksContainer => "drive-harddisk-encrypted",
                    _ => "drive-harddisk",
                }
                .to_string()
            });

        Self {
            id: Self::id_for_device(&record.id),
            enclosing_id,
            device_id: record.id.clone(),
            name,
            vpd_name: record.device_file.clone(),
            description,
            icon_name,
            usage,
            offset,
            size,
            partition_number,
            is_recognized: !matches!(usage, VolumeUsage::Unrecognized),
            job: record.job.clone(),
        }
    }
}

fn classify(record: &DeviceRecord) -> VolumeUsage {
    if record.is_luks {
        VolumeUsage::LuksContainer
    } else if record.is_linux_md_component {
        VolumeUsage::MdComponent
    } else if record.is_linux_lvm2_pv {
        VolumeUsage::Lvm2PhysicalVolume
    } else if record.is_recognized {
        VolumeUsage::Filesystem
    } else {
        VolumeUsage::Unrecognized
    }
}

/// Unallocated space inside a partition table. Exists only while the gap
/// genuinely exists; removed outright as soon as the space is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeHole {
    pub id: String,
    pub enclosing_id: String,
    pub offset: u64,
    pub size: u64,
}

impl VolumeHole {
    /// The id is derived from (parent, offset, size), so a hole that moves
    /// or shrinks is a different presentable.
    pub fn new(enclosing_id: &str, offset: u64, size: u64) -> Self {
        Self {
            id: format!("hole:{enclosing_id}@{offset}+{size}"),
            enclosing_id: enclosing_id.to_string(),
            offset,
            size,
        }
    }
}
