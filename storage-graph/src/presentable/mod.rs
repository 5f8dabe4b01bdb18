//! The presentable node model.
//!
//! A [`Presentable`] is one user-actionable node in the storage hierarchy.
//! The set of kinds is closed; shared behavior is a match over the variants
//! rather than trait dispatch, so adding a kind forces every accessor to be
//! revisited.
//!
//! Parent links are stored as ids and resolved through the pool on demand;
//! they are routinely stale during partial rebuilds and must never be
//! owning references.

pub mod drive;
pub mod hub;
pub mod linux_md;
pub mod lvm;
pub mod machine;
pub mod volume;

pub use drive::Drive;
pub use hub::Hub;
pub use linux_md::LinuxMdDrive;
pub use lvm::{Lvm2Volume, Lvm2VolumeGroup, Lvm2VolumeHole};
pub use machine::Machine;
pub use volume::{Volume, VolumeHole, VolumeUsage};

use serde::{Deserialize, Serialize};
use storage_graph_types::JobRecord;

/// One node in the presentable graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Presentable {
    Machine(Machine),
    Hub(Hub),
    Drive(Drive),
    Volume(Volume),
    VolumeHole(VolumeHole),
    LinuxMdDrive(LinuxMdDrive),
    Lvm2VolumeGroup(Lvm2VolumeGroup),
    Lvm2Volume(Lvm2Volume),
    Lvm2VolumeHole(Lvm2VolumeHole),
}

impl Presentable {
    /// Stable id, unique within a pool. Computed from underlying device
    /// identity, never from display names.
    pub fn id(&self) -> &str {
        match self {
            Self::Machine(p) => &p.id,
            Self::Hub(p) => &p.id,
            Self::Drive(p) => &p.id,
            Self::Volume(p) => &p.id,
            Self::VolumeHole(p) => &p.id,
            Self::LinuxMdDrive(p) => &p.id,
            Self::Lvm2VolumeGroup(p) => &p.id,
            Self::Lvm2Volume(p) => &p.id,
            Self::Lvm2VolumeHole(p) => &p.id,
        }
    }

    /// Id of the enclosing presentable; `None` only for the machine root.
    pub fn enclosing_id(&self) -> Option<&str> {
        match self {
            Self::Machine(_) => None,
            Self::Hub(p) => Some(&p.enclosing_id),
            Self::Drive(p) => Some(&p.enclosing_id),
            Self::Volume(p) => Some(&p.enclosing_id),
            Self::VolumeHole(p) => Some(&p.enclosing_id),
            Self::LinuxMdDrive(p) => Some(&p.enclosing_id),
            Self::Lvm2VolumeGroup(p) => Some(&p.enclosing_id),
            Self::Lvm2Volume(p) => Some(&p.enclosing_id),
            Self::Lvm2VolumeHole(p) => Some(&p.enclosing_id),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Machine(_) => "Local Storage".to_string(),
            Self::Hub(p) => p.name.clone(),
            Self::Drive(p) => p.name.clone(),
            Self::Volume(p) => p.name.clone(),
            Self::VolumeHole(_) | Self::Lvm2VolumeHole(_) => "Free Space".to_string(),
            Self::LinuxMdDrive(p) => p.name(),
            Self::Lvm2VolumeGroup(p) => p.name.clone(),
            Self::Lvm2Volume(p) => p.name.clone(),
        }
    }

    /// Vital-product-data style name: vendor/model for hardware, array or
    /// group naming for synthetics.
    pub fn vpd_name(&self) -> String {
        match self {
            Self::Machine(_) => String::new(),
            Self::Hub(p) => p.vpd_name.clone(),
            Self::Drive(p) => p.vpd_name.clone(),
            Self::Volume(p) => p.vpd_name.clone(),
            Self::VolumeHole(_) | Self::Lvm2VolumeHole(_) => String::new(),
            Self::LinuxMdDrive(p) => p.vpd_name(),
            Self::Lvm2VolumeGroup(p) => format!("LVM2 VG {}", p.name),
            Self::Lvm2Volume(p) => format!("LVM2 LV {}", p.name),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Self::Machine(_) => "Storage attached to this machine".to_string(),
            Self::Hub(p) => p.description.clone(),
            Self::Drive(p) => p.description.clone(),
            Self::Volume(p) => p.description.clone(),
            Self::VolumeHole(_) => "Unallocated space".to_string(),
            Self::Lvm2VolumeHole(_) => "Unallocated space in volume group".to_string(),
            Self::LinuxMdDrive(p) => p.level.describe(),
            Self::Lvm2VolumeGroup(_) => "LVM2 Volume Group".to_string(),
            Self::Lvm2Volume(_) => "LVM2 Logical Volume".to_string(),
        }
    }

    pub fn icon_name(&self) -> &str {
        match self {
            Self::Machine(_) => "computer",
            Self::Hub(_) => "network-server",
            Self::Drive(p) => &p.icon_name,
            Self::Volume(p) => &p.icon_name,
            Self::VolumeHole(_) | Self::Lvm2VolumeHole(_) => "drive-harddisk",
            Self::LinuxMdDrive(_) => "drive-multidisk",
            Self::Lvm2VolumeGroup(_) => "drive-multidisk",
            Self::Lvm2Volume(_) => "drive-harddisk",
        }
    }

    /// Byte offset within the enclosing presentable, where meaningful.
    pub fn offset(&self) -> u64 {
        match self {
            Self::Volume(p) => p.offset,
            Self::VolumeHole(p) => p.offset,
            Self::Lvm2Volume(p) => p.position,
            _ => 0,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Self::Machine(_) => 0,
            Self::Hub(_) => 0,
            Self::Drive(p) => p.size,
            Self::Volume(p) => p.size,
            Self::VolumeHole(p) => p.size,
            Self::LinuxMdDrive(p) => p.size,
            Self::Lvm2VolumeGroup(p) => p.size,
            Self::Lvm2Volume(p) => p.size,
            Self::Lvm2VolumeHole(p) => p.size,
        }
    }

    /// Whether the node represents allocated space. Holes are the only
    /// unallocated kinds.
    pub fn is_allocated(&self) -> bool {
        !matches!(self, Self::VolumeHole(_) | Self::Lvm2VolumeHole(_))
    }

    /// Whether the content of the node was recognized (filesystem,
    /// component signature, ...). Synthetic aggregates count as recognized.
    pub fn is_recognized(&self) -> bool {
        match self {
            Self::Machine(_) | Self::Hub(_) => true,
            Self::Drive(p) => p.is_recognized,
            Self::Volume(p) => p.is_recognized,
            Self::VolumeHole(_) | Self::Lvm2VolumeHole(_) => false,
            Self::LinuxMdDrive(_) | Self::Lvm2VolumeGroup(_) | Self::Lvm2Volume(_) => true,
        }
    }

    /// Id of the device record directly backing this presentable, if any.
    /// Absent for pure synthetics (holes, an unassembled array, an
    /// inactive LV, the machine root).
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Self::Machine(_) => None,
            Self::Hub(p) => Some(&p.device_id),
            Self::Drive(p) => Some(&p.device_id),
            Self::Volume(p) => Some(&p.device_id),
            Self::VolumeHole(_) | Self::Lvm2VolumeHole(_) => None,
            Self::LinuxMdDrive(p) => p.array_device_id.as_deref(),
            Self::Lvm2VolumeGroup(_) => None,
            Self::Lvm2Volume(p) => p.device_id.as_deref(),
        }
    }

    /// In-flight daemon job on the backing device, if any.
    pub fn job(&self) -> Option<&JobRecord> {
        match self {
            Self::Drive(p) => p.job.as_ref(),
            Self::Volume(p) => p.job.as_ref(),
            Self::LinuxMdDrive(p) => p.job.as_ref(),
            Self::Lvm2Volume(p) => p.job.as_ref(),
            _ => None,
        }
    }

    /// Attribute comparison that ignores job state, used for `Changed`
    /// suppression; job state changes are notified separately.
    pub fn same_attributes(&self, other: &Self) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        a.clear_job();
        b.clear_job();
        a == b
    }

    /// Whether only the job state differs between two snapshots.
    pub fn same_job(&self, other: &Self) -> bool {
        self.job() == other.job()
    }

    fn clear_job(&mut self) {
        match self {
            Self::Drive(p) => p.job = None,
            Self::Volume(p) => p.job = None,
            Self::LinuxMdDrive(p) => p.job = None,
            Self::Lvm2Volume(p) => p.job = None,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_is_the_only_root() {
        let machine = Presentable::Machine(Machine::new());
        assert_eq!(machine.id(), "machine:root");
        assert_eq!(machine.enclosing_id(), None);
        assert!(machine.is_allocated());
    }

    #[test]
    fn holes_are_unallocated_and_unrecognized() {
        let hole = Presentable::VolumeHole(VolumeHole::new("drive:/devices/sda", 40, 60));
        assert!(!hole.is_allocated());
        assert!(!hole.is_recognized());
        assert_eq!(hole.name(), "Free Space");
        assert_eq!(hole.offset(), 40);
        assert_eq!(hole.size(), 60);
    }

    #[test]
    fn same_attributes_ignores_job_state() {
        let mut a = Drive::default();
        a.id = "drive:/devices/sda".to_string();
        let mut b = a.clone();
        b.job = Some(JobRecord {
            in_progress: true,
            job_id: "FilesystemCreate".to_string(),
            percentage: 10.0,
            is_cancellable: true,
        });

        let a = Presentable::Drive(a);
        let b = Presentable::Drive(b);
        assert!(a.same_attributes(&b));
        assert!(!a.same_job(&b));
    }
}
