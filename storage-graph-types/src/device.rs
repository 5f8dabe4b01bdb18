//! Raw block-device attribute snapshots.
//!
//! A [`DeviceRecord`] is the engine's view of a single block device as
//! reported by the daemon. Records are immutable per refresh: when a change
//! notification arrives for a device the whole record is replaced, never
//! merged field by field. Nested sub-records are present only when the
//! corresponding daemon interface is present on the device.

use serde::{Deserialize, Serialize};

/// Snapshot of one raw block device.
///
/// `id` is the daemon's stable object identifier for the device and is the
/// cache key; everything else may change between refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeviceRecord {
    /// Stable object identifier (object-path-like string).
    pub id: String,

    /// Special device file, e.g. `/dev/sda1`.
    pub device_file: String,

    /// Device size in bytes. Zero when no medium is present.
    pub size: u64,

    /// Logical block size in bytes.
    pub block_size: u64,

    /// Whether a usable filesystem/signature was recognized on the device.
    pub is_recognized: bool,

    pub is_drive: bool,
    pub is_partition: bool,
    pub is_partition_table: bool,
    pub is_media_available: bool,
    pub is_luks: bool,
    pub is_luks_cleartext: bool,
    pub is_linux_md_component: bool,
    pub is_linux_md: bool,
    pub is_linux_lvm2_pv: bool,
    pub is_linux_lvm2_lv: bool,

    /// For a LUKS cleartext device, the id of the encrypted device it was
    /// unlocked from.
    pub luks_cleartext_slave: Option<String>,

    /// Operator-set display name, if any.
    pub presentation_name: Option<String>,

    /// Operator-set icon override, if any.
    pub presentation_icon_name: Option<String>,

    /// Operator request to hide the device from presentation.
    pub presentation_hide: bool,

    pub partition: Option<PartitionRecord>,
    pub partition_table: Option<PartitionTableRecord>,
    pub drive: Option<DriveRecord>,
    pub md_component: Option<MdComponentRecord>,
    pub md_array: Option<MdArrayRecord>,
    pub lvm2_pv: Option<Lvm2PvRecord>,
    pub lvm2_lv: Option<Lvm2LvRecord>,
    pub adapter: Option<AdapterRecord>,
    pub expander: Option<ExpanderRecord>,
    pub job: Option<JobRecord>,
}

impl DeviceRecord {
    /// Whether this record describes a host adapter or expander rather than
    /// a storage device.
    pub fn is_hub(&self) -> bool {
        self.adapter.is_some() || self.expander.is_some()
    }
}

/// Partition metadata for devices with `is_partition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PartitionRecord {
    /// Device id of the device holding the partition table.
    pub slave: String,

    /// Partition number, 1-based.
    pub number: u32,

    /// Byte offset of the partition on the slave device.
    pub offset: u64,

    /// Partition size in bytes.
    pub size: u64,

    /// Table-scheme-specific type identifier.
    pub type_: String,

    pub label: Option<String>,
    pub uuid: Option<String>,
}

/// Partition-table metadata for devices with `is_partition_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PartitionTableRecord {
    /// Table scheme, e.g. `gpt` or `mbr`.
    pub scheme: String,

    /// Number of partition slots in use.
    pub count: u32,
}

/// Drive metadata for devices with `is_drive`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DriveRecord {
    pub vendor: String,
    pub model: String,
    pub serial: String,
    pub wwn: String,

    /// Physical connection interface, e.g. `ata`, `usb`, `scsi`.
    pub connection_interface: String,

    /// Rotation rate in RPM; zero for non-rotational media.
    pub rotation_rate: u32,

    /// Device id of the host adapter this drive hangs off, if known.
    pub adapter: Option<String>,

    /// Device id of the expander between the adapter and this drive, if any.
    pub expander: Option<String>,
}

/// RAID component metadata for devices with `is_linux_md_component`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MdComponentRecord {
    /// RAID level string as reported in the component superblock.
    pub level: String,

    /// UUID of the array this component belongs to.
    pub uuid: String,

    /// Array name from the superblock, if set.
    pub name: String,

    pub home_host: String,

    /// Number of devices the array was created with.
    pub num_raid_devices: u32,

    /// Slot position of this component; negative means spare/unknown.
    pub position: i32,

    /// Superblock metadata version.
    pub version: String,
}

/// Assembled-array metadata for devices with `is_linux_md`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MdArrayRecord {
    pub uuid: String,
    pub level: String,
    pub name: String,
    pub num_raid_devices: u32,

    /// Device ids of the currently attached components.
    pub slaves: Vec<String>,

    pub is_degraded: bool,

    /// Current sync action, e.g. `idle`, `resync`, `recover`.
    pub sync_action: String,

    /// Sync progress 0.0..=100.0; meaningful only while syncing.
    pub sync_percentage: f64,
}

// MdArrayRecord carries an f64, so Eq cannot be derived for it; records in
// the cache are compared with PartialEq only.
impl Eq for MdArrayRecord {}

/// LVM physical-volume metadata for devices with `is_linux_lvm2_pv`.
///
/// LVM replicates the volume-group metadata onto every PV; the snapshot on
/// the PV with the highest `group_sequence_number` is the most recent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Lvm2PvRecord {
    /// UUID of this physical volume.
    pub uuid: String,

    /// UUID of the volume group this PV belongs to.
    pub group_uuid: String,

    pub group_name: String,

    /// Total size of the volume group in bytes.
    pub group_size: u64,

    /// Unallocated bytes remaining in the volume group.
    pub group_unallocated_size: u64,

    /// Metadata sequence number; higher is newer.
    pub group_sequence_number: u64,

    /// Serialized logical-volume records, one string per LV.
    /// See [`crate::lvm::LvRecord::parse`] for the format.
    pub group_logical_volumes: Vec<String>,

    /// Serialized physical-volume records, one string per PV.
    pub group_physical_volumes: Vec<String>,
}

/// LVM logical-volume metadata for devices with `is_linux_lvm2_lv`.
///
/// Present only on an *activated* LV's block device; an inactive LV has no
/// backing device at all and is known only through the serialized metadata
/// on its group's PVs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Lvm2LvRecord {
    pub uuid: String,
    pub name: String,
    pub group_uuid: String,
    pub group_name: String,
}

/// Host adapter metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AdapterRecord {
    /// Fabric/transport string, e.g. `ata_sata`, `scsi_sas`.
    pub fabric: String,

    pub vendor: String,
    pub model: String,
}

/// Expander metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExpanderRecord {
    /// Fabric of the fabric segment the expander sits on.
    pub fabric: String,

    pub vendor: String,
    pub model: String,

    /// Device id of the adapter upstream of this expander.
    pub adapter: Option<String>,
}

/// In-flight daemon job state for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JobRecord {
    pub in_progress: bool,

    /// Daemon job identifier, e.g. `FilesystemCreate`.
    pub job_id: String,

    /// Progress 0.0..=100.0, or negative when indeterminate.
    pub percentage: f64,

    pub is_cancellable: bool,
}

impl Eq for JobRecord {}
