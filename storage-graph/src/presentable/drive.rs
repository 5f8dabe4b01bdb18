//! Physical drive nodes.

use serde::{Deserialize, Serialize};
use storage_graph_types::{DeviceRecord, JobRecord};

/// A physical drive (disk, SSD, card reader slot, ...). Encloses its
/// volumes and free-space holes; enclosed by a hub when its adapter is
/// known, otherwise by the machine root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Drive {
    pub id: String,
    pub enclosing_id: String,
    pub device_id: String,
    pub name: String,
    pub vpd_name: String,
    pub description: String,
    pub icon_name: String,
    pub size: u64,
    pub is_media_available: bool,
    pub is_recognized: bool,
    pub has_partition_table: bool,
    pub job: Option<JobRecord>,
}

impl Drive {
    pub fn id_for_device(device_id: &str) -> String {
        format!("drive:{device_id}")
    }

    /// Builds the drive presentable for a raw drive record.
    pub fn from_record(record: &DeviceRecord, enclosing_id: String) -> Self {
        let detail = record.drive.clone().unwrap_or_default();
        let vpd_name = format!("{} {}", detail.vendor, detail.model)
            .trim()
            .to_string();

        let name = record
            .presentation_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                if vpd_name.is_empty() {
                    record.device_file.clone()
                } else {
                    vpd_name.clone()
                }
            });

        let description = if !record.is_media_available {
            "No Media Detected".to_string()
        } else if detail.rotation_rate == 0 && detail.connection_interface == "ata" {
            "Solid-State Disk".to_string()
        } else {
            "Hard Disk".to_string()
        };

        let icon_name = record
            .presentation_icon_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| icon_for_interface(&detail.connection_interface).to_string());

        Self {
            id: Self::id_for_device(&record.id),
            enclosing_id,
            device_id: record.id.clone(),
            name,
            vpd_name,
            description,
            icon_name,
            // A drive with no medium reports size zero.
            size: if record.is_media_available {
                record.size
            } else {
                0
            },
            is_media_available: record.is_media_available,
            is_recognized: record.is_recognized || record.is_partition_table,
            has_partition_table: record.is_partition_table,
            job: record.job.clone(),
        }
    }
}

fn icon_for_interface(interface: &str) -> &'static str {
    match interface {
        "usb" => "drive-removable-media-usb",
        "firewire" => "drive-removable-media-ieee1394",
        "sdio" => "media-flash-sd",
        _ => "drive-harddisk",
    }
}
