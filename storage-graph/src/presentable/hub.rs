//! Host adapter and expander nodes.

use serde::{Deserialize, Serialize};
use storage_graph_types::DeviceRecord;

use super::machine::MACHINE_ID;

/// A host adapter or expander in the storage topology. Not itself storage;
/// drives hang off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    pub id: String,
    pub enclosing_id: String,
    pub device_id: String,
    pub name: String,
    pub vpd_name: String,
    pub description: String,
}

impl Hub {
    pub fn id_for_device(device_id: &str) -> String {
        format!("hub:{device_id}")
    }

    /// Builds the hub for an adapter record, enclosed by the machine root.
    pub fn from_adapter(record: &DeviceRecord) -> Option<Self> {
        let adapter = record.adapter.as_ref()?;
        let vpd_name = join_vendor_model(&adapter.vendor, &adapter.model);

        Some(Self {
            id: Self::id_for_device(&record.id),
            enclosing_id: MACHINE_ID.to_string(),
            device_id: record.id.clone(),
            name: adapter_name_for_fabric(&adapter.fabric).to_string(),
            vpd_name,
            description: format!("Fabric: {}", adapter.fabric),
        })
    }

    /// Builds the hub for an expander record, enclosed by its adapter's hub
    /// when known, otherwise by the machine root.
    pub fn from_expander(record: &DeviceRecord) -> Option<Self> {
        let expander = record.expander.as_ref()?;
        let enclosing_id = expander
            .adapter
            .as_deref()
            .map(Self::id_for_device)
            .unwrap_or_else(|| MACHINE_ID.to_string());
        let vpd_name = join_vendor_model(&expander.vendor, &expander.model);

        Some(Self {
            id: Self::id_for_device(&record.id),
            enclosing_id,
            device_id: record.id.clone(),
            name: expander_name_for_fabric(&expander.fabric).to_string(),
            vpd_name,
            description: format!("Fabric: {}", expander.fabric),
        })
    }
}

/// Hub display name from the fabric string. Longer prefixes are checked
/// first so `ata_sata` does not fall into the plain `ata` bucket.
pub fn adapter_name_for_fabric(fabric: &str) -> &'static str {
    if fabric.starts_with("ata_sata") {
        "SATA Host Adapter"
    } else if fabric.starts_with("ata_pata") {
        "PATA Host Adapter"
    } else if fabric.starts_with("ata") {
        "ATA Host Adapter"
    } else if fabric.starts_with("scsi_sas") {
        "SAS Host Adapter"
    } else if fabric.starts_with("scsi") {
        "SCSI Host Adapter"
    } else if fabric.starts_with("usb") {
        "USB Host Adapter"
    } else if fabric.starts_with("firewire") {
        "FireWire Host Adapter"
    } else {
        "Host Adapter"
    }
}

pub fn expander_name_for_fabric(fabric: &str) -> &'static str {
    if fabric.starts_with("scsi_sas") {
        "SAS Expander"
    } else {
        "Expander"
    }
}

fn join_vendor_model(vendor: &str, model: &str) -> String {
    let joined = format!("{vendor} {model}");
    joined.trim().to_string()
}
