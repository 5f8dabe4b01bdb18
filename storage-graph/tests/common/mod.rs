//! Record builders shared by the integration tests.
//!
//! Each test binary uses its own subset of these.
#![allow(dead_code)]

use storage_graph_types::{
    AdapterRecord, DeviceRecord, DriveRecord, ExpanderRecord, Lvm2LvRecord, Lvm2PvRecord,
    MdArrayRecord, MdComponentRecord, PartitionRecord, PartitionTableRecord,
};

pub fn drive(id: &str, size: u64) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        device_file: format!("/dev/{}", id.rsplit('/').next().unwrap_or(id)),
        size,
        block_size: 512,
        is_drive: true,
        is_partition_table: true,
        is_media_available: true,
        partition_table: Some(PartitionTableRecord {
            scheme: "gpt".to_string(),
            count: 0,
        }),
        drive: Some(DriveRecord {
            vendor: "ATA".to_string(),
            model: "TestDisk".to_string(),
            connection_interface: "ata".to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn partition(id: &str, slave: &str, number: u32, offset: u64, size: u64) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        device_file: format!("/dev/{}", id.rsplit('/').next().unwrap_or(id)),
        size,
        block_size: 512,
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

pub fn md_component(id: &str, uuid: &str, level: &str, num: u32, size: u64) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        device_file: format!("/dev/{}", id.rsplit('/').next().unwrap_or(id)),
        size,
        is_linux_md_component: true,
        is_media_available: true,
        md_component: Some(MdComponentRecord {
            level: level.to_string(),
            uuid: uuid.to_string(),
            num_raid_devices: num,
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn md_array(id: &str, uuid: &str, level: &str, num: u32, size: u64) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        device_file: format!("/dev/{}", id.rsplit('/').next().unwrap_or(id)),
        size,
        is_linux_md: true,
        is_media_available: true,
        md_array: Some(MdArrayRecord {
            uuid: uuid.to_string(),
            level: level.to_string(),
            num_raid_devices: num,
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn pv(
    id: &str,
    group_uuid: &str,
    group_name: &str,
    sequence: u64,
    group_size: u64,
    unallocated: u64,
    lvs: &[&str],
) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        device_file: format!("/dev/{}", id.rsplit('/').next().unwrap_or(id)),
        size: group_size,
        is_linux_lvm2_pv: true,
        is_media_available: true,
        lvm2_pv: Some(Lvm2PvRecord {
            uuid: format!("pv-uuid-{id}"),
            group_uuid: group_uuid.to_string(),
            group_name: group_name.to_string(),
            group_size,
            group_unallocated_size: unallocated,
            group_sequence_number: sequence,
            group_logical_volumes: lvs.iter().map(|s| s.to_string()).collect(),
            group_physical_volumes: Vec::new(),
        }),
        ..Default::default()
    }
}

pub fn adapter(id: &str, fabric: &str) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        adapter: Some(AdapterRecord {
            fabric: fabric.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn expander(id: &str, fabric: &str, adapter: &str) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        expander: Some(ExpanderRecord {
            fabric: fabric.to_string(),
            adapter: Some(adapter.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn luks_container(id: &str, slave: &str, number: u32, offset: u64, size: u64) -> DeviceRecord {
    let mut record = partition(id, slave, number, offset, size);
    record.is_recognized = false;
    record.is_luks = true;
    record
}

pub fn luks_cleartext(id: &str, slave: &str, size: u64) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        device_file: format!("/dev/{}", id.rsplit('/').next().unwrap_or(id)),
        size,
        is_luks_cleartext: true,
        is_recognized: true,
        is_media_available: true,
        luks_cleartext_slave: Some(slave.to_string()),
        ..Default::default()
    }
}

pub fn lv_device(id: &str, lv_uuid: &str, group_uuid: &str) -> DeviceRecord {
    DeviceRecord {
        id: id.to_string(),
        device_file: format!("/dev/{}", id.rsplit('/').next().unwrap_or(id)),
        size: 100,
        is_linux_lvm2_lv: true,
        is_recognized: true,
        is_media_available: true,
        lvm2_lv: Some(Lvm2LvRecord {
            uuid: lv_uuid.to_string(),
            group_uuid: group_uuid.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}
