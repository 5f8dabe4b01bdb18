//! Latest-snapshot cache of raw device records.

use std::collections::BTreeMap;

use storage_graph_types::DeviceRecord;

/// Holds the most recent [`DeviceRecord`] for every known device, keyed by
/// the daemon's stable device id.
///
/// Records are replaced wholesale on every change notification, never
/// merged. A `BTreeMap` keeps iteration deterministic so that synthesis
/// scans produce order-stable output regardless of event arrival order.
#[derive(Debug, Default)]
pub struct DeviceRecordCache {
    records: BTreeMap<String, DeviceRecord>,
}

impl DeviceRecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored record for `record.id` wholesale. Returns the
    /// previous record, if any.
    pub fn upsert(&mut self, record: DeviceRecord) -> Option<DeviceRecord> {
        self.records.insert(record.id.clone(), record)
    }

    /// Deletes the record for `device_id`. Returns it if it was present.
    pub fn remove(&mut self, device_id: &str) -> Option<DeviceRecord> {
        self.records.remove(device_id)
    }

    /// Absence is a routine condition, not an error.
    pub fn get(&self, device_id: &str) -> Option<&DeviceRecord> {
        self.records.get(device_id)
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.records.contains_key(device_id)
    }

    /// All records in id order; used by synthesis scans such as "find every
    /// PV with group uuid X".
    pub fn all(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
