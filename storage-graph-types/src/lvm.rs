//! LVM volume-group metadata types and the serialized record parser.
//!
//! The daemon flattens the VG metadata held on each physical volume into
//! lists of strings, one per logical/physical volume, each a
//! semicolon-delimited `key=value` record:
//!
//! ```text
//! uuid=Abc123;name=root;size=10737418240;active=1;position=0
//! ```
//!
//! Values are percent-escaped so that `;`, `=` and `%` can appear inside
//! them. Unknown keys are ignored so the format can grow without breaking
//! older parsers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Run state of a volume group, derived from how many of its logical
/// volumes currently have a backing device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VgState {
    /// No LV in the group has a backing device.
    NotRunning,
    /// Some but not all LVs have backing devices.
    PartiallyRunning,
    /// Every LV in the group has a backing device.
    Running,
}

/// One logical volume as described by the serialized VG metadata.
///
/// An LV that is not activated has no block device anywhere; this record is
/// the only source of its name and size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LvRecord {
    pub uuid: String,
    pub name: String,
    pub size: u64,
    pub active: bool,
    /// Ordering hint within the group; groups without explicit positions
    /// fall back to metadata order.
    pub position: Option<u64>,
}

impl LvRecord {
    /// Parses one serialized LV record. Returns `None` when the mandatory
    /// `uuid`, `name` or `size` keys are missing or malformed.
    pub fn parse(serialized: &str) -> Option<Self> {
        let fields = parse_kv_record(serialized);
        let uuid = fields.get("uuid")?.clone();
        let name = fields.get("name")?.clone();
        let size = fields.get("size")?.parse().ok()?;
        let active = matches!(fields.get("active").map(String::as_str), Some("1"));
        let position = fields.get("position").and_then(|v| v.parse().ok());

        Some(Self {
            uuid,
            name,
            size,
            active,
            position,
        })
    }
}

/// One physical volume as described by the serialized VG metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvRecord {
    pub uuid: String,
    pub size: u64,
    pub unallocated_size: u64,
}

impl PvRecord {
    /// Parses one serialized PV record. Returns `None` when `uuid` or
    /// `size` is missing or malformed.
    pub fn parse(serialized: &str) -> Option<Self> {
        let fields = parse_kv_record(serialized);
        let uuid = fields.get("uuid")?.clone();
        let size = fields.get("size")?.parse().ok()?;
        let unallocated_size = fields
            .get("unallocated_size")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Some(Self {
            uuid,
            size,
            unallocated_size,
        })
    }
}

/// Splits a semicolon-delimited `key=value` record into a map, unescaping
/// values. Entries without an `=` are skipped.
pub fn parse_kv_record(serialized: &str) -> BTreeMap<String, String> {
    serialized
        .split(';')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unescape_lvm_value(value)))
        })
        .collect()
}

/// Reverses the daemon's percent-escaping of `;`, `=` and `%`.
///
/// Invalid escape sequences are passed through verbatim rather than
/// rejected; the surrounding record parser decides what is fatal.
pub fn unescape_lvm_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let hi = chars.next();
        let lo = chars.next();
        match (hi, lo) {
            (Some(hi), Some(lo)) => {
                let pair: String = [hi, lo].iter().collect();
                match u8::from_str_radix(&pair, 16) {
                    Ok(byte) => out.push(byte as char),
                    Err(_) => {
                        out.push('%');
                        out.push(hi);
                        out.push(lo);
                    }
                }
            }
            (Some(hi), None) => {
                out.push('%');
                out.push(hi);
            }
            (None, _) => out.push('%'),
        }
    }

    out
}
