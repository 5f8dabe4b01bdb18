// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for the storage presentable graph engine.
//!
//! This crate defines the single source of truth for the raw device side of
//! the model:
//!
//! - **Device records**: per-device attribute snapshots delivered by the
//!   block-device daemon, replaced wholesale on every change notification.
//! - **RAID metadata**: array levels and the member-count/size arithmetic
//!   derived from component records.
//! - **LVM metadata**: the serialized PV/LV records embedded in physical
//!   volume snapshots, plus volume-group run state.
//! - **Remote operations**: the request and error taxonomy for operations
//!   the engine routes to the daemon but never interprets.
//!
//! The engine crate (`storage-graph`) builds presentables on top of these
//! types; UI layers consume both.

pub mod device;
pub mod lvm;
pub mod ops;
pub mod raid;

pub use device::{
    AdapterRecord, DeviceRecord, DriveRecord, ExpanderRecord, JobRecord, Lvm2LvRecord,
    Lvm2PvRecord, MdArrayRecord, MdComponentRecord, PartitionRecord, PartitionTableRecord,
};
pub use lvm::{LvRecord, PvRecord, VgState, parse_kv_record, unescape_lvm_value};
pub use ops::{RemoteOpError, RemoteRequest, RequestId};
pub use raid::RaidLevel;
