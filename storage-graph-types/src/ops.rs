//! Remote operation requests and the daemon error taxonomy.
//!
//! The engine routes these to the transport layer and relays completions
//! verbatim; it never retries or interprets them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Correlation id for one remote operation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One operation the daemon carries out on the engine's behalf.
///
/// Every variant names the device (or synthetic presentable target) by the
/// same stable identifiers the graph uses; argument validation is the
/// daemon's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteRequest {
    FilesystemMount {
        device_id: String,
        options: Vec<String>,
    },
    FilesystemUnmount {
        device_id: String,
    },
    FilesystemCreate {
        device_id: String,
        fs_type: String,
        label: Option<String>,
    },
    PartitionCreate {
        device_id: String,
        offset: u64,
        size: u64,
        type_: String,
        label: Option<String>,
    },
    PartitionDelete {
        device_id: String,
    },
    MdStart {
        array_uuid: String,
    },
    MdStop {
        array_uuid: String,
    },
    MdAddSpare {
        array_uuid: String,
        component_device_id: String,
    },
    MdExpand {
        array_uuid: String,
        component_device_ids: Vec<String>,
    },
    VgStart {
        vg_uuid: String,
    },
    VgStop {
        vg_uuid: String,
    },
    VgAddPv {
        vg_uuid: String,
        pv_device_id: String,
    },
    VgRemovePv {
        vg_uuid: String,
        pv_uuid: String,
    },
    LvCreate {
        vg_uuid: String,
        name: String,
        size: u64,
    },
    LvRemove {
        lv_uuid: String,
    },
    LvRename {
        lv_uuid: String,
        new_name: String,
    },
}

/// Typed failure relayed from the daemon through a completion callback.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RemoteOpError {
    #[error("operation failed: {0}")]
    Failed(String),

    #[error("device is busy: {0}")]
    Busy(String),

    #[error("operation was cancelled")]
    Cancelled,

    #[error("operation not supported: {0}")]
    NotSupported(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("filesystem driver or tools missing: {0}")]
    FilesystemToolsMissing(String),
}
