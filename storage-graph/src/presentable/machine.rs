//! The root node of the presentable forest.

use serde::{Deserialize, Serialize};

/// Root presentable for the local machine. Exactly one exists per pool and
/// it is never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
}

pub const MACHINE_ID: &str = "machine:root";

impl Machine {
    pub fn new() -> Self {
        Self {
            id: MACHINE_ID.to_string(),
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
