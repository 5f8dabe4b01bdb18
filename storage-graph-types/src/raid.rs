//! RAID level arithmetic shared by the synthesis rules.

use serde::{Deserialize, Serialize};

/// Linux MD RAID level, parsed from the level string carried in component
/// superblocks and array records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaidLevel {
    Raid0,
    Raid1,
    Raid4,
    Raid5,
    Raid6,
    Raid10,
    Linear,
    /// Unrecognized level string, preserved verbatim.
    Other(String),
}

impl RaidLevel {
    pub fn parse(level: &str) -> Self {
        match level {
            "raid0" => Self::Raid0,
            "raid1" => Self::Raid1,
            "raid4" => Self::Raid4,
            "raid5" => Self::Raid5,
            "raid6" => Self::Raid6,
            "raid10" => Self::Raid10,
            "linear" => Self::Linear,
            other => Self::Other(other.to_string()),
        }
    }

    /// Minimum surviving members needed to activate an array configured
    /// with `num_devices` members.
    ///
    /// The raid10 threshold (`num_devices / 2`) is an approximation: whether
    /// a half-populated raid10 can actually start depends on which mirrors
    /// the missing members belonged to, and that is not derivable from
    /// component metadata alone.
    pub fn min_members_to_activate(&self, num_devices: u32) -> u32 {
        match self {
            Self::Raid0 | Self::Linear | Self::Other(_) => num_devices,
            Self::Raid1 => 1,
            Self::Raid4 | Self::Raid5 => num_devices.saturating_sub(1),
            Self::Raid6 => num_devices.saturating_sub(2),
            Self::Raid10 => num_devices / 2,
        }
    }

    /// Array capacity derivable from a single component's size, or zero
    /// when the striping geometry makes it unknowable until assembly.
    pub fn array_size(&self, component_size: u64, num_devices: u32) -> u64 {
        let n = u64::from(num_devices);
        match self {
            // Stripe geometry is not derivable from component metadata.
            Self::Raid0 | Self::Raid10 | Self::Linear | Self::Other(_) => 0,
            Self::Raid1 => component_size,
            Self::Raid4 | Self::Raid5 => {
                if n > 0 {
                    component_size / n * (n - 1)
                } else {
                    0
                }
            }
            Self::Raid6 => {
                if n > 1 {
                    component_size / n * (n - 2)
                } else {
                    0
                }
            }
        }
    }

    /// Human description of the array kind, e.g. `RAID-5 Array`.
    pub fn describe(&self) -> String {
        match self {
            Self::Raid0 => "RAID-0 Array".to_string(),
            Self::Raid1 => "RAID-1 Array".to_string(),
            Self::Raid4 => "RAID-4 Array".to_string(),
            Self::Raid5 => "RAID-5 Array".to_string(),
            Self::Raid6 => "RAID-6 Array".to_string(),
            Self::Raid10 => "RAID-10 Array".to_string(),
            Self::Linear => "Linear Array".to_string(),
            Self::Other(level) => format!("{level} Array"),
        }
    }
}
