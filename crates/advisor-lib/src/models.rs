//! Core data models for the downscale advisor

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownTierError;

/// Storage tier of a data node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Hot,
    Warm,
    Cold,
    Frozen,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Hot, Tier::Warm, Tier::Cold, Tier::Frozen];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hot => "hot",
            Tier::Warm => "warm",
            Tier::Cold => "cold",
            Tier::Frozen => "frozen",
        }
    }

    /// Single character marker used in `_cat` node role codes
    fn marker(&self) -> char {
        match self {
            Tier::Hot => 'h',
            Tier::Warm => 'w',
            Tier::Cold => 'c',
            Tier::Frozen => 'f',
        }
    }

    /// Derive the tier from a compact node role code such as `himrst`.
    ///
    /// Markers are checked in `h, w, c, f` order, so a code carrying
    /// several of them resolves to the hottest one.
    pub fn from_node_role(role: &str) -> Result<Tier, UnknownTierError> {
        Tier::ALL
            .into_iter()
            .find(|tier| role.contains(tier.marker()))
            .ok_or_else(|| UnknownTierError {
                role: role.to_string(),
            })
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = UnknownTierError;

    /// Parse a full tier name (`hot`, `warm`, ...), as found in
    /// instance configuration IDs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| UnknownTierError {
                role: s.to_string(),
            })
    }
}

/// One purchasable node shape, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub disk: u64,
    pub memory: u64,
}

/// Disk allocation of a single node as returned by `_cat/allocation`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Allocation {
    #[serde(rename = "disk.used", default)]
    pub disk_used: Option<String>,
    #[serde(rename = "disk.total", default)]
    pub disk_total: Option<String>,
    #[serde(rename = "node.role", default)]
    pub node_role: Option<String>,
}

impl Allocation {
    pub fn new(disk_used: impl Into<String>, disk_total: impl Into<String>, node_role: impl Into<String>) -> Self {
        Self {
            disk_used: Some(disk_used.into()),
            disk_total: Some(disk_total.into()),
            node_role: Some(node_role.into()),
        }
    }

    /// Role code, empty for unassigned shards and non-data rows
    pub fn role(&self) -> &str {
        self.node_role.as_deref().unwrap_or_default()
    }
}

/// Aggregated sizing and usage of one tier
///
/// All nodes of a tier are assumed to share one size. When they do not,
/// the size matched for the last node seen wins.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TierConfig {
    pub node_size_index: usize,
    pub node_size_disk: u64,
    pub node_size_memory: u64,
    pub node_count: usize,
    pub total_disk_usage: u64,
}
