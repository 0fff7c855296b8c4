//! Allocation aggregation
//!
//! Folds the per-node rows of `_cat/allocation` into one [`TierConfig`]
//! per tier. The allocation API does not expose the machine shape, so the
//! provisioned size is reconstructed from each node's total disk via
//! [`TierSizes::nearest_index`].

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::catalog::TierSizes;
use crate::error::{Error, Result};
use crate::models::{Allocation, Tier, TierConfig};

/// What to do with a data node whose role code names no known tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RolePolicy {
    /// Fail the whole aggregation
    #[default]
    Abort,
    /// Log and ignore the node
    Skip,
}

/// Aggregate allocations into one config per tier, aborting on unknown roles
pub fn aggregate_tiers(allocations: &[Allocation], tier_sizes: &TierSizes) -> Result<BTreeMap<Tier, TierConfig>> {
    aggregate_tiers_with_policy(allocations, tier_sizes, RolePolicy::Abort)
}

pub fn aggregate_tiers_with_policy(
    allocations: &[Allocation],
    tier_sizes: &TierSizes,
    policy: RolePolicy,
) -> Result<BTreeMap<Tier, TierConfig>> {
    let mut tiers: BTreeMap<Tier, TierConfig> = BTreeMap::new();

    for allocation in allocations {
        let role = allocation.role();
        if role.is_empty() {
            continue;
        }

        let tier = match Tier::from_node_role(role) {
            Ok(tier) => tier,
            Err(err) if policy == RolePolicy::Skip => {
                warn!(node_role = %role, "Skipping allocation: {err}");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let disk_total = parse_bytes("disk.total", allocation.disk_total.as_deref())?;
        let disk_used = parse_bytes("disk.used", allocation.disk_used.as_deref())?;

        let index = tier_sizes.nearest_index(tier, disk_total);
        let size = tier_sizes.get(tier).and_then(|sizes| sizes.get(index));

        let config = tiers.entry(tier).or_default();
        if let Some(size) = size {
            if config.node_count > 0 && config.node_size_index != index {
                debug!(%tier, previous = config.node_size_index, current = index, "Nodes of tier match different sizes, keeping the last one");
            }
            config.node_size_disk = size.disk;
            config.node_size_memory = size.memory;
        }
        config.node_size_index = index;
        config.node_count += 1;
        config.total_disk_usage += disk_used;
    }

    Ok(tiers)
}

fn parse_bytes(field: &'static str, value: Option<&str>) -> Result<u64> {
    let value = value.unwrap_or_default();
    value.trim().parse::<u64>().map_err(|source| Error::MalformedNumeric {
        field,
        value: value.to_string(),
        source,
    })
}
