//! Structured logging for advisor events
//!
//! Every record carries an `event` field and the deployment it concerns,
//! so runs can be filtered when the JSON log layer is enabled.

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::catalog::TierSizes;
use crate::downscale::Recommendations;
use crate::models::{Tier, TierConfig};

#[derive(Clone)]
pub struct StructuredLogger {
    deployment: String,
}

impl StructuredLogger {
    pub fn new(deployment: impl Into<String>) -> Self {
        Self {
            deployment: deployment.into(),
        }
    }

    /// Log the catalog size of every tier found in a template
    pub fn log_catalog_built(&self, profile: &str, tier_sizes: &TierSizes) {
        for tier in tier_sizes.tiers() {
            debug!(
                event = "catalog_built",
                deployment = %self.deployment,
                profile = %profile,
                tier = %tier,
                entries = tier_sizes.get(tier).map_or(0, <[_]>::len),
                "Built size catalog"
            );
        }

        if tier_sizes.is_empty() {
            warn!(
                event = "catalog_empty",
                deployment = %self.deployment,
                profile = %profile,
                "Deployment template defines no data tier sizes"
            );
        }
    }

    pub fn log_tiers_aggregated(&self, tiers: &BTreeMap<Tier, TierConfig>) {
        for (tier, config) in tiers {
            debug!(
                event = "tier_aggregated",
                deployment = %self.deployment,
                tier = %tier,
                node_count = config.node_count,
                node_size_index = config.node_size_index,
                node_size_disk = config.node_size_disk,
                total_disk_usage = config.total_disk_usage,
                "Aggregated tier allocation"
            );
        }
    }

    pub fn log_recommendations(&self, recommendations: &Recommendations) {
        for r in recommendations.iter() {
            info!(
                event = "recommendation_computed",
                deployment = %self.deployment,
                tier = %r.tier,
                current_nodes = r.current.nodes,
                current_disk_per_node = r.current.disk_per_node,
                smaller_nodes = r.smaller.nodes,
                smaller_disk_per_node = r.smaller.disk_per_node,
                free_pct = r.smaller.free_after_downsize_pct,
                already_smallest = r.is_already_smallest,
                recommended = r.is_downscaling_recommended,
                "Computed downscale recommendation"
            );
        }
    }

    pub fn log_index_skipped(&self, index: &str, reason: &str) {
        debug!(
            event = "index_skipped",
            deployment = %self.deployment,
            index = %index,
            reason = %reason,
            "Index not moved"
        );
    }

    pub fn log_index_moved(&self, index: &str, from_phase: &str, to_phase: &str, dry_run: bool) {
        info!(
            event = "index_moved",
            deployment = %self.deployment,
            index = %index,
            from_phase = %from_phase,
            to_phase = %to_phase,
            dry_run = dry_run,
            "Moved index to phase"
        );
    }
}
