use tracing::debug;

use super::{DownscaleSearch, SearchContext, SearchState, SmallerConfig};

/// Shrinks node size and zone count together.
///
/// Deployments run one node per zone in 1, 2 or 3 zones, so node count
/// and zone count are treated as the same thing. The search alternates
/// between zone count changes and size steps:
///
/// - 1 node stays at 1 node, only the size shrinks
/// - an even node count goes to 3 nodes at the next smaller size
/// - an odd node count (other than 1) goes to 2 nodes at the same size
///
/// A 3 node candidate keeps the size index for the next attempt, every
/// other candidate moves one size down.
///
/// Known limitation: a 6 node tier may be 2 zones of 3 nodes or 3 zones
/// of 2 nodes. Aggregate counts cannot tell these apart and the count is
/// always treated as a node count.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneChangeSearch;

/// Node count of the next candidate given the last accepted one
pub fn next_node_count(nodes: usize) -> usize {
    match nodes {
        1 => 1,
        n if n % 2 == 0 => 3,
        _ => 2,
    }
}

impl ZoneChangeSearch {
    fn accept(ctx: &SearchContext<'_>, steps: usize, smaller: SmallerConfig) -> SearchState {
        SearchState::Accepted {
            recommended: steps > 1 || smaller.nodes != ctx.config.node_count,
            smaller,
        }
    }
}

impl DownscaleSearch for ZoneChangeSearch {
    fn is_already_smallest(&self, ctx: &SearchContext<'_>) -> bool {
        ctx.config.node_size_index == 0 && ctx.config.node_count <= 2
    }

    fn initial_state(&self, ctx: &SearchContext<'_>) -> SearchState {
        SearchState::Searching {
            steps: if ctx.config.node_count % 2 == 0 { 1 } else { 0 },
            smaller: SmallerConfig::unchanged(ctx.config),
        }
    }

    fn step(&self, ctx: &SearchContext<'_>, state: SearchState) -> SearchState {
        let SearchState::Searching { steps, smaller } = state else {
            return state;
        };

        let nodes = next_node_count(smaller.nodes);
        let Some(size) = ctx.size_below(steps) else {
            debug!(tier = %ctx.tier, steps, "No catalog entry below current size");
            return Self::accept(ctx, steps, smaller);
        };

        let candidate = SmallerConfig::evaluate(nodes, size, ctx.config.total_disk_usage);
        debug!(
            tier = %ctx.tier,
            steps,
            nodes = candidate.nodes,
            disk_per_node = candidate.disk_per_node,
            free_pct = candidate.free_after_downsize_pct,
            "Evaluated zone change candidate"
        );

        if !candidate.meets_headroom(ctx.headroom_percent) {
            return Self::accept(ctx, steps, smaller);
        }

        let steps = if candidate.nodes % 3 != 0 { steps + 1 } else { steps };

        if steps > ctx.config.node_size_index && candidate.nodes < 3 {
            return SearchState::Exhausted { smaller: candidate };
        }

        SearchState::Searching {
            steps,
            smaller: candidate,
        }
    }
}
