use tracing::debug;

use super::{DownscaleSearch, SearchContext, SearchState, SmallerConfig};

/// Shrinks node size one catalog step at a time, keeping the node count.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedZoneSearch;

impl DownscaleSearch for FixedZoneSearch {
    fn is_already_smallest(&self, ctx: &SearchContext<'_>) -> bool {
        ctx.config.node_size_index == 0
    }

    fn initial_state(&self, ctx: &SearchContext<'_>) -> SearchState {
        SearchState::Searching {
            steps: 1,
            smaller: SmallerConfig::unchanged(ctx.config),
        }
    }

    fn step(&self, ctx: &SearchContext<'_>, state: SearchState) -> SearchState {
        let SearchState::Searching { steps, smaller } = state else {
            return state;
        };

        let Some(size) = ctx.size_below(steps) else {
            return SearchState::Accepted {
                smaller,
                recommended: steps > 1,
            };
        };

        let candidate = SmallerConfig::evaluate(ctx.config.node_count, size, ctx.config.total_disk_usage);
        debug!(
            tier = %ctx.tier,
            steps,
            nodes = candidate.nodes,
            disk_per_node = candidate.disk_per_node,
            free_pct = candidate.free_after_downsize_pct,
            "Evaluated fixed zone candidate"
        );

        if !candidate.meets_headroom(ctx.headroom_percent) {
            return SearchState::Accepted {
                smaller,
                recommended: steps > 1,
            };
        }

        let steps = steps + 1;
        if steps > ctx.config.node_size_index {
            return SearchState::Exhausted { smaller: candidate };
        }

        SearchState::Searching {
            steps,
            smaller: candidate,
        }
    }
}
