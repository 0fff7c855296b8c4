//! Downscale recommendation engine
//!
//! For every tier, searches the size catalog downwards from the currently
//! provisioned size for the smallest configuration that still leaves the
//! required free disk headroom. Two strategies exist:
//!
//! - [`FixedZoneSearch`] keeps the node count and only shrinks node size.
//! - [`ZoneChangeSearch`] additionally moves between 1, 2 and 3 zone
//!   deployments.
//!
//! Both are expressed as a [`SearchState`] machine driven by
//! [`DownscaleSearch::step`], so every step of a search can be inspected.

mod fixed;
mod report;
mod zone;


pub use fixed::FixedZoneSearch;
pub use zone::ZoneChangeSearch;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::allocation::aggregate_tiers;
use crate::catalog::TierSizes;
use crate::error::Result;
use crate::models::{Allocation, Size, Tier, TierConfig};

/// Default required free space after a downscale, in percent
pub const DEFAULT_HEADROOM_PERCENT: f64 = 25.0;

/// Which downscale search to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Keep the node count, shrink the node size only
    #[default]
    FixedZones,
    /// Also change the number of zones
    ZoneChange,
}

impl SearchMode {
    pub fn from_zone_change(recommend_zone_change: bool) -> Self {
        if recommend_zone_change {
            SearchMode::ZoneChange
        } else {
            SearchMode::FixedZones
        }
    }
}

/// Currently provisioned configuration of a tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrentConfig {
    pub nodes: usize,
    pub disk_per_node: u64,
    pub memory_per_node: u64,
    pub disk_total: u64,
    pub consumption: u64,
}

/// Proposed smaller configuration of a tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmallerConfig {
    pub nodes: usize,
    pub disk_per_node: u64,
    pub memory_per_node: u64,
    pub disk_total: u64,
    pub free_after_downsize: f64,
    pub free_after_downsize_pct: f64,
}

impl SmallerConfig {
    /// Starting point of a search: the current shape, nothing evaluated yet
    fn unchanged(config: &TierConfig) -> Self {
        Self {
            nodes: config.node_count,
            disk_per_node: config.node_size_disk,
            memory_per_node: config.node_size_memory,
            disk_total: 0,
            free_after_downsize: 0.0,
            free_after_downsize_pct: 0.0,
        }
    }

    /// Project the free space of `nodes` nodes of `size` holding `usage` bytes
    pub fn evaluate(nodes: usize, size: Size, usage: u64) -> Self {
        let disk_total = nodes as f64 * size.disk as f64;
        let free = disk_total - usage as f64;

        Self {
            nodes,
            disk_per_node: size.disk,
            memory_per_node: size.memory,
            disk_total: nodes as u64 * size.disk,
            free_after_downsize: free,
            free_after_downsize_pct: 100.0 / disk_total * free,
        }
    }

    /// A percentage that is not a number (zero capacity) never fits.
    pub fn meets_headroom(&self, headroom_percent: f64) -> bool {
        self.free_after_downsize_pct.is_finite() && self.free_after_downsize_pct >= headroom_percent
    }
}

/// State of a downscale search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    /// `steps` is the distance below the current size index the next
    /// candidate is taken from; `smaller` the last accepted candidate.
    Searching { steps: usize, smaller: SmallerConfig },
    /// The next candidate violated headroom, `smaller` is final.
    Accepted { smaller: SmallerConfig, recommended: bool },
    /// The smallest catalog entry was reached while still fitting.
    Exhausted { smaller: SmallerConfig },
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchState::Searching { .. })
    }

    pub fn smaller(&self) -> &SmallerConfig {
        match self {
            SearchState::Searching { smaller, .. }
            | SearchState::Accepted { smaller, .. }
            | SearchState::Exhausted { smaller } => smaller,
        }
    }

    pub fn is_downscaling_recommended(&self) -> bool {
        match self {
            SearchState::Searching { .. } => false,
            SearchState::Accepted { recommended, .. } => *recommended,
            SearchState::Exhausted { .. } => true,
        }
    }
}

/// Inputs shared by every step of one tier's search
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub tier: Tier,
    pub config: &'a TierConfig,
    pub sizes: &'a [Size],
    pub headroom_percent: f64,
}

impl SearchContext<'_> {
    /// Catalog entry `steps` below the current size, if there is one
    fn size_below(&self, steps: usize) -> Option<Size> {
        self.config
            .node_size_index
            .checked_sub(steps)
            .and_then(|index| self.sizes.get(index))
            .copied()
    }
}

/// A downscale strategy expressed as a pure state transition
pub trait DownscaleSearch {
    fn is_already_smallest(&self, ctx: &SearchContext<'_>) -> bool;

    fn initial_state(&self, ctx: &SearchContext<'_>) -> SearchState;

    fn step(&self, ctx: &SearchContext<'_>, state: SearchState) -> SearchState;

    /// Step from the initial state until the search concludes
    fn run(&self, ctx: &SearchContext<'_>) -> SearchState {
        let mut state = self.initial_state(ctx);
        while !state.is_terminal() {
            state = self.step(ctx, state);
        }
        state
    }
}

/// Downscale recommendation for one tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub tier: Tier,
    pub current: CurrentConfig,
    pub required_headroom_percent: f64,
    pub smaller: SmallerConfig,
    pub is_already_smallest: bool,
    pub is_downscaling_recommended: bool,
}

impl Recommendation {
    /// Run `search` for a single aggregated tier
    pub fn for_tier(search: &dyn DownscaleSearch, ctx: &SearchContext<'_>) -> Self {
        let config = ctx.config;
        let mut recommendation = Self {
            tier: ctx.tier,
            current: CurrentConfig {
                nodes: config.node_count,
                disk_per_node: config.node_size_disk,
                memory_per_node: config.node_size_memory,
                disk_total: config.node_count as u64 * config.node_size_disk,
                consumption: config.total_disk_usage,
            },
            required_headroom_percent: ctx.headroom_percent,
            smaller: SmallerConfig::unchanged(config),
            is_already_smallest: false,
            is_downscaling_recommended: false,
        };

        if search.is_already_smallest(ctx) {
            recommendation.is_already_smallest = true;
            return recommendation;
        }

        let outcome = search.run(ctx);
        recommendation.smaller = *outcome.smaller();
        recommendation.is_downscaling_recommended = outcome.is_downscaling_recommended();
        recommendation
    }
}

/// One recommendation per tier, ordered hot to frozen
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Recommendations(BTreeMap<Tier, Recommendation>);

impl Recommendations {
    pub fn get(&self, tier: Tier) -> Option<&Recommendation> {
        self.0.get(&tier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if at least one tier should be downscaled
    pub fn is_downscaling_recommended(&self) -> bool {
        self.0.values().any(|r| r.is_downscaling_recommended)
    }
}

impl FromIterator<Recommendation> for Recommendations {
    fn from_iter<I: IntoIterator<Item = Recommendation>>(iter: I) -> Self {
        Self(iter.into_iter().map(|r| (r.tier, r)).collect())
    }
}

/// Recommend per tier sizes for the observed allocations
pub fn recommend(
    allocations: &[Allocation],
    tier_sizes: &TierSizes,
    headroom_percent: f64,
    mode: SearchMode,
) -> Result<Recommendations> {
    let tiers = aggregate_tiers(allocations, tier_sizes)?;
    Ok(recommend_tiers(&tiers, tier_sizes, headroom_percent, mode))
}

/// Recommend sizes for already aggregated tiers
pub fn recommend_tiers(
    tiers: &BTreeMap<Tier, TierConfig>,
    tier_sizes: &TierSizes,
    headroom_percent: f64,
    mode: SearchMode,
) -> Recommendations {
    let search: &dyn DownscaleSearch = match mode {
        SearchMode::FixedZones => &FixedZoneSearch,
        SearchMode::ZoneChange => &ZoneChangeSearch,
    };

    tiers
        .iter()
        .map(|(&tier, config)| {
            let ctx = SearchContext {
                tier,
                config,
                sizes: tier_sizes.get(tier).unwrap_or_default(),
                headroom_percent,
            };
            Recommendation::for_tier(search, &ctx)
        })
        .collect()
}
