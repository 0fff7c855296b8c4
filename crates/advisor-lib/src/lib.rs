//! Downscale advisor library for Elastic Cloud deployments
//!
//! This crate provides the decision logic behind `ec-check`:
//! - Size catalogs per data tier from deployment templates
//! - Aggregation of node disk allocations per tier
//! - Downscale searches with and without zone count changes
//! - ILM index filtering and move pre-conditions
//! - Region table and structured logging

pub mod allocation;
pub mod catalog;
pub mod downscale;
pub mod error;
pub mod ilm;
pub mod models;
pub mod observability;
pub mod regions;
pub mod units;

pub use allocation::{aggregate_tiers, aggregate_tiers_with_policy, RolePolicy};
pub use catalog::{DeploymentTemplate, TierSizes};
pub use downscale::{recommend, recommend_tiers, Recommendation, Recommendations, SearchMode};
pub use error::{Error, Result, UnknownTierError};
pub use models::*;
pub use observability::StructuredLogger;
