//! Downscale recommendation command

use advisor_lib::{aggregate_tiers, recommend_tiers, Recommendations, SearchMode, StructuredLogger, TierSizes};
use anyhow::{Context, Result};

use crate::client::ApiClient;
use crate::config::{resolve_headroom, Config, Settings};
use crate::output::{print_json, print_success, print_warning, OutputFormat};

/// Options of the `downscale` subcommand
#[derive(Debug, Clone, Default)]
pub struct DownscaleOptions {
    pub profile: Option<String>,
    pub headroom_pct: Option<f64>,
    pub recommend_zone_change: bool,
}

/// Outcome of one downscale evaluation
pub struct DownscaleReport {
    pub tier_sizes: TierSizes,
    pub recommendations: Recommendations,
}

/// Evaluate every data tier of the deployment and print the result.
///
/// Returns whether downscaling is recommended for at least one tier.
pub async fn run(
    settings: &Settings,
    config: &Config,
    options: DownscaleOptions,
    verbose: bool,
    format: OutputFormat,
) -> Result<bool> {
    let region = settings.region()?;
    let profile = options
        .profile
        .or_else(|| config.profile.clone())
        .context("no deployment template given, use --profile (see `ec-check profiles`)")?;
    let headroom = resolve_headroom(options.headroom_pct, config);
    let mode = SearchMode::from_zone_change(options.recommend_zone_change);
    let logger = StructuredLogger::new(settings.deployment_label());

    let report = evaluate(
        &settings.cloud_client()?,
        &settings.cluster_client()?,
        region,
        &profile,
        headroom,
        mode,
        &logger,
    )
    .await?;

    let recommended = report.recommendations.is_downscaling_recommended();
    match format {
        OutputFormat::Json => print_json(&report.recommendations)?,
        OutputFormat::Table => {
            if verbose {
                print!("{}", report.tier_sizes);
            }
            print!("{}", report.recommendations);
            if recommended {
                print_warning("Downscaling is recommended for at least one tier");
            } else {
                print_success("No downscaling recommended");
            }
        }
    }

    Ok(recommended)
}

/// Fetch the size catalog and the allocations, then run the searches
pub async fn evaluate(
    cloud: &ApiClient,
    cluster: &ApiClient,
    region: &str,
    profile: &str,
    headroom_percent: f64,
    mode: SearchMode,
    logger: &StructuredLogger,
) -> Result<DownscaleReport> {
    let template = cloud.deployment_template(profile, region).await?;
    let tier_sizes = TierSizes::from_template(&template);
    logger.log_catalog_built(profile, &tier_sizes);

    let allocations = cluster.allocations().await?;
    let tiers = aggregate_tiers(&allocations, &tier_sizes).context("Failed to aggregate node allocations")?;
    logger.log_tiers_aggregated(&tiers);

    let recommendations = recommend_tiers(&tiers, &tier_sizes, headroom_percent, mode);
    logger.log_recommendations(&recommendations);

    Ok(DownscaleReport {
        tier_sizes,
        recommendations,
    })
}
