//! Elastic Cloud check CLI
//!
//! A command-line tool for checking whether the data tiers of an Elastic
//! Cloud deployment can be downscaled, and for inspecting and moving
//! indices between ILM phases.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{downscale, ilm, profiles, regions};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit code signalling that at least one tier should be downscaled
const DOWNSCALE_RECOMMENDED_EXIT_CODE: u8 = 2;

/// Elastic Cloud check CLI
#[derive(Parser)]
#[command(name = "ec-check")]
#[command(author, version, about = "Checks for Elastic Cloud deployments", long_about = None)]
pub struct Cli {
    /// Name of the deployment in Elastic Cloud, e.g. my-deployment
    #[arg(long, short, global = true)]
    pub deployment: Option<String>,

    /// Region of the deployment, e.g. azure-westeurope (see `ec-check regions`)
    #[arg(long, short, global = true)]
    pub region: Option<String>,

    /// Elasticsearch username
    #[arg(long, env = "ES_USERNAME", global = true)]
    pub username: Option<String>,

    /// Elasticsearch password
    #[arg(long, env = "ES_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Elastic Cloud API endpoint [default: https://api.elastic-cloud.com]
    #[arg(long, env = "EC_CHECK_CLOUD_API_URL", global = true)]
    pub cloud_api_url: Option<String>,

    /// Elasticsearch endpoint, instead of the one derived from deployment and region
    #[arg(long, env = "EC_CHECK_ES_URL", global = true)]
    pub es_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table", global = true)]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Write logs to stderr as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Calculate whether downscaling the data tiers is feasible based on the current disk consumption
    Downscale {
        /// Deployment template of the deployment (see `ec-check profiles`)
        #[arg(long, short)]
        profile: Option<String>,

        /// Minimal free disk space in percent after downscaling [default: 25]
        #[arg(long)]
        headroom_pct: Option<f64>,

        /// Also consider reducing the number of availability zones
        #[arg(long, short = 'z')]
        recommend_zone_change: bool,

        /// Exit with code 2 if downscaling is recommended for at least one tier
        #[arg(long, short)]
        exit_code: bool,
    },

    /// Index lifecycle management commands
    #[command(subcommand)]
    Ilm(IlmCommands),

    /// List the deployment templates (profiles) of a region
    Profiles,

    /// List the Elastic Cloud regions
    Regions,
}

#[derive(Subcommand)]
pub enum IlmCommands {
    /// List ILM managed indices
    List {
        /// Only show indices in this phase
        #[arg(long, short)]
        phase: Option<String>,

        /// Only show indices managed by this policy
        #[arg(long)]
        ilm_policy: Option<String>,

        /// Sort columns, applied in order (age, size)
        #[arg(long, short, value_delimiter = ',')]
        sort: Vec<String>,

        /// Minimal index size, e.g. 10g or 512mb
        #[arg(long)]
        min_size: Option<String>,

        /// Minimal index age in days
        #[arg(long, default_value_t = 0)]
        min_age_days: u32,
    },

    /// Move ILM managed indices to another phase
    Move {
        /// Index pattern selecting the indices to move
        #[arg(long, short)]
        index_pattern: String,

        /// Phase to move to (hot, warm, cold, frozen, delete)
        #[arg(long, short)]
        target_phase: String,

        /// Move indices even if their current phase is not complete
        #[arg(long)]
        force: bool,

        /// Only print the moves without executing them
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_directives = if verbose {
        "warn,advisor_lib=debug,ec_check=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = config::Config::load()?;
    let settings = config::Settings {
        deployment: cli.deployment,
        region: cli.region,
        username: cli.username,
        password: cli.password,
        cloud_api_url: cli.cloud_api_url,
        es_url: cli.es_url,
    }
    .merge(&config);

    // Execute command
    match cli.command {
        Commands::Downscale {
            profile,
            headroom_pct,
            recommend_zone_change,
            exit_code,
        } => {
            let options = downscale::DownscaleOptions {
                profile,
                headroom_pct,
                recommend_zone_change,
            };
            let recommended = downscale::run(&settings, &config, options, cli.verbose, cli.format).await?;
            if exit_code && recommended {
                return Ok(ExitCode::from(DOWNSCALE_RECOMMENDED_EXIT_CODE));
            }
        }
        Commands::Ilm(ilm_cmd) => match ilm_cmd {
            IlmCommands::List {
                phase,
                ilm_policy,
                sort,
                min_size,
                min_age_days,
            } => {
                let options = ilm::ListOptions {
                    phase,
                    ilm_policy,
                    sort,
                    min_size,
                    min_age_days,
                };
                ilm::list(&settings, options, cli.format).await?;
            }
            IlmCommands::Move {
                index_pattern,
                target_phase,
                force,
                dry_run,
            } => {
                let options = ilm::MoveOptions {
                    index_pattern,
                    target_phase,
                    force,
                    dry_run,
                };
                ilm::move_indices(&settings, options).await?;
            }
        },
        Commands::Profiles => {
            profiles::list_profiles(&settings, cli.format).await?;
        }
        Commands::Regions => {
            regions::list_regions(cli.format)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
