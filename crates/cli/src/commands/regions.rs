//! Region listing

use advisor_lib::regions::PROVIDERS;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_table, OutputFormat};

/// Row for regions table
#[derive(Tabled, Serialize)]
struct RegionRow {
    #[tabled(rename = "Provider")]
    provider: &'static str,
    #[tabled(rename = "Region")]
    id: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
}

/// List the Elastic Cloud regions per provider
pub fn list_regions(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<RegionRow> = PROVIDERS
                .iter()
                .flat_map(|(provider, regions)| {
                    regions.iter().map(move |region| RegionRow {
                        provider: *provider,
                        id: region.id,
                        name: region.name,
                    })
                })
                .collect();
            print_table(&rows, format)?;
        }
        OutputFormat::Table => {
            for (provider, regions) in PROVIDERS {
                println!("{}", provider.bold());
                for region in regions.iter() {
                    println!("  {:<30} {}", region.id.cyan(), region.name);
                }
                println!();
            }
        }
    }
    Ok(())
}
