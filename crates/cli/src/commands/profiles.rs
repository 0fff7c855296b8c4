//! Deployment template listing

use anyhow::Result;

use crate::config::Settings;
use crate::output::{print_json, print_warning, OutputFormat};

/// Print the deployment template IDs available in the configured region
pub async fn list_profiles(settings: &Settings, format: OutputFormat) -> Result<()> {
    let region = settings.region()?;
    let client = settings.cloud_client()?;

    let mut profiles: Vec<String> = client
        .deployment_templates(region)
        .await?
        .into_iter()
        .map(|template| template.id)
        .collect();
    profiles.sort();

    match format {
        OutputFormat::Json => print_json(&profiles)?,
        OutputFormat::Table => {
            if profiles.is_empty() {
                print_warning(&format!("No deployment templates found in {region}"));
            }
            for profile in &profiles {
                println!("{profile}");
            }
        }
    }
    Ok(())
}
