//! Elastic Cloud regions

use crate::error::{Error, Result};

/// A hosting region of Elastic Cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub id: &'static str,
    pub name: &'static str,
}

const fn region(id: &'static str, name: &'static str) -> Region {
    Region { id, name }
}

pub const AWS_REGIONS: &[Region] = &[
    region("aws-af-south-1", "Africa (Cape Town)"),
    region("aws-ap-east-1", "Asia Pacific (Hong Kong)"),
    region("ap-northeast-1", "Asia Pacific (Tokyo)"),
    region("aws-ap-northeast-2", "Asia Pacific (Seoul)"),
    region("aws-ap-south-1", "Asia Pacific (Mumbai)"),
    region("ap-southeast-1", "Asia Pacific (Singapore)"),
    region("ap-southeast-2", "Asia Pacific (Sydney)"),
    region("aws-ca-central-1", "Canada (central)"),
    region("aws-eu-central-1", "EU (Frankfurt)"),
    region("aws-eu-central-2", "EU (Zurich)"),
    region("aws-eu-north-1", "EU (Stockholm)"),
    region("aws-eu-south-1", "EU (Milan)"),
    region("eu-west-1", "EU (Ireland)"),
    region("aws-eu-west-2", "EU (London)"),
    region("aws-eu-west-3", "EU (Paris)"),
    region("aws-me-south-1", "Middle East (Bahrain)"),
    region("sa-east-1", "South America (São Paulo)"),
    region("us-east-1", "US East (N. Virginia)"),
    region("aws-us-east-2", "US East (Ohio)"),
    region("us-west-1", "US West (N. California)"),
    region("us-west-2", "US West (Oregon)"),
];

pub const GCP_REGIONS: &[Region] = &[
    region("gcp-asia-east1", "Asia Pacific East 1 (Taiwan)"),
    region("gcp-asia-northeast1", "Asia Pacific Northeast 1 (Tokyo)"),
    region("gcp-asia-northeast3", "Asia Pacific Northeast 3 (Seoul)"),
    region("gcp-asia-south1", "Asia Pacific South 1 (Mumbai)"),
    region("gcp-asia-southeast1", "Asia Pacific Southeast 1 (Singapore)"),
    region("gcp-asia-southeast2", "Asia Pacific Southeast 2 (Jakarta)"),
    region("gcp-australia-southeast1", "Asia Pacific Southeast 1 (Sydney)"),
    region("gcp-europe-north1", "Europe North 1 (Finland)"),
    region("gcp-europe-west1", "Europe West 1 (Belgium)"),
    region("gcp-europe-west2", "Europe West 2 (London)"),
    region("gcp-europe-west3", "Europe West 3 (Frankfurt)"),
    region("gcp-europe-west4", "Europe West 4 (Netherlands)"),
    region("gcp-europe-west9", "Europe West 9 (Paris)"),
    region("gcp-me-west1", "ME West 1 (Tel Aviv)"),
    region("gcp-northamerica-northeast1", "North America Northeast 1 (Montreal)"),
    region("gcp-southamerica-east1", "South America East 1 (Sao Paulo)"),
    region("gcp-us-central1", "US Central 1 (Iowa)"),
    region("gcp-us-east1", "US East 1 (South Carolina)"),
    region("gcp-us-east4", "US East 4 (N. Virginia)"),
    region("gcp-us-west1", "US West 1 (Oregon)"),
];

pub const AZURE_REGIONS: &[Region] = &[
    region("azure-australiaeast", "Australia East (New South Wales)"),
    region("azure-brazilsouth", "Brazil South (São Paulo)"),
    region("azure-canadacentral", "Canada Central (Toronto)"),
    region("azure-centralindia", "Central India (Pune)"),
    region("azure-centralus", "Central US (Iowa)"),
    region("azure-eastus", "East US (Virginia)"),
    region("azure-eastus2", "East US 2 (Virginia)"),
    region("azure-francecentral", "France Central (Paris)"),
    region("azure-japaneast", "Japan East (Tokyo, Saitama)"),
    region("azure-northeurope", "North Europe (Ireland)"),
    region("azure-southafricanorth", "South Africa North (Johannesburg)"),
    region("azure-southcentralus", "South Central US (Texas)"),
    region("azure-southeastasia", "South East Asia (Singapore)"),
    region("azure-uksouth", "UK South (London)"),
    region("azure-westeurope", "West Europe (Netherlands)"),
    region("azure-westus2", "West US 2 (Washington)"),
];

/// Regions grouped by provider display name
pub const PROVIDERS: &[(&str, &[Region])] = &[("AWS", AWS_REGIONS), ("GCP", GCP_REGIONS), ("Azure", AZURE_REGIONS)];

pub fn all_regions() -> impl Iterator<Item = &'static Region> {
    PROVIDERS.iter().flat_map(|(_, regions)| regions.iter())
}

/// Providers whose regions have a `<provider>-<region>` ID
const ENDPOINT_PROVIDERS: [&str; 3] = ["aws", "gcp", "azure"];

pub fn is_region_valid(id: &str) -> bool {
    all_regions().any(|r| r.id == id)
}

/// Provider and provider region of a region ID, e.g. `azure` and `westeurope`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEndpoint {
    pub provider: String,
    pub provider_region: String,
}

impl RegionEndpoint {
    /// Split a region ID at its first dash.
    ///
    /// Legacy AWS IDs without a provider prefix (e.g. `us-east-1`) have no
    /// endpoint of this form and are rejected.
    pub fn parse(id: &str) -> Result<Self> {
        match id.split_once('-') {
            Some((provider, provider_region))
                if ENDPOINT_PROVIDERS.contains(&provider) && !provider_region.is_empty() =>
            {
                Ok(Self {
                    provider: provider.to_string(),
                    provider_region: provider_region.to_string(),
                })
            }
            _ => Err(Error::MalformedRegion { value: id.to_string() }),
        }
    }

    /// Elasticsearch endpoint of a deployment hosted in this region
    pub fn deployment_url(&self, deployment: &str) -> String {
        format!(
            "https://{deployment}.es.{}.{}.elastic-cloud.com",
            self.provider_region, self.provider
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_validation() {
        assert!(is_region_valid("azure-westeurope"));
        assert!(is_region_valid("gcp-us-central1"));
        assert!(is_region_valid("aws-eu-central-1"));
        assert!(!is_region_valid("West Europe (Netherlands)"));
        assert!(!is_region_valid("azure-moon"));
    }

    #[test]
    fn test_region_ids_unique() {
        let mut ids: Vec<_> = all_regions().map(|r| r.id).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_endpoint_parse() {
        let endpoint = RegionEndpoint::parse("azure-westeurope").unwrap();
        assert_eq!(endpoint.provider, "azure");
        assert_eq!(endpoint.provider_region, "westeurope");
        assert_eq!(
            endpoint.deployment_url("my-deployment"),
            "https://my-deployment.es.westeurope.azure.elastic-cloud.com"
        );

        let endpoint = RegionEndpoint::parse("aws-eu-central-1").unwrap();
        assert_eq!(endpoint.provider_region, "eu-central-1");
    }

    #[test]
    fn test_endpoint_parse_invalid() {
        assert!(matches!(RegionEndpoint::parse("westeurope"), Err(Error::MalformedRegion { .. })));
        assert!(RegionEndpoint::parse("azure-").is_err());
    }

    #[test]
    fn test_unprefixed_aws_regions_have_no_endpoint() {
        for id in ["us-east-1", "eu-west-1", "ap-southeast-2", "sa-east-1"] {
            assert!(is_region_valid(id), "{id}");
            assert!(
                matches!(RegionEndpoint::parse(id), Err(Error::MalformedRegion { .. })),
                "{id}"
            );
        }
    }

    #[test]
    fn test_every_prefixed_region_parses() {
        for region in all_regions().filter(|r| ENDPOINT_PROVIDERS.iter().any(|p| r.id.starts_with(&format!("{p}-")))) {
            let endpoint = RegionEndpoint::parse(region.id).unwrap();
            assert!(ENDPOINT_PROVIDERS.contains(&endpoint.provider.as_str()));
        }
    }
}
