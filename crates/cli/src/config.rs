//! Configuration management for the CLI

use advisor_lib::downscale::DEFAULT_HEADROOM_PERCENT;
use advisor_lib::regions::{is_region_valid, RegionEndpoint};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::client::{ApiClient, CLOUD_API_URL};

/// Defaults read from the config file and `EC_CHECK_*` variables
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub deployment: Option<String>,
    pub region: Option<String>,
    /// Default deployment template
    pub profile: Option<String>,
    pub username: Option<String>,
    pub headroom_pct: Option<f64>,
    pub cloud_api_url: Option<String>,
}

impl Config {
    /// Load configuration from the default file and the environment
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path` (if it exists) and the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Json)
                    .required(false),
            )
            .add_source(config::Environment::with_prefix("EC_CHECK"))
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?
            .try_deserialize()
            .context("Failed to parse config file")
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("ec-check").join("config.json"))
    }
}

/// Connection settings after merging flags over the config file
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub deployment: Option<String>,
    pub region: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub cloud_api_url: Option<String>,
    pub es_url: Option<String>,
}

impl Settings {
    /// Fill every unset field from `config`
    pub fn merge(mut self, config: &Config) -> Self {
        self.deployment = self.deployment.or_else(|| config.deployment.clone());
        self.region = self.region.or_else(|| config.region.clone());
        self.username = self.username.or_else(|| config.username.clone());
        self.cloud_api_url = self.cloud_api_url.or_else(|| config.cloud_api_url.clone());
        self
    }

    /// The configured region, if it is a known Elastic Cloud region
    pub fn region(&self) -> Result<&str> {
        match self.region.as_deref() {
            Some(region) if is_region_valid(region) => Ok(region),
            Some(region) => anyhow::bail!("invalid region {region:?}, see `ec-check regions`"),
            None => anyhow::bail!("no region given, use --region or set it in the config file"),
        }
    }

    /// Client for the Elastic Cloud API
    pub fn cloud_client(&self) -> Result<ApiClient> {
        ApiClient::new(self.cloud_api_url.as_deref().unwrap_or(CLOUD_API_URL))
    }

    /// Elasticsearch URL, either given directly or derived from deployment and region
    pub fn es_url(&self) -> Result<String> {
        if let Some(url) = &self.es_url {
            return Ok(url.clone());
        }

        let deployment = self
            .deployment
            .as_deref()
            .context("no deployment given, use --deployment or set it in the config file")?;
        let endpoint = RegionEndpoint::parse(self.region()?)?;
        Ok(endpoint.deployment_url(deployment))
    }

    /// Client for the deployment's Elasticsearch endpoint
    pub fn cluster_client(&self) -> Result<ApiClient> {
        let client = ApiClient::new(&self.es_url()?)?;
        Ok(match (&self.username, &self.password) {
            (Some(username), Some(password)) => client.with_basic_auth(username, password),
            _ => client,
        })
    }

    /// Deployment name for log records
    pub fn deployment_label(&self) -> &str {
        self.deployment.as_deref().unwrap_or("-")
    }
}

/// Headroom from the flag, then the config, then the built-in default
pub fn resolve_headroom(flag: Option<f64>, config: &Config) -> f64 {
    flag.or(config.headroom_pct).unwrap_or(DEFAULT_HEADROOM_PERCENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"deployment": "logs-prod", "region": "gcp-europe-west1", "headroom_pct": 30.0}}"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();

        assert_eq!(config.deployment.as_deref(), Some("logs-prod"));
        assert_eq!(config.region.as_deref(), Some("gcp-europe-west1"));
        assert_eq!(config.headroom_pct, Some(30.0));
        assert_eq!(config.profile, None);
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.deployment, None);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "not json").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_flags_win_over_config() {
        let config = Config {
            deployment: Some("from-file".into()),
            region: Some("azure-westeurope".into()),
            ..Default::default()
        };
        let settings = Settings {
            deployment: Some("from-flag".into()),
            ..Default::default()
        }
        .merge(&config);

        assert_eq!(settings.deployment.as_deref(), Some("from-flag"));
        assert_eq!(settings.region.as_deref(), Some("azure-westeurope"));
    }

    #[test]
    fn test_headroom_precedence() {
        let config = Config {
            headroom_pct: Some(30.0),
            ..Default::default()
        };
        assert_eq!(resolve_headroom(Some(10.0), &config), 10.0);
        assert_eq!(resolve_headroom(None, &config), 30.0);
        assert_eq!(resolve_headroom(None, &Config::default()), DEFAULT_HEADROOM_PERCENT);
    }

    #[test]
    fn test_es_url_from_deployment_and_region() {
        let settings = Settings {
            deployment: Some("logs-prod".into()),
            region: Some("aws-eu-central-1".into()),
            ..Default::default()
        };
        assert_eq!(
            settings.es_url().unwrap(),
            "https://logs-prod.es.eu-central-1.aws.elastic-cloud.com"
        );
    }

    #[test]
    fn test_es_url_override() {
        let settings = Settings {
            es_url: Some("http://localhost:9200".into()),
            ..Default::default()
        };
        assert_eq!(settings.es_url().unwrap(), "http://localhost:9200");
    }

    #[test]
    fn test_unknown_region_rejected() {
        let settings = Settings {
            deployment: Some("logs-prod".into()),
            region: Some("mars-olympus-1".into()),
            ..Default::default()
        };
        assert!(settings.region().is_err());
        assert!(settings.es_url().is_err());
    }

    #[test]
    fn test_legacy_aws_region_needs_es_url() {
        let settings = Settings {
            deployment: Some("logs-prod".into()),
            region: Some("us-east-1".into()),
            ..Default::default()
        };
        assert_eq!(settings.region().unwrap(), "us-east-1");
        assert!(settings.es_url().is_err());

        let settings = Settings {
            es_url: Some("https://logs-prod.example.com".into()),
            ..settings
        };
        assert_eq!(settings.es_url().unwrap(), "https://logs-prod.example.com");
    }
}
